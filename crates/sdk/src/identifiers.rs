//! Newtype identifiers.
//!
//! Values the service hands out as opaque identities are wrapped in distinct
//! newtypes so that, for example, a [`SiteId`] path segment can never be passed
//! where an [`ApiKeyId`] is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// An optional `valid = <fn(&str) -> bool>` adds a check beyond non-emptiness.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident $(, valid = $valid:expr)?
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty
            /// or otherwise invalid.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() $(|| !($valid)(v.as_str()))? {
                    None
                } else {
                    Some(Self(v))
                }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (server-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

u64_id! {
    /// Identifies an API key record created through the settings endpoint.
    ApiKeyId
}

string_id! {
    /// Identifies a monitored site whose compliance badge can be fetched.
    ///
    /// Percent-encoded into the `/badge/{site_id}` path segment. `.` and `..`
    /// are rejected because URL normalisation would resolve them as dot
    /// segments.
    SiteId, valid = |v: &str| v != "." && v != ".."
}

/// Correlates one dispatched request across client logs and the service.
///
/// Generated fresh for every dispatch; recorded on the request span and sent
/// as the `x-request-id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
