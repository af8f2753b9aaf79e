//! Error taxonomy surfaced to callers.
//!
//! Every failed operation resolves to exactly one [`ClientError`] variant. The
//! variant, not the message text, is the stable contract: callers branch on
//! [`ClientError::kind`] to decide whether to re-authenticate, show a billing
//! prompt, back off, or display the server's message.
//!
//! [`TransportError`] is the failure type of the [`crate::Transport`] port. It
//! is carried through [`ClientError::TransportFailure`] unchanged.

use std::time::Duration;

use thiserror::Error;

use crate::ValidationIssue;

/// Fallback text used when an error response carries no string `detail`.
pub const GENERIC_API_ERROR: &str = "API request failed";

// ---------------------------------------------------------------------------
// Transport-level failures
// ---------------------------------------------------------------------------

/// A network exchange that produced no HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response arrived within the configured request timeout.
    #[error("request timed out after {after:?}")]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },

    /// The connection to the service could not be established.
    #[error("connection failed: {message}")]
    Connect {
        /// Description from the underlying HTTP stack.
        message: String,
    },

    /// Any other failure while sending the request or reading the response.
    #[error("transport error: {message}")]
    Other {
        /// Description from the underlying HTTP stack.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Client errors
// ---------------------------------------------------------------------------

/// Fieldless discriminant of [`ClientError`] for branching without matching
/// on payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AuthenticationFailed,
    Forbidden,
    QuotaExceeded,
    RateLimited,
    ApiError,
    TransportFailure,
    DecodeFailure,
    Configuration,
    InvalidRequest,
}

/// Errors returned by every client operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service rejected the credential (HTTP 401).
    #[error("Authentication failed. Please check your API key or access token.")]
    AuthenticationFailed,

    /// The credential is valid but lacks permission for the operation (HTTP 403).
    #[error("Insufficient permissions for this operation.")]
    Forbidden,

    /// The organisation has used up its scan quota (HTTP 402).
    #[error("Scan quota exceeded. Please upgrade your plan or wait for reset.")]
    QuotaExceeded,

    /// Too many requests (HTTP 429).
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited {
        /// Server-provided `Retry-After` hint, when present. The client never
        /// retries on its own.
        retry_after: Option<Duration>,
    },

    /// Any other non-2xx response.
    #[error("{detail}")]
    ApiError {
        /// HTTP status code of the response.
        status: u16,
        /// The envelope's string `detail`, or [`GENERIC_API_ERROR`].
        detail: String,
        /// Field-level issues when the envelope carried a validation list.
        validation: Vec<ValidationIssue>,
    },

    /// No HTTP response was received.
    #[error(transparent)]
    TransportFailure(#[from] TransportError),

    /// A response body (or one batch line) could not be decoded.
    #[error("Failed to decode {context}: {message}")]
    DecodeFailure {
        /// What was being decoded, e.g. `"ScanResponse"` or `"batch line 3"`.
        context: String,
        /// Decoder error text.
        message: String,
    },

    /// The client configuration produced an unusable request: a base address
    /// that does not parse as an http(s) URL, or a credential containing a
    /// line break.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The request body could not be serialised.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ClientError {
    /// Returns the fieldless kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::QuotaExceeded => ErrorKind::QuotaExceeded,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::ApiError { .. } => ErrorKind::ApiError,
            Self::TransportFailure(_) => ErrorKind::TransportFailure,
            Self::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }

    /// Returns the HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed => Some(401),
            Self::QuotaExceeded => Some(402),
            Self::Forbidden => Some(403),
            Self::RateLimited { .. } => Some(429),
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for errors that call for new credentials.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::AuthenticationFailed | ErrorKind::Forbidden
        )
    }

    pub(crate) fn decode(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::DecodeFailure {
            context: context.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_status_agree() {
        let cases = [
            (ClientError::AuthenticationFailed, ErrorKind::AuthenticationFailed, Some(401)),
            (ClientError::QuotaExceeded, ErrorKind::QuotaExceeded, Some(402)),
            (ClientError::Forbidden, ErrorKind::Forbidden, Some(403)),
            (
                ClientError::RateLimited { retry_after: None },
                ErrorKind::RateLimited,
                Some(429),
            ),
            (
                ClientError::TransportFailure(TransportError::Timeout {
                    after: Duration::from_secs(30),
                }),
                ErrorKind::TransportFailure,
                None,
            ),
        ];
        for (err, kind, status) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn test_api_error_displays_detail_verbatim() {
        let err = ClientError::ApiError {
            status: 404,
            detail: "Site not found".to_string(),
            validation: Vec::new(),
        };
        assert_eq!(err.to_string(), "Site not found");
        assert!(!err.requires_reauthentication());
    }

    #[test]
    fn test_transport_failure_is_transparent() {
        let inner = TransportError::Connect {
            message: "refused".to_string(),
        };
        let err = ClientError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
        match err {
            ClientError::TransportFailure(passed) => assert_eq!(passed, inner),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_auth_errors_require_reauthentication() {
        assert!(ClientError::AuthenticationFailed.requires_reauthentication());
        assert!(ClientError::Forbidden.requires_reauthentication());
        assert!(!ClientError::QuotaExceeded.requires_reauthentication());
    }
}
