//! Client configuration read by every dispatched request.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Production endpoint used when no base address is configured.
pub const DEFAULT_BASE_ADDRESS: &str = "https://api.regulaai.com";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Environment variable overriding the base address.
pub const BASE_ADDRESS_ENV: &str = "REGULAAI_API_URL";

/// Environment variable overriding the request timeout, in milliseconds.
pub const TIMEOUT_ENV: &str = "REGULAAI_TIMEOUT_MS";

/// Where requests go and how long each may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfiguration {
    /// Scheme and host (optionally with a path prefix) every operation path is
    /// appended to.
    pub base_address: String,

    /// Upper bound on one network exchange. Exceeding it surfaces as
    /// [`crate::TransportError::Timeout`].
    #[serde(rename = "request_timeout_ms", with = "duration_ms")]
    pub request_timeout: Duration,

    /// Sent as the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ClientConfiguration {
    fn default() -> Self {
        Self {
            base_address: DEFAULT_BASE_ADDRESS.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            user_agent: format!("RegulaAI-SDK-Rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfiguration {
    /// Returns the defaults overlaid with [`BASE_ADDRESS_ENV`] and
    /// [`TIMEOUT_ENV`] when they are set.
    pub fn from_env() -> Self {
        Self::default().with_overrides(
            std::env::var(BASE_ADDRESS_ENV).ok(),
            std::env::var(TIMEOUT_ENV).ok(),
        )
    }

    fn with_overrides(mut self, base_address: Option<String>, timeout_ms: Option<String>) -> Self {
        if let Some(address) = base_address.filter(|a| !a.trim().is_empty()) {
            self.base_address = address;
        }
        if let Some(raw) = timeout_ms {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.request_timeout = Duration::from_millis(ms),
                _ => warn!(value = %raw, "Ignoring invalid {TIMEOUT_ENV}"),
            }
        }
        self
    }

    /// Joins an operation path onto the base address.
    ///
    /// A trailing `/` on the base address is ignored so that both
    /// `https://host` and `https://host/` produce `https://host/scan`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_address.trim_end_matches('/'), path)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfiguration::default();
        assert_eq!(config.base_address, DEFAULT_BASE_ADDRESS);
        assert_eq!(config.request_timeout, Duration::from_millis(30_000));
        assert!(config.user_agent.starts_with("RegulaAI-SDK-Rust/"));
    }

    #[test]
    fn test_overrides_apply_and_invalid_timeout_is_ignored() {
        let config = ClientConfiguration::default()
            .with_overrides(Some("http://localhost:8000".into()), Some("abc".into()));
        assert_eq!(config.base_address, "http://localhost:8000");
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);

        let config = ClientConfiguration::default().with_overrides(None, Some("1500".into()));
        assert_eq!(config.base_address, DEFAULT_BASE_ADDRESS);
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_url_for_tolerates_trailing_slash() {
        let mut config = ClientConfiguration::default();
        config.base_address = "http://localhost:8000/".to_string();
        assert_eq!(config.url_for("/scan"), "http://localhost:8000/scan");
    }

    #[test]
    fn test_timeout_serialises_as_milliseconds() {
        let json = serde_json::to_value(ClientConfiguration::default()).unwrap();
        assert_eq!(json["request_timeout_ms"], 30_000);
    }
}
