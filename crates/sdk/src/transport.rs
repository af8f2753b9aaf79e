//! The network port.
//!
//! [`Transport`] performs exactly one HTTP exchange. It reports any response it
//! receives, whatever the status code; interpreting statuses is the executor's
//! job. Infrastructure crates implement this trait; nothing in this crate
//! opens a socket.

use std::time::Duration;

use async_trait::async_trait;

use crate::TransportError;

/// HTTP methods used by the operation catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully composed outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Header name/value pairs, in the order they should be sent.
    pub headers: Vec<(String, String)>,
    /// Serialised body; `None` sends no body at all.
    pub body: Option<Vec<u8>>,
    /// Deadline for the whole exchange.
    pub timeout: Duration,
}

impl TransportRequest {
    /// Returns the first value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Whatever the service answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the first value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Performs one HTTP exchange.
///
/// Implementations must not retry, and must honour
/// [`TransportRequest::timeout`], reporting expiry as
/// [`TransportError::Timeout`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
