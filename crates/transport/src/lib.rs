//! RegulaAI HTTP transport adapter.
//!
//! Implements the [`sdk::Transport`] trait over [`reqwest`]. Every status code
//! the service answers with is handed back to the executor unchanged; only
//! exchanges that produce no response at all become [`sdk::TransportError`]s.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection handling, TLS, header encoding, and timeout
//! enforcement live here. The [`sdk`] crate sees only [`sdk::Transport`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sdk::{
    ClientConfiguration, ClientError, Method, RegulaClient, Transport, TransportError,
    TransportRequest, TransportResponse,
};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors raised while building the adapter.
#[derive(Debug, Error)]
pub enum TransportSetupError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// [`Transport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with rustls and default connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportSetupError::Client`] if the TLS backend cannot be
    /// initialised.
    pub fn new() -> Result<Self, TransportSetupError> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;
        Ok(Self { client })
    }

    /// Wraps an already configured [`reqwest::Client`].
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(name = "regula.transport", skip_all, fields(method = %request.method, url = %request.url))]
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let timeout = request.timeout;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .headers(header_map(&request.headers)?)
            .timeout(timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| map_error(e, timeout))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_error(e, timeout))?
            .to_vec();

        debug!(status, bytes = body.len(), "Exchange complete");
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| TransportError::Other {
            message: format!("invalid header name '{name}': {e}"),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| TransportError::Other {
            message: format!("invalid value for header '{name}': {e}"),
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

fn map_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout { after: timeout }
    } else if err.is_connect() {
        TransportError::Connect {
            message: err.to_string(),
        }
    } else {
        TransportError::Other {
            message: err.to_string(),
        }
    }
}

/// Builds a [`RegulaClient`] that talks HTTP through a fresh
/// [`ReqwestTransport`].
///
/// # Errors
///
/// [`ClientError::Configuration`] if the HTTP stack cannot be initialised.
pub fn http_client(config: ClientConfiguration) -> Result<RegulaClient, ClientError> {
    let transport = ReqwestTransport::new().map_err(|e| ClientError::Configuration {
        message: e.to_string(),
    })?;
    Ok(RegulaClient::new(Arc::new(transport), config))
}
