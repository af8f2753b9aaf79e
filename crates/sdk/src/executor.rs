//! The request executor.
//!
//! Turns an [`Operation`] plus typed input into a [`TransportRequest`], hands
//! it to the [`Transport`], and maps the outcome to a typed value or a
//! [`ClientError`]. Each call is a single attempt.
//!
//! Configuration and credentials are read once, when the request is composed.
//! A request already in flight keeps the headers it was dispatched with even if
//! the credential changes before it completes.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, field, instrument, warn, Span};
use url::Url;

use crate::errors::GENERIC_API_ERROR;
use crate::{
    ApiErrorEnvelope, ClientConfiguration, ClientError, CredentialStore, ErrorDetail, Operation,
    RequestId, RequestKind, ResponseKind, Transport, TransportRequest, TransportResponse,
};

/// Header correlating a request with client-side logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Dispatches operations through a [`Transport`].
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    config: RwLock<ClientConfiguration>,
    credentials: RwLock<CredentialStore>,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: ClientConfiguration,
        credentials: CredentialStore,
    ) -> Self {
        Self {
            transport,
            config: RwLock::new(config),
            credentials: RwLock::new(credentials),
        }
    }

    /// Returns a snapshot of the current configuration.
    pub fn configuration(&self) -> ClientConfiguration {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutates the configuration used by requests dispatched from now on.
    pub fn update_configuration(&self, update: impl FnOnce(&mut ClientConfiguration)) {
        update(&mut self.config.write().unwrap_or_else(PoisonError::into_inner));
    }

    /// Returns a snapshot of the credential store.
    pub fn credentials(&self) -> CredentialStore {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutates the credential store used by requests dispatched from now on.
    pub fn update_credentials(&self, update: impl FnOnce(&mut CredentialStore)) {
        update(&mut self.credentials.write().unwrap_or_else(PoisonError::into_inner));
    }

    /// Executes an operation whose successful response is a JSON document.
    ///
    /// `input` is ignored for operations declaring [`RequestKind::Empty`]; pass
    /// `&()` for those.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; see [`map_failure`] for the status mapping.
    /// Operations that do not declare [`ResponseKind::Json`] are refused with
    /// [`ClientError::InvalidRequest`] before anything is sent.
    pub async fn execute_json<Req, Resp>(
        &self,
        operation: &Operation,
        path: &str,
        input: &Req,
    ) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        if operation.response != ResponseKind::Json {
            return Err(ClientError::InvalidRequest {
                message: format!("{} does not return a JSON document", operation.name),
            });
        }
        let response = self.dispatch(operation, path, input).await?;
        decode_json(operation, &response.body)
    }

    /// Executes an operation and returns the successful body as text,
    /// untouched.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; a body that is not UTF-8 is a
    /// [`ClientError::DecodeFailure`].
    pub async fn execute_text<Req>(
        &self,
        operation: &Operation,
        path: &str,
        input: &Req,
    ) -> Result<String, ClientError>
    where
        Req: Serialize + ?Sized,
    {
        let response = self.dispatch(operation, path, input).await?;
        String::from_utf8(response.body).map_err(|e| ClientError::decode(operation.name, e))
    }

    #[instrument(
        name = "regula.request",
        skip(self, operation, path, input),
        fields(
            operation = operation.name,
            method = %operation.method,
            path = %path,
            request_id = field::Empty,
        )
    )]
    async fn dispatch<Req>(
        &self,
        operation: &Operation,
        path: &str,
        input: &Req,
    ) -> Result<TransportResponse, ClientError>
    where
        Req: Serialize + ?Sized,
    {
        let request_id = RequestId::new_random();
        Span::current().record("request_id", field::display(request_id));

        let body = match operation.request {
            RequestKind::Empty => None,
            RequestKind::Json => Some(serde_json::to_vec(input).map_err(|e| {
                ClientError::InvalidRequest {
                    message: e.to_string(),
                }
            })?),
        };
        let request = self.compose(operation, path, body, request_id)?;

        debug!(url = %request.url, "Dispatching request");
        let response = self.transport.perform(request).await.map_err(|e| {
            warn!(error = %e, "Transport failure");
            ClientError::TransportFailure(e)
        })?;
        debug!(status = response.status, "Response received");

        if response.is_success() {
            Ok(response)
        } else {
            let err = map_failure(&response);
            warn!(status = response.status, error = %err, "Request failed");
            Err(err)
        }
    }

    fn compose(
        &self,
        operation: &Operation,
        path: &str,
        body: Option<Vec<u8>>,
        request_id: RequestId,
    ) -> Result<TransportRequest, ClientError> {
        let config = self.configuration();
        let url = config.url_for(path);
        match Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {}
            Ok(_) => {
                return Err(ClientError::Configuration {
                    message: format!("base address '{}' is not an http(s) URL", config.base_address),
                });
            }
            Err(e) => {
                return Err(ClientError::Configuration {
                    message: format!("base address '{}' is not a valid URL: {e}", config.base_address),
                });
            }
        }

        let mut headers = vec![
            ("User-Agent".to_string(), config.user_agent.clone()),
            ("Accept".to_string(), operation.accept().to_string()),
            (REQUEST_ID_HEADER.to_string(), request_id.to_string()),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        for (name, value) in self.credentials().auth_headers() {
            if value.contains(&['\r', '\n'][..]) {
                return Err(ClientError::Configuration {
                    message: format!("{name} header value contains a line break"),
                });
            }
            headers.push((name.to_string(), value));
        }

        Ok(TransportRequest {
            method: operation.method,
            url,
            headers,
            body,
            timeout: config.request_timeout,
        })
    }
}

fn decode_json<T: DeserializeOwned>(operation: &Operation, body: &[u8]) -> Result<T, ClientError> {
    // 204/205 carry no body; let unit-like response types still decode.
    let result = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_slice(body)
    };
    result.map_err(|e| ClientError::decode(operation.name, e))
}

/// Maps a non-2xx response to its [`ClientError`].
///
/// | Status | Error |
/// |--------|-------|
/// | 401 | [`ClientError::AuthenticationFailed`] |
/// | 402 | [`ClientError::QuotaExceeded`] |
/// | 403 | [`ClientError::Forbidden`] |
/// | 429 | [`ClientError::RateLimited`] |
/// | other | [`ClientError::ApiError`] with the envelope's string `detail`, or [`GENERIC_API_ERROR`] |
pub fn map_failure(response: &TransportResponse) -> ClientError {
    match response.status {
        401 => ClientError::AuthenticationFailed,
        402 => ClientError::QuotaExceeded,
        403 => ClientError::Forbidden,
        429 => ClientError::RateLimited {
            retry_after: response
                .header("Retry-After")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        },
        status => {
            let (detail, validation) = match serde_json::from_slice::<ApiErrorEnvelope>(&response.body) {
                Ok(ApiErrorEnvelope {
                    detail: ErrorDetail::Message(message),
                }) if !message.is_empty() => (message, Vec::new()),
                Ok(ApiErrorEnvelope {
                    detail: ErrorDetail::Validation(issues),
                }) => (GENERIC_API_ERROR.to_string(), issues),
                _ => (GENERIC_API_ERROR.to_string(), Vec::new()),
            };
            ClientError::ApiError {
                status,
                detail,
                validation,
            }
        }
    }
}
