//! Typed client facade over the operation catalogue.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::batch::{decode_batch, decode_batch_report, BatchReport};
use crate::operations::{self, Operation};
use crate::{
    ApiKeyCreateRequest, ApiKeyResponse, AuthCredential, AuthMethod, BatchScanRequest,
    CheckoutSessionRequest, CheckoutSessionResponse, ClientConfiguration, ClientError,
    CredentialStore, EmailSettingsRequest, IntegrationStatusResponse, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, RequestExecutor, ScanRequest, ScanResponse, SiteId,
    SlackWebhookRequest, TestIntegrationRequest, Transport,
};

impl LoginResponse {
    /// Returns the bearer credential carried by this response, or `None` when
    /// the access token is empty.
    pub fn bearer_credential(&self) -> Option<AuthCredential> {
        if self.access_token.is_empty() {
            None
        } else {
            Some(AuthCredential::BearerToken(self.access_token.clone()))
        }
    }
}

/// Client for the RegulaAI compliance-scanning service.
///
/// One client owns one credential and one configuration. Operations may be
/// issued concurrently from several tasks; use separate clients when
/// requests must be isolated from each other's credentials.
///
/// ```no_run
/// # use std::sync::Arc;
/// # async fn demo(transport: Arc<dyn sdk::Transport>) -> Result<(), sdk::ClientError> {
/// let client = sdk::RegulaClient::builder()
///     .transport(transport)
///     .api_key("your-api-key")
///     .build()?;
///
/// let result = client.scan_website(&sdk::ScanRequest::new("https://example.com")).await?;
/// println!("Compliance score: {}%", result.score);
/// # Ok(())
/// # }
/// ```
pub struct RegulaClient {
    executor: RequestExecutor,
}

impl RegulaClient {
    /// Creates an unauthenticated client.
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfiguration) -> Self {
        Self {
            executor: RequestExecutor::new(transport, config, CredentialStore::new()),
        }
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    // -----------------------------------------------------------------------
    // Credentials
    // -----------------------------------------------------------------------

    /// Authenticates subsequent requests with an API key.
    pub fn set_api_key(&self, key: impl Into<String>) {
        self.executor.update_credentials(|c| c.set_api_key(key));
    }

    /// Authenticates subsequent requests with a bearer token.
    pub fn set_access_token(&self, token: impl Into<String>) {
        self.executor.update_credentials(|c| c.set_access_token(token));
    }

    /// Replaces the current credential.
    pub fn apply_credential(&self, credential: AuthCredential) {
        self.executor.update_credentials(|c| c.apply(credential));
    }

    pub fn is_authenticated(&self) -> bool {
        self.executor.credentials().is_authenticated()
    }

    /// Kind of the current credential; [`AuthMethod::ApiKey`] before any is set.
    pub fn auth_method(&self) -> AuthMethod {
        self.executor.credentials().auth_method()
    }

    pub fn credential(&self) -> Option<AuthCredential> {
        self.executor.credentials().credential().cloned()
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    pub fn configuration(&self) -> ClientConfiguration {
        self.executor.configuration()
    }

    pub fn base_address(&self) -> String {
        self.executor.configuration().base_address
    }

    pub fn set_base_address(&self, base_address: impl Into<String>) {
        let base_address = base_address.into();
        self.executor.update_configuration(|c| c.base_address = base_address);
    }

    pub fn request_timeout(&self) -> Duration {
        self.executor.configuration().request_timeout
    }

    pub fn set_request_timeout(&self, timeout: Duration) {
        self.executor.update_configuration(|c| c.request_timeout = timeout);
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Registers a new user and organisation.
    pub async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse, ClientError> {
        self.json(&operations::REGISTER, request).await
    }

    /// Logs in and authenticates this client with the issued access token.
    ///
    /// On success the response's access token, when non-empty, is applied as
    /// the client's credential *before* the response is returned, replacing
    /// any API key. Callers that only want the tokens should use a separate
    /// client.
    #[instrument(skip_all)]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let response: LoginResponse = self.json(&operations::LOGIN, request).await?;
        if let Some(credential) = response.bearer_credential() {
            self.apply_credential(credential);
            info!("Login succeeded; bearer token applied");
        }
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Scanning
    // -----------------------------------------------------------------------

    /// Scans a single website for GDPR compliance.
    pub async fn scan_website(&self, request: &ScanRequest) -> Result<ScanResponse, ClientError> {
        self.json(&operations::SCAN, request).await
    }

    /// Scans several websites and returns the successful results in the order
    /// the service streamed them. Items the service failed to scan are
    /// dropped; use [`Self::batch_scan_report`] to see them.
    pub async fn batch_scan(&self, request: &BatchScanRequest) -> Result<Vec<ScanResponse>, ClientError> {
        let body = self.batch_scan_raw(request).await?;
        decode_batch(&body)
    }

    /// Scans several websites and returns both successes and per-item
    /// failures.
    pub async fn batch_scan_report(&self, request: &BatchScanRequest) -> Result<BatchReport, ClientError> {
        let body = self.batch_scan_raw(request).await?;
        decode_batch_report(&body)
    }

    /// Scans several websites and returns the undecoded NDJSON body.
    pub async fn batch_scan_raw(&self, request: &BatchScanRequest) -> Result<String, ClientError> {
        let op = &operations::BATCH_SCAN;
        self.executor.execute_text(op, op.path, request).await
    }

    // -----------------------------------------------------------------------
    // Settings and billing
    // -----------------------------------------------------------------------

    pub async fn create_api_key(&self, request: &ApiKeyCreateRequest) -> Result<ApiKeyResponse, ClientError> {
        self.json(&operations::CREATE_API_KEY, request).await
    }

    /// Creates a checkout session for a subscription.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSessionResponse, ClientError> {
        self.json(&operations::CREATE_CHECKOUT_SESSION, request).await
    }

    // -----------------------------------------------------------------------
    // Integrations
    // -----------------------------------------------------------------------

    /// Configures the Slack webhook used for high-severity alerts.
    pub async fn configure_slack_webhook(
        &self,
        request: &SlackWebhookRequest,
    ) -> Result<MessageResponse, ClientError> {
        self.json(&operations::CONFIGURE_SLACK_WEBHOOK, request).await
    }

    /// Configures email delivery for high-severity alerts.
    pub async fn configure_email_settings(
        &self,
        request: &EmailSettingsRequest,
    ) -> Result<MessageResponse, ClientError> {
        self.json(&operations::CONFIGURE_EMAIL_SETTINGS, request).await
    }

    pub async fn test_email_integration(
        &self,
        request: &TestIntegrationRequest,
    ) -> Result<MessageResponse, ClientError> {
        self.json(&operations::TEST_EMAIL_INTEGRATION, request).await
    }

    pub async fn get_integration_status(&self) -> Result<IntegrationStatusResponse, ClientError> {
        self.json(&operations::INTEGRATION_STATUS, &()).await
    }

    // -----------------------------------------------------------------------
    // Monitoring
    // -----------------------------------------------------------------------

    /// Returns the service's Prometheus metrics, untouched.
    pub async fn get_metrics(&self) -> Result<String, ClientError> {
        let op = &operations::METRICS;
        self.executor.execute_text(op, op.path, &()).await
    }

    /// Returns the compliance badge markup for `site_id`, untouched.
    pub async fn get_badge(&self, site_id: &SiteId) -> Result<String, ClientError> {
        let op = &operations::BADGE;
        self.executor
            .execute_text(op, &op.path_with(site_id.as_str()), &())
            .await
    }

    async fn json<Req, Resp>(&self, operation: &Operation, input: &Req) -> Result<Resp, ClientError>
    where
        Req: serde::Serialize + ?Sized,
        Resp: serde::de::DeserializeOwned,
    {
        self.executor.execute_json(operation, operation.path, input).await
    }
}

/// Assembles a [`RegulaClient`].
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<ClientConfiguration>,
    base_address: Option<String>,
    request_timeout: Option<Duration>,
    api_key: Option<String>,
    access_token: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Starts from `config` instead of [`ClientConfiguration::default`].
    pub fn config(mut self, config: ClientConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    pub fn base_address(mut self, base_address: impl Into<String>) -> Self {
        self.base_address = Some(base_address.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets an initial bearer token. Takes precedence over [`Self::api_key`].
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// [`ClientError::Configuration`] if no transport was supplied.
    pub fn build(self) -> Result<RegulaClient, ClientError> {
        let transport = self.transport.ok_or_else(|| ClientError::Configuration {
            message: "transport not set".to_string(),
        })?;

        let mut config = self.config.unwrap_or_default();
        if let Some(base_address) = self.base_address {
            config.base_address = base_address;
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }

        let client = RegulaClient::new(transport, config);
        if let Some(token) = self.access_token {
            client.set_access_token(token);
        } else if let Some(key) = self.api_key {
            client.set_api_key(key);
        }
        Ok(client)
    }
}
