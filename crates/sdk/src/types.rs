//! Request and response shapes exchanged with the RegulaAI service.
//!
//! Field names follow the service's snake_case JSON. Optional request fields are
//! omitted from the body when `None`; unknown response fields are ignored so the
//! scanner can add data without breaking older clients.

use serde::{Deserialize, Serialize};

use crate::ApiKeyId;

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// A request to scan one website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Absolute URL of the page to scan.
    pub url: String,

    /// Optional visitor persona the scanner should emulate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

impl ScanRequest {
    /// Creates a request for `url` with no persona.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            persona: None,
        }
    }

    /// Sets the persona to emulate.
    #[must_use]
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }
}

/// A request to scan several websites in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchScanRequest {
    /// Individual scans, in submission order.
    pub scans: Vec<ScanRequest>,
}

/// A cookie observed while loading the scanned page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// Severity assigned to a compliance [`Violation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(label)
    }
}

/// A compliance rule the scanned page failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub title: String,
    pub description: String,
    pub severity: Severity,

    /// Identifier of the rule that produced this violation, when the rule set
    /// assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

/// Compliance score in the range `[0.0, 100.0]`.
///
/// Deserialisation fails for values outside the range, so a [`ScanResponse`]
/// always carries a meaningful score.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ComplianceScore(f64);

impl ComplianceScore {
    /// Creates a [`ComplianceScore`], returning `None` if `value` is outside
    /// `[0.0, 100.0]` or not finite.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the score as an `f64` in `[0.0, 100.0]`.
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for ComplianceScore {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("score {value} is outside [0, 100]"))
    }
}

impl From<ComplianceScore> for f64 {
    fn from(score: ComplianceScore) -> Self {
        score.0
    }
}

impl std::fmt::Display for ComplianceScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of scanning one website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub url: String,
    pub cookies: Vec<Cookie>,
    pub cookie_banner_detected: bool,
    pub cookie_banner_selectors: Vec<String>,
    pub scan_time_ms: u64,
    pub score: ComplianceScore,
    pub violations: Vec<Violation>,
}

impl ScanResponse {
    /// Returns the violations at `severity`, in report order.
    pub fn violations_with(&self, severity: Severity) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.severity == severity)
    }
}

/// One batch item the service could not scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    pub url: String,
    pub error: String,
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Registers a new user together with their organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub organisation_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Tokens issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

// ---------------------------------------------------------------------------
// Settings and billing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyCreateRequest {
    /// Human-readable label for the new key.
    pub name: String,
}

/// A newly created API key. The secret is only ever returned once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
    pub id: ApiKeyId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionRequest {
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionResponse {
    pub checkout_url: String,
}

// ---------------------------------------------------------------------------
// Integrations
// ---------------------------------------------------------------------------

/// Slack incoming-webhook target for high-severity alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackWebhookRequest {
    pub webhook_url: String,
}

/// Email delivery settings for high-severity alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSettingsRequest {
    pub resend_api_key: String,
    pub notification_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestIntegrationRequest {
    pub test_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationStatusResponse {
    pub slack_configured: bool,
    pub email_configured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_email: Option<String>,
}

/// Generic acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Error bodies
// ---------------------------------------------------------------------------

/// One field-level validation problem reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Path to the offending field; segments are strings or array indices.
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The `detail` member of an error body: either a plain message or a list of
/// validation issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationIssue>),
}

/// Structured error body the service returns with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorEnvelope {
    pub detail: ErrorDetail,
}
