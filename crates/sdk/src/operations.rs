//! The operation catalogue.
//!
//! Each [`Operation`] is a static declaration of one service endpoint. The
//! typed methods on [`crate::RegulaClient`] pair a descriptor with its request
//! and response types and hand both to the executor.

use crate::Method;

/// Placeholder substituted by [`Operation::path_with`].
pub const SITE_ID_PARAM: &str = "{site_id}";

/// How an operation's input is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// No body.
    Empty,
    /// JSON-serialised body.
    Json,
}

/// How a successful response body is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// A single JSON document.
    Json,
    /// Newline-delimited JSON, one document per line.
    NdJson,
    /// Raw text returned untouched.
    Text,
}

/// Declaration of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Stable name used in logs.
    pub name: &'static str,
    pub method: Method,
    /// Path relative to the base address; may contain [`SITE_ID_PARAM`].
    pub path: &'static str,
    /// Informational; the service enforces authentication, not the client.
    pub requires_auth: bool,
    pub request: RequestKind,
    pub response: ResponseKind,
}

impl Operation {
    /// Substitutes the percent-encoded `site_id` for [`SITE_ID_PARAM`] in the
    /// path template, so `/`, `?` and `#` stay inside the segment.
    pub fn path_with(&self, site_id: &str) -> String {
        self.path.replace(SITE_ID_PARAM, &urlencoding::encode(site_id))
    }

    /// Returns `true` if the path contains a template parameter.
    pub fn is_templated(&self) -> bool {
        self.path.contains(SITE_ID_PARAM)
    }

    /// Value of the `Accept` header for this operation.
    pub fn accept(&self) -> &'static str {
        match self.response {
            ResponseKind::Json => "application/json",
            ResponseKind::NdJson => "application/x-ndjson",
            ResponseKind::Text => "*/*",
        }
    }
}

const fn json_post(name: &'static str, path: &'static str, requires_auth: bool) -> Operation {
    Operation {
        name,
        method: Method::Post,
        path,
        requires_auth,
        request: RequestKind::Json,
        response: ResponseKind::Json,
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

pub const REGISTER: Operation = json_post("register", "/auth/register", false);

pub const LOGIN: Operation = json_post("login", "/auth/login", false);

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

pub const SCAN: Operation = json_post("scan_website", "/scan", true);

pub const BATCH_SCAN: Operation = Operation {
    name: "batch_scan",
    method: Method::Post,
    path: "/batch_scan",
    requires_auth: true,
    request: RequestKind::Json,
    response: ResponseKind::NdJson,
};

// ---------------------------------------------------------------------------
// Settings, billing, integrations
// ---------------------------------------------------------------------------

pub const CREATE_API_KEY: Operation = json_post("create_api_key", "/settings/api-keys", true);

pub const CREATE_CHECKOUT_SESSION: Operation = json_post(
    "create_checkout_session",
    "/billing/create-checkout-session",
    true,
);

pub const CONFIGURE_SLACK_WEBHOOK: Operation =
    json_post("configure_slack_webhook", "/integrations/slack", true);

pub const CONFIGURE_EMAIL_SETTINGS: Operation =
    json_post("configure_email_settings", "/integrations/email", true);

pub const TEST_EMAIL_INTEGRATION: Operation =
    json_post("test_email_integration", "/integrations/test-email", true);

pub const INTEGRATION_STATUS: Operation = Operation {
    name: "get_integration_status",
    method: Method::Get,
    path: "/integrations/status",
    requires_auth: true,
    request: RequestKind::Empty,
    response: ResponseKind::Json,
};

// ---------------------------------------------------------------------------
// Monitoring
// ---------------------------------------------------------------------------

/// Prometheus text exposition.
pub const METRICS: Operation = Operation {
    name: "get_metrics",
    method: Method::Get,
    path: "/metrics",
    requires_auth: false,
    request: RequestKind::Empty,
    response: ResponseKind::Text,
};

/// Compliance badge markup for one site.
pub const BADGE: Operation = Operation {
    name: "get_badge",
    method: Method::Get,
    path: "/badge/{site_id}",
    requires_auth: false,
    request: RequestKind::Empty,
    response: ResponseKind::Text,
};

/// Every declared operation.
pub const ALL: [Operation; 12] = [
    REGISTER,
    LOGIN,
    SCAN,
    BATCH_SCAN,
    CREATE_API_KEY,
    CREATE_CHECKOUT_SESSION,
    CONFIGURE_SLACK_WEBHOOK,
    CONFIGURE_EMAIL_SETTINGS,
    TEST_EMAIL_INTEGRATION,
    INTEGRATION_STATUS,
    METRICS,
    BADGE,
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_names_and_routes_are_unique() {
        let names: HashSet<_> = ALL.iter().map(|op| op.name).collect();
        let routes: HashSet<_> = ALL.iter().map(|op| (op.method, op.path)).collect();
        assert_eq!(names.len(), ALL.len());
        assert_eq!(routes.len(), ALL.len());
    }

    #[test]
    fn test_only_metrics_and_badge_are_text() {
        let text: Vec<_> = ALL
            .iter()
            .filter(|op| op.response == ResponseKind::Text)
            .map(|op| op.name)
            .collect();
        assert_eq!(text, vec!["get_metrics", "get_badge"]);
    }

    #[test]
    fn test_gets_carry_no_body() {
        for op in ALL.iter().filter(|op| op.method == Method::Get) {
            assert_eq!(op.request, RequestKind::Empty, "{}", op.name);
        }
    }

    #[test]
    fn test_badge_path_substitution() {
        assert!(BADGE.is_templated());
        assert_eq!(BADGE.path_with("site-7"), "/badge/site-7");
        assert!(!SCAN.is_templated());
        assert_eq!(SCAN.path_with("ignored"), "/scan");
    }

    #[test]
    fn test_site_id_is_percent_encoded_into_one_segment() {
        assert_eq!(BADGE.path_with("../metrics"), "/badge/..%2Fmetrics");
        assert_eq!(BADGE.path_with("a?b#c"), "/badge/a%3Fb%23c");
        assert_eq!(BADGE.path_with("acme site"), "/badge/acme%20site");
    }
}
