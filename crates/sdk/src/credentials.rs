//! Credential state shared by every request a client dispatches.
//!
//! A [`CredentialStore`] holds at most one [`AuthCredential`]. Installing a
//! credential replaces the previous one wholesale, and the outgoing auth
//! header is derived from that single value, so a request can never carry
//! both `x-api-key` and `Authorization`.

use tracing::info;

/// Header carrying an API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying a bearer token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Which kind of credential a client authenticates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthMethod {
    /// `x-api-key` header. Reported before any credential has been set.
    #[default]
    ApiKey,
    /// `Authorization: Bearer` header.
    Bearer,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey => f.write_str("apiKey"),
            Self::Bearer => f.write_str("bearer"),
        }
    }
}

/// The active authentication artefact.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthCredential {
    ApiKey(String),
    BearerToken(String),
}

impl AuthCredential {
    /// Returns the method this credential authenticates with.
    pub fn method(&self) -> AuthMethod {
        match self {
            Self::ApiKey(_) => AuthMethod::ApiKey,
            Self::BearerToken(_) => AuthMethod::Bearer,
        }
    }

    /// Returns the single header this credential contributes to a request.
    pub fn header(&self) -> (&'static str, String) {
        match self {
            Self::ApiKey(key) => (API_KEY_HEADER, key.clone()),
            Self::BearerToken(token) => (AUTHORIZATION_HEADER, format!("Bearer {token}")),
        }
    }

    /// Returns the raw secret.
    pub fn secret(&self) -> &str {
        match self {
            Self::ApiKey(value) | Self::BearerToken(value) => value,
        }
    }
}

impl std::fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::BearerToken(_) => f.write_str("BearerToken(<redacted>)"),
        }
    }
}

/// Holds the credential used for subsequent requests.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    current: Option<AuthCredential>,
}

impl CredentialStore {
    /// Creates an empty, unauthenticated store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticates subsequent requests with an API key, retiring any token.
    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.apply(AuthCredential::ApiKey(key.into()));
    }

    /// Authenticates subsequent requests with a bearer token, retiring any
    /// API key.
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.apply(AuthCredential::BearerToken(token.into()));
    }

    /// Replaces the current credential.
    ///
    /// A credential with an empty secret clears the store instead: the client
    /// is unauthenticated afterwards and sends no auth header.
    pub fn apply(&mut self, credential: AuthCredential) {
        if credential.secret().is_empty() {
            let previous = self.current.take().map(|c| c.method());
            info!(previous = ?previous, "Empty credential supplied; store cleared");
            return;
        }
        let method = credential.method();
        let previous = self.current.replace(credential).map(|c| c.method());
        info!(auth_method = %method, previous = ?previous, "Credential installed");
    }

    /// Returns `true` if a credential of either kind is present.
    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Returns the kind of the current credential, or [`AuthMethod::ApiKey`]
    /// before any has been set.
    pub fn auth_method(&self) -> AuthMethod {
        self.current
            .as_ref()
            .map(AuthCredential::method)
            .unwrap_or_default()
    }

    /// Returns the current credential, if any.
    pub fn credential(&self) -> Option<&AuthCredential> {
        self.current.as_ref()
    }

    /// Returns the auth headers a request dispatched now must carry: exactly
    /// one header when authenticated, none otherwise.
    pub fn auth_headers(&self) -> Vec<(&'static str, String)> {
        self.current.iter().map(AuthCredential::header).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_names(store: &CredentialStore) -> Vec<&'static str> {
        store.auth_headers().into_iter().map(|(name, _)| name).collect()
    }

    #[test]
    fn test_new_store_is_unauthenticated() {
        let store = CredentialStore::new();
        assert!(!store.is_authenticated());
        assert_eq!(store.auth_method(), AuthMethod::ApiKey);
        assert!(store.auth_headers().is_empty());
    }

    #[test]
    fn test_api_key_installs_only_api_key_header() {
        let mut store = CredentialStore::new();
        store.set_api_key("key-123");
        assert!(store.is_authenticated());
        assert_eq!(store.auth_method(), AuthMethod::ApiKey);
        assert_eq!(
            store.auth_headers(),
            vec![(API_KEY_HEADER, "key-123".to_string())]
        );
    }

    #[test]
    fn test_access_token_installs_only_authorization_header() {
        let mut store = CredentialStore::new();
        store.set_access_token("tok");
        assert_eq!(store.auth_method(), AuthMethod::Bearer);
        assert_eq!(
            store.auth_headers(),
            vec![(AUTHORIZATION_HEADER, "Bearer tok".to_string())]
        );
    }

    #[test]
    fn test_switching_kinds_leaves_exactly_the_latest_header() {
        let mut store = CredentialStore::new();
        store.set_api_key("key");
        store.set_access_token("tok");
        assert_eq!(header_names(&store), vec![AUTHORIZATION_HEADER]);

        store.set_api_key("key-2");
        assert_eq!(header_names(&store), vec![API_KEY_HEADER]);
        assert_eq!(store.credential().map(AuthCredential::secret), Some("key-2"));
    }

    #[test]
    fn test_empty_api_key_is_not_a_credential() {
        let mut store = CredentialStore::new();
        store.set_api_key("");
        assert!(!store.is_authenticated());
        assert!(store.auth_headers().is_empty());
    }

    #[test]
    fn test_empty_access_token_clears_previous_credential() {
        let mut store = CredentialStore::new();
        store.set_api_key("key");
        store.set_access_token("");
        assert!(!store.is_authenticated());
        assert!(store.credential().is_none());
        assert!(store.auth_headers().is_empty());
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let credential = AuthCredential::BearerToken("super-secret".to_string());
        assert!(!format!("{credential:?}").contains("super-secret"));
        let mut store = CredentialStore::new();
        store.apply(credential);
        assert!(!format!("{store:?}").contains("super-secret"));
    }
}
