//! Credential strategies for outgoing test requests.
//!
//! Each [`AuthKind`] maps to one [`CredentialStrategy`]. Credentials are
//! looked up in a caller-supplied environment map under the variable names
//! listed in `auth.configHints.env`; the first non-empty value wins. A missing
//! credential is not an error: the request goes out unauthenticated.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::RequestBuilder;
use tracing::{debug, warn};

use crate::manifest::{AuthConfig, AuthKind};

/// Header used by [`ApiKey`] when the manifest names none.
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Attaches credentials to an outgoing request.
pub trait CredentialStrategy: Send + Sync {
    /// Return `request` with credentials attached, or unchanged if none apply.
    fn attach(
        &self,
        request: RequestBuilder,
        auth: &AuthConfig,
        env: &HashMap<String, String>,
    ) -> RequestBuilder;
}

/// First non-empty value among the hinted environment variables.
fn find_credential<'a>(auth: &AuthConfig, env: &'a HashMap<String, String>) -> Option<&'a str> {
    auth.env_names()
        .iter()
        .filter_map(|name| env.get(name))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

fn warn_missing(auth: &AuthConfig) {
    warn!(
        auth_type = %auth.kind,
        vars = ?auth.env_names(),
        "no credential found in environment; sending request unauthenticated"
    );
}

/// No credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl CredentialStrategy for NoAuth {
    fn attach(
        &self,
        request: RequestBuilder,
        _auth: &AuthConfig,
        _env: &HashMap<String, String>,
    ) -> RequestBuilder {
        request
    }
}

/// `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerToken;

impl CredentialStrategy for BearerToken {
    fn attach(
        &self,
        request: RequestBuilder,
        auth: &AuthConfig,
        env: &HashMap<String, String>,
    ) -> RequestBuilder {
        match find_credential(auth, env) {
            Some(token) => request.bearer_auth(token),
            None => {
                warn_missing(auth);
                request
            },
        }
    }
}

/// API key in the header named by `configHints.header`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKey;

impl CredentialStrategy for ApiKey {
    fn attach(
        &self,
        request: RequestBuilder,
        auth: &AuthConfig,
        env: &HashMap<String, String>,
    ) -> RequestBuilder {
        let header = auth
            .config_hints
            .as_ref()
            .and_then(|hints| hints.header.as_deref())
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_API_KEY_HEADER);
        match find_credential(auth, env) {
            Some(key) => request.header(header, key),
            None => {
                warn_missing(auth);
                request
            },
        }
    }
}

/// OAuth 2.0. No token flow is run; an already-issued access token found in
/// the environment is sent as a bearer token.
#[derive(Debug, Clone, Copy, Default)]
pub struct OAuth2;

impl CredentialStrategy for OAuth2 {
    fn attach(
        &self,
        request: RequestBuilder,
        auth: &AuthConfig,
        env: &HashMap<String, String>,
    ) -> RequestBuilder {
        match find_credential(auth, env) {
            Some(token) => request.bearer_auth(token),
            None => {
                debug!(scopes = ?auth.scopes, "no oauth2 access token in environment");
                request
            },
        }
    }
}

/// Strategy registry keyed by auth kind.
#[derive(Clone)]
pub struct AuthStrategies {
    strategies: HashMap<AuthKind, Arc<dyn CredentialStrategy>>,
}

impl std::fmt::Debug for AuthStrategies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStrategies")
            .field("kinds", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for AuthStrategies {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(AuthKind::None, Arc::new(NoAuth));
        registry.register(AuthKind::Bearer, Arc::new(BearerToken));
        registry.register(AuthKind::ApiKey, Arc::new(ApiKey));
        registry.register(AuthKind::OAuth2, Arc::new(OAuth2));
        registry
    }
}

impl AuthStrategies {
    /// A registry with no strategies.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Register (or replace) the strategy for `kind`.
    pub fn register(&mut self, kind: AuthKind, strategy: Arc<dyn CredentialStrategy>) {
        self.strategies.insert(kind, strategy);
    }

    /// Attach credentials per `auth`. Absent auth, unknown kinds and kinds
    /// without a strategy leave the request unchanged.
    #[must_use]
    pub fn apply(
        &self,
        request: RequestBuilder,
        auth: Option<&AuthConfig>,
        env: &HashMap<String, String>,
    ) -> RequestBuilder {
        let Some(auth) = auth else {
            return request;
        };
        let Some(kind) = auth.auth_kind() else {
            warn!(auth_type = %auth.kind, "unknown auth type; sending request unauthenticated");
            return request;
        };
        match self.strategies.get(&kind) {
            Some(strategy) => strategy.attach(request, auth, env),
            None => {
                warn!(%kind, "no credential strategy registered");
                request
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::AuthConfigHints;

    fn auth(kind: &str, env: &[&str], header: Option<&str>) -> AuthConfig {
        AuthConfig {
            kind: kind.into(),
            scopes: None,
            config_hints: Some(AuthConfigHints {
                env: env.iter().map(|s| (*s).to_string()).collect(),
                header: header.map(str::to_string),
                ..Default::default()
            }),
        }
    }

    fn headers(
        auth: Option<&AuthConfig>,
        env: &HashMap<String, String>,
    ) -> reqwest::header::HeaderMap {
        let request = reqwest::Client::new().post("http://localhost/echo");
        AuthStrategies::default()
            .apply(request, auth, env)
            .build()
            .unwrap()
            .headers()
            .clone()
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn bearer_uses_first_non_empty_variable() {
        let auth = auth("bearer", &["A_TOKEN", "B_TOKEN"], None);
        let env = env(&[("A_TOKEN", ""), ("B_TOKEN", "secret")]);
        let headers = headers(Some(&auth), &env);
        assert_eq!(headers["authorization"], "Bearer secret");
    }

    #[test]
    fn missing_credential_sends_unauthenticated() {
        let auth = auth("bearer", &["A_TOKEN"], None);
        let headers = headers(Some(&auth), &HashMap::new());
        assert!(headers.get("authorization").is_none());
    }

    #[test]
    fn api_key_uses_hinted_or_default_header() {
        let env = env(&[("KEY", "k-123")]);

        let default_header = headers(Some(&auth("api_key", &["KEY"], None)), &env);
        assert_eq!(default_header["x-api-key"], "k-123");

        let custom = headers(Some(&auth("api_key", &["KEY"], Some("X-Custom"))), &env);
        assert_eq!(custom["x-custom"], "k-123");
        assert!(custom.get("x-api-key").is_none());
    }

    #[test]
    fn oauth2_forwards_token_when_present() {
        let env = env(&[("ACCESS", "tok")]);
        let with = headers(Some(&auth("oauth2", &["ACCESS"], None)), &env);
        assert_eq!(with["authorization"], "Bearer tok");

        let without = headers(Some(&auth("oauth2", &["OTHER"], None)), &env);
        assert!(without.get("authorization").is_none());
    }

    #[test]
    fn none_absent_and_unknown_leave_request_alone() {
        let env = env(&[("KEY", "v")]);
        assert!(headers(Some(&auth("none", &["KEY"], None)), &env).is_empty());
        assert!(headers(None, &env).is_empty());
        assert!(headers(Some(&auth("basic", &["KEY"], None)), &env).is_empty());
    }

    #[test]
    fn custom_strategy_can_be_registered() {
        struct Fixed;
        impl CredentialStrategy for Fixed {
            fn attach(
                &self,
                request: RequestBuilder,
                _auth: &AuthConfig,
                _env: &HashMap<String, String>,
            ) -> RequestBuilder {
                request.header("x-fixed", "1")
            }
        }

        let mut registry = AuthStrategies::default();
        registry.register(AuthKind::None, Arc::new(Fixed));
        let request = registry
            .apply(
                reqwest::Client::new().get("http://localhost/"),
                Some(&auth("none", &[], None)),
                &HashMap::new(),
            )
            .build()
            .unwrap();
        assert_eq!(request.headers()["x-fixed"], "1");
    }
}
