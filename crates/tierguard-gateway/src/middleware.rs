use crate::error::ApiError;
use axum::{
    extract::{Query, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

/// API keys accepted by the gateway. Empty means no auth.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Accepted keys.
    pub api_keys: Vec<String>,
}

impl AuthConfig {
    /// Auth config accepting `api_keys`.
    pub fn new(api_keys: Vec<String>) -> Self {
        Self { api_keys }
    }

    /// Whether any key is configured.
    pub fn is_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    fn accepts(&self, key: &str) -> bool {
        self.api_keys.iter().any(|k| k == key)
    }
}

/// Query string carrying an API key.
#[derive(serde::Deserialize, Default)]
pub struct AuthQuery {
    /// Key from `?api_key=`.
    pub api_key: Option<String>,
}

/// Validates `Authorization: Bearer <key>`, falling back to `?api_key=<key>`.
///
/// `/health` is always reachable.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    headers: HeaderMap,
    query: Query<AuthQuery>,
    request: Request,
    next: Next,
) -> Response {
    if !auth.is_enabled() || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let key = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
        .or_else(|| query.api_key.clone());

    match key {
        Some(k) if auth.accepts(&k) => next.run(request).await,
        Some(_) => {
            warn!(path = %request.uri().path(), "Rejected request: invalid API key");
            ApiError::unauthorized("Invalid API key").into_response()
        }
        None => {
            warn!(path = %request.uri().path(), "Rejected request: missing API key");
            ApiError::unauthorized("API key required").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_disabled() {
        assert!(!AuthConfig::default().is_enabled());
    }

    #[test]
    fn test_auth_config_accepts_listed_keys() {
        let config = AuthConfig::new(vec!["key123".to_string()]);
        assert!(config.is_enabled());
        assert!(config.accepts("key123"));
        assert!(!config.accepts("key1234"));
    }
}
