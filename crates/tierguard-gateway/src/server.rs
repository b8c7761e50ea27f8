use crate::error::ApiError;
use crate::middleware::{auth_middleware, AuthConfig};
use axum::{
    extract::{Path, State},
    middleware as axum_mw,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tierguard_access::{FrameworkAccess, LicensingService, ModuleAccess};
use tierguard_core::{FrameworkCode, FrameworkModule, TierguardError, TierguardResult};
use tierguard_policy::LicensingSummary;
use tokio::net::TcpListener;
use tracing::info;

/// Shared application state.
pub struct AppState {
    /// Licensing checks backing every route.
    pub service: LicensingService,
}

#[derive(Debug, Serialize)]
struct FrameworksResponse {
    organization_id: String,
    frameworks: Vec<FrameworkCode>,
}

#[derive(Debug, Serialize)]
struct ModulesResponse {
    organization_id: String,
    framework: FrameworkCode,
    modules: Vec<FrameworkModule>,
}

/// Read-only licensing API.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router without auth.
    pub fn build(service: LicensingService) -> Router {
        Self::build_with_auth(service, AuthConfig::default())
    }

    /// Build the router, layering API key auth when keys are configured.
    pub fn build_with_auth(service: LicensingService, auth: AuthConfig) -> Router {
        let state = Arc::new(AppState { service });

        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/orgs/{org}/licensing", get(summary_handler))
            .route("/orgs/{org}/frameworks", get(frameworks_handler))
            .route("/orgs/{org}/frameworks/{fw}", get(framework_access_handler))
            .route("/orgs/{org}/frameworks/{fw}/modules", get(modules_handler))
            .route(
                "/orgs/{org}/frameworks/{fw}/modules/{module}",
                get(module_access_handler),
            )
            .with_state(state);

        if auth.is_enabled() {
            app.layer(axum_mw::from_fn_with_state(Arc::new(auth), auth_middleware))
        } else {
            app
        }
    }

    /// Bind `host:port` and serve `app` until the task is cancelled.
    pub async fn serve(app: Router, host: &str, port: u16) -> TierguardResult<()> {
        let listener = TcpListener::bind((host, port)).await?;
        let addr = listener.local_addr()?;
        info!(%addr, "Licensing gateway listening");
        axum::serve(listener, app)
            .await
            .map_err(|e| TierguardError::Gateway(e.to_string()))
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "tierguard"}))
}

async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Path(org): Path<String>,
) -> Result<Json<LicensingSummary>, ApiError> {
    Ok(Json(state.service.summary(&org).await?))
}

async fn frameworks_handler(
    State(state): State<Arc<AppState>>,
    Path(org): Path<String>,
) -> Result<Json<FrameworksResponse>, ApiError> {
    let frameworks = state.service.enabled_frameworks(&org).await?;
    Ok(Json(FrameworksResponse {
        organization_id: org,
        frameworks,
    }))
}

async fn framework_access_handler(
    State(state): State<Arc<AppState>>,
    Path((org, fw)): Path<(String, String)>,
) -> Result<Json<FrameworkAccess>, ApiError> {
    let framework: FrameworkCode = fw.parse()?;
    Ok(Json(state.service.check_framework(&org, framework).await?))
}

async fn modules_handler(
    State(state): State<Arc<AppState>>,
    Path((org, fw)): Path<(String, String)>,
) -> Result<Json<ModulesResponse>, ApiError> {
    let framework: FrameworkCode = fw.parse()?;
    let modules = state.service.enabled_modules(&org, framework).await?;
    Ok(Json(ModulesResponse {
        organization_id: org,
        framework,
        modules,
    }))
}

async fn module_access_handler(
    State(state): State<Arc<AppState>>,
    Path((org, fw, module)): Path<(String, String, String)>,
) -> Result<Json<ModuleAccess>, ApiError> {
    let framework: FrameworkCode = fw.parse()?;
    let module: FrameworkModule = module.parse()?;
    Ok(Json(state.service.check_module(&org, framework, module).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tierguard_store::{MemoryLicensingStore, OrganizationRow};
    use tower::ServiceExt;

    async fn app(auth: AuthConfig) -> Router {
        let store = MemoryLicensingStore::new();
        store
            .upsert_organization(OrganizationRow::licensed(
                "org-1",
                "Acme",
                "starter",
                &["nis2"],
            ))
            .await;
        GatewayServer::build_with_auth(LicensingService::new(Arc::new(store)), auth)
    }

    async fn get(
        app: Router,
        uri: &str,
        bearer: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().uri(uri);
        if let Some(key) = bearer {
            request = request.header("authorization", format!("Bearer {key}"));
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_module_access_route() {
        let (status, body) = get(
            app(AuthConfig::default()).await,
            "/orgs/org-1/frameworks/nis2/modules/incidents",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], false);
        assert_eq!(body["prompt"]["requiredTier"], "professional");
        assert_eq!(body["prompt"]["moduleName"], "Incident Management");
    }

    #[tokio::test]
    async fn test_module_from_another_framework_is_denied() {
        for uri in [
            "/orgs/org-1/frameworks/nis2/modules/roi",
            "/orgs/org-1/frameworks/nis2/modules/soa",
        ] {
            let (status, body) = get(app(AuthConfig::default()).await, uri, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["allowed"], false);
            assert_eq!(body["denial"]["reason"], "module_not_in_framework");
            assert!(body["prompt"].is_null());
        }
    }

    #[tokio::test]
    async fn test_unknown_module_is_bad_request() {
        let (status, body) = get(
            app(AuthConfig::default()).await,
            "/orgs/org-1/frameworks/nis2/modules/payroll",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("payroll"));
    }

    #[tokio::test]
    async fn test_auth_layer() {
        let auth = AuthConfig::new(vec!["secret".into()]);

        let (status, _) = get(app(auth.clone()).await, "/orgs/org-1/frameworks", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) =
            get(app(auth.clone()).await, "/orgs/org-1/frameworks", Some("nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            get(app(auth.clone()).await, "/orgs/org-1/frameworks", Some("secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["frameworks"], serde_json::json!(["nis2"]));

        let (status, _) = get(app(auth).await, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
