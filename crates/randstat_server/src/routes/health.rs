//! Health check and readiness endpoints
//!
//! Provides health and readiness endpoints for load balancer integration
//! and service availability monitoring.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status ("healthy" or "unhealthy")
    pub status: String,
    /// Server version
    pub version: String,
    /// Server uptime in seconds
    pub uptime_secs: u64,
    /// Dependency status
    pub dependencies: DependencyStatus,
}

/// Dependency status for health check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStatus {
    /// Whether a provider API key was loaded at startup
    pub credential_loaded: bool,
    /// Provider endpoint in use
    pub upstream_url: String,
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    /// Ready status
    pub ready: bool,
    /// Whether `/random/mean` can reach the provider at all
    pub credential_loaded: bool,
}

/// Build the health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
}

/// GET /health - Health check endpoint
///
/// Returns the server health status, version, uptime, and dependency status.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        uptime_secs: uptime,
        dependencies: DependencyStatus {
            credential_loaded: state.orchestrator.has_credential(),
            upstream_url: state.config.upstream_url.clone(),
        },
    };

    (StatusCode::OK, Json(response))
}

/// GET /ready - Readiness probe endpoint
///
/// Always 200: a missing credential is reported per request as 401, not as
/// an unready server.
async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = ReadyResponse {
        ready: true,
        credential_loaded: state.orchestrator.has_credential(),
    };
    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RandomOrgClient;
    use crate::config::{Credential, ServerConfig};
    use crate::orchestrator::Orchestrator;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state(credential: Option<Credential>) -> AppState {
        let config = Arc::new(ServerConfig::default());
        let client = RandomOrgClient::from_config(&config).unwrap();
        AppState::new(
            config,
            Arc::new(Orchestrator::new(Arc::new(client), credential)),
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(state: AppState, uri: &str) -> T {
        let response = routes()
            .with_state(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint_returns_json() {
        let health: HealthResponse = get_json(create_test_state(None), "/health").await;

        assert_eq!(health.status, "healthy");
        assert_eq!(health.version, crate::VERSION);
        assert!(!health.dependencies.credential_loaded);
        assert_eq!(
            health.dependencies.upstream_url,
            crate::config::DEFAULT_UPSTREAM_URL
        );
    }

    #[tokio::test]
    async fn test_health_reports_loaded_credential() {
        let health: HealthResponse =
            get_json(create_test_state(Credential::new("key")), "/health").await;

        assert!(health.dependencies.credential_loaded);
    }

    #[tokio::test]
    async fn test_ready_endpoint_returns_json() {
        let ready: ReadyResponse = get_json(create_test_state(None), "/ready").await;

        assert!(ready.ready);
        assert!(!ready.credential_loaded);
    }

    #[tokio::test]
    async fn test_health_response_camel_case() {
        let response = routes()
            .with_state(create_test_state(None))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json_str = std::str::from_utf8(&body).unwrap();

        assert!(json_str.contains("uptimeSecs"));
        assert!(json_str.contains("credentialLoaded"));
        assert!(json_str.contains("upstreamUrl"));
    }
}
