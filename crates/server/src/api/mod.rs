use crate::config::AppState;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Start the API server
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let state = Arc::new(state);
    tokio::spawn(cleanup_sessions(state.clone()));

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn cleanup_sessions(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
    loop {
        interval.tick().await;
        let removed = state.sessions.cleanup_expired();
        if removed > 0 {
            tracing::info!(removed, "Purged expired sessions");
        }
    }
}

/// Create the API router
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/{session_id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/features", get(handlers::list_features))
        .route("/tools", get(handlers::list_tools))
        .route("/tools/{name}", post(handlers::call_tool))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "active_sessions": state.sessions.count(),
    }))
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Error type for API handlers
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::Body;
    use axum::http::Request;
    use pipedrive_mcp::tools::{register_all, ToolRegistry};
    use pipedrive_sdk::{PipedriveClient, RetryConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(enabled: &[&str]) -> (Router, Arc<AppState>) {
        let client = PipedriveClient::builder()
            .base_url("http://127.0.0.1:1")
            .api_token("test-token-123")
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap();
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, &client).unwrap();
        for feature in enabled {
            registry.features_mut().enable_feature(feature).unwrap();
        }
        let state = Arc::new(AppState::new(&ServerConfig::default(), registry));
        (create_router(state.clone()), state)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, state) = app(&[]);
        state.sessions.create(None, None);

        let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "active_sessions": 1}));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (app, state) = app(&[]);

        let (status, body) = send(
            app.clone(),
            post_json("/sessions", json!({"user_id": "u1", "metadata": {"client": "test"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let id = body["session_id"].as_str().unwrap().to_string();
        assert_eq!(id.len(), 32);
        assert!(body["expires_at"].is_string());

        let (status, body) = send(
            app.clone(),
            Request::get(format!("/sessions/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["user_id"], "u1");
        assert_eq!(body["session"]["metadata"]["client"], "test");

        let (status, _) = send(
            app.clone(),
            Request::delete(format!("/sessions/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.sessions.count(), 0);

        let (status, body) = send(
            app,
            Request::get(format!("/sessions/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_features_and_tools() {
        let (app, _) = app(&["persons"]);

        let (status, body) = send(app.clone(), Request::get("/features").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let features = body["features"].as_array().unwrap();
        assert_eq!(features.len(), 6);
        let persons = features.iter().find(|f| f["id"] == "persons").unwrap();
        assert_eq!(persons["enabled"], true);
        assert_eq!(persons["tool_count"], 6);

        let (_, body) = send(app, Request::get("/tools").body(Body::empty()).unwrap()).await;
        assert_eq!(body["tools"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_call_tool_over_http() {
        let (app, _) = app(&["deals"]);

        // Input errors come back before any request is made
        let (status, body) = send(
            app.clone(),
            post_json("/tools/get_deal_from_pipedrive", json!({"id": "abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "id must be a numeric string. Example: '123'");

        let (status, body) = send(
            app.clone(),
            post_json("/tools/get_person_from_pipedrive", json!({"id": "1"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("'persons' feature is disabled"));

        let (status, _) = send(app, post_json("/tools/no_such_tool", json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
