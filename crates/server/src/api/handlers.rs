use super::{ApiError, ApiResult, ErrorResponse};
use crate::config::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use pipedrive_core::features::FeatureStatus;
use pipedrive_core::{Session, ToolResponse};
use pipedrive_mcp::protocol::ToolSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Open a new session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Json<CreateSessionResponse> {
    let session = state.sessions.create(req.user_id, req.metadata);
    tracing::info!(session_id = %session.session_id, "Created session");

    Json(CreateSessionResponse {
        success: true,
        session_id: session.session_id,
        created_at: session.created_at,
        expires_at: session.expires_at,
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetSessionResponse {
    pub success: bool,
    pub session: Session,
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<GetSessionResponse>> {
    let session = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| ApiError::not_found("Session not found or expired"))?;

    Ok(Json(GetSessionResponse {
        success: true,
        session,
    }))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Value>> {
    if !state.sessions.delete(&session_id) {
        return Err(ApiError::not_found("Session not found"));
    }
    tracing::info!(session_id = %session_id, "Deleted session");
    Ok(Json(serde_json::json!({"success": true})))
}

#[derive(Debug, Serialize)]
pub struct ListFeaturesResponse {
    pub features: Vec<FeatureStatus>,
}

/// All features with their enabled flags
pub async fn list_features(State(state): State<Arc<AppState>>) -> Json<ListFeaturesResponse> {
    Json(ListFeaturesResponse {
        features: state.registry.features().statuses(),
    })
}

#[derive(Debug, Serialize)]
pub struct ListToolsResponse {
    pub tools: Vec<ToolSchema>,
}

/// Schemas of the enabled tools
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ListToolsResponse> {
    Json(ListToolsResponse {
        tools: state.registry.list_schemas(),
    })
}

/// Run one tool and return its envelope.
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(arguments): Json<Value>,
) -> ApiResult<Response> {
    if !state.registry.contains(&name) {
        return Err(ApiError::not_found(format!("Unknown tool: {name}")));
    }
    if !state.registry.is_enabled(&name) {
        let feature = state
            .registry
            .features()
            .feature_for_tool(&name)
            .unwrap_or_default()
            .to_string();
        let message = format!(
            "This tool is not available because the '{feature}' feature is disabled. Please contact your administrator."
        );
        return Ok((StatusCode::FORBIDDEN, Json(ErrorResponse::new(message))).into_response());
    }

    let result = state
        .registry
        .call(&name, arguments)
        .await
        .map_err(|e| ApiError::not_found(e.message))?;

    let text = result.joined_text();
    let envelope = serde_json::from_str::<ToolResponse>(&text)
        .unwrap_or_else(|_| ToolResponse::error(text));
    Ok(Json(envelope).into_response())
}
