//! HTTP surface of the tool execution server.

use crate::tools::ToolRegistry;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tablechat_core::ResultEnvelope;
use tablechat_error::{ToolError, ToolErrorKind};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// `POST /mcp` body.
///
/// `arguments` takes precedence over the legacy `args` alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpRequest {
    /// Wire name of the tool
    #[serde(default)]
    pub tool: Option<String>,
    /// Tool arguments
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
    /// Alias for `arguments`
    #[serde(default)]
    pub args: Option<Map<String, Value>>,
}

impl McpRequest {
    /// Build a request for `tool` with `arguments`.
    pub fn new(tool: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool: Some(tool.into()),
            arguments: Some(arguments),
            args: None,
        }
    }

    /// Resolved arguments: `arguments`, then `args`, else empty.
    pub fn into_arguments(self) -> Map<String, Value> {
        self.arguments.or(self.args).unwrap_or_default()
    }
}

/// Shared router state.
#[derive(Clone)]
pub struct McpState {
    registry: Arc<ToolRegistry>,
}

impl McpState {
    /// Wrap a registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

/// Routes: `POST /mcp`, `GET /mcp/tools`, `GET /health`.
pub fn create_router(state: McpState) -> Router {
    Router::new()
        .route("/mcp", post(call_tool))
        .route("/mcp/tools", get(list_tools))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn list_tools(State(state): State<McpState>) -> impl IntoResponse {
    let mut tools: Vec<Value> = state
        .registry
        .list()
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name(),
                "description": tool.description(),
                "inputSchema": tool.input_schema(),
            })
        })
        .collect();
    tools.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
    Json(json!({ "tools": tools }))
}

async fn call_tool(
    State(state): State<McpState>,
    payload: Result<Json<McpRequest>, JsonRejection>,
) -> Result<Json<ResultEnvelope>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::from(ToolError::new(ToolErrorKind::InvalidArguments(
            rejection.body_text(),
        )))
    })?;

    let tool = request.tool.clone().unwrap_or_default();
    let arguments = request.into_arguments();
    let logged = Value::Object(arguments.clone());
    info!(tool = %tool, arguments = %logged, "Tool call");

    let envelope = state.registry.execute(&tool, arguments).await?;
    Ok(Json(envelope))
}

/// Tool failure rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError(ToolError);

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!(error = %self.0, "Rejected tool call");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, "Tool execution failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.kind.to_string() }))).into_response()
    }
}
