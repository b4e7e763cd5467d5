//! HTTP surface of the inference gateway.

use crate::gateway::InferenceGateway;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tablechat_core::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use tablechat_error::{GatewayError, GatewayErrorKind};
use tablechat_mcp_client::{Answer, Orchestrator};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

/// SSE terminator.
const DONE: &str = "[DONE]";

fn default_generate_max_tokens() -> u32 {
    128
}

fn default_generate_temperature() -> f32 {
    0.7
}

/// `POST /generate` and `/generate/stream` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Raw prompt
    pub prompt: String,
    /// Maximum tokens to generate
    #[serde(default = "default_generate_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_generate_temperature")]
    pub temperature: f32,
}

/// `POST /generate` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    pub text: String,
}

/// `POST /chat` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question
    #[serde(default)]
    pub input: Option<String>,
}

/// `POST /chat` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Tool envelope or plain text
    pub response: Answer,
}

/// Shared router state.
#[derive(Clone)]
pub struct GatewayState {
    gateway: InferenceGateway,
    orchestrator: Arc<Orchestrator>,
}

impl GatewayState {
    /// Serve `gateway`, answering `/chat` through `orchestrator`.
    pub fn new(gateway: InferenceGateway, orchestrator: Orchestrator) -> Self {
        Self {
            gateway,
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// CORS policy allowing credentialed calls from one browser origin.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, GatewayError> {
    let origin = HeaderValue::from_str(origin).map_err(|e| {
        GatewayError::new(GatewayErrorKind::InvalidRequest(format!(
            "Invalid CORS origin \"{}\": {}",
            origin, e
        )))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Routes: `/health`, `/generate`, `/generate/stream`, `/v1/chat/completions`, `/chat`.
pub fn create_router(state: GatewayState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/generate", post(generate))
        .route("/generate/stream", post(generate_stream))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/chat", post(chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn generate(
    State(state): State<GatewayState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = payload?;
    let text = state
        .gateway
        .generate(&request.prompt, request.max_tokens, request.temperature)
        .await?;
    Ok(Json(GenerateResponse { text }))
}

async fn generate_stream(
    State(state): State<GatewayState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let tokens = state
        .gateway
        .generate_stream(&request.prompt, request.max_tokens, request.temperature)
        .await?;

    let events = tokens.map(|fragment| fragment.map(|token| json!({ "token": token }).to_string()));
    Ok(sse_response(events))
}

async fn chat_completions(
    State(state): State<GatewayState>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let created = chrono::Utc::now().timestamp();
    info!(
        model = %request.model,
        messages = request.messages.len(),
        stream = request.stream,
        "Chat completion"
    );

    if !request.stream {
        let text = state
            .gateway
            .chat(&request.messages, request.max_tokens, request.temperature)
            .await?;
        let completion = ChatCompletionResponse::local(request.model, created, text);
        return Ok(Json(completion).into_response());
    }

    let tokens = state
        .gateway
        .chat_stream(&request.messages, request.max_tokens, request.temperature)
        .await?;
    let model = request.model;
    let events = tokens.map(move |fragment| {
        fragment.and_then(|token| {
            serde_json::to_string(&ChatCompletionChunk::local(model.clone(), created, token))
                .map_err(|e| GatewayError::new(GatewayErrorKind::Deserialization(e.to_string())))
        })
    });
    Ok(sse_response(events))
}

async fn chat(
    State(state): State<GatewayState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let input = request
        .input
        .filter(|input| !input.trim().is_empty())
        .ok_or_else(|| {
            GatewayError::new(GatewayErrorKind::InvalidRequest(
                "Missing 'input'".to_string(),
            ))
        })?;

    let response = state.orchestrator.run(&input).await;
    Ok(Json(ChatResponse { response }))
}

/// One `data:` event per payload, an error event if generation breaks, then `[DONE]`.
fn sse_response<S>(payloads: S) -> Response
where
    S: Stream<Item = Result<String, GatewayError>> + Send + 'static,
{
    let events = payloads
        .map(|payload| match payload {
            Ok(data) => Event::default().data(data),
            Err(e) => {
                error!(error = %e, "Generation failed mid-stream");
                Event::default().data(json!({ "error": e.kind.to_string() }).to_string())
            }
        })
        .chain(futures::stream::once(async { Event::default().data(DONE) }))
        .map(Ok::<_, Infallible>);

    Sse::new(events).into_response()
}

/// Gateway failure rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    #[track_caller]
    fn from(rejection: JsonRejection) -> Self {
        Self(GatewayError::new(GatewayErrorKind::InvalidRequest(
            rejection.body_text(),
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!(error = %self.0, "Rejected request");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, "Generation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.kind.to_string() }))).into_response()
    }
}
