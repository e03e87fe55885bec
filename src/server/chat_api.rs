//! The `/api/chat` relay endpoint.
//!
//! - OPTIONS /api/chat: CORS preflight
//! - POST /api/chat: forward a chat completion upstream, buffered or streamed

use std::any::Any;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::RelayError;
use crate::relay::payload::{InboundRequest, OutboundPayload};
use crate::relay::upstream::UpstreamClient;
use crate::server::cors::with_cors;
use crate::server::streaming::line_stream_to_sse;

/// Application state shared across handlers. Read-only after startup.
pub struct AppState {
    pub upstream: UpstreamClient,
    /// Bearer credential for upstream; `None` when not configured.
    pub api_key: Option<String>,
}

impl AppState {
    /// Build state from configuration, reading the credential from the environment.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            upstream: UpstreamClient::new(config.upstream.url.clone())?,
            api_key: config.upstream.api_key(),
        })
    }
}

/// Build the axum router with the relay route.
///
/// Request bodies are not size-limited: long conversations and inline images
/// are forwarded whole.
pub fn build_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/api/chat", post(chat).options(preflight))
        .layer(DefaultBodyLimit::disable())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    with_cors(router)
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, RelayError> {
    let api_key = state
        .api_key
        .as_deref()
        .ok_or(RelayError::ServerConfiguration)?;

    let request = InboundRequest::from_slice(&body)?;
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id = request_id,
        model = request.model.as_deref().unwrap_or_default(),
        messages = request.messages.as_ref().map_or(0, Vec::len),
        stream = request.wants_stream(),
        "Chat completion request"
    );

    let payload = OutboundPayload::from_request(request)?;
    let response = state.upstream.dispatch(api_key, &payload).await?;

    if payload.stream {
        info!(request_id = request_id, "Relaying upstream event stream");
        Ok(sse_response(response))
    } else {
        let completion: Value = response.json().await?;
        Ok(Json(completion).into_response())
    }
}

/// Forward the upstream body as SSE frames, one per non-empty line.
fn sse_response(upstream: reqwest::Response) -> Response {
    let body = Body::from_stream(line_stream_to_sse(upstream.bytes_stream()));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}

/// Turn a handler panic into the catch-all 500 response.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    RelayError::Internal(message).into_response()
}
