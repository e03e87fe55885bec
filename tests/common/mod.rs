//! Shared helpers: a recording stub upstream and request/response utilities.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::net::TcpListener;

use chat_relay::relay::upstream::UpstreamClient;
use chat_relay::server::chat_api::{build_router, AppState};

pub const TEST_API_KEY: &str = "fw-test-key";

/// One request as seen by the stub upstream.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub headers: HeaderMap,
    pub body: Value,
}

/// Stub upstream that records every request and answers with a canned response.
#[derive(Clone)]
pub struct StubUpstream {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: &'static str,
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubUpstream {
    pub fn new(status: StatusCode, content_type: &'static str, body: &'static str) -> Self {
        Self {
            status,
            content_type,
            body,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn json(body: &'static str) -> Self {
        Self::new(StatusCode::OK, "application/json", body)
    }

    pub fn event_stream(body: &'static str) -> Self {
        Self::new(StatusCode::OK, "text/event-stream", body)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// Serve the stub on an ephemeral port and return its chat-completions URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/v1/chat/completions", post(stub_handler))
            .layer(DefaultBodyLimit::disable())
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1/chat/completions")
    }
}

async fn stub_handler(
    State(stub): State<StubUpstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stub.seen.lock().unwrap().push(SeenRequest { headers, body });
    (
        stub.status,
        [(header::CONTENT_TYPE, stub.content_type)],
        stub.body,
    )
        .into_response()
}

/// Relay router pointed at `upstream_url`.
pub fn relay(upstream_url: &str, api_key: Option<&str>) -> Router {
    let state = AppState {
        upstream: UpstreamClient::new(upstream_url).unwrap(),
        api_key: api_key.map(str::to_string),
    };
    build_router(Arc::new(state))
}

pub fn chat_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> Value {
    let body = body_bytes(response).await;
    serde_json::from_slice(&body).unwrap_or_else(|e| panic!("Expected valid JSON body: {e}"))
}

pub fn header_str<'a>(response: &'a Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .map(|v| v.to_str().unwrap_or(""))
        .unwrap_or("")
}

/// Assert the fixed CORS header set is present.
pub fn assert_cors(response: &Response) {
    assert_eq!(header_str(response, "access-control-allow-origin"), "*");
    assert_eq!(
        header_str(response, "access-control-allow-methods"),
        "GET, POST, OPTIONS"
    );
    assert_eq!(
        header_str(response, "access-control-allow-headers"),
        "Content-Type, Authorization"
    );
}
