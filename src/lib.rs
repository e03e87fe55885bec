//! chat-relay: single-endpoint chat-completion relay.
//!
//! Accepts OpenAI-style chat requests on `POST /api/chat`, applies fixed
//! sampling defaults and a fixed token limit, and forwards them to a hosted
//! inference API. Responses come back either as one JSON document or as a
//! relayed event stream, with permissive CORS headers on every path.

pub mod config;
pub mod error;
pub mod relay;
pub mod server;
