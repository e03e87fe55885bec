//! HTTP surface of the relay.
//!
//! - [`chat_api`]: router, shared state and the `/api/chat` handlers
//! - [`cors`]: the fixed CORS header set applied to every response
//! - [`streaming`]: SSE framing of upstream line streams

pub mod chat_api;
pub mod cors;
pub mod streaming;
