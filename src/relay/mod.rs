//! Request shaping and upstream dispatch.
//!
//! - [`payload`]: inbound request parsing, validation and outbound payload construction
//! - [`upstream`]: HTTP client for the hosted chat-completions API

pub mod payload;
pub mod upstream;
