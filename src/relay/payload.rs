//! Inbound chat request and the outbound payload derived from it.
//!
//! Message records, tool definitions and sampling values are opaque JSON: they
//! are forwarded as given, never validated. The only rules applied are the
//! required-field check, the sampling defaults and the fixed token limit.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::error::RelayError;

/// Completion token limit sent upstream. Callers cannot override it.
pub const MAX_TOKENS: u32 = 25_000;

fn default_temperature() -> Value {
    json!(0.6)
}
fn default_top_p() -> Value {
    json!(1)
}
fn default_top_k() -> Value {
    json!(40)
}
fn default_penalty() -> Value {
    json!(0)
}

/// `Some` whenever the key is present, so an explicit `null` is kept as
/// `Some(Value::Null)` instead of collapsing into `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Chat request as received on `/api/chat`.
///
/// Unknown fields, including any caller-supplied `max_tokens`, are ignored.
/// Sampling values and `tool_choice` are `None` only when the key is absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundRequest {
    pub model: Option<String>,
    pub messages: Option<Vec<Value>>,
    pub stream: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub temperature: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub top_p: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub top_k: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub presence_penalty: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub frequency_penalty: Option<Value>,
    pub tools: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "present")]
    pub tool_choice: Option<Value>,
}

impl InboundRequest {
    /// Parse a raw request body. The body must be a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, RelayError> {
        let value: Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(RelayError::Internal(
                "request body must be a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn wants_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

/// Body of the upstream chat-completions call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundPayload {
    pub model: String,
    pub messages: Vec<Value>,
    pub temperature: Value,
    pub top_p: Value,
    pub top_k: Value,
    pub max_tokens: u32,
    pub presence_penalty: Value,
    pub frequency_penalty: Value,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
}

impl OutboundPayload {
    /// Validate the inbound request and apply the sampling defaults.
    pub fn from_request(req: InboundRequest) -> Result<Self, RelayError> {
        let stream = req.wants_stream();

        let model = req.model.filter(|m| !m.is_empty());
        let messages = req.messages.filter(|m| !m.is_empty());
        let (Some(model), Some(messages)) = (model, messages) else {
            return Err(RelayError::BadRequest);
        };

        // An empty tool list is dropped, and tool_choice only travels with tools.
        let tools = req.tools.filter(|t| !t.is_empty());
        let tool_choice = tools.as_ref().and(req.tool_choice);

        Ok(Self {
            model,
            messages,
            temperature: req.temperature.unwrap_or_else(default_temperature),
            top_p: req.top_p.unwrap_or_else(default_top_p),
            top_k: req.top_k.unwrap_or_else(default_top_k),
            max_tokens: MAX_TOKENS,
            presence_penalty: req.presence_penalty.unwrap_or_else(default_penalty),
            frequency_penalty: req.frequency_penalty.unwrap_or_else(default_penalty),
            stream,
            tools,
            tool_choice,
        })
    }
}
