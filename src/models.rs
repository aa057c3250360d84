//! Request and response bodies for the relay.
//!
//! Message contents are never inspected: they are kept as raw JSON values so the relay stays
//! compatible with whatever message schema the upstream accepts.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::RelayError;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u64 = 2048;

const UNKNOWN_ERROR: &str = "Unknown error";

fn default_model() -> Value {
    Value::from(DEFAULT_MODEL)
}

fn default_temperature() -> Value {
    Value::from(DEFAULT_TEMPERATURE)
}

fn default_max_tokens() -> Value {
    Value::from(DEFAULT_MAX_TOKENS)
}

/// The body of a `POST /api/chat` request.
///
/// Defaults are applied only when a key is missing; an explicit `null` is forwarded as-is.
/// Other top-level keys are dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingChatRequest {
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default = "default_model")]
    pub model: Value,
    #[serde(default = "default_temperature")]
    pub temperature: Value,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Value,
}

impl Default for IncomingChatRequest {
    fn default() -> Self {
        Self {
            messages: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl IncomingChatRequest {
    /// Parses a raw request body.
    ///
    /// Malformed JSON and a bare `null` are internal errors. Any other non-object body parses
    /// to a request without messages, which then fails validation.
    pub fn from_slice(body: &[u8]) -> Result<Self, RelayError> {
        let value: Value = serde_json::from_slice(body).map_err(RelayError::internal)?;
        match value {
            Value::Null => Err(RelayError::Internal(
                "request body must not be null".to_owned(),
            )),
            Value::Object(_) => serde_json::from_value(value).map_err(RelayError::internal),
            _ => Ok(Self::default()),
        }
    }

    /// Validates the request and builds the body sent upstream.
    pub fn into_upstream(self) -> Result<UpstreamChatRequest, RelayError> {
        let Some(Value::Array(messages)) = self.messages else {
            return Err(RelayError::InvalidMessages);
        };
        Ok(UpstreamChatRequest {
            model: self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        })
    }
}

/// The body forwarded to the upstream chat-completions endpoint. Streaming is always off.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamChatRequest {
    pub model: Value,
    pub messages: Vec<Value>,
    pub temperature: Value,
    pub max_tokens: Value,
    pub stream: bool,
}

/// The normalized error body returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            message: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The body of `GET /api/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn now() -> Self {
        Self {
            status: "ok".into(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// Pulls `error.message` out of an upstream error body, falling back to "Unknown error" when
/// the body is not JSON or has no usable message.
pub fn upstream_error_details(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.pointer("/error/message"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or(UNKNOWN_ERROR)
        .to_owned()
}
