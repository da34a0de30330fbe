use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use super::Message;
use crate::{error::BackendError, function::FunctionSchema};

/// How the model may use the advertised functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallMode {
    /// The model chooses between answering and calling a function.
    Auto,
    /// The model must answer in natural language.
    None,
    /// The model must call the named function.
    Forced(String),
}

impl CallMode {
    pub fn is_forced(&self) -> bool {
        matches!(self, CallMode::Forced(_))
    }

    pub fn to_value(&self) -> Value {
        match self {
            CallMode::Auto => json!("auto"),
            CallMode::None => json!("none"),
            CallMode::Forced(name) => json!({ "name": name }),
        }
    }
}

impl Serialize for CallMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Everything a backend needs for one round trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub functions: Vec<FunctionSchema>,
    pub call_mode: CallMode,
}

impl ChatRequest {
    /// The request as a chat-completions style JSON body.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });
        if !self.functions.is_empty() {
            body["functions"] = json!(self.functions);
            body["function_call"] = self.call_mode.to_value();
        }
        body
    }
}

/// The model endpoint. Implementations own transport, authentication and decoding.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends one request and returns the single reply message.
    ///
    /// Rate limiting must be reported as [`BackendError::RateLimited`] so the
    /// engine can retry it.
    async fn send(&self, request: &ChatRequest) -> Result<Message, BackendError>;
}
