use std::{borrow::Cow, time::Duration};

use serde_json::Value;

/// Errors raised while deriving schemas, parsing arguments or running functions.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Cannot derive a schema for type `{type_name}`")]
    CannotParseType { type_name: String },

    #[error("Value {value} does not match schema {schema}")]
    BrokenSchema { value: Value, schema: Value },

    #[error("Function arguments are not valid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("Function '{name}' not found")]
    FunctionNotFound { name: Cow<'static, str> },

    #[error("The result of '{name}' cannot be turned into content: {reason}")]
    NonSerializableOutput { name: String, reason: String },

    #[error("Expected {expected}, got {found}")]
    ArgumentConversion { expected: String, found: String },

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl ToolError {
    pub(crate) fn not_found(name: impl Into<String>) -> Self {
        ToolError::FunctionNotFound {
            name: Cow::Owned(name.into()),
        }
    }

    pub(crate) fn broken(value: &Value, schema: &crate::schema::SchemaFragment) -> Self {
        ToolError::BrokenSchema {
            value: value.clone(),
            schema: schema.to_value(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ToolError::FunctionNotFound { .. })
    }
}

/// Failures reported by a [`ChatBackend`](crate::conversation::ChatBackend).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed reply: {0}")]
    MalformedReply(String),
}

/// Errors surfaced by the conversation engine.
#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Expected a call to '{expected}', the model answered without one")]
    UnexpectedReply { expected: String },

    #[error("No final response after {0} steps")]
    StepLimit(usize),

    #[error("The model replied with neither content nor a function call")]
    EmptyReply,
}
