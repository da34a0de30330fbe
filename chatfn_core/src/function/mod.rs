//! Function descriptors: the callable, its derived schema and its result policy.

mod result;
mod wrapper;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ToolError,
    parsers::{ParserRegistry, default_registry},
    schema::{SchemaFragment, TypeDescriptor},
};

pub use result::{FunctionResult, RawFunctionResult, ReturnValue};
pub use wrapper::{Arguments, FunctionBuilder, FunctionRegistration, FunctionWrapper, Handler};

/// What happens to a function's result once it has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultPolicy {
    /// Send the result back into the conversation.
    pub save_return: bool,
    /// JSON-encode the result. When off the result must already be a string.
    pub serialize: bool,
    /// Drop the originating tool-call message once resolved.
    pub remove_call: bool,
    /// Treat the result as the assistant's own answer.
    pub interpret_as_response: bool,
}

impl Default for ResultPolicy {
    fn default() -> Self {
        Self {
            save_return: true,
            serialize: true,
            remove_call: false,
            interpret_as_response: false,
        }
    }
}

/// Per-function configuration: the parsers used for its arguments and its result policy.
#[derive(Debug, Clone)]
pub struct WrapperConfig {
    pub parsers: Arc<ParserRegistry>,
    pub policy: ResultPolicy,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            parsers: default_registry(),
            policy: ResultPolicy::default(),
        }
    }
}

/// A declared parameter of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeDescriptor,
    /// Used when the argument is omitted. Parameters without one are required.
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            description: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Shorthand for a `null` default.
    pub fn optional(self) -> Self {
        self.with_default(Value::Null)
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// The declaration sent to the backend for one function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: SchemaFragment,
}

/// A tool invocation requested by the model. `arguments` is raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Anything a function set can expose to the model.
#[async_trait]
pub trait ChatFunction: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> FunctionSchema;

    fn policy(&self) -> ResultPolicy {
        ResultPolicy::default()
    }

    /// Runs the function on decoded JSON arguments.
    async fn call(&self, arguments: Value) -> Result<RawFunctionResult, ToolError>;
}
