//! Convenient re-exports for common usage patterns.
//!
//! ```rust
//! use chatfn::prelude::*;
//! ```

// Engine
pub use crate::{
    CallMode, ChatBackend, ChatRequest, Conversation, ConversationConfig, Message, Retries,
};

// Functions and sets
pub use crate::{
    Arguments, BasicFunctionSet, ChatFunction, FunctionCall, FunctionSchema, FunctionSet,
    FunctionWrapper, Param, RawFunctionResult, TogglableSet, UnionSkillSet,
};

// Types and errors
pub use crate::{BackendError, ConversationError, Describe, FromArgValue, ToolError};

// Macros
pub use crate::function;

// Commonly used external types
pub use serde_json::{Value, json};

// Async runtime used by the engine
pub use tokio;
