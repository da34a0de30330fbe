#![deny(unsafe_code)]

pub mod conversation;
pub mod docs;
pub mod error;
pub mod function;
pub mod nlp;
pub mod parsers;
pub mod schema;
pub mod sets;
pub mod value;

// Re-exported for use in generated code
pub use inventory;
pub use serde_json;

pub use conversation::{
    CallMode, ChatBackend, ChatRequest, Conversation, ConversationConfig, Message, Retries,
};
pub use error::{BackendError, ConversationError, ToolError};
pub use function::{
    Arguments, ChatFunction, FunctionBuilder, FunctionCall, FunctionRegistration, FunctionResult,
    FunctionSchema, FunctionWrapper, Param, RawFunctionResult, ResultPolicy, WrapperConfig,
};
pub use nlp::{NaturalLanguageAnnotated, NaturalLanguageFunction};
pub use parsers::{ArgParser, ParserRegistry, default_registry};
pub use schema::{
    ChoiceDescriptor, Describe, FieldDescriptor, RecordDescriptor, SchemaFragment, SchemaType,
    TypeDescriptor,
};
pub use sets::{BasicFunctionSet, FunctionSet, TogglableSet, UnionSkillSet};
pub use value::{ArgValue, FromArgValue, take_field};
