//! Collections of functions exposed to the model together.

mod basic;
mod togglable;
mod union;

use async_trait::async_trait;

use crate::{
    error::ToolError,
    function::{FunctionCall, FunctionResult, FunctionSchema},
};

pub use basic::BasicFunctionSet;
pub use togglable::TogglableSet;
pub use union::UnionSkillSet;

/// A source of callable functions.
#[async_trait]
pub trait FunctionSet: Send + Sync {
    /// Schemas of every visible function, in lookup order.
    fn functions_schema(&self) -> Vec<FunctionSchema>;

    /// Runs one tool call. Fails with `FunctionNotFound` when the name is not served here.
    async fn run_function(&self, call: &FunctionCall) -> Result<FunctionResult, ToolError>;
}
