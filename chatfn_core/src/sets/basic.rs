use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::FunctionSet;
use crate::{
    error::ToolError,
    function::{
        ChatFunction, FunctionCall, FunctionRegistration, FunctionResult, FunctionSchema,
    },
};

/// An ordered list of functions; lookups return the first match.
#[derive(Clone, Default)]
pub struct BasicFunctionSet {
    functions: Vec<Arc<dyn ChatFunction>>,
}

impl BasicFunctionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_functions(functions: Vec<Arc<dyn ChatFunction>>) -> Self {
        Self { functions }
    }

    /// Builds a set from every function registered with `#[function]`, sorted by name.
    pub fn collect() -> Result<Self, ToolError> {
        let mut registrations: Vec<&FunctionRegistration> =
            inventory::iter::<FunctionRegistration>.into_iter().collect();
        registrations.sort_by_key(|reg| reg.name);

        let mut set = Self::new();
        for reg in registrations {
            set.add((reg.build)()?);
        }
        info!(count = set.len(), "collected registered functions");
        Ok(set)
    }

    /// Appends a function and returns a handle to it.
    pub fn add<F: ChatFunction + 'static>(&mut self, function: F) -> Arc<dyn ChatFunction> {
        self.add_arc(Arc::new(function))
    }

    pub fn add_arc(&mut self, function: Arc<dyn ChatFunction>) -> Arc<dyn ChatFunction> {
        debug!(function = function.name(), "registered function");
        self.functions.push(function.clone());
        function
    }

    /// Removes every function called `name`.
    pub fn remove(&mut self, name: &str) -> Result<(), ToolError> {
        let before = self.functions.len();
        self.functions.retain(|f| f.name() != name);
        if self.functions.len() == before {
            return Err(ToolError::not_found(name));
        }
        debug!(function = name, "removed function");
        Ok(())
    }

    pub fn find(&self, name: &str) -> Result<&Arc<dyn ChatFunction>, ToolError> {
        self.functions
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| ToolError::not_found(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[async_trait]
impl FunctionSet for BasicFunctionSet {
    fn functions_schema(&self) -> Vec<FunctionSchema> {
        self.functions.iter().map(|f| f.schema()).collect()
    }

    async fn run_function(&self, call: &FunctionCall) -> Result<FunctionResult, ToolError> {
        let function = self.find(&call.name)?;
        let arguments = serde_json::from_str(&call.arguments)
            .map_err(|source| ToolError::InvalidJson { source })?;
        let raw = function.call(arguments).await?;
        Ok(FunctionResult::new(function.name(), raw, function.policy()))
    }
}
