use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use super::{BasicFunctionSet, FunctionSet};
use crate::{
    error::ToolError,
    function::{ChatFunction, FunctionCall, FunctionResult, FunctionSchema},
};

/// Several function sets behind one name space.
///
/// Child sets are searched in the order they were added, then the local set.
/// The advertised schema lists the local functions first.
#[derive(Clone, Default)]
pub struct UnionSkillSet {
    sets: Vec<Arc<dyn FunctionSet>>,
    local: BasicFunctionSet,
}

impl UnionSkillSet {
    pub fn new(sets: Vec<Arc<dyn FunctionSet>>) -> Self {
        Self {
            sets,
            local: BasicFunctionSet::new(),
        }
    }

    pub fn add_skill(&mut self, set: Arc<dyn FunctionSet>) {
        self.sets.push(set);
    }

    pub fn add_function<F: ChatFunction + 'static>(&mut self, function: F) -> Arc<dyn ChatFunction> {
        self.local.add(function)
    }

    pub fn remove_function(&mut self, name: &str) -> Result<(), ToolError> {
        self.local.remove(name)
    }

    pub fn local(&self) -> &BasicFunctionSet {
        &self.local
    }
}

#[async_trait]
impl FunctionSet for UnionSkillSet {
    fn functions_schema(&self) -> Vec<FunctionSchema> {
        let mut schema = self.local.functions_schema();
        for set in &self.sets {
            schema.extend(set.functions_schema());
        }
        schema
    }

    async fn run_function(&self, call: &FunctionCall) -> Result<FunctionResult, ToolError> {
        for (index, set) in self.sets.iter().enumerate() {
            match set.run_function(call).await {
                Err(err) if err.is_not_found() => {
                    trace!(function = %call.name, set = index, "not in child set");
                }
                other => return other,
            }
        }
        self.local.run_function(call).await
    }
}
