use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::info;

use super::{BasicFunctionSet, FunctionSet};
use crate::{
    error::ToolError,
    function::{ChatFunction, FunctionCall, FunctionResult, FunctionSchema, ResultPolicy},
    schema::{SchemaFragment, SchemaType},
};

/// A function set hidden behind a single "enable" function until the model calls it.
///
/// Enabling is permanent.
pub struct TogglableSet {
    enable_name: String,
    enable_description: Option<String>,
    enabled: AtomicBool,
    inner: BasicFunctionSet,
}

impl TogglableSet {
    pub fn new(enable_name: impl Into<String>, inner: BasicFunctionSet) -> Self {
        Self {
            enable_name: enable_name.into(),
            enable_description: None,
            enabled: AtomicBool::new(false),
            inner,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.enable_description = Some(description.into());
        self
    }

    pub fn add<F: ChatFunction + 'static>(&mut self, function: F) {
        self.inner.add(function);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::AcqRel) {
            info!(set = %self.enable_name, functions = self.inner.len(), "function set enabled");
        }
    }

    fn enable_schema(&self) -> FunctionSchema {
        FunctionSchema {
            name: self.enable_name.clone(),
            description: self.enable_description.clone(),
            parameters: SchemaFragment {
                properties: Some(Default::default()),
                ..SchemaFragment::of(SchemaType::Object)
            },
        }
    }
}

#[async_trait]
impl FunctionSet for TogglableSet {
    fn functions_schema(&self) -> Vec<FunctionSchema> {
        if self.is_enabled() {
            self.inner.functions_schema()
        } else {
            vec![self.enable_schema()]
        }
    }

    async fn run_function(&self, call: &FunctionCall) -> Result<FunctionResult, ToolError> {
        if self.is_enabled() {
            return self.inner.run_function(call).await;
        }
        if call.name != self.enable_name {
            return Err(ToolError::not_found(call.name.clone()));
        }
        self.enable();
        Ok(FunctionResult::empty(
            self.enable_name.clone(),
            ResultPolicy {
                interpret_as_response: true,
                ..ResultPolicy::default()
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionWrapper;
    use serde_json::json;

    fn gated() -> TogglableSet {
        let mut set = TogglableSet::new("enable_math", BasicFunctionSet::new())
            .with_description("Unlocks math functions");
        set.add(
            FunctionWrapper::builder("one")
                .sync_handler(|_| Ok(1))
                .unwrap(),
        );
        set.add(
            FunctionWrapper::builder("two")
                .sync_handler(|_| Ok(2))
                .unwrap(),
        );
        set
    }

    #[tokio::test]
    async fn only_the_enable_function_is_visible_at_first() {
        let set = gated();
        let schema = set.functions_schema();
        assert_eq!(schema.len(), 1);
        assert_eq!(
            serde_json::to_value(&schema[0]).unwrap(),
            json!({
                "name": "enable_math",
                "description": "Unlocks math functions",
                "parameters": {"type": "object", "properties": {}}
            })
        );

        let err = set.run_function(&FunctionCall::new("one", "{}")).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!set.is_enabled());
    }

    #[tokio::test]
    async fn enabling_reveals_everything() {
        let set = gated();
        let result = set
            .run_function(&FunctionCall::new("enable_math", "{}"))
            .await
            .unwrap();
        assert!(result.policy.interpret_as_response);
        assert_eq!(result.content().unwrap(), None);
        assert!(set.is_enabled());

        let names: Vec<_> = set.functions_schema().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["one", "two"]);
        let result = set.run_function(&FunctionCall::new("two", "{}")).await.unwrap();
        assert_eq!(result.content().unwrap().as_deref(), Some("2"));
    }
}
