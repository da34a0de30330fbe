use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use futures::{FutureExt, future::BoxFuture};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{
    ChatFunction, FunctionSchema, Param, RawFunctionResult, ResultPolicy, ReturnValue,
    WrapperConfig,
};
use crate::{
    docs::{ParsedDocs, parse_docs},
    error::ToolError,
    parsers::ParserRegistry,
    schema::SchemaFragment,
    value::{ArgValue, FromArgValue, take_field},
};

/// Type-erased callable behind a [`FunctionWrapper`].
pub type Handler =
    dyn Fn(Arguments) -> BoxFuture<'static, Result<RawFunctionResult, ToolError>> + Send + Sync;

/// Parsed arguments, in parameter declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, ArgValue>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Removes an argument and converts it to `T`.
    pub fn take<T: FromArgValue>(&mut self, name: &str) -> Result<T, ToolError> {
        take_field(&mut self.values, name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> IndexMap<String, ArgValue> {
        self.values
    }
}

// ============================================================================
// FUNCTION WRAPPER
// ============================================================================

/// A callable with a schema derived ahead of time from its declared parameters.
#[derive(Clone)]
pub struct FunctionWrapper {
    name: String,
    description: Option<String>,
    params: Vec<Param>,
    schema: FunctionSchema,
    config: WrapperConfig,
    handler: Arc<Handler>,
}

impl FunctionWrapper {
    pub fn builder(name: impl Into<String>) -> FunctionBuilder {
        FunctionBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    pub fn schema(&self) -> &FunctionSchema {
        &self.schema
    }

    /// Checks decoded JSON arguments against the parameters.
    ///
    /// Required parameters must be present, unknown names are rejected and
    /// omitted parameters take their parsed default.
    pub fn parse_arguments(&self, arguments: &Value) -> Result<Arguments, ToolError> {
        let broken = || ToolError::broken(arguments, &self.schema.parameters);
        let empty = Map::new();
        let object = match arguments {
            Value::Object(object) => object,
            Value::Null => &empty,
            _ => return Err(broken()),
        };

        if object
            .keys()
            .any(|key| !self.params.iter().any(|p| &p.name == key))
        {
            return Err(broken());
        }

        let mut values = IndexMap::with_capacity(self.params.len());
        for param in &self.params {
            let raw = match (object.get(&param.name), &param.default) {
                (Some(raw), _) => raw,
                (None, Some(default)) => default,
                (None, None) => return Err(broken()),
            };
            values.insert(param.name.clone(), self.config.parsers.parse(&param.ty, raw)?);
        }
        Ok(Arguments { values })
    }

    /// Parses `arguments` and runs the callable, returning its result untouched.
    pub async fn invoke(&self, arguments: &Value) -> Result<RawFunctionResult, ToolError> {
        let parsed = self.parse_arguments(arguments)?;
        debug!(function = %self.name, args = parsed.len(), "invoking function");
        (self.handler)(parsed).await
    }
}

impl fmt::Debug for FunctionWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionWrapper")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("policy", &self.config.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatFunction for FunctionWrapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> FunctionSchema {
        self.schema.clone()
    }

    fn policy(&self) -> ResultPolicy {
        self.config.policy
    }

    async fn call(&self, arguments: Value) -> Result<RawFunctionResult, ToolError> {
        self.invoke(&arguments).await
    }
}

// ============================================================================
// BUILDER
// ============================================================================

pub struct FunctionBuilder {
    name: String,
    description: Option<String>,
    docs: ParsedDocs,
    params: Vec<Param>,
    config: WrapperConfig,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            docs: ParsedDocs::default(),
            params: Vec::new(),
            config: WrapperConfig::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the description taken from [`docs`](Self::docs).
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Raw documentation: the first paragraph becomes the description and an
    /// `# Arguments` list describes the parameters.
    pub fn docs(mut self, raw: &str) -> Self {
        self.docs = parse_docs(raw);
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn policy(mut self, policy: ResultPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn save_return(mut self, on: bool) -> Self {
        self.config.policy.save_return = on;
        self
    }

    pub fn serialize(mut self, on: bool) -> Self {
        self.config.policy.serialize = on;
        self
    }

    pub fn remove_call(mut self, on: bool) -> Self {
        self.config.policy.remove_call = on;
        self
    }

    pub fn interpret_as_response(mut self, on: bool) -> Self {
        self.config.policy.interpret_as_response = on;
        self
    }

    pub fn parsers(mut self, parsers: Arc<ParserRegistry>) -> Self {
        self.config.parsers = parsers;
        self
    }

    pub fn config(mut self, config: WrapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Finishes the function with an async callable.
    ///
    /// Fails if any parameter type has no parser in the configured registry.
    pub fn handler<F, Fut, T>(self, f: F) -> Result<FunctionWrapper, ToolError>
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ToolError>> + Send + 'static,
        T: ReturnValue,
    {
        let handler: Arc<Handler> = Arc::new(move |args: Arguments| {
            let fut = f(args);
            async move { fut.await.map(RawFunctionResult::new) }.boxed()
        });
        self.build(handler)
    }

    /// Finishes the function with a blocking callable, run inline.
    pub fn sync_handler<F, T>(self, f: F) -> Result<FunctionWrapper, ToolError>
    where
        F: Fn(Arguments) -> Result<T, ToolError> + Send + Sync + 'static,
        T: ReturnValue,
    {
        let handler: Arc<Handler> = Arc::new(move |args: Arguments| {
            futures::future::ready(f(args).map(RawFunctionResult::new)).boxed()
        });
        self.build(handler)
    }

    fn build(self, handler: Arc<Handler>) -> Result<FunctionWrapper, ToolError> {
        let FunctionBuilder {
            name,
            description,
            docs,
            mut params,
            config,
        } = self;

        let description = description.or(docs.short_description);
        let mut properties = IndexMap::with_capacity(params.len());
        for param in &mut params {
            if param.description.is_none() {
                param.description = docs.params.get(&param.name).cloned();
            }
            let mut fragment = config.parsers.schema(&param.ty).inspect_err(|err| {
                warn!(function = %name, param = %param.name, error = %err, "cannot derive parameter schema");
            })?;
            if let Some(text) = &param.description {
                fragment.description = Some(text.clone());
            }
            properties.insert(param.name.clone(), fragment);
        }
        let required = params
            .iter()
            .filter(|p| p.is_required())
            .map(|p| p.name.clone())
            .collect();

        let schema = FunctionSchema {
            name: name.clone(),
            description: description.clone(),
            parameters: SchemaFragment::object(properties, required),
        };
        debug!(function = %name, params = params.len(), "derived function schema");

        Ok(FunctionWrapper {
            name,
            description,
            params,
            schema,
            config,
            handler,
        })
    }
}

// ============================================================================
// REGISTRATION
// ============================================================================

/// Link-time registration emitted by `#[function]`.
pub struct FunctionRegistration {
    pub name: &'static str,
    pub build: fn() -> Result<FunctionWrapper, ToolError>,
}

impl FunctionRegistration {
    pub const fn new(name: &'static str, build: fn() -> Result<FunctionWrapper, ToolError>) -> Self {
        Self { name, build }
    }
}

inventory::collect!(FunctionRegistration);
