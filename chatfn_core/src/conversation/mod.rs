//! The conversation engine: history, function sets and the request/execute loop.
//!
//! Each step either resolves a pending tool call locally or asks the backend
//! for the next message. `run_until_response` repeats steps until the last
//! message is a plain assistant answer.

mod backend;
mod config;
mod message;
mod retry;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    error::{BackendError, ConversationError},
    function::{ChatFunction, FunctionCall, FunctionSchema, RawFunctionResult, ResultPolicy},
    sets::{FunctionSet, UnionSkillSet},
};

pub use backend::{CallMode, ChatBackend, ChatRequest};
pub use config::{ConversationConfig, DEFAULT_MODEL, Retries};
pub use message::Message;

use retry::send_with_retries;

/// What `execute` does with a result that cannot become content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentFailure {
    Raise,
    /// Keep only the raw result; nothing enters the history.
    Skip,
}

pub struct Conversation {
    messages: Vec<Message>,
    skills: UnionSkillSet,
    backend: Arc<dyn ChatBackend>,
    config: ConversationConfig,
    /// Index of the trailing tool-call message once it has run.
    resolved_call: Option<usize>,
}

impl Conversation {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            messages: Vec::new(),
            skills: UnionSkillSet::default(),
            backend,
            config: ConversationConfig::default(),
            resolved_call: None,
        }
    }

    pub fn with_config(mut self, config: ConversationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_skill(mut self, skill: Arc<dyn FunctionSet>) -> Self {
        self.skills.add_skill(skill);
        self
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConversationConfig {
        &mut self.config
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Appends a message; plain strings become user messages.
    pub fn add_message(&mut self, message: impl Into<Message>) {
        self.messages.push(message.into());
    }

    pub fn add_messages<I, M>(&mut self, messages: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<Message>,
    {
        self.messages.extend(messages.into_iter().map(Into::into));
    }

    pub fn pop_message(&mut self) -> Option<Message> {
        let message = self.messages.pop();
        if self.resolved_call.is_some_and(|i| i >= self.messages.len()) {
            self.resolved_call = None;
        }
        message
    }

    /// Empties the history, keeping the functions.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.resolved_call = None;
    }

    // ------------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------------

    pub fn functions_schema(&self) -> Vec<FunctionSchema> {
        self.skills.functions_schema()
    }

    pub fn add_function<F: ChatFunction + 'static>(&mut self, function: F) -> Arc<dyn ChatFunction> {
        self.skills.add_function(function)
    }

    pub fn remove_function(&mut self, name: &str) -> Result<(), ConversationError> {
        Ok(self.skills.remove_function(name)?)
    }

    pub fn add_skill(&mut self, skill: Arc<dyn FunctionSet>) {
        self.skills.add_skill(skill);
    }

    pub fn skills(&self) -> &UnionSkillSet {
        &self.skills
    }

    // ------------------------------------------------------------------------
    // Engine
    // ------------------------------------------------------------------------

    /// The last message, if it is a tool call that has not run yet.
    fn pending_call(&self) -> Option<&FunctionCall> {
        let index = self.messages.len().checked_sub(1)?;
        if self.resolved_call == Some(index) {
            return None;
        }
        self.messages[index].function_call()
    }

    /// Takes one step with the configured retry budget.
    pub async fn generate_message(&mut self, mode: CallMode) -> Result<Message, ConversationError> {
        let retries = self.config.retries;
        self.generate_message_with(mode, retries).await
    }

    /// Takes one step.
    ///
    /// Unless `mode` forces a call, a pending tool call is executed first. If
    /// that leaves a message behind, it is the result of the step. Otherwise
    /// the backend is asked and its reply is appended and returned.
    pub async fn generate_message_with(
        &mut self,
        mode: CallMode,
        retries: Retries,
    ) -> Result<Message, ConversationError> {
        if !mode.is_forced() {
            if let Some(call) = self.pending_call().cloned() {
                if let Some(message) = self.execute(&call, ContentFailure::Raise).await?.0 {
                    return Ok(message);
                }
            }
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: self.messages.clone(),
            functions: self.functions_schema(),
            call_mode: mode,
        };
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            functions = request.functions.len(),
            call_mode = %request.call_mode.to_value(),
            "sending chat request"
        );
        let reply = send_with_retries(self.backend.as_ref(), &request, retries).await?;

        match &reply {
            Message::Assistant {
                content: None,
                tool_call: None,
            } => return Err(ConversationError::EmptyReply),
            Message::Assistant { .. } => {}
            other => {
                return Err(BackendError::MalformedReply(format!(
                    "expected an assistant message, got a {} message",
                    other.role()
                ))
                .into());
            }
        }
        self.messages.push(reply.clone());
        Ok(reply)
    }

    /// Runs the tool call at the end of the history and folds its result in
    /// according to the function's policy. Returns the appended message, if
    /// any, and the raw result.
    ///
    /// Once the function has run the call counts as resolved, even if its
    /// result then fails to become content.
    async fn execute(
        &mut self,
        call: &FunctionCall,
        on_failure: ContentFailure,
    ) -> Result<(Option<Message>, Option<RawFunctionResult>), ConversationError> {
        let call_index = self.messages.len().saturating_sub(1);
        info!(function = %call.name, "executing tool call");

        let result = self.skills.run_function(call).await?;
        self.resolved_call = Some(call_index);
        let content = match result.content() {
            Ok(content) => content,
            Err(err) if on_failure == ContentFailure::Raise => return Err(err.into()),
            Err(err) => {
                warn!(function = %result.name, error = %err, "result kept out of the conversation");
                None
            }
        };
        let appended = self.fold_result(call_index, &result.name, result.policy, content);
        Ok((appended, result.into_raw()))
    }

    fn fold_result(
        &mut self,
        call_index: usize,
        name: &str,
        policy: ResultPolicy,
        content: Option<String>,
    ) -> Option<Message> {
        if policy.remove_call {
            self.messages.truncate(call_index);
            self.resolved_call = None;
        } else {
            self.resolved_call = Some(call_index);
        }

        let message = match content {
            None => {
                debug!(function = name, "tool call resolved without content");
                return None;
            }
            Some(text) if policy.interpret_as_response => Message::assistant(text),
            Some(text) => Message::tool(name, Some(text)),
        };
        self.messages.push(message.clone());
        Some(message)
    }

    /// Steps until the model (or a function answering for it) gives a final answer.
    pub async fn run_until_response(
        &mut self,
        allow_function_calls: bool,
    ) -> Result<String, ConversationError> {
        let mode = if allow_function_calls {
            CallMode::Auto
        } else {
            CallMode::None
        };

        let mut steps = 0;
        loop {
            if let Some(max) = self.config.max_steps {
                if steps >= max {
                    return Err(ConversationError::StepLimit(max));
                }
            }
            let message = self.generate_message(mode.clone()).await?;
            steps += 1;
            if let Some(answer) = message.final_content() {
                debug!(steps, "final response");
                return Ok(answer.to_string());
            }
        }
    }

    /// Adds `question` as a user message and runs until the answer.
    pub async fn ask(&mut self, question: impl Into<String>) -> Result<String, ConversationError> {
        self.add_message(Message::user(question));
        self.run_until_response(true).await
    }

    /// Forces one call to `function` and returns its raw result.
    ///
    /// The call is recorded in the history according to the function's
    /// policy, as any other resolved call would be. A result that cannot be
    /// turned into content is still returned; the call is then resolved
    /// without adding anything.
    pub async fn run(
        &mut self,
        function: &str,
        prompt: Option<&str>,
    ) -> Result<RawFunctionResult, ConversationError> {
        if let Some(prompt) = prompt {
            self.add_message(Message::user(prompt));
        }

        let reply = self
            .generate_message(CallMode::Forced(function.to_string()))
            .await?;
        let call = match reply.function_call() {
            Some(call) if call.name == function => call.clone(),
            _ => {
                return Err(ConversationError::UnexpectedReply {
                    expected: function.to_string(),
                });
            }
        };

        let (_, raw) = self.execute(&call, ContentFailure::Skip).await?;
        Ok(raw.unwrap_or_else(|| RawFunctionResult::new(())))
    }
}
