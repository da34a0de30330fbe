//! Calling a single function from a natural-language request.

use std::sync::Arc;

use crate::{
    conversation::{CallMode, ChatBackend, Conversation, ConversationConfig, Message},
    error::ConversationError,
    function::{FunctionWrapper, RawFunctionResult},
};

/// The raw result of a forced call together with the model's comment on it.
#[derive(Debug)]
pub struct NaturalLanguageAnnotated {
    pub function_result: RawFunctionResult,
    pub annotation: String,
}

/// One function in a conversation of its own.
///
/// Every request starts from a fresh history holding only the system prompt.
pub struct NaturalLanguageFunction {
    name: String,
    system_prompt: Option<String>,
    conversation: Conversation,
}

impl NaturalLanguageFunction {
    pub fn new(function: FunctionWrapper, backend: Arc<dyn ChatBackend>) -> Self {
        let name = function.name().to_string();
        let mut conversation = Conversation::new(backend);
        conversation.add_function(function);
        Self {
            name,
            system_prompt: None,
            conversation,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_config(mut self, config: ConversationConfig) -> Self {
        *self.conversation.config_mut() = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// History of the last request.
    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    fn reset(&mut self) {
        self.conversation.clear_messages();
        if let Some(prompt) = &self.system_prompt {
            self.conversation.add_message(Message::system(prompt.clone()));
        }
    }

    /// Has the model turn `prompt` into arguments and returns the function's result.
    pub async fn from_natural_language(
        &mut self,
        prompt: &str,
    ) -> Result<RawFunctionResult, ConversationError> {
        self.reset();
        self.conversation.run(&self.name, Some(prompt)).await
    }

    /// Forces the call, then lets the model answer with the result in view.
    pub async fn natural_language_response(
        &mut self,
        prompt: &str,
    ) -> Result<String, ConversationError> {
        self.reset();
        self.conversation.add_message(Message::user(prompt));
        self.conversation
            .generate_message(CallMode::Forced(self.name.clone()))
            .await?;
        self.conversation.run_until_response(false).await
    }

    /// Both the raw result and the model's answer.
    pub async fn natural_language_annotated(
        &mut self,
        prompt: &str,
    ) -> Result<NaturalLanguageAnnotated, ConversationError> {
        let function_result = self.from_natural_language(prompt).await?;
        let annotation = self.conversation.run_until_response(false).await?;
        Ok(NaturalLanguageAnnotated {
            function_result,
            annotation,
        })
    }
}
