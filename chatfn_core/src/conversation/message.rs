use serde::{Deserialize, Serialize};

use crate::function::FunctionCall;

/// One entry of the conversation history, in its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call: Option<FunctionCall>,
    },
    Tool {
        name: String,
        content: Option<String>,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: Some(content.into()),
            tool_call: None,
        }
    }

    pub fn tool_call(call: FunctionCall) -> Self {
        Message::Assistant {
            content: None,
            tool_call: Some(call),
        }
    }

    pub fn tool(name: impl Into<String>, content: Option<String>) -> Self {
        Message::Tool {
            name: name.into(),
            content,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
            Message::Tool { .. } => "tool",
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Message::System { content } | Message::User { content } => Some(content.as_str()),
            Message::Assistant { content, .. } | Message::Tool { content, .. } => content.as_deref(),
        }
    }

    pub fn function_call(&self) -> Option<&FunctionCall> {
        match self {
            Message::Assistant { tool_call, .. } => tool_call.as_ref(),
            _ => None,
        }
    }

    /// The answer text, if this is a contentful assistant message without a call.
    pub fn final_content(&self) -> Option<&str> {
        match self {
            Message::Assistant {
                content: Some(content),
                tool_call: None,
            } => Some(content.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Message {
    fn from(content: &str) -> Self {
        Message::user(content)
    }
}

impl From<String> for Message {
    fn from(content: String) -> Self {
        Message::user(content)
    }
}
