use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-0613";

/// Retry budget for rate-limited backend calls, counted per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retries {
    Limited(u32),
    Unlimited,
}

impl Default for Retries {
    fn default() -> Self {
        Retries::Limited(1)
    }
}

impl Retries {
    pub fn allows_retry(&self) -> bool {
        match self {
            Retries::Limited(n) => *n > 0,
            Retries::Unlimited => true,
        }
    }

    /// The budget left after one retry.
    pub fn spend(self) -> Self {
        match self {
            Retries::Limited(n) => Retries::Limited(n.saturating_sub(1)),
            Retries::Unlimited => Retries::Unlimited,
        }
    }
}

/// Settings for one [`Conversation`](super::Conversation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub model: String,
    pub retries: Retries,
    /// Upper bound on steps taken by a single `run_until_response`.
    pub max_steps: Option<usize>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            retries: Retries::default(),
            max_steps: None,
        }
    }
}

impl ConversationConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_retries(mut self, retries: Retries) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}
