//! The backend seam and the chat types that cross it.
//!
//! Coaching tasks never talk to an inference engine directly. They build a
//! [`CompletionRequest`] and hand it to whichever [`LlmBackend`] is up.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Failures reported by a backend.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Endpoint unreachable or switched off
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Non-success HTTP status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// HTTP 429; the delay comes from `Retry-After` when sent
    #[error("Rate limited (retry after {retry_after_ms:?} ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    /// The model refused or the provider filtered the output
    #[error("Output refused: {reason}")]
    ContentFiltered { reason: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    /// Body was not a chat-completions response
    #[error("Unreadable response: {0}")]
    ParseError(String),

    #[error("Backend misconfigured: {0}")]
    Configuration(String),
}

/// An inference engine able to answer chat requests.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Identifier recorded in the audit log, usually the model name.
    fn id(&self) -> &str;

    async fn is_available(&self) -> bool;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    fn capabilities(&self) -> &ModelCapabilities;
}

/// One chat request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    /// Oldest first
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// JSON schema the reply must follow
    pub output_schema: Option<OutputSchema>,
}

impl CompletionRequest {
    /// Start a conversation with one user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
            ..Self::default()
        }
    }

    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Token budget and temperature. Temperature is clamped to 0.0..=2.0.
    pub fn with_sampling(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature.map(|t| t.clamp(0.0, 2.0));
        self
    }

    pub fn with_output_schema(mut self, name: impl Into<String>, schema: serde_json::Value) -> Self {
        self.output_schema = Some(OutputSchema {
            name: name.into(),
            schema,
        });
        self
    }
}

/// Named JSON schema for structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    /// `[A-Za-z0-9_-]` only; OpenAI rejects anything else
    pub name: String,
    pub schema: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// A previous model reply, replayed when asking for a correction.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat role. The system prompt travels separately on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    /// Cut off at `max_tokens`
    Length,
    ContentFilter,
}

/// Token counts as reported by the backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// What a backend's model can do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCapabilities {
    pub context_window: u32,
    pub max_output_tokens: u32,
    /// Honours a JSON schema in the request; otherwise the schema is only
    /// described in the prompt
    pub structured_output: bool,
}

impl Default for ModelCapabilities {
    fn default() -> Self {
        Self {
            context_window: 8192,
            max_output_tokens: 2048,
            structured_output: false,
        }
    }
}
