//! LLM backend abstraction layer.
//!
//! - OpenAI-compatible (OpenAI, vLLM, Ollama)
//! - Scripted mock backend for tests

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use traits::{
    CompletionRequest, CompletionResponse, LlmBackend, LlmError, Message, MessageRole,
    ModelCapabilities,
};
