//! Mock LLM backend for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::traits::*;

/// A scripted reply.
#[derive(Debug)]
enum Reply {
    Content(String),
    Error(LlmError),
}

/// Scripted backend for tests and offline runs.
///
/// Replies are taken from a queue in order. Once the queue is empty every
/// call returns the default response.
pub struct MockBackend {
    model_id: String,
    available: AtomicBool,
    capabilities: ModelCapabilities,
    default_response: String,
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    latency: Option<Duration>,
    call_count: AtomicU32,
}

impl MockBackend {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            available: AtomicBool::new(true),
            capabilities: ModelCapabilities {
                structured_output: true,
                ..ModelCapabilities::default()
            },
            default_response: "{}".to_string(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            latency: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Response returned once the script runs out.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.default_response = content.into();
        self
    }

    /// Queue replies, returned in order before the default response.
    pub fn with_script(self, replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for reply in replies {
            self.push_response(reply);
        }
        self
    }

    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Delay every completion by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_capabilities(mut self, capabilities: ModelCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn push_response(&self, content: impl Into<String>) {
        self.lock_script().push_back(Reply::Content(content.into()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.lock_script().push_back(Reply::Error(error));
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of times `complete` was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Reply>> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(LlmError::Unavailable("Mock backend disabled".to_string()));
        }

        // Rough token estimate, four characters per token.
        let prompt_tokens: u32 = request
            .messages
            .iter()
            .map(|m| m.content.len() as u32 / 4)
            .sum();

        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        let next = self.lock_script().pop_front();
        let content = match next {
            Some(Reply::Error(err)) => return Err(err),
            Some(Reply::Content(content)) => content,
            None => self.default_response.clone(),
        };

        Ok(CompletionResponse {
            usage: Usage {
                prompt_tokens,
                completion_tokens: content.len() as u32 / 4,
            },
            content,
            finish_reason: FinishReason::Stop,
        })
    }

    fn capabilities(&self) -> &ModelCapabilities {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_default() {
        let backend = MockBackend::new("test-model")
            .with_script(["first", "second"])
            .with_response("fallback");

        let mut seen = Vec::new();
        for _ in 0..3 {
            let response = backend.complete(CompletionRequest::user("Hi")).await.unwrap();
            seen.push(response.content);
        }

        assert_eq!(seen, vec!["first", "second", "fallback"]);
        assert_eq!(backend.call_count(), 3);
        assert_eq!(backend.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let backend = MockBackend::default();
        backend.push_error(LlmError::RateLimited { retry_after_ms: None });

        let result = backend.complete(CompletionRequest::user("Hi")).await;
        assert!(matches!(result, Err(LlmError::RateLimited { .. })));
        assert!(backend.complete(CompletionRequest::user("Hi")).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let backend = MockBackend::new("test-model").with_available(false);

        assert!(!backend.is_available().await);
        assert!(backend.complete(CompletionRequest::user("Hi")).await.is_err());

        backend.set_available(true);
        assert!(backend.is_available().await);
    }
}
