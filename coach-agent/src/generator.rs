//! Structured generation with schema-checked retries.
//!
//! The generator asks a backend for JSON matching the output type's schema.
//! When the reply does not parse into that type, the parse error is sent
//! back to the model and the call is retried, up to `output_retries` times.
//! The whole exchange, retries included, is bounded by `timeout_ms`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audit::{AuditLog, GenerationOutcome, GenerationRecord};
use crate::backend::traits::{CompletionRequest, LlmBackend, LlmError, Message};

/// Error types for structured generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Every configured backend reported itself unavailable
    #[error("No LLM backend available")]
    NoBackendAvailable,

    /// Transport or backend failure
    #[error("Backend error: {0}")]
    Backend(#[from] LlmError),

    /// Output did not match the schema within the retry budget
    #[error("Output failed schema validation after {attempts} attempts: {message}")]
    SchemaValidation { attempts: u32, message: String },

    /// Deadline reached
    #[error("Generation timed out after {0}ms")]
    Timeout(u64),

    /// Output schema could not be rendered
    #[error("Invalid output schema: {0}")]
    InvalidSchema(String),
}

impl GenerationError {
    /// Failures a caller may absorb: the collaborator was unreachable or
    /// too slow, as opposed to answering wrongly.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NoBackendAvailable | Self::Backend(_) | Self::Timeout(_)
        )
    }

    fn outcome(&self) -> GenerationOutcome {
        match self {
            Self::NoBackendAvailable => GenerationOutcome::NoBackend,
            Self::Backend(_) | Self::InvalidSchema(_) => GenerationOutcome::BackendFailed,
            Self::SchemaValidation { .. } => GenerationOutcome::SchemaRejected,
            Self::Timeout(_) => GenerationOutcome::TimedOut,
        }
    }
}

/// Generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Retries after the first attempt when output fails validation
    pub output_retries: u32,
    /// Deadline for one generation, retries included
    pub timeout_ms: u64,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_retries: 3,
            timeout_ms: 30_000,
            max_tokens: Some(2048),
            temperature: Some(0.7),
        }
    }
}

/// One unit of work for the generator.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    /// Short label used in logs and the audit trail
    pub label: String,
    pub system_prompt: String,
    /// What to produce
    pub instruction: String,
    /// Rendered structured context appended to the system prompt
    pub context: Vec<String>,
}

impl GenerationTask {
    pub fn new(
        label: impl Into<String>,
        system_prompt: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            system_prompt: system_prompt.into(),
            instruction: instruction.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, section: impl Into<String>) -> Self {
        self.context.push(section.into());
        self
    }
}

/// Progress kept outside the timed future so it survives cancellation.
#[derive(Default)]
struct Progress {
    backend_id: Option<String>,
    attempts: u32,
}

/// Produces typed values from an LLM.
pub struct StructuredGenerator {
    backends: Vec<Arc<dyn LlmBackend>>,
    config: GeneratorConfig,
    audit: Arc<AuditLog>,
}

impl StructuredGenerator {
    /// Backends are tried in order; the first available one serves a call.
    pub fn new(backends: Vec<Arc<dyn LlmBackend>>) -> Self {
        Self {
            backends,
            config: GeneratorConfig::default(),
            audit: Arc::new(AuditLog::new()),
        }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    async fn select_backend(&self) -> Result<Arc<dyn LlmBackend>, GenerationError> {
        for backend in &self.backends {
            if backend.is_available().await {
                return Ok(Arc::clone(backend));
            }
        }
        Err(GenerationError::NoBackendAvailable)
    }

    /// Generate a `T` for `task`.
    pub async fn generate<T>(&self, task: &GenerationTask) -> Result<T, GenerationError>
    where
        T: JsonSchema + DeserializeOwned,
    {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut progress = Progress::default();

        let deadline = Duration::from_millis(self.config.timeout_ms);
        let result = match tokio::time::timeout(deadline, self.run::<T>(task, &mut progress)).await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.config.timeout_ms)),
        };

        let (outcome, error) = match &result {
            Ok(_) => (GenerationOutcome::Succeeded, None),
            Err(e) => {
                warn!(task = %task.label, attempts = progress.attempts, error = %e, "Generation failed");
                (e.outcome(), Some(e.to_string()))
            }
        };

        self.audit
            .record(GenerationRecord {
                record_id: uuid::Uuid::new_v4().to_string(),
                task: task.label.clone(),
                backend_id: progress.backend_id,
                attempts: progress.attempts,
                outcome,
                error,
                started_at,
                duration_ms: clock.elapsed().as_millis() as u64,
            })
            .await;

        result
    }

    async fn run<T>(
        &self,
        task: &GenerationTask,
        progress: &mut Progress,
    ) -> Result<T, GenerationError>
    where
        T: JsonSchema + DeserializeOwned,
    {
        let (schema_name, schema) = output_schema::<T>()?;
        let backend = self.select_backend().await?;
        progress.backend_id = Some(backend.id().to_string());

        let mut request = CompletionRequest::user(&task.instruction)
            .with_system(system_prompt(task, &schema))
            .with_sampling(self.config.max_tokens, self.config.temperature)
            .with_output_schema(schema_name, schema);

        let max_attempts = self.config.output_retries + 1;
        loop {
            progress.attempts += 1;
            let response = backend.complete(request.clone()).await?;

            match parse_output::<T>(&response.content) {
                Ok(value) => {
                    debug!(
                        task = %task.label,
                        backend = %backend.id(),
                        attempts = progress.attempts,
                        "Structured output accepted"
                    );
                    return Ok(value);
                }
                Err(e) if progress.attempts >= max_attempts => {
                    return Err(GenerationError::SchemaValidation {
                        attempts: progress.attempts,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        task = %task.label,
                        attempt = progress.attempts,
                        error = %e,
                        "Output rejected, retrying"
                    );
                    request = request
                        .with_message(Message::assistant(response.content))
                        .with_message(Message::user(format!(
                            "Your previous reply did not match the required JSON schema: {e}. \
                             Reply again with only a JSON object that matches the schema."
                        )));
                }
            }
        }
    }
}

fn output_schema<T: JsonSchema>() -> Result<(String, serde_json::Value), GenerationError> {
    let name: String = T::schema_name()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let schema = serde_json::to_value(schemars::schema_for!(T))
        .map_err(|e| GenerationError::InvalidSchema(e.to_string()))?;
    Ok((name, schema))
}

fn system_prompt(task: &GenerationTask, schema: &serde_json::Value) -> String {
    let mut prompt = task.system_prompt.clone();
    for section in &task.context {
        prompt.push_str("\n\n");
        prompt.push_str(section);
    }
    prompt.push_str("\n\n## OUTPUT FORMAT\n\nRespond with a single JSON object matching this JSON schema:\n");
    prompt.push_str(&schema.to_string());
    prompt
}

/// Parse model output, accepting a fenced ```json block.
fn parse_output<T: DeserializeOwned>(content: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_fences(content))
}

fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Tip {
        text: String,
        minutes: u32,
    }

    fn task() -> GenerationTask {
        GenerationTask::new("tip", "You are a fitness coach.", "Give one tip.")
            .with_context("## USER\nAda, weight loss")
    }

    fn generator(backend: Arc<MockBackend>) -> StructuredGenerator {
        StructuredGenerator::new(vec![backend as Arc<dyn LlmBackend>])
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_generate_first_attempt() {
        let backend = Arc::new(
            MockBackend::default().with_response(r#"{"text": "Walk after lunch", "minutes": 15}"#),
        );
        let generator = generator(Arc::clone(&backend));

        let tip: Tip = generator.generate(&task()).await.unwrap();
        assert_eq!(tip.minutes, 15);
        assert_eq!(backend.call_count(), 1);

        let request = &backend.requests()[0];
        let system = request.system_prompt.as_deref().unwrap();
        assert!(system.contains("Ada, weight loss"));
        assert!(system.contains("OUTPUT FORMAT"));
        assert!(request.output_schema.is_some());
    }

    #[tokio::test]
    async fn test_retry_feeds_back_error() {
        let backend = Arc::new(
            MockBackend::default()
                .with_script(["not json", "```json\n{\"text\": \"Stretch\", \"minutes\": 5}\n```"]),
        );
        let generator = generator(Arc::clone(&backend));

        let tip: Tip = generator.generate(&task()).await.unwrap();
        assert_eq!(tip.text, "Stretch");
        assert_eq!(backend.call_count(), 2);

        let retry = &backend.requests()[1];
        assert_eq!(retry.messages.len(), 3);
        assert!(retry.messages[2].content.contains("did not match"));

        let record = &generator.audit().recent(1).await[0];
        assert_eq!(record.attempts, 2);
        assert_eq!(record.outcome, GenerationOutcome::Succeeded);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let backend = Arc::new(MockBackend::default().with_response(r#"{"text": 3}"#));
        let generator = generator(Arc::clone(&backend));

        let err = generator.generate::<Tip>(&task()).await.unwrap_err();
        assert!(matches!(err, GenerationError::SchemaValidation { attempts: 4, .. }));
        assert!(!err.is_transient());
        assert_eq!(backend.call_count(), 4);
    }

    #[tokio::test]
    async fn test_timeout() {
        let backend = Arc::new(
            MockBackend::default()
                .with_latency(Duration::from_millis(500))
                .with_response(r#"{"text": "late", "minutes": 1}"#),
        );
        let generator = generator(backend).with_config(GeneratorConfig {
            timeout_ms: 20,
            ..GeneratorConfig::default()
        });

        let err = generator.generate::<Tip>(&task()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(20)));
        assert!(err.is_transient());
        assert_eq!(generator.audit().stats().await.timed_out, 1);
    }

    #[tokio::test]
    async fn test_falls_through_to_available_backend() {
        let down = Arc::new(MockBackend::new("down").with_available(false));
        let up = Arc::new(MockBackend::new("up").with_response(r#"{"text": "ok", "minutes": 2}"#));
        let generator = StructuredGenerator::new(vec![
            Arc::clone(&down) as Arc<dyn LlmBackend>,
            Arc::clone(&up) as Arc<dyn LlmBackend>,
        ]);

        let _: Tip = generator.generate(&task()).await.unwrap();
        assert_eq!(down.call_count(), 0);
        assert_eq!(up.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_backend() {
        let generator = StructuredGenerator::new(vec![]);
        let err = generator.generate::<Tip>(&task()).await.unwrap_err();
        assert!(matches!(err, GenerationError::NoBackendAvailable));
    }
}
