//! Configuration for the advisor.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use coach_agent::{CoachService, GeneratorConfig, LlmBackend, LlmError, OpenAiBackend};
use fitness_core::PromotionThresholds;

use crate::types::{NudgeError, Result};

/// Top-level configuration. Every section is optional in YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub rules: RuleThresholds,
    pub promotion: PromotionThresholds,
    pub fallback: FallbackConfig,
    pub agent: AgentConfig,
    pub general: GeneralConfig,
}

impl NudgeConfig {
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Read a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NudgeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
            .map_err(|e| NudgeError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Thresholds of the local notification rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Step reminders start at this time
    #[serde(with = "clock_time")]
    pub step_check_after: NaiveTime,
    /// Fewer steps than this triggers a reminder
    pub step_floor: u32,
    #[serde(with = "clock_time")]
    pub breakfast_after: NaiveTime,
    #[serde(with = "clock_time")]
    pub lunch_after: NaiveTime,
    /// Fraction of the calorie goal above which weight-loss users are warned
    pub calorie_warning_ratio: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            step_check_after: hm(12, 0),
            step_floor: 2000,
            breakfast_after: hm(10, 0),
            lunch_after: hm(14, 0),
            calorie_warning_ratio: 0.8,
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Fallback to the generative collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// When false, "no rule fired" means "no notification"
    pub enabled: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// OpenAI-compatible collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Endpoint; the public OpenAI API when absent
    pub base_url: Option<String>,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub output_retries: u32,
    pub timeout_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: coach_agent::backend::openai::DEFAULT_MODEL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            output_retries: 3,
            timeout_ms: 30_000,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

impl AgentConfig {
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            output_retries: self.output_retries,
            timeout_ms: self.timeout_ms,
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        }
    }

    pub fn backend(&self) -> std::result::Result<OpenAiBackend, LlmError> {
        let api_key = std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty());
        match &self.base_url {
            Some(base_url) => OpenAiBackend::new(base_url.as_str(), self.model.as_str(), api_key),
            None => {
                let api_key = api_key.ok_or_else(|| {
                    LlmError::Configuration(format!("{} is not set", self.api_key_env))
                })?;
                OpenAiBackend::openai(&self.model, api_key)
            }
        }
    }

    /// Coach backed by the configured endpoint.
    pub fn coach_service(&self) -> std::result::Result<CoachService, LlmError> {
        let backend: Arc<dyn LlmBackend> = Arc::new(self.backend()?);
        Ok(CoachService::from_backends(vec![backend]).with_config(self.generator_config()))
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Level for this crate's logs
    pub log_level: String,
    /// Append circle context to notifications
    pub enhance_with_circle: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enhance_with_circle: true,
        }
    }
}

impl GeneralConfig {
    /// Tracing directive for the `nudge` target, e.g. `nudge=debug`.
    pub fn log_directive(&self) -> String {
        format!("nudge={}", self.log_level.trim())
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(value: &str) -> std::result::Result<NaiveTime, chrono::ParseError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
}

/// Serde adapter writing times of day as `HH:MM`.
mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock(&raw).map_err(serde::de::Error::custom)
    }
}
