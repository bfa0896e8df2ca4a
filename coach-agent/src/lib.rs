//! Coach Agent - generative coaching collaborator
//!
//! Wraps LLM backends behind typed coaching tasks:
//! - Trait-based backends (OpenAI-compatible, scripted mock)
//! - Structured output checked against a JSON schema, with bounded retries
//! - Prompt assembly from profile, tracking and circle state
//! - Audit trail of every generation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             CoachService                │
//! │  (report, candidates, notifications,    │
//! │   influencer content)                   │
//! └────────────────┬────────────────────────┘
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │          StructuredGenerator            │
//! │  schema ─► complete ─► parse ─► retry   │
//! └────────────────┬────────────────────────┘
//!                  ▼
//!          ┌──────────────┐
//!          │  LlmBackend  │
//!          │ (OpenAI/Mock)│
//!          └──────────────┘
//! ```

pub mod audit;
pub mod backend;
pub mod generator;
pub mod prompt;
pub mod service;

pub use audit::{AuditLog, AuditStats, GenerationOutcome, GenerationRecord};
pub use backend::{LlmBackend, LlmError, MockBackend, OpenAiBackend};
pub use generator::{GenerationError, GenerationTask, GeneratorConfig, StructuredGenerator};
pub use prompt::{CoachTask, PromptAssembler};
pub use service::{CircleNotificationDraft, CoachService, NotificationCandidates};
