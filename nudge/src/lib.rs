//! Nudge - contextual notifications for the fitness advisor
//!
//! Picks the one notification that matters most right now:
//!
//! - **Local rules**: step, meal and calorie signals in strict priority order
//! - **Generative fallback**: the coach drafts a notification when no rule fires
//! - **Circle enhancement**: one social line based on the user's circle standing
//! - **Facade**: [`FitnessAdvisor`] ties selection, circles and the coach together
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   FitnessAdvisor                     │
//! │                                                      │
//! │  ┌────────────┐   ┌──────────┐   ┌───────────────┐   │
//! │  │  RuleSet   │──►│ Decision │──►│ CircleEnhancer│   │
//! │  └────────────┘   └────┬─────┘   └───────────────┘   │
//! │                        │ fallback                    │
//! │                ┌───────▼───────┐   ┌─────────────┐   │
//! │                │ CoachService  │   │  CircleHub  │   │
//! │                └───────────────┘   └─────────────┘   │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod advisor;
pub mod config;
pub mod enhancer;
pub mod rules;
pub mod selector;
pub mod types;

// Re-export main types
pub use advisor::{Clock, FitnessAdvisor, FixedClock, SystemClock};
pub use config::{AgentConfig, FallbackConfig, GeneralConfig, NudgeConfig, RuleThresholds};
pub use enhancer::CircleEnhancer;
pub use rules::{CalorieRule, MealRule, NotificationRule, RuleContext, RuleSet, StepRule};
pub use selector::{ContextualSelector, SelectorBuilder};
pub use types::*;
