//! Core types for notification selection.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use coach_agent::GenerationError;
use fitness_core::{BehavioralNotification, CircleError, DailyTracking, FitnessProfile};

/// Everything the generative collaborator needs when no rule applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackContext {
    pub profile: FitnessProfile,
    pub tracking: DailyTracking,
    /// Time of day the rules were evaluated at
    pub effective_time: NaiveTime,
}

/// Outcome of running the rule chain once.
///
/// The first three variants carry a finished notification. The fallback
/// variant defers to the collaborator and carries its full input.
#[derive(Debug, Clone)]
pub enum Decision {
    Step(BehavioralNotification),
    Meal(BehavioralNotification),
    Calorie(BehavioralNotification),
    GenerativeFallback(Box<FallbackContext>),
}

impl Decision {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Step(_) => "step",
            Self::Meal(_) => "meal",
            Self::Calorie(_) => "calorie",
            Self::GenerativeFallback(_) => "generative_fallback",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::GenerativeFallback(_))
    }

    /// The locally produced notification, if a rule fired.
    pub fn notification(&self) -> Option<&BehavioralNotification> {
        match self {
            Self::Step(n) | Self::Meal(n) | Self::Calorie(n) => Some(n),
            Self::GenerativeFallback(_) => None,
        }
    }

    pub fn into_notification(self) -> Option<BehavioralNotification> {
        match self {
            Self::Step(n) | Self::Meal(n) | Self::Calorie(n) => Some(n),
            Self::GenerativeFallback(_) => None,
        }
    }
}

/// Error types for the advisor.
#[derive(Debug, thiserror::Error)]
pub enum NudgeError {
    /// Circle operation refused
    #[error("Circle error: {0}")]
    Circle(#[from] CircleError),

    /// Generative collaborator failed in a way that cannot be absorbed
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Operation needs a coach but none is configured
    #[error("No coach configured")]
    NoCoach,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, NudgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use fitness_core::{FitnessGoal, NotificationKind, Urgency};

    #[test]
    fn test_decision_accessors() {
        let step = Decision::Step(BehavioralNotification::new(
            NotificationKind::StepReminder,
            Urgency::High,
            "Move",
        ));
        assert_eq!(step.label(), "step");
        assert!(step.notification().is_some());
        assert!(!step.is_fallback());

        let fallback = Decision::GenerativeFallback(Box::new(FallbackContext {
            profile: FitnessProfile::new("Ada", "Lagos", FitnessGoal::Strength),
            tracking: DailyTracking::new(chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
            effective_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        }));
        assert!(fallback.is_fallback());
        assert!(fallback.into_notification().is_none());
    }
}
