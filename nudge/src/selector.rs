//! Contextual notification selector - local rules with a generative fallback.
//!
//! [`ContextualSelector::decide`] is pure and deterministic for a given wall
//! clock. [`ContextualSelector::select`] additionally resolves the fallback
//! through the coach:
//!
//! - unreachable, failing or slow coach: no notification
//! - output that never matched its schema: [`NudgeError::Generation`]
//! - no coach or fallback disabled: no notification

use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{debug, info, warn};

use coach_agent::CoachService;
use fitness_core::{BehavioralNotification, DailyTracking, FitnessProfile};

use crate::config::{NudgeConfig, RuleThresholds};
use crate::rules::{RuleContext, RuleSet};
use crate::types::{Decision, NudgeError, Result};

/// Picks the single most relevant notification for a user.
pub struct ContextualSelector {
    rules: RuleSet,
    coach: Option<Arc<CoachService>>,
    fallback_enabled: bool,
}

impl ContextualSelector {
    /// Default thresholds, no coach.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SelectorBuilder {
        SelectorBuilder::new()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn has_coach(&self) -> bool {
        self.coach.is_some()
    }

    /// Run the rule chain.
    pub fn decide(
        &self,
        profile: &FitnessProfile,
        tracking: &DailyTracking,
        wall_clock: NaiveTime,
    ) -> Decision {
        self.rules
            .evaluate(&RuleContext::new(profile, tracking, wall_clock))
    }

    /// Decide, then resolve a fallback decision through the coach.
    pub async fn select(
        &self,
        profile: &FitnessProfile,
        tracking: &DailyTracking,
        wall_clock: NaiveTime,
    ) -> Result<Option<BehavioralNotification>> {
        let decision = self.decide(profile, tracking, wall_clock);
        self.resolve(decision).await
    }

    /// Turn a decision into a notification.
    pub async fn resolve(&self, decision: Decision) -> Result<Option<BehavioralNotification>> {
        let context = match decision {
            Decision::GenerativeFallback(context) => context,
            local => return Ok(local.into_notification()),
        };

        let coach = match (&self.coach, self.fallback_enabled) {
            (Some(coach), true) => coach,
            _ => {
                debug!(user_id = %context.profile.user_id(), "No rule fired and fallback is off");
                return Ok(None);
            }
        };

        info!(user_id = %context.profile.user_id(), "Falling back to coach for notification");
        match coach
            .behavioral_notification(&context.profile, &context.tracking, context.effective_time)
            .await
        {
            Ok(notification) => Ok(Some(notification)),
            Err(e) if e.is_transient() => {
                warn!(
                    user_id = %context.profile.user_id(),
                    error = %e,
                    "Coach fallback failed, no notification"
                );
                Ok(None)
            }
            Err(e) => Err(NudgeError::Generation(e)),
        }
    }
}

impl Default for ContextualSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ContextualSelector`].
pub struct SelectorBuilder {
    thresholds: RuleThresholds,
    coach: Option<Arc<CoachService>>,
    fallback_enabled: bool,
}

impl SelectorBuilder {
    pub fn new() -> Self {
        Self {
            thresholds: RuleThresholds::default(),
            coach: None,
            fallback_enabled: true,
        }
    }

    /// Thresholds and fallback switch from a config.
    pub fn config(mut self, config: &NudgeConfig) -> Self {
        self.thresholds = config.rules;
        self.fallback_enabled = config.fallback.enabled;
        self
    }

    pub fn thresholds(mut self, thresholds: RuleThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn coach(mut self, coach: Arc<CoachService>) -> Self {
        self.coach = Some(coach);
        self
    }

    pub fn fallback_enabled(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    pub fn build(self) -> ContextualSelector {
        ContextualSelector {
            rules: RuleSet::new(&self.thresholds),
            coach: self.coach,
            fallback_enabled: self.fallback_enabled,
        }
    }
}

impl Default for SelectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
