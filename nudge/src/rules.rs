//! Local notification rules.
//!
//! Each rule is a total function over a profile and a tracking snapshot that
//! either abstains or produces a finished notification. [`RuleSet`] runs
//! them in a fixed priority order: steps, then meals, then calories. The
//! first rule that fires wins.

use chrono::NaiveTime;
use tracing::debug;

use fitness_core::{
    BehavioralNotification, DailyTracking, FitnessGoal, FitnessProfile, MealSlot,
    NotificationKind, Urgency,
};

use crate::config::RuleThresholds;
use crate::types::{Decision, FallbackContext};

/// Inputs of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub profile: &'a FitnessProfile,
    pub tracking: &'a DailyTracking,
    /// Effective time of day
    pub time: NaiveTime,
}

impl<'a> RuleContext<'a> {
    /// Resolve the effective time against the caller's wall clock.
    pub fn new(
        profile: &'a FitnessProfile,
        tracking: &'a DailyTracking,
        wall_clock: NaiveTime,
    ) -> Self {
        Self {
            profile,
            tracking,
            time: tracking.effective_time(wall_clock),
        }
    }
}

/// A single behavioral signal.
pub trait NotificationRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` means the rule abstains.
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<BehavioralNotification>;
}

/// Too few steps past midday.
#[derive(Debug, Clone, Copy)]
pub struct StepRule {
    pub check_after: NaiveTime,
    pub step_floor: u32,
}

impl NotificationRule for StepRule {
    fn name(&self) -> &'static str {
        "step"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<BehavioralNotification> {
        let tracking = ctx.tracking;
        if ctx.time < self.check_after || tracking.steps_taken >= self.step_floor {
            return None;
        }

        let remaining = tracking.steps_remaining();
        let message = format!(
            "Only {} steps so far today. You need {} more to reach your {} step goal, \
             and a 30-minute walk adds roughly 3,000.",
            tracking.steps_taken, remaining, tracking.steps_goal
        );

        Some(
            BehavioralNotification::new(NotificationKind::StepReminder, Urgency::High, message)
                .with_context("steps_taken", tracking.steps_taken)
                .with_context("steps_goal", tracking.steps_goal)
                .with_context("steps_remaining", remaining)
                .with_context("time", ctx.time.to_string())
                .with_suggested_action(
                    "Take a 30-minute walk or spread movement through the rest of the day",
                ),
        )
    }
}

/// Unlogged breakfast, else unlogged lunch.
#[derive(Debug, Clone, Copy)]
pub struct MealRule {
    pub breakfast_after: NaiveTime,
    pub lunch_after: NaiveTime,
}

impl MealRule {
    fn reminder(ctx: &RuleContext<'_>, slot: MealSlot, message: &str, action: &str) -> BehavioralNotification {
        let logged: Vec<&str> = ctx.tracking.meals_logged.iter().map(MealSlot::as_str).collect();
        BehavioralNotification::new(NotificationKind::MealReminder, Urgency::Medium, message)
            .with_context("missing_meal", slot.as_str())
            .with_context("meals_logged", logged)
            .with_context("time", ctx.time.to_string())
            .with_suggested_action(action)
    }
}

impl NotificationRule for MealRule {
    fn name(&self) -> &'static str {
        "meal"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<BehavioralNotification> {
        if ctx.time >= self.breakfast_after && !ctx.tracking.has_logged(MealSlot::Breakfast) {
            Some(Self::reminder(
                ctx,
                MealSlot::Breakfast,
                "No breakfast logged yet. A balanced first meal keeps your energy and \
                 metabolism steady through the morning.",
                "Log your breakfast or plan your next meal",
            ))
        } else if ctx.time >= self.lunch_after && !ctx.tracking.has_logged(MealSlot::Lunch) {
            Some(Self::reminder(
                ctx,
                MealSlot::Lunch,
                "Time for lunch. Skipping meals tends to mean overeating later; aim for \
                 protein and vegetables.",
                "Log your lunch or plan a healthy meal",
            ))
        } else {
            None
        }
    }
}

/// Calorie budget nearly spent. Weight-loss goals only.
#[derive(Debug, Clone, Copy)]
pub struct CalorieRule {
    pub warning_ratio: f64,
}

impl NotificationRule for CalorieRule {
    fn name(&self) -> &'static str {
        "calorie"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<BehavioralNotification> {
        let tracking = ctx.tracking;
        if ctx.profile.fitness_goal != FitnessGoal::WeightLoss {
            return None;
        }
        if f64::from(tracking.calories_consumed) <= self.warning_ratio * f64::from(tracking.calories_goal) {
            return None;
        }

        let remaining = tracking.calories_remaining();
        let message = format!(
            "You've had {} calories today, leaving {} within your weight loss target.",
            tracking.calories_consumed, remaining
        );

        Some(
            BehavioralNotification::new(NotificationKind::CalorieWarning, Urgency::High, message)
                .with_context("calories_consumed", tracking.calories_consumed)
                .with_context("calories_goal", tracking.calories_goal)
                .with_context("calories_remaining", remaining)
                .with_suggested_action("Choose lower-calorie options for your remaining meals"),
        )
    }
}

/// The three rules in priority order.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub step: StepRule,
    pub meal: MealRule,
    pub calorie: CalorieRule,
}

impl RuleSet {
    pub fn new(thresholds: &RuleThresholds) -> Self {
        Self {
            step: StepRule {
                check_after: thresholds.step_check_after,
                step_floor: thresholds.step_floor,
            },
            meal: MealRule {
                breakfast_after: thresholds.breakfast_after,
                lunch_after: thresholds.lunch_after,
            },
            calorie: CalorieRule {
                warning_ratio: thresholds.calorie_warning_ratio,
            },
        }
    }

    /// Run the chain. Always yields a decision; abstention of every rule
    /// yields the generative fallback.
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Decision {
        let decision = if let Some(n) = self.step.evaluate(ctx) {
            Decision::Step(n)
        } else if let Some(n) = self.meal.evaluate(ctx) {
            Decision::Meal(n)
        } else if let Some(n) = self.calorie.evaluate(ctx) {
            Decision::Calorie(n)
        } else {
            Decision::GenerativeFallback(Box::new(FallbackContext {
                profile: ctx.profile.clone(),
                tracking: ctx.tracking.clone(),
                effective_time: ctx.time,
            }))
        };

        debug!(
            user_id = %ctx.profile.user_id(),
            time = %ctx.time,
            decision = decision.label(),
            "Rules evaluated"
        );
        decision
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(&RuleThresholds::default())
    }
}
