//! CoachService - the coaching tasks offered to the advisor.
//!
//! Every task assembles a prompt, asks the generator for a typed draft and
//! turns the draft into a domain object. Identifiers and timestamps are
//! always filled locally, never taken from model output.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use fitness_core::{
    BehavioralNotification, Circle, CircleNotification, DailyTracking, FitnessProfile,
    FitnessReport, NotificationKind, PostContent, Urgency,
};

use crate::audit::AuditLog;
use crate::backend::traits::LlmBackend;
use crate::generator::{GenerationError, GeneratorConfig, StructuredGenerator};
use crate::prompt::{CoachTask, PromptAssembler};

/// Number of candidate messages behind a report's notification.
pub const CANDIDATE_COUNT: usize = 5;

/// Candidate notification messages for one profile.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationCandidates {
    /// Exactly five short messages
    pub messages: Vec<String>,
}

/// Model-drafted part of a circle notification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CircleNotificationDraft {
    pub notification_type: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub urgency: Urgency,
    /// User ids to notify; empty means every other member
    #[serde(default)]
    pub recipient_ids: Vec<String>,
}

/// Generative coaching collaborator.
pub struct CoachService {
    generator: StructuredGenerator,
}

impl CoachService {
    pub fn new(generator: StructuredGenerator) -> Self {
        Self { generator }
    }

    /// Service over `backends` with default generator settings.
    pub fn from_backends(backends: Vec<Arc<dyn LlmBackend>>) -> Self {
        Self::new(StructuredGenerator::new(backends))
    }

    pub fn with_config(self, config: GeneratorConfig) -> Self {
        Self::new(self.generator.with_config(config))
    }

    pub fn generator(&self) -> &StructuredGenerator {
        &self.generator
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        self.generator.audit()
    }

    /// Five goal-specific notification messages.
    pub async fn notification_candidates(
        &self,
        profile: &FitnessProfile,
    ) -> Result<Vec<String>, GenerationError> {
        let task = PromptAssembler::task(
            CoachTask::NotificationCandidates,
            format!(
                "Generate {CANDIDATE_COUNT} personalized notification messages for someone \
                 with fitness goal: {}. Make them specific to their goal and encouraging \
                 for their fitness journey.",
                profile.fitness_goal.as_str()
            ),
        );

        let mut candidates: NotificationCandidates = self.generator.generate(&task).await?;
        candidates.messages.retain(|m| !m.trim().is_empty());
        candidates.messages.truncate(CANDIDATE_COUNT);
        Ok(candidates.messages)
    }

    /// Full report. The notification message is chosen from fresh candidates.
    pub async fn fitness_report(
        &self,
        profile: &FitnessProfile,
    ) -> Result<FitnessReport, GenerationError> {
        let candidates = self.notification_candidates(profile).await?;

        let task = PromptAssembler::task(
            CoachTask::FitnessReport,
            "Create the fitness report for this user.",
        )
        .with_context(PromptAssembler::profile_section(profile))
        .with_context(PromptAssembler::candidates_section(&candidates));

        let report: FitnessReport = self.generator.generate(&task).await?;
        info!(
            user_id = %profile.user_id(),
            exercises = report.workout_plan.len(),
            meals = report.meal_plan.len(),
            daily_calories = report.daily_calories,
            "Fitness report generated"
        );
        Ok(report)
    }

    /// Free-form behavioral notification for when no local rule applies.
    ///
    /// `time` is the effective time of day the rules were evaluated at.
    pub async fn behavioral_notification(
        &self,
        profile: &FitnessProfile,
        tracking: &DailyTracking,
        time: NaiveTime,
    ) -> Result<BehavioralNotification, GenerationError> {
        let task = PromptAssembler::task(
            CoachTask::BehavioralNotification,
            "Analyze the user's current progress and generate an appropriate behavioral notification.",
        )
        .with_context(PromptAssembler::profile_section(profile))
        .with_context(PromptAssembler::tracking_section(tracking))
        .with_context(PromptAssembler::time_section(time));

        self.generator.generate(&task).await
    }

    /// Circle notification sent by `profile`.
    ///
    /// Recipients named by the model are narrowed to actual members other
    /// than the sender. When none remain, every other member is addressed.
    pub async fn circle_notification(
        &self,
        profile: &FitnessProfile,
        circle: &Circle,
        now: DateTime<Utc>,
    ) -> Result<CircleNotification, GenerationError> {
        let task = PromptAssembler::task(
            CoachTask::CircleNotification,
            format!(
                "Draft a notification from {} to the {} circle.",
                profile.user_id(),
                circle.name
            ),
        )
        .with_context(PromptAssembler::profile_section(profile))
        .with_context(PromptAssembler::circle_section(circle));

        let draft: CircleNotificationDraft = self.generator.generate(&task).await?;
        Ok(finish_circle_notification(draft, profile, circle, now))
    }

    /// Post content for an influencer. Authorization is the caller's concern.
    pub async fn influencer_content(
        &self,
        profile: &FitnessProfile,
        circle: &Circle,
    ) -> Result<PostContent, GenerationError> {
        let task = PromptAssembler::task(
            CoachTask::InfluencerContent,
            format!(
                "Generate a motivational post for a {} in a {} circle. Make it engaging \
                 and specific to the circle's fitness goals.",
                profile.circle_rank.as_str(),
                circle.circle_goal.as_str()
            ),
        )
        .with_context(PromptAssembler::profile_section(profile))
        .with_context(PromptAssembler::circle_section(circle));

        self.generator.generate(&task).await
    }
}

fn finish_circle_notification(
    draft: CircleNotificationDraft,
    sender: &FitnessProfile,
    circle: &Circle,
    now: DateTime<Utc>,
) -> CircleNotification {
    let sender_id = sender.user_id();
    let others = circle
        .members()
        .iter()
        .map(|m| m.user_id.as_str())
        .filter(|id| *id != sender_id);

    let mut recipients: Vec<String> = others
        .clone()
        .filter(|id| draft.recipient_ids.iter().any(|r| r.as_str() == *id))
        .map(str::to_string)
        .collect();
    if recipients.is_empty() {
        recipients = others.map(str::to_string).collect();
    }

    let mut notification = CircleNotification::new(
        draft.notification_type,
        draft.message,
        &circle.circle_id,
        sender_id,
        recipients,
        now,
    );
    notification.urgency = draft.urgency;
    notification
}
