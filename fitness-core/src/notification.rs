//! Notification types emitted by the advisor.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What situation a notification addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    StepReminder,
    MealReminder,
    WorkoutReminder,
    ProgressCelebration,
    CalorieWarning,
    HydrationReminder,
    CircleChallenge,
    AccountabilityCheck,
    InfluencerMotivation,
}

/// How urgently a notification should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// The single most relevant behavioral message for a user right now.
///
/// Built fresh for every decision and never persisted. The circle-aware
/// enhancer may append one line to `message` before it is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BehavioralNotification {
    #[serde(rename = "notification_type")]
    pub kind: NotificationKind,
    pub message: String,
    pub urgency: Urgency,
    /// Signal values that triggered the notification
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub suggested_action: Option<String>,
}

impl BehavioralNotification {
    pub fn new(kind: NotificationKind, urgency: Urgency, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            urgency,
            context: HashMap::new(),
            suggested_action: None,
        }
    }

    /// Add a context value.
    pub fn with_context(mut self, key: &str, value: impl Serialize) -> Self {
        self.context.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or_default(),
        );
        self
    }

    /// Set the suggested action.
    pub fn with_suggested_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    /// Append a paragraph to the message.
    pub fn append_line(&mut self, line: &str) {
        self.message.push_str("\n\n");
        self.message.push_str(line);
    }
}

/// A notification scoped to a circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleNotification {
    #[serde(rename = "notification_type")]
    pub kind: NotificationKind,
    pub message: String,
    pub circle_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub recipient_ids: Vec<String>,
    #[serde(default)]
    pub challenge_id: Option<String>,
    #[serde(default)]
    pub post_id: Option<String>,
    pub urgency: Urgency,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

impl CircleNotification {
    /// Create an unread, medium-urgency circle notification.
    pub fn new(
        kind: NotificationKind,
        message: impl Into<String>,
        circle_id: impl Into<String>,
        sender_id: impl Into<String>,
        recipient_ids: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            circle_id: circle_id.into(),
            sender_id: sender_id.into(),
            recipient_ids,
            challenge_id: None,
            post_id: None,
            urgency: Urgency::Medium,
            created_at: now,
            is_read: false,
        }
    }

    /// Link to a challenge.
    pub fn for_challenge(mut self, challenge_id: impl Into<String>) -> Self {
        self.challenge_id = Some(challenge_id.into());
        self
    }

    /// Link to an influencer post.
    pub fn for_post(mut self, post_id: impl Into<String>) -> Self {
        self.post_id = Some(post_id.into());
        self
    }
}
