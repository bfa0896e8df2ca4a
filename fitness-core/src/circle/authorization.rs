//! Privilege-gated circle actions.
//!
//! Three independent gates, each resolving the actor's member record first:
//!
//! | action                     | allowed ranks                         |
//! |----------------------------|---------------------------------------|
//! | create challenge           | Leader and influencer tiers           |
//! | initiate accountability    | Leader and influencer tiers           |
//! | post as influencer         | influencer tiers only (not Leader)    |
//!
//! A refused action constructs nothing and has no side effect.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::profile::FitnessProfile;

use super::types::{Circle, CircleError, CircleRank, Member, Result};

/// What a challenge measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    Steps,
    Workout,
    Nutrition,
    Streak,
}

/// Parameters for a new challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeSpec {
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub target_value: u32,
    pub duration_days: u32,
    pub points_reward: u32,
}

/// A time-boxed goal shared by a circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleChallenge {
    pub challenge_id: String,
    pub circle_id: String,
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub target_value: u32,
    pub duration_days: u32,
    pub points_reward: u32,
    pub created_by: String,
    /// Every member at creation time is opted in
    pub participants: Vec<String>,
    #[serde(default)]
    pub completed_by: Vec<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

/// Cadence or purpose of an accountability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Daily,
    Weekly,
    Challenge,
    Motivation,
}

/// A prompt asking specific members to report status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountabilityCheck {
    pub check_id: String,
    pub circle_id: String,
    pub initiated_by: String,
    /// Only ids of actual members, in circle order
    pub target_members: Vec<String>,
    pub message: String,
    pub check_type: CheckType,
    pub created_at: DateTime<Utc>,
    /// user id -> response
    #[serde(default)]
    pub responses: HashMap<String, String>,
    #[serde(default)]
    pub is_completed: bool,
}

impl AccountabilityCheck {
    /// Record a target's response. Completes the check once every target answered.
    ///
    /// Responses from non-targets are ignored.
    pub fn record_response(&mut self, user_id: &str, response: impl Into<String>) -> bool {
        if !self.target_members.iter().any(|t| t == user_id) {
            return false;
        }
        self.responses.insert(user_id.to_string(), response.into());
        self.is_completed = self
            .target_members
            .iter()
            .all(|t| self.responses.contains_key(t));
        true
    }
}

/// Kind of influencer post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Motivation,
    Progress,
    Challenge,
    Tip,
}

/// Content of an influencer post, written by hand or drafted by the coach.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PostContent {
    pub content: String,
    pub post_type: PostType,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// A post shared with a circle by an influencer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluencerPost {
    pub post_id: String,
    pub influencer_id: String,
    pub circle_id: String,
    pub content: String,
    pub post_type: PostType,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_featured: bool,
}

impl Circle {
    fn authorize(
        &self,
        actor: &FitnessProfile,
        action: &'static str,
        allowed: fn(&CircleRank) -> bool,
    ) -> Result<&Member> {
        let member = self
            .find(actor.user_id())
            .filter(|m| allowed(&m.rank))
            .ok_or_else(|| CircleError::NotAuthorized {
                user_id: actor.user_id().to_string(),
                action,
            })?;

        debug!(
            circle_id = %self.circle_id,
            user_id = %member.user_id,
            rank = member.rank.as_str(),
            action,
            "Action authorized"
        );
        Ok(member)
    }

    /// Create a challenge open to every current member.
    pub fn create_challenge(
        &self,
        actor: &FitnessProfile,
        spec: ChallengeSpec,
        now: DateTime<Utc>,
    ) -> Result<CircleChallenge> {
        let creator = self.authorize(actor, "create challenges", CircleRank::is_privileged)?;
        let end_date = now
            .checked_add_signed(Duration::days(i64::from(spec.duration_days)))
            .ok_or(CircleError::ChallengeOutOfRange {
                duration_days: spec.duration_days,
            })?;

        let challenge = CircleChallenge {
            challenge_id: uuid::Uuid::new_v4().to_string(),
            circle_id: self.circle_id.clone(),
            title: spec.title,
            description: spec.description,
            challenge_type: spec.challenge_type,
            target_value: spec.target_value,
            duration_days: spec.duration_days,
            points_reward: spec.points_reward,
            created_by: creator.user_id.clone(),
            participants: self.member_ids(),
            completed_by: Vec::new(),
            start_date: now,
            end_date,
            is_active: true,
        };

        info!(
            circle_id = %self.circle_id,
            challenge_id = %challenge.challenge_id,
            participants = challenge.participants.len(),
            "Challenge created"
        );

        Ok(challenge)
    }

    /// Ask members to report status. Targets that are not members are dropped.
    pub fn initiate_accountability_check(
        &self,
        actor: &FitnessProfile,
        targets: &[String],
        message: impl Into<String>,
        check_type: CheckType,
        now: DateTime<Utc>,
    ) -> Result<AccountabilityCheck> {
        let initiator =
            self.authorize(actor, "initiate accountability checks", CircleRank::is_privileged)?;

        let target_members: Vec<String> = self
            .members
            .iter()
            .filter(|m| targets.contains(&m.user_id))
            .map(|m| m.user_id.clone())
            .collect();

        if target_members.len() < targets.len() {
            debug!(
                circle_id = %self.circle_id,
                requested = targets.len(),
                kept = target_members.len(),
                "Dropped accountability targets outside the circle"
            );
        }

        Ok(AccountabilityCheck {
            check_id: uuid::Uuid::new_v4().to_string(),
            circle_id: self.circle_id.clone(),
            initiated_by: initiator.user_id.clone(),
            target_members,
            message: message.into(),
            check_type,
            created_at: now,
            responses: HashMap::new(),
            is_completed: false,
        })
    }

    /// Post to the circle as an influencer.
    pub fn create_influencer_post(
        &self,
        actor: &FitnessProfile,
        content: PostContent,
        now: DateTime<Utc>,
    ) -> Result<InfluencerPost> {
        let influencer = self.authorize(actor, "post as an influencer", CircleRank::is_influencer)?;

        Ok(InfluencerPost {
            post_id: uuid::Uuid::new_v4().to_string(),
            influencer_id: influencer.user_id.clone(),
            circle_id: self.circle_id.clone(),
            content: content.content,
            post_type: content.post_type,
            media_urls: content.media_urls,
            likes: 0,
            comments: Vec::new(),
            created_at: now,
            is_featured: false,
        })
    }
}
