//! Core circle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::{FitnessGoal, FitnessProfile};

/// Default capacity of a circle.
pub const DEFAULT_MAX_MEMBERS: usize = 100;

/// A member's standing within a circle, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleRank {
    #[default]
    Follower,
    Member,
    Leader,
    Influencer,
    CommunityInfluencer,
    BigInfluencer,
}

impl CircleRank {
    /// Ranks allowed to create challenges and initiate accountability checks.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            Self::Leader | Self::Influencer | Self::CommunityInfluencer | Self::BigInfluencer
        )
    }

    /// Influencer tiers. Strictly narrower than [`is_privileged`](Self::is_privileged):
    /// a Leader is privileged but not an influencer.
    pub fn is_influencer(&self) -> bool {
        matches!(
            self,
            Self::Influencer | Self::CommunityInfluencer | Self::BigInfluencer
        )
    }

    /// Wire name, as shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follower => "follower",
            Self::Member => "member",
            Self::Leader => "leader",
            Self::Influencer => "influencer",
            Self::CommunityInfluencer => "community_influencer",
            Self::BigInfluencer => "big_influencer",
        }
    }
}

/// A user's record inside one circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub name: String,
    pub rank: CircleRank,
    pub fitness_goal: FitnessGoal,
    /// Consecutive active days
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub total_points: u64,
    #[serde(default)]
    pub followers_count: u32,
    #[serde(default)]
    pub following_count: u32,
    pub last_active: DateTime<Utc>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub location: String,
    #[serde(default)]
    pub is_online: bool,
}

impl Member {
    /// A fresh, online member record for a profile.
    pub fn from_profile(profile: &FitnessProfile, rank: CircleRank, now: DateTime<Utc>) -> Self {
        Self {
            user_id: profile.user_id().to_string(),
            name: profile.name.clone(),
            rank,
            fitness_goal: profile.fitness_goal,
            current_streak: 0,
            total_points: 0,
            followers_count: profile.followers.len() as u32,
            following_count: profile.following.len() as u32,
            last_active: now,
            profile_picture: None,
            bio: None,
            location: profile.location.clone(),
            is_online: true,
        }
    }
}

/// A bounded social group of goal-aligned members.
///
/// Member order is join order. Members are only reachable through the
/// registry operations in [`registry`](super::registry), which keep
/// `members.len() <= max_members` and user ids unique. A deserialized circle
/// must pass [`Circle::validate`] before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub circle_id: String,
    pub name: String,
    pub description: String,
    /// User id of the creator
    pub created_by: String,
    #[serde(default)]
    pub(crate) members: Vec<Member>,
    #[serde(default = "default_max_members")]
    pub max_members: usize,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub total_challenges_completed: u32,
    pub circle_goal: FitnessGoal,
    #[serde(default)]
    pub circle_theme: Option<String>,
}

fn default_max_members() -> usize {
    DEFAULT_MAX_MEMBERS
}

fn default_true() -> bool {
    true
}

impl Circle {
    /// Members in join order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_members
    }

    /// User ids of all members, in join order.
    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.user_id.clone()).collect()
    }
}

/// Settings for creating a circle.
#[derive(Debug, Clone)]
pub struct CircleSettings {
    pub name: String,
    pub description: String,
    pub circle_goal: FitnessGoal,
    pub max_members: usize,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub circle_theme: Option<String>,
}

impl CircleSettings {
    pub fn new(name: impl Into<String>, circle_goal: FitnessGoal) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            circle_goal,
            max_members: DEFAULT_MAX_MEMBERS,
            is_public: true,
            tags: Vec::new(),
            circle_theme: None,
        }
    }

    /// Builder: set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set capacity.
    pub fn with_max_members(mut self, max_members: usize) -> Self {
        self.max_members = max_members;
        self
    }

    /// Builder: set tags.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: make the circle private.
    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }
}

/// Activity reported alongside a progress update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub steps_taken: u32,
    pub calories_consumed: u32,
    pub workouts_completed: u32,
}

/// Error types for circle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CircleError {
    /// Join attempted on a full circle
    #[error("Circle {circle_id} is at capacity ({max_members} members)")]
    CapacityExceeded { circle_id: String, max_members: usize },

    /// Join attempted by an existing member
    #[error("{user_id} is already a member of circle {circle_id}")]
    DuplicateMember { circle_id: String, user_id: String },

    /// Privileged action by a non-member or insufficient rank
    #[error("{user_id} is not authorized to {action}")]
    NotAuthorized { user_id: String, action: &'static str },

    /// Target member does not exist
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Circle id unknown to the hub
    #[error("Circle not found: {0}")]
    CircleNotFound(String),

    /// Challenge end date is not representable
    #[error("A {duration_days}-day challenge ends outside the supported date range")]
    ChallengeOutOfRange { duration_days: u32 },
}

pub type Result<T> = std::result::Result<T, CircleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileged_and_influencer_sets() {
        let privileged: Vec<_> = [
            CircleRank::Follower,
            CircleRank::Member,
            CircleRank::Leader,
            CircleRank::Influencer,
            CircleRank::CommunityInfluencer,
            CircleRank::BigInfluencer,
        ]
        .into_iter()
        .filter(CircleRank::is_privileged)
        .collect();
        assert_eq!(privileged.len(), 4);
        assert!(!privileged.contains(&CircleRank::Member));

        assert!(CircleRank::Leader.is_privileged());
        assert!(!CircleRank::Leader.is_influencer());
        assert!(CircleRank::BigInfluencer.is_influencer());
        assert!(!CircleRank::Follower.is_privileged());
    }

    #[test]
    fn test_rank_wire_names() {
        let value = serde_json::to_value(CircleRank::CommunityInfluencer).unwrap();
        assert_eq!(value, "community_influencer");
        assert_eq!(CircleRank::CommunityInfluencer.as_str(), "community_influencer");
    }
}
