//! Membership registry operations on a [`Circle`].
//!
//! Each operation either applies completely or leaves the circle untouched.
//! Operations take an explicit `now` so callers control the clock.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::profile::FitnessProfile;

use super::rank::RankPolicy;
use super::types::{
    Circle, CircleError, CircleRank, CircleSettings, Member, ProgressUpdate, Result,
};

impl Circle {
    /// Create a circle with `creator` as its first member.
    ///
    /// The creator starts as Leader when their profile rank is an influencer
    /// tier, else as Member.
    pub fn create(
        creator: &mut FitnessProfile,
        settings: CircleSettings,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let circle_id = uuid::Uuid::new_v4().to_string();

        if settings.max_members == 0 {
            return Err(CircleError::CapacityExceeded {
                circle_id,
                max_members: 0,
            });
        }

        let creator_rank = if creator.is_influencer() {
            CircleRank::Leader
        } else {
            CircleRank::Member
        };

        let circle = Self {
            circle_id,
            name: settings.name,
            description: settings.description,
            created_by: creator.user_id().to_string(),
            members: vec![Member::from_profile(creator, creator_rank, now)],
            max_members: settings.max_members,
            is_public: settings.is_public,
            tags: settings.tags,
            created_at: now,
            last_activity: now,
            total_challenges_completed: 0,
            circle_goal: settings.circle_goal,
            circle_theme: settings.circle_theme,
        };

        creator.record_circle(&circle.circle_id);

        info!(
            circle_id = %circle.circle_id,
            creator = %circle.created_by,
            rank = creator_rank.as_str(),
            "Circle created"
        );

        Ok(circle)
    }

    /// Add `profile` to the circle.
    ///
    /// Influencer-tier profiles join as Member, everyone else as Follower.
    pub fn join(&mut self, profile: &mut FitnessProfile, now: DateTime<Utc>) -> Result<()> {
        if self.is_full() {
            return Err(CircleError::CapacityExceeded {
                circle_id: self.circle_id.clone(),
                max_members: self.max_members,
            });
        }

        if self.find(profile.user_id()).is_some() {
            return Err(CircleError::DuplicateMember {
                circle_id: self.circle_id.clone(),
                user_id: profile.user_id().to_string(),
            });
        }

        let rank = if profile.is_influencer() {
            CircleRank::Member
        } else {
            CircleRank::Follower
        };

        self.members.push(Member::from_profile(profile, rank, now));
        profile.record_circle(&self.circle_id);
        self.last_activity = now;

        info!(
            circle_id = %self.circle_id,
            user_id = %profile.user_id(),
            rank = rank.as_str(),
            members = self.members.len(),
            "Member joined circle"
        );

        Ok(())
    }

    /// Check the membership invariants of a circle built outside the
    /// registry, e.g. loaded from a file.
    pub fn validate(&self) -> Result<()> {
        if self.members.len() > self.max_members {
            return Err(CircleError::CapacityExceeded {
                circle_id: self.circle_id.clone(),
                max_members: self.max_members,
            });
        }

        for (i, member) in self.members.iter().enumerate() {
            if self.members[..i].iter().any(|m| m.user_id == member.user_id) {
                return Err(CircleError::DuplicateMember {
                    circle_id: self.circle_id.clone(),
                    user_id: member.user_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// First member with the given user id.
    pub fn find(&self, user_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    fn find_mut(&mut self, user_id: &str) -> Result<&mut Member> {
        self.members
            .iter_mut()
            .find(|m| m.user_id == user_id)
            .ok_or_else(|| CircleError::MemberNotFound(user_id.to_string()))
    }

    /// Administrative rank overwrite. Not checked against the rank policy.
    pub fn promote(&mut self, user_id: &str, new_rank: CircleRank, now: DateTime<Utc>) -> Result<()> {
        let member = self.find_mut(user_id)?;
        let previous = member.rank;
        member.rank = new_rank;
        self.last_activity = now;

        info!(
            circle_id = %self.circle_id,
            user_id,
            from = previous.as_str(),
            to = new_rank.as_str(),
            "Member rank set"
        );

        Ok(())
    }

    /// Record externally maintained streak and earned points for a member.
    ///
    /// Points only accumulate; they never decrease.
    pub fn credit_activity(
        &mut self,
        user_id: &str,
        current_streak: u32,
        points_earned: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let member = self.find_mut(user_id)?;
        member.current_streak = current_streak;
        member.total_points = member.total_points.saturating_add(points_earned);
        self.last_activity = now;
        Ok(())
    }

    /// Mark a member active and apply one step of the rank policy.
    ///
    /// Streak and points are read as they are; they must already be current.
    /// Returns the new rank when the member was promoted.
    pub fn update_progress(
        &mut self,
        user_id: &str,
        progress: ProgressUpdate,
        policy: &RankPolicy,
        now: DateTime<Utc>,
    ) -> Result<Option<CircleRank>> {
        let circle_id = self.circle_id.clone();
        let member = self.find_mut(user_id)?;

        member.last_active = now;
        member.is_online = true;

        debug!(
            circle_id = %circle_id,
            user_id,
            steps = progress.steps_taken,
            calories = progress.calories_consumed,
            workouts = progress.workouts_completed,
            "Progress reported"
        );

        let next = policy.next_rank(member);
        let promoted = if next != member.rank {
            info!(
                circle_id = %circle_id,
                user_id,
                from = member.rank.as_str(),
                to = next.as_str(),
                streak = member.current_streak,
                points = member.total_points,
                "Member promoted"
            );
            member.rank = next;
            Some(next)
        } else {
            None
        };

        self.last_activity = now;
        Ok(promoted)
    }

    /// Members ordered by points, then streak, both descending.
    ///
    /// Ties keep join order.
    pub fn leaderboard(&self) -> Vec<&Member> {
        let mut board: Vec<&Member> = self.members.iter().collect();
        board.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| b.current_streak.cmp(&a.current_streak))
        });
        board
    }
}
