//! Rank promotion policy.
//!
//! Promotion is a pure function of a member's streak, points and current
//! rank. Rules are evaluated in order and the first match wins:
//!
//! 1. Follower with a streak of at least `follower_streak_days` becomes Member
//! 2. Member with at least `member_points` points becomes Leader
//!
//! There is no demotion path; ranks above Leader are only reachable through
//! an explicit administrative promotion.

use serde::{Deserialize, Serialize};

use super::types::{CircleRank, Member};

/// Activity thresholds for automatic promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionThresholds {
    /// Streak a Follower needs to become a Member
    pub follower_streak_days: u32,
    /// Points a Member needs to become a Leader
    pub member_points: u64,
}

impl Default for PromotionThresholds {
    fn default() -> Self {
        Self {
            follower_streak_days: 7,
            member_points: 1000,
        }
    }
}

/// Maps a member's activity counters to the rank they are allowed to hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankPolicy {
    thresholds: PromotionThresholds,
}

impl RankPolicy {
    pub fn new(thresholds: PromotionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PromotionThresholds {
        &self.thresholds
    }

    /// The rank a member should hold after one promotion step.
    pub fn next_rank(&self, member: &Member) -> CircleRank {
        self.evaluate(member.rank, member.current_streak, member.total_points)
    }

    /// Total over (rank, streak, points). Unchanged when no rule matches.
    pub fn evaluate(&self, rank: CircleRank, current_streak: u32, total_points: u64) -> CircleRank {
        match rank {
            CircleRank::Follower if current_streak >= self.thresholds.follower_streak_days => {
                CircleRank::Member
            }
            CircleRank::Member if total_points >= self.thresholds.member_points => {
                CircleRank::Leader
            }
            unchanged => unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follower_with_week_streak_becomes_member() {
        let policy = RankPolicy::default();
        for streak in [7, 8, 30, 365] {
            assert_eq!(
                policy.evaluate(CircleRank::Follower, streak, 0),
                CircleRank::Member
            );
        }
        assert_eq!(policy.evaluate(CircleRank::Follower, 6, 50_000), CircleRank::Follower);
    }

    #[test]
    fn test_single_step_per_evaluation() {
        let policy = RankPolicy::default();
        // A follower with both thresholds met only moves one step.
        assert_eq!(policy.evaluate(CircleRank::Follower, 10, 5_000), CircleRank::Member);
        assert_eq!(policy.evaluate(CircleRank::Member, 10, 5_000), CircleRank::Leader);
    }

    #[test]
    fn test_member_points_threshold() {
        let policy = RankPolicy::default();
        assert_eq!(policy.evaluate(CircleRank::Member, 0, 999), CircleRank::Member);
        assert_eq!(policy.evaluate(CircleRank::Member, 0, 1000), CircleRank::Leader);
    }

    #[test]
    fn test_idempotent_at_ceiling() {
        let policy = RankPolicy::default();
        let mut rank = CircleRank::Leader;
        for _ in 0..5 {
            rank = policy.evaluate(rank, 100, 100_000);
        }
        assert_eq!(rank, CircleRank::Leader);

        for tier in [
            CircleRank::Influencer,
            CircleRank::CommunityInfluencer,
            CircleRank::BigInfluencer,
        ] {
            assert_eq!(policy.evaluate(tier, 100, 100_000), tier);
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let policy = RankPolicy::new(PromotionThresholds {
            follower_streak_days: 3,
            member_points: 200,
        });
        assert_eq!(policy.evaluate(CircleRank::Follower, 3, 0), CircleRank::Member);
        assert_eq!(policy.evaluate(CircleRank::Member, 0, 200), CircleRank::Leader);
    }
}
