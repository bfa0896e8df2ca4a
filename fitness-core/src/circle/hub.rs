//! Concurrent directory of circles.
//!
//! Each circle sits behind its own `RwLock`. Mutations hold the write lock
//! for their whole duration, so capacity and uniqueness checks cannot race
//! with another writer on the same circle. Different circles never contend.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::profile::FitnessProfile;

use super::authorization::{
    AccountabilityCheck, ChallengeSpec, CheckType, CircleChallenge, InfluencerPost, PostContent,
};
use super::rank::RankPolicy;
use super::types::{Circle, CircleError, CircleRank, CircleSettings, Member, ProgressUpdate, Result};

/// Directory of live circles keyed by circle id.
pub struct CircleHub {
    circles: DashMap<String, Arc<RwLock<Circle>>>,
    policy: RankPolicy,
}

impl CircleHub {
    /// Create an empty hub with the default rank policy.
    pub fn new() -> Self {
        Self::with_policy(RankPolicy::default())
    }

    pub fn with_policy(policy: RankPolicy) -> Self {
        Self {
            circles: DashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &RankPolicy {
        &self.policy
    }

    /// Create a circle and register it. Returns the new circle id.
    pub fn create(
        &self,
        creator: &mut FitnessProfile,
        settings: CircleSettings,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let circle = Circle::create(creator, settings, now)?;
        let circle_id = circle.circle_id.clone();
        self.insert(circle)?;
        Ok(circle_id)
    }

    /// Register an existing circle, replacing any circle with the same id.
    /// Circles that fail [`Circle::validate`] are rejected.
    pub fn insert(&self, circle: Circle) -> Result<()> {
        circle.validate()?;
        self.circles
            .insert(circle.circle_id.clone(), Arc::new(RwLock::new(circle)));
        Ok(())
    }

    pub fn remove(&self, circle_id: &str) -> Option<Arc<RwLock<Circle>>> {
        self.circles.remove(circle_id).map(|(_, circle)| circle)
    }

    pub fn len(&self) -> usize {
        self.circles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    fn handle(&self, circle_id: &str) -> Result<Arc<RwLock<Circle>>> {
        // Clone the Arc out so no DashMap shard guard is held across an await.
        self.circles
            .get(circle_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CircleError::CircleNotFound(circle_id.to_string()))
    }

    /// Point-in-time copy of a circle.
    pub async fn snapshot(&self, circle_id: &str) -> Result<Circle> {
        let handle = self.handle(circle_id)?;
        let circle = handle.read().await;
        Ok(circle.clone())
    }

    pub async fn join(
        &self,
        circle_id: &str,
        profile: &mut FitnessProfile,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let handle = self.handle(circle_id)?;
        let mut circle = handle.write().await;
        circle.join(profile, now)
    }

    pub async fn find(&self, circle_id: &str, user_id: &str) -> Result<Option<Member>> {
        let handle = self.handle(circle_id)?;
        let circle = handle.read().await;
        Ok(circle.find(user_id).cloned())
    }

    pub async fn promote(
        &self,
        circle_id: &str,
        user_id: &str,
        new_rank: CircleRank,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let handle = self.handle(circle_id)?;
        let mut circle = handle.write().await;
        circle.promote(user_id, new_rank, now)
    }

    pub async fn credit_activity(
        &self,
        circle_id: &str,
        user_id: &str,
        current_streak: u32,
        points_earned: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let handle = self.handle(circle_id)?;
        let mut circle = handle.write().await;
        circle.credit_activity(user_id, current_streak, points_earned, now)
    }

    /// Report progress using the hub's rank policy.
    pub async fn update_progress(
        &self,
        circle_id: &str,
        user_id: &str,
        progress: ProgressUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<CircleRank>> {
        let handle = self.handle(circle_id)?;
        let mut circle = handle.write().await;
        circle.update_progress(user_id, progress, &self.policy, now)
    }

    /// Owned leaderboard copy.
    pub async fn leaderboard(&self, circle_id: &str) -> Result<Vec<Member>> {
        let handle = self.handle(circle_id)?;
        let circle = handle.read().await;
        Ok(circle.leaderboard().into_iter().cloned().collect())
    }

    pub async fn create_challenge(
        &self,
        circle_id: &str,
        actor: &FitnessProfile,
        spec: ChallengeSpec,
        now: DateTime<Utc>,
    ) -> Result<CircleChallenge> {
        let handle = self.handle(circle_id)?;
        let circle = handle.read().await;
        circle.create_challenge(actor, spec, now)
    }

    pub async fn initiate_accountability_check(
        &self,
        circle_id: &str,
        actor: &FitnessProfile,
        targets: &[String],
        message: impl Into<String>,
        check_type: CheckType,
        now: DateTime<Utc>,
    ) -> Result<AccountabilityCheck> {
        let handle = self.handle(circle_id)?;
        let circle = handle.read().await;
        circle.initiate_accountability_check(actor, targets, message, check_type, now)
    }

    pub async fn create_influencer_post(
        &self,
        circle_id: &str,
        actor: &FitnessProfile,
        content: PostContent,
        now: DateTime<Utc>,
    ) -> Result<InfluencerPost> {
        let handle = self.handle(circle_id)?;
        let circle = handle.read().await;
        let post = circle.create_influencer_post(actor, content, now)?;
        debug!(circle_id, post_id = %post.post_id, "Influencer post created");
        Ok(post)
    }
}

impl Default for CircleHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::FitnessGoal;

    fn profile(name: &str) -> FitnessProfile {
        FitnessProfile::new(name, "Lagos", FitnessGoal::WeightLoss)
    }

    #[tokio::test]
    async fn test_hub_round_trip() {
        let hub = CircleHub::new();
        let now = Utc::now();
        let mut host = profile("Host");
        let circle_id = hub
            .create(&mut host, CircleSettings::new("Walkers", FitnessGoal::WeightLoss), now)
            .unwrap();

        let mut tunde = profile("Tunde");
        hub.join(&circle_id, &mut tunde, now).await.unwrap();
        hub.credit_activity(&circle_id, "Tunde", 7, 40, now).await.unwrap();

        let promoted = hub
            .update_progress(&circle_id, "Tunde", ProgressUpdate::default(), now)
            .await
            .unwrap();
        assert_eq!(promoted, Some(CircleRank::Member));

        let board = hub.leaderboard(&circle_id).await.unwrap();
        assert_eq!(board[0].user_id, "Tunde");
        assert_eq!(hub.find(&circle_id, "Tunde").await.unwrap().unwrap().rank, CircleRank::Member);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_circle() {
        let hub = CircleHub::new();
        let mut host = profile("Host");
        let mut circle = Circle::create(
            &mut host,
            CircleSettings::new("Walkers", FitnessGoal::WeightLoss).with_max_members(2),
            Utc::now(),
        )
        .unwrap();
        circle.join(&mut profile("Tunde"), Utc::now()).unwrap();
        circle.max_members = 1;
        let circle_id = circle.circle_id.clone();

        let err = hub.insert(circle).unwrap_err();
        assert!(matches!(err, CircleError::CapacityExceeded { .. }));
        assert!(hub.snapshot(&circle_id).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_circle() {
        let hub = CircleHub::new();
        let err = hub.snapshot("missing").await.unwrap_err();
        assert_eq!(err, CircleError::CircleNotFound("missing".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_respect_capacity() {
        let hub = Arc::new(CircleHub::new());
        let now = Utc::now();
        let mut host = profile("Host");
        let circle_id = hub
            .create(
                &mut host,
                CircleSettings::new("Tiny", FitnessGoal::Strength).with_max_members(5),
                now,
            )
            .unwrap();

        let mut tasks = Vec::new();
        for i in 0..20 {
            let hub = Arc::clone(&hub);
            let circle_id = circle_id.clone();
            tasks.push(tokio::spawn(async move {
                let mut joiner = profile(&format!("user-{i}"));
                hub.join(&circle_id, &mut joiner, now).await.is_ok()
            }));
        }

        let mut joined = 0;
        for task in tasks {
            if task.await.unwrap() {
                joined += 1;
            }
        }

        assert_eq!(joined, 4);
        assert_eq!(hub.snapshot(&circle_id).await.unwrap().member_count(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_joins_admit_once() {
        let hub = Arc::new(CircleHub::new());
        let now = Utc::now();
        let mut host = profile("Host");
        let circle_id = hub
            .create(&mut host, CircleSettings::new("Walkers", FitnessGoal::WeightLoss), now)
            .unwrap();

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let hub = Arc::clone(&hub);
            let circle_id = circle_id.clone();
            tasks.push(tokio::spawn(async move {
                let mut same = profile("Tunde");
                hub.join(&circle_id, &mut same, now).await.is_ok()
            }));
        }

        let mut admitted = 0;
        for task in tasks {
            if task.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(hub.snapshot(&circle_id).await.unwrap().member_count(), 2);
    }
}
