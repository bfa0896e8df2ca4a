//! FitnessAdvisor - the entry point binaries and services call.
//!
//! Owns the selector, the optional coach and the circle hub. Every
//! time-dependent call reads the injected [`Clock`] once and threads the
//! values down, so nothing below this layer touches the wall clock.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, Utc};
use tracing::{debug, info, warn};

use coach_agent::CoachService;
use fitness_core::{
    BehavioralNotification, CircleError, CircleHub, CircleNotification, DailyTracking,
    FitnessProfile, FitnessReport, InfluencerPost, RankPolicy,
};

use crate::config::NudgeConfig;
use crate::enhancer::CircleEnhancer;
use crate::selector::ContextualSelector;
use crate::types::{NudgeError, Result};

/// Source of "now".
pub trait Clock: Send + Sync {
    /// Instant used for timestamps.
    fn now(&self) -> DateTime<Utc>;

    /// Local time of day used by time-gated rules.
    fn time_of_day(&self) -> NaiveTime;
}

/// The system clock. Rules see local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn time_of_day(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
    pub time_of_day: NaiveTime,
}

impl FixedClock {
    /// Frozen at `now`, with rules seeing its UTC time of day.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            time_of_day: now.time(),
        }
    }

    pub fn with_time_of_day(mut self, time_of_day: NaiveTime) -> Self {
        self.time_of_day = time_of_day;
        self
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn time_of_day(&self) -> NaiveTime {
        self.time_of_day
    }
}

/// Fitness advisor facade.
pub struct FitnessAdvisor {
    config: NudgeConfig,
    selector: ContextualSelector,
    coach: Option<Arc<CoachService>>,
    hub: Arc<CircleHub>,
    clock: Arc<dyn Clock>,
}

impl FitnessAdvisor {
    /// Advisor without a coach, with an empty hub using the configured
    /// promotion thresholds.
    pub fn new(config: NudgeConfig) -> Self {
        let hub = Arc::new(CircleHub::with_policy(RankPolicy::new(config.promotion)));
        Self {
            selector: ContextualSelector::builder().config(&config).build(),
            config,
            coach: None,
            hub,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_coach(mut self, coach: Arc<CoachService>) -> Self {
        self.selector = ContextualSelector::builder()
            .config(&self.config)
            .coach(Arc::clone(&coach))
            .build();
        self.coach = Some(coach);
        self
    }

    /// Share an existing hub.
    pub fn with_hub(mut self, hub: Arc<CircleHub>) -> Self {
        self.hub = hub;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &NudgeConfig {
        &self.config
    }

    pub fn selector(&self) -> &ContextualSelector {
        &self.selector
    }

    pub fn hub(&self) -> &Arc<CircleHub> {
        &self.hub
    }

    fn coach(&self) -> Result<&CoachService> {
        self.coach.as_deref().ok_or(NudgeError::NoCoach)
    }

    /// Generate the full fitness report for a profile.
    pub async fn analyze_profile(&self, profile: &FitnessProfile) -> Result<FitnessReport> {
        let report = self.coach()?.fitness_report(profile).await?;
        Ok(report)
    }

    /// Most relevant notification right now, without circle context.
    pub async fn contextual_notification(
        &self,
        profile: &FitnessProfile,
        tracking: &DailyTracking,
    ) -> Result<Option<BehavioralNotification>> {
        self.selector
            .select(profile, tracking, self.clock.time_of_day())
            .await
    }

    /// Most relevant notification, enhanced with the user's standing in
    /// `circle_id`. The circle is only read when a notification was selected.
    pub async fn contextual_notification_with_circle(
        &self,
        profile: &FitnessProfile,
        tracking: &DailyTracking,
        circle_id: Option<&str>,
    ) -> Result<Option<BehavioralNotification>> {
        let base = self.contextual_notification(profile, tracking).await?;

        let circle_id = match circle_id {
            Some(id) if base.is_some() && self.config.general.enhance_with_circle => id,
            _ => return Ok(base),
        };

        let circle = self.hub.snapshot(circle_id).await?;
        Ok(CircleEnhancer::enhance(base, profile, Some(&circle)))
    }

    /// Generate and publish an influencer post.
    ///
    /// The author's rank is checked before generation so unauthorized
    /// requests never reach the coach. The draft is then published through
    /// the circle's own influencer gate. An unreachable or slow coach yields
    /// `Ok(None)` and nothing is published.
    pub async fn influencer_post(
        &self,
        profile: &FitnessProfile,
        circle_id: &str,
    ) -> Result<Option<InfluencerPost>> {
        let circle = self.hub.snapshot(circle_id).await?;
        let authorized = circle
            .find(profile.user_id())
            .is_some_and(|m| m.rank.is_influencer());
        if !authorized {
            debug!(user_id = %profile.user_id(), circle_id, "Influencer post refused before generation");
            return Err(CircleError::NotAuthorized {
                user_id: profile.user_id().to_string(),
                action: "post as an influencer",
            }
            .into());
        }

        let content = match self.coach()?.influencer_content(profile, &circle).await {
            Ok(content) => content,
            Err(e) if e.is_transient() => {
                warn!(
                    user_id = %profile.user_id(),
                    circle_id,
                    error = %e,
                    "Influencer content generation failed, nothing posted"
                );
                return Ok(None);
            }
            Err(e) => return Err(NudgeError::Generation(e)),
        };
        let post = self
            .hub
            .create_influencer_post(circle_id, profile, content, self.clock.now())
            .await?;

        info!(
            circle_id,
            post_id = %post.post_id,
            influencer_id = %post.influencer_id,
            "Influencer post published"
        );
        Ok(Some(post))
    }

    /// Generate a notification from a member to the rest of the circle.
    pub async fn circle_notification(
        &self,
        profile: &FitnessProfile,
        circle_id: &str,
    ) -> Result<CircleNotification> {
        let circle = self.hub.snapshot(circle_id).await?;
        if circle.find(profile.user_id()).is_none() {
            return Err(CircleError::MemberNotFound(profile.user_id().to_string()).into());
        }

        let notification = self
            .coach()?
            .circle_notification(profile, &circle, self.clock.now())
            .await?;
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use coach_agent::{LlmBackend, LlmError, MockBackend};
    use fitness_core::{CircleRank, CircleSettings, FitnessGoal, MealSlot, NotificationKind};
    use serde_json::json;

    fn clock() -> Arc<dyn Clock> {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 13, 0, 0).unwrap();
        Arc::new(FixedClock::at(now))
    }

    fn coach(backend: &Arc<MockBackend>) -> Arc<CoachService> {
        Arc::new(CoachService::from_backends(vec![
            Arc::clone(backend) as Arc<dyn LlmBackend>
        ]))
    }

    fn profile(name: &str) -> FitnessProfile {
        FitnessProfile::new(name, "Lagos", FitnessGoal::WeightLoss)
    }

    fn lazy_morning() -> DailyTracking {
        DailyTracking::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .with_steps(300, 10_000)
            .with_meal(MealSlot::Breakfast)
    }

    /// Advisor whose hub holds one circle: Host, Ife (influencer) and Tunde
    /// (follower on a streak).
    async fn advisor_with_circle(backend: &Arc<MockBackend>) -> (FitnessAdvisor, String) {
        let advisor = FitnessAdvisor::new(NudgeConfig::default())
            .with_coach(coach(backend))
            .with_clock(clock());
        let now = advisor.clock.now();
        let hub = advisor.hub();

        let mut host = profile("Host");
        let circle_id = hub
            .create(&mut host, CircleSettings::new("Walkers", FitnessGoal::WeightLoss), now)
            .unwrap();
        for name in ["Ife", "Tunde"] {
            hub.join(&circle_id, &mut profile(name), now).await.unwrap();
        }
        hub.promote(&circle_id, "Ife", CircleRank::Influencer, now).await.unwrap();
        hub.credit_activity(&circle_id, "Tunde", 3, 40, now).await.unwrap();
        (advisor, circle_id)
    }

    #[tokio::test]
    async fn test_fixed_clock_drives_rules() {
        let advisor = FitnessAdvisor::new(NudgeConfig::default()).with_clock(clock());
        let n = advisor
            .contextual_notification(&profile("Ada"), &lazy_morning())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n.kind, NotificationKind::StepReminder);

        let early: Arc<dyn Clock> = Arc::new(FixedClock::at(Utc::now()).with_time_of_day(
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        ));
        let advisor = FitnessAdvisor::new(NudgeConfig::default()).with_clock(early);
        assert!(advisor
            .contextual_notification(&profile("Ada"), &lazy_morning())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_analyze_profile_requires_coach() {
        let advisor = FitnessAdvisor::new(NudgeConfig::default());
        let err = advisor.analyze_profile(&profile("Ada")).await.unwrap_err();
        assert!(matches!(err, NudgeError::NoCoach));
    }

    #[tokio::test]
    async fn test_circle_enhancement() {
        let backend = Arc::new(MockBackend::default());
        let (advisor, circle_id) = advisor_with_circle(&backend).await;

        let n = advisor
            .contextual_notification_with_circle(&profile("Tunde"), &lazy_morning(), Some(&circle_id))
            .await
            .unwrap()
            .unwrap();
        assert!(n.message.ends_with("You're on a 3-day streak! Keep it up!"));

        let plain = advisor
            .contextual_notification_with_circle(&profile("Tunde"), &lazy_morning(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(!plain.message.contains("streak"));
    }

    #[tokio::test]
    async fn test_no_circle_lookup_without_notification() {
        let advisor = FitnessAdvisor::new(NudgeConfig::default()).with_clock(clock());
        let quiet = lazy_morning().with_steps(9000, 10_000).with_meal(MealSlot::Lunch);

        // Unknown circle is never read because nothing was selected.
        let result = advisor
            .contextual_notification_with_circle(&profile("Ada"), &quiet, Some("missing"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_enhancement_can_be_disabled() {
        let backend = Arc::new(MockBackend::default());
        let (advisor, circle_id) = advisor_with_circle(&backend).await;
        let mut config = NudgeConfig::default();
        config.general.enhance_with_circle = false;
        let advisor = FitnessAdvisor::new(config)
            .with_hub(Arc::clone(advisor.hub()))
            .with_clock(clock());

        let n = advisor
            .contextual_notification_with_circle(&profile("Tunde"), &lazy_morning(), Some(&circle_id))
            .await
            .unwrap()
            .unwrap();
        assert!(!n.message.contains("streak"));
    }

    #[tokio::test]
    async fn test_influencer_post_gate_skips_generation() {
        let backend = Arc::new(MockBackend::default().with_response(
            json!({"content": "Hydrate and go", "post_type": "tip"}).to_string(),
        ));
        let (advisor, circle_id) = advisor_with_circle(&backend).await;

        let err = advisor.influencer_post(&profile("Host"), &circle_id).await.unwrap_err();
        assert!(matches!(err, NudgeError::Circle(CircleError::NotAuthorized { .. })));
        assert_eq!(backend.call_count(), 0);

        let post = advisor
            .influencer_post(&profile("Ife"), &circle_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(post.influencer_id, "Ife");
        assert_eq!(post.circle_id, circle_id);
        assert_eq!(post.content, "Hydrate and go");
        assert_eq!(post.created_at, clock().now());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_influencer_post_degrades_on_network_error() {
        let backend = Arc::new(MockBackend::default());
        backend.push_error(LlmError::NetworkError("connection reset".to_string()));
        let (advisor, circle_id) = advisor_with_circle(&backend).await;

        let post = advisor.influencer_post(&profile("Ife"), &circle_id).await.unwrap();
        assert!(post.is_none());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_influencer_post_propagates_schema_failure() {
        let backend = Arc::new(MockBackend::default().with_response("Just keep moving!"));
        let (advisor, circle_id) = advisor_with_circle(&backend).await;

        let err = advisor.influencer_post(&profile("Ife"), &circle_id).await.unwrap_err();
        assert!(matches!(err, NudgeError::Generation(_)));
    }

    #[tokio::test]
    async fn test_circle_notification_requires_membership() {
        let backend = Arc::new(MockBackend::default().with_response(
            json!({"notification_type": "circle_challenge", "message": "Weekend hike?"}).to_string(),
        ));
        let (advisor, circle_id) = advisor_with_circle(&backend).await;

        let err = advisor
            .circle_notification(&profile("Stranger"), &circle_id)
            .await
            .unwrap_err();
        assert!(matches!(err, NudgeError::Circle(CircleError::MemberNotFound(_))));

        let n = advisor.circle_notification(&profile("Ife"), &circle_id).await.unwrap();
        assert_eq!(n.sender_id, "Ife");
        assert_eq!(n.recipient_ids, vec!["Host", "Tunde"]);
        assert_eq!(n.created_at, clock().now());
    }

    #[tokio::test]
    async fn test_unknown_circle() {
        let backend = Arc::new(MockBackend::default());
        let (advisor, _) = advisor_with_circle(&backend).await;
        let err = advisor.circle_notification(&profile("Ife"), "nope").await.unwrap_err();
        assert!(matches!(err, NudgeError::Circle(CircleError::CircleNotFound(_))));
    }
}
