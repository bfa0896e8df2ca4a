//! Circle-aware enhancement of a selected notification.

use tracing::debug;

use fitness_core::{BehavioralNotification, Circle, FitnessProfile};

/// Appends at most one social line to a notification.
///
/// An influencer-tier member is reminded of their followers. Any other
/// member with an active streak is congratulated on it.
pub struct CircleEnhancer;

impl CircleEnhancer {
    /// Absent notifications pass through without a circle lookup.
    pub fn enhance(
        notification: Option<BehavioralNotification>,
        profile: &FitnessProfile,
        circle: Option<&Circle>,
    ) -> Option<BehavioralNotification> {
        let mut notification = notification?;
        let Some(circle) = circle else {
            return Some(notification);
        };

        if let Some(line) = Self::social_line(profile, circle) {
            debug!(
                user_id = %profile.user_id(),
                circle_id = %circle.circle_id,
                "Notification enhanced with circle context"
            );
            notification.append_line(&line);
        }
        Some(notification)
    }

    fn social_line(profile: &FitnessProfile, circle: &Circle) -> Option<String> {
        let member = circle.find(profile.user_id())?;

        if member.rank.is_influencer() {
            Some(format!(
                "As a {}, your progress inspires {} followers!",
                member.rank.as_str(),
                profile.follower_count()
            ))
        } else if member.current_streak > 0 {
            Some(format!(
                "You're on a {}-day streak! Keep it up!",
                member.current_streak
            ))
        } else {
            None
        }
    }
}
