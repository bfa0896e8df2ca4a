//! Prompt assembly for coaching tasks.
//!
//! Each task has a fixed role prompt. Profile, tracking and circle state are
//! rendered into labelled sections that the generator appends to it.

use chrono::NaiveTime;
use serde::Serialize;

use fitness_core::{Circle, DailyTracking, FitnessProfile};

use crate::generator::GenerationTask;

/// The coaching tasks the collaborator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoachTask {
    FitnessReport,
    NotificationCandidates,
    BehavioralNotification,
    CircleNotification,
    InfluencerContent,
}

impl CoachTask {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FitnessReport => "fitness_report",
            Self::NotificationCandidates => "notification_candidates",
            Self::BehavioralNotification => "behavioral_notification",
            Self::CircleNotification => "circle_notification",
            Self::InfluencerContent => "influencer_content",
        }
    }

    fn role(&self) -> &'static str {
        match self {
            Self::FitnessReport => {
                "Create a personalized fitness report from the user's information: \
                 a workout plan, a meal plan, daily calories, a macro split, tips and \
                 a weekly schedule."
            }
            Self::NotificationCandidates => {
                "Generate personalized notification messages based on the user's \
                 fitness goals and current status."
            }
            Self::BehavioralNotification => {
                "Generate contextual behavioral notifications based on the user's \
                 current progress versus their goals. Consider their fitness goal, \
                 the current time and what they should be doing now."
            }
            Self::CircleNotification => {
                "Generate circle-specific notifications and manage accountability \
                 features for fitness communities. Consider the user's rank, the \
                 circle's goal and its community dynamics."
            }
            Self::InfluencerContent => {
                "Generate motivational and educational content for fitness \
                 influencers to share with their followers. Make it resonate with \
                 the circle's goal and reflect the influencer's ability to inspire."
            }
        }
    }
}

/// Builds generation tasks from domain state.
pub struct PromptAssembler;

impl PromptAssembler {
    /// A task with the role prompt for `kind` and no context yet.
    pub fn task(kind: CoachTask, instruction: impl Into<String>) -> GenerationTask {
        let mut system = String::from("# ROLE\n\n");
        system.push_str(kind.role());
        system.push_str("\nBe specific, encouraging and brief. Never give medical diagnoses.");
        GenerationTask::new(kind.label(), system, instruction)
    }

    pub fn profile_section(profile: &FitnessProfile) -> String {
        Self::section("USER PROFILE", profile)
    }

    pub fn tracking_section(tracking: &DailyTracking) -> String {
        Self::section("CURRENT DAILY PROGRESS", tracking)
    }

    /// Time of day the notification is for.
    pub fn time_section(time: NaiveTime) -> String {
        format!("## CURRENT TIME\n\n{}", time.format("%H:%M"))
    }

    /// Circle summary: settings plus one line per member.
    ///
    /// Members are listed in leaderboard order so the model sees who leads.
    pub fn circle_section(circle: &Circle) -> String {
        let mut out = String::from("## CIRCLE\n\n");
        out.push_str(&format!(
            "- name: {}\n- goal: {}\n- members: {}/{}\n",
            circle.name,
            circle.circle_goal.as_str(),
            circle.member_count(),
            circle.max_members
        ));
        if !circle.description.is_empty() {
            out.push_str(&format!("- description: {}\n", circle.description));
        }
        if !circle.tags.is_empty() {
            out.push_str(&format!("- tags: {}\n", circle.tags.join(", ")));
        }

        out.push_str("\n### MEMBERS\n\n");
        for member in circle.leaderboard() {
            out.push_str(&format!(
                "- {} ({}): {} points, {} day streak\n",
                member.user_id,
                member.rank.as_str(),
                member.total_points,
                member.current_streak
            ));
        }
        out
    }

    /// Numbered list of candidate messages for the report task.
    pub fn candidates_section(candidates: &[String]) -> String {
        let mut out = String::from("## NOTIFICATION CANDIDATES\n\n");
        for (i, candidate) in candidates.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, candidate));
        }
        out.push_str(
            "\nPick the single best message from this list and use it verbatim as \
             `notification_message`.\n",
        );
        out
    }

    fn section(title: &str, value: &impl Serialize) -> String {
        let body = serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!("\"<unavailable: {e}>\""));
        format!("## {title}\n\n```json\n{body}\n```")
    }
}
