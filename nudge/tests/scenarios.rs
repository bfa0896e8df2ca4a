//! End-to-end notification selection scenarios.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use coach_agent::{CoachService, GeneratorConfig, LlmBackend, LlmError, MockBackend};
use fitness_core::{
    DailyTracking, FitnessGoal, FitnessProfile, MealSlot, NotificationKind, Urgency,
};
use nudge::{ContextualSelector, Decision, NudgeError};

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn day() -> DailyTracking {
    DailyTracking::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
}

fn profile(goal: FitnessGoal) -> FitnessProfile {
    FitnessProfile::new("Sample", "Lagos", goal)
}

/// The wall clock passed alongside trackings that carry their own time.
fn midnight() -> NaiveTime {
    at(0, 0)
}

#[tokio::test]
async fn low_steps_at_noon() {
    let selector = ContextualSelector::new();
    let tracking = day().with_steps(200, 10_000).at(at(12, 0));

    let n = selector
        .select(&profile(FitnessGoal::Strength), &tracking, midnight())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(n.kind, NotificationKind::StepReminder);
    assert_eq!(n.urgency, Urgency::High);
    assert!(n.message.contains("200"));
    assert!(n.message.contains("9800"));
    assert_eq!(n.context["steps_taken"], 200);
    assert_eq!(n.context["steps_remaining"], 9800);
    assert!(n.suggested_action.unwrap().contains("walk"));
}

#[tokio::test]
async fn lunch_missing_after_two() {
    let selector = ContextualSelector::new();
    let tracking = day()
        .with_steps(5000, 10_000)
        .with_meal(MealSlot::Breakfast)
        .at(at(14, 0));

    let n = selector
        .select(&profile(FitnessGoal::Strength), &tracking, midnight())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(n.kind, NotificationKind::MealReminder);
    assert_eq!(n.urgency, Urgency::Medium);
    assert_eq!(n.context["missing_meal"], "lunch");
}

#[tokio::test]
async fn calorie_budget_nearly_spent() {
    let selector = ContextualSelector::new();
    let tracking = day()
        .with_steps(8000, 10_000)
        .with_calories(1300, 1500)
        .with_meal(MealSlot::Breakfast)
        .with_meal(MealSlot::Lunch)
        .at(at(16, 0));

    let n = selector
        .select(&profile(FitnessGoal::WeightLoss), &tracking, midnight())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(n.kind, NotificationKind::CalorieWarning);
    assert_eq!(n.urgency, Urgency::High);
    assert!(n.message.contains("1300"));
    assert!(n.message.contains("200"));
    assert_eq!(n.context["calories_consumed"], 1300);
    assert_eq!(n.context["calories_remaining"], 200);
}

#[test]
fn low_steps_always_win_after_noon() {
    let selector = ContextualSelector::new();
    let goals = [
        FitnessGoal::HealthyLiving,
        FitnessGoal::WeightGain,
        FitnessGoal::WeightLoss,
        FitnessGoal::MuscleGain,
        FitnessGoal::Strength,
    ];

    for steps in (0..2000).step_by(97) {
        for (i, goal) in goals.iter().enumerate() {
            let hour = 12 + (steps as u32 + i as u32) % 12;
            // Meals and calories would each trigger their own rule.
            let tracking = day()
                .with_steps(steps, 10_000)
                .with_calories(1900, 2000)
                .at(at(hour, 30));

            match selector.decide(&profile(*goal), &tracking, midnight()) {
                Decision::Step(n) => {
                    assert_eq!(n.urgency, Urgency::High);
                    assert_eq!(n.context["steps_taken"], steps);
                }
                other => panic!("steps={steps} hour={hour}: got {}", other.label()),
            }
        }
    }
}

#[test]
fn breakfast_precedes_lunch() {
    let selector = ContextualSelector::new();
    let tracking = day().with_steps(6000, 10_000).at(at(15, 0));

    let decision = selector.decide(&profile(FitnessGoal::Strength), &tracking, midnight());
    let n = decision.notification().unwrap();
    assert_eq!(n.kind, NotificationKind::MealReminder);
    assert_eq!(n.context["missing_meal"], "breakfast");
}

#[test]
fn calorie_rule_is_weight_loss_only() {
    let selector = ContextualSelector::new();
    let tracking = day()
        .with_steps(8000, 10_000)
        .with_calories(1450, 1500)
        .with_meal(MealSlot::Breakfast)
        .with_meal(MealSlot::Lunch)
        .at(at(17, 0));

    let weight_loss = selector.decide(&profile(FitnessGoal::WeightLoss), &tracking, midnight());
    assert!(matches!(weight_loss, Decision::Calorie(_)));

    for goal in [
        FitnessGoal::HealthyLiving,
        FitnessGoal::WeightGain,
        FitnessGoal::MuscleGain,
        FitnessGoal::Strength,
    ] {
        let decision = selector.decide(&profile(goal), &tracking, midnight());
        assert!(decision.is_fallback(), "{goal:?} got {}", decision.label());
    }
}

#[tokio::test]
async fn calorie_warning_without_a_budget() {
    let selector = ContextualSelector::new();
    let tracking = day()
        .with_steps(8000, 10_000)
        .with_calories(900, 0)
        .with_meal(MealSlot::Breakfast)
        .with_meal(MealSlot::Lunch)
        .at(at(16, 0));

    let decision = selector.decide(&profile(FitnessGoal::WeightLoss), &tracking, midnight());
    assert_eq!(decision.label(), "calorie");

    let n = selector
        .select(&profile(FitnessGoal::WeightLoss), &tracking, midnight())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n.kind, NotificationKind::CalorieWarning);
    assert_eq!(n.context["calories_remaining"], -900);
}

fn coach(backend: &Arc<MockBackend>) -> Arc<CoachService> {
    Arc::new(
        CoachService::from_backends(vec![Arc::clone(backend) as Arc<dyn LlmBackend>]).with_config(
            GeneratorConfig {
                output_retries: 1,
                ..GeneratorConfig::default()
            },
        ),
    )
}

const WORKOUT_NUDGE: &str = r#"{
    "notification_type": "workout_reminder",
    "message": "Your evening session is waiting",
    "urgency": "medium",
    "suggested_action": "Start with a 10-minute warm-up"
}"#;

#[tokio::test]
async fn fallback_only_when_rules_abstain() {
    let backend = Arc::new(MockBackend::default().with_response(WORKOUT_NUDGE));
    let selector = ContextualSelector::builder().coach(coach(&backend)).build();
    let p = profile(FitnessGoal::MuscleGain);

    let low_steps = day().with_steps(100, 10_000).at(at(13, 0));
    selector.select(&p, &low_steps, midnight()).await.unwrap();
    assert_eq!(backend.call_count(), 0);

    let on_track = day()
        .with_steps(9000, 10_000)
        .with_meal(MealSlot::Breakfast)
        .with_meal(MealSlot::Lunch)
        .at(at(18, 0));
    let n = selector.select(&p, &on_track, midnight()).await.unwrap().unwrap();
    assert_eq!(backend.call_count(), 1);
    assert_eq!(n.kind, NotificationKind::WorkoutReminder);
    assert_eq!(n.suggested_action.as_deref(), Some("Start with a 10-minute warm-up"));

    let prompt = &backend.requests()[0];
    let context = prompt.system_prompt.as_deref().unwrap();
    assert!(context.contains("muscle_gain"));
    assert!(context.contains("9000"));
}

#[tokio::test]
async fn fallback_degrades_or_propagates() {
    let on_track = day()
        .with_steps(9000, 10_000)
        .with_meal(MealSlot::Breakfast)
        .with_meal(MealSlot::Lunch)
        .at(at(18, 0));
    let p = profile(FitnessGoal::Strength);

    let offline = Arc::new(MockBackend::default().with_available(false));
    let selector = ContextualSelector::builder().coach(coach(&offline)).build();
    assert!(selector.select(&p, &on_track, midnight()).await.unwrap().is_none());

    let limited = Arc::new(MockBackend::default());
    limited.push_error(LlmError::RateLimited { retry_after_ms: Some(500) });
    let selector = ContextualSelector::builder().coach(coach(&limited)).build();
    assert!(selector.select(&p, &on_track, midnight()).await.unwrap().is_none());

    let chatty = Arc::new(MockBackend::default().with_response("Sure! Here's a tip: drink water."));
    let selector = ContextualSelector::builder().coach(coach(&chatty)).build();
    let err = selector.select(&p, &on_track, midnight()).await.unwrap_err();
    assert!(matches!(err, NudgeError::Generation(_)));
    assert_eq!(chatty.call_count(), 2);
}
