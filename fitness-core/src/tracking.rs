//! Daily tracking snapshots.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A meal slot that can be logged once per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

/// One day of activity, immutable for the duration of a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTracking {
    pub date: NaiveDate,
    #[serde(default)]
    pub steps_taken: u32,
    #[serde(default = "default_steps_goal")]
    pub steps_goal: u32,
    #[serde(default)]
    pub calories_consumed: u32,
    #[serde(default)]
    pub calories_goal: u32,
    /// Meal slots already logged today
    #[serde(default)]
    pub meals_logged: BTreeSet<MealSlot>,
    #[serde(default)]
    pub workouts_completed: Vec<String>,
    /// Litres
    #[serde(default)]
    pub water_intake: f64,
    /// Litres
    #[serde(default = "default_water_goal")]
    pub water_goal: f64,
    /// Explicit time of day; the caller's wall clock is used when absent
    #[serde(default)]
    pub current_time: Option<NaiveTime>,
}

fn default_steps_goal() -> u32 {
    10_000
}

fn default_water_goal() -> f64 {
    2.5
}

impl DailyTracking {
    /// Empty tracking for the given day.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            steps_taken: 0,
            steps_goal: default_steps_goal(),
            calories_consumed: 0,
            calories_goal: 0,
            meals_logged: BTreeSet::new(),
            workouts_completed: Vec::new(),
            water_intake: 0.0,
            water_goal: default_water_goal(),
            current_time: None,
        }
    }

    /// Builder: steps taken and goal.
    pub fn with_steps(mut self, taken: u32, goal: u32) -> Self {
        self.steps_taken = taken;
        self.steps_goal = goal;
        self
    }

    /// Builder: calories consumed and goal.
    pub fn with_calories(mut self, consumed: u32, goal: u32) -> Self {
        self.calories_consumed = consumed;
        self.calories_goal = goal;
        self
    }

    /// Builder: log a meal slot.
    pub fn with_meal(mut self, meal: MealSlot) -> Self {
        self.meals_logged.insert(meal);
        self
    }

    /// Builder: pin the time of day.
    pub fn at(mut self, time: NaiveTime) -> Self {
        self.current_time = Some(time);
        self
    }

    /// Time of day used by time-gated rules.
    pub fn effective_time(&self, wall_clock: NaiveTime) -> NaiveTime {
        self.current_time.unwrap_or(wall_clock)
    }

    pub fn has_logged(&self, meal: MealSlot) -> bool {
        self.meals_logged.contains(&meal)
    }

    /// Steps still needed to hit the goal (negative once exceeded).
    pub fn steps_remaining(&self) -> i64 {
        i64::from(self.steps_goal) - i64::from(self.steps_taken)
    }

    /// Calories left in the budget (negative once exceeded).
    pub fn calories_remaining(&self) -> i64 {
        i64::from(self.calories_goal) - i64::from(self.calories_consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_effective_time_prefers_override() {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let evening = NaiveTime::from_hms_opt(19, 30, 0).unwrap();

        let pinned = DailyTracking::new(day()).at(noon);
        assert_eq!(pinned.effective_time(evening), noon);

        let unpinned = DailyTracking::new(day());
        assert_eq!(unpinned.effective_time(evening), evening);
    }

    #[test]
    fn test_meals_have_set_semantics() {
        let json = serde_json::json!({
            "date": "2025-03-14",
            "meals_logged": ["breakfast", "lunch", "breakfast"]
        });
        let tracking: DailyTracking = serde_json::from_value(json).unwrap();
        assert_eq!(tracking.meals_logged.len(), 2);
        assert!(tracking.has_logged(MealSlot::Breakfast));
        assert!(!tracking.has_logged(MealSlot::Dinner));
        assert_eq!(tracking.steps_goal, 10_000);
    }

    #[test]
    fn test_remaining_can_go_negative() {
        let tracking = DailyTracking::new(day())
            .with_steps(12_000, 10_000)
            .with_calories(1_800, 1_500);
        assert_eq!(tracking.steps_remaining(), -2_000);
        assert_eq!(tracking.calories_remaining(), -300);
    }
}
