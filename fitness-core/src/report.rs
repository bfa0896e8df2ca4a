//! Personalized fitness report, produced by the generative collaborator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single exercise in a workout plan.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    /// Rest between sets, in seconds
    #[serde(rename = "rest_time")]
    pub rest_time_secs: u32,
}

/// A planned or logged meal.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Meal {
    pub name: String,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    /// breakfast, lunch, dinner or snack
    pub timing: String,
    #[serde(default)]
    pub logged: bool,
    #[serde(default)]
    pub logged_time: Option<DateTime<Utc>>,
}

/// Full personalized plan for a profile.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FitnessReport {
    /// Customized workout routine
    pub workout_plan: Vec<Exercise>,
    /// Daily meal plan
    pub meal_plan: Vec<Meal>,
    /// Recommended daily caloric intake
    pub daily_calories: u32,
    /// Recommended macro split (protein, carbs, fats)
    pub macros: HashMap<String, f64>,
    /// Personalized fitness and nutrition tips
    pub tips: Vec<String>,
    /// Weekly workout and meal timing schedule
    pub weekly_schedule: HashMap<String, serde_json::Value>,
    /// The single best notification message for this profile's goal
    pub notification_message: String,
}

impl FitnessReport {
    /// Total planned calories across the meal plan.
    pub fn planned_calories(&self) -> u32 {
        self.meal_plan.iter().map(|m| m.calories).sum()
    }
}
