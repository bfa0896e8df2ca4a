//! User fitness profiles.
//!
//! A profile is the caller-supplied description of a person: body metrics,
//! goals, dietary constraints and their standing in the social graph. The
//! profile `name` doubles as the user id inside circles.

use serde::{Deserialize, Serialize};

use crate::circle::CircleRank;

/// How active a person is outside of planned workouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    VeryActive,
    Athlete,
}

/// Self-reported cooking ability, used when planning meals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookingSkillLevel {
    Beginner,
    Intermediate,
    #[serde(rename = "expert")]
    Advanced,
}

/// Primary fitness goal.
///
/// Drives calorie-rule applicability: only [`FitnessGoal::WeightLoss`]
/// profiles receive calorie warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
    HealthyLiving,
    WeightGain,
    WeightLoss,
    MuscleGain,
    Strength,
}

impl FitnessGoal {
    /// Wire name, as used in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HealthyLiving => "healthy_living",
            Self::WeightGain => "weight_gain",
            Self::WeightLoss => "weight_loss",
            Self::MuscleGain => "muscle_gain",
            Self::Strength => "strength",
        }
    }
}

/// Meals a person habitually skips (single meals or combinations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkippedMeal {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    BreakfastLunch,
    LunchDinner,
    DinnerSnack,
    BreakfastDinner,
    BreakfastLunchDinner,
    BreakfastLunchDinnerSnack,
}

/// Everything the advisor knows about a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessProfile {
    pub age: u32,
    /// Weight in kilograms
    pub weight: f64,
    /// Height in centimetres
    pub height: f64,
    /// Display name, also the user id inside circles
    pub name: String,
    pub location: String,
    pub gender: String,
    pub desired_weight: f64,
    pub activity_level: ActivityLevel,
    pub fitness_goal: FitnessGoal,
    #[serde(default)]
    pub health_conditions: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    pub cooking_skill_level: CookingSkillLevel,
    pub intermittent_fasting: bool,
    #[serde(default)]
    pub skipped_meals: Vec<SkippedMeal>,
    /// Fasting window in hours
    pub fasting_threshold: u32,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub cuisine_preferences: Vec<String>,
    #[serde(default)]
    pub injuries: Vec<String>,
    pub preferred_workout_time: String,
    #[serde(default)]
    pub available_equipment: Vec<String>,
    pub workout_days_per_week: u32,
    /// Daily deficit for weight-loss goals
    #[serde(default)]
    pub daily_calorie_deficit: u32,
    /// Daily surplus for muscle-gain goals
    #[serde(default)]
    pub daily_calorie_surplus: u32,
    #[serde(default = "default_step_goal")]
    pub step_goal: u32,
    /// Litres per day
    #[serde(default = "default_water_goal")]
    pub water_goal: f64,
    #[serde(default)]
    pub circle_rank: CircleRank,
    /// Circle ids this user belongs to
    #[serde(default)]
    pub circles_joined: Vec<String>,
    /// User ids following this user
    #[serde(default)]
    pub followers: Vec<String>,
    /// User ids this user follows
    #[serde(default)]
    pub following: Vec<String>,
}

fn default_step_goal() -> u32 {
    10_000
}

fn default_water_goal() -> f64 {
    2.5
}

impl FitnessProfile {
    /// Create a profile with the given identity and goal, everything else defaulted.
    pub fn new(name: impl Into<String>, location: impl Into<String>, fitness_goal: FitnessGoal) -> Self {
        Self {
            age: 30,
            weight: 70.0,
            height: 170.0,
            name: name.into(),
            location: location.into(),
            gender: "unspecified".to_string(),
            desired_weight: 70.0,
            activity_level: ActivityLevel::Moderate,
            fitness_goal,
            health_conditions: Vec::new(),
            dietary_restrictions: Vec::new(),
            cooking_skill_level: CookingSkillLevel::Beginner,
            intermittent_fasting: false,
            skipped_meals: Vec::new(),
            fasting_threshold: 12,
            allergies: Vec::new(),
            cuisine_preferences: Vec::new(),
            injuries: Vec::new(),
            preferred_workout_time: "morning".to_string(),
            available_equipment: Vec::new(),
            workout_days_per_week: 3,
            daily_calorie_deficit: 0,
            daily_calorie_surplus: 0,
            step_goal: default_step_goal(),
            water_goal: default_water_goal(),
            circle_rank: CircleRank::Follower,
            circles_joined: Vec::new(),
            followers: Vec::new(),
            following: Vec::new(),
        }
    }

    /// Builder: set the profile-level circle rank.
    pub fn with_rank(mut self, rank: CircleRank) -> Self {
        self.circle_rank = rank;
        self
    }

    /// Builder: set follower ids.
    pub fn with_followers(mut self, followers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.followers = followers.into_iter().map(Into::into).collect();
        self
    }

    /// The id this profile uses inside circles.
    pub fn user_id(&self) -> &str {
        &self.name
    }

    /// Number of users following this profile.
    pub fn follower_count(&self) -> usize {
        self.followers.len()
    }

    /// Whether the profile-level rank is one of the influencer tiers.
    pub fn is_influencer(&self) -> bool {
        self.circle_rank.is_influencer()
    }

    /// Record membership of a circle (idempotent).
    pub(crate) fn record_circle(&mut self, circle_id: &str) {
        if !self.circles_joined.iter().any(|c| c == circle_id) {
            self.circles_joined.push(circle_id.to_string());
        }
    }
}
