//! Fitness Core - domain model for the fitness advisor
//!
//! This crate holds everything the advisor reasons over:
//!
//! - **Profiles**: a user's goals, preferences and social standing
//! - **Daily tracking**: steps, calories, meals and water for one day
//! - **Notifications**: the behavioral and circle messages the advisor emits
//! - **Circles**: bounded peer groups with ranks, promotion and
//!   privilege-gated actions (challenges, accountability checks, influencer posts)
//!
//! # Key Components
//!
//! - [`RankPolicy`]: pure promotion rules over a member's streak and points
//! - [`Circle`]: membership registry operations (join, promote, progress, leaderboard)
//! - [`CircleHub`]: concurrent directory serializing mutation per circle
//!
//! # Example
//!
//! ```ignore
//! use fitness_core::{Circle, CircleSettings, FitnessGoal};
//!
//! let now = chrono::Utc::now();
//! let mut circle = Circle::create(&mut creator, CircleSettings::new("Lagos Walkers", FitnessGoal::WeightLoss), now)?;
//! circle.join(&mut friend, now)?;
//! let board = circle.leaderboard();
//! ```

pub mod circle;
pub mod notification;
pub mod profile;
pub mod report;
pub mod tracking;

// Re-export main types
pub use circle::*;
pub use notification::*;
pub use profile::*;
pub use report::*;
pub use tracking::*;
