//! nudge: command-line front end for the fitness advisor
//!
//! Evaluates a profile and a day of tracking against the notification rules,
//! prints circle leaderboards and replays the reference scenarios.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::info;

use fitness_core::{Circle, DailyTracking, FitnessGoal, FitnessProfile, MealSlot};
use nudge::config::parse_clock;
use nudge::{FitnessAdvisor, FixedClock, NudgeConfig};

#[derive(Parser)]
#[command(name = "nudge")]
#[command(about = "Contextual fitness notifications and circle tools")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "NUDGE_CONFIG", default_value = "nudge.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pick the notification for a profile and a day of tracking
    Evaluate {
        /// Profile YAML
        #[arg(long)]
        profile: PathBuf,

        /// Daily tracking YAML
        #[arg(long)]
        tracking: PathBuf,

        /// Circle YAML used to enhance the notification
        #[arg(long)]
        circle: Option<PathBuf>,

        /// Time of day (HH:MM) when the tracking has none
        #[arg(long, value_parser = parse_clock)]
        at: Option<NaiveTime>,

        /// Use the configured OpenAI-compatible endpoint when no rule fires
        #[arg(long)]
        llm: bool,
    },

    /// Print a circle's leaderboard
    Leaderboard {
        /// Circle YAML
        #[arg(long)]
        circle: PathBuf,
    },

    /// Run the built-in reference scenarios
    Scenarios,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let found = cli.config.exists();
    let config = if found {
        NudgeConfig::load(&cli.config)?
    } else {
        NudgeConfig::default()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.general.log_directive().parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    if found {
        info!(path = %cli.config.display(), "Loaded config");
    } else {
        info!("Config file not found, using defaults");
    }

    let output = match cli.command {
        Command::Evaluate {
            profile,
            tracking,
            circle,
            at,
            llm,
        } => evaluate(config, &profile, &tracking, circle.as_deref(), at, llm).await?,
        Command::Leaderboard { circle } => leaderboard(&circle)?,
        Command::Scenarios => scenarios(config).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

async fn evaluate(
    config: NudgeConfig,
    profile_path: &Path,
    tracking_path: &Path,
    circle_path: Option<&Path>,
    at: Option<NaiveTime>,
    llm: bool,
) -> anyhow::Result<serde_json::Value> {
    let profile: FitnessProfile = read_yaml(profile_path)?;
    let tracking: DailyTracking = read_yaml(tracking_path)?;

    let time_of_day = at.unwrap_or_else(|| Local::now().time());
    let clock = FixedClock::at(Utc::now()).with_time_of_day(time_of_day);

    let mut advisor = FitnessAdvisor::new(config).with_clock(Arc::new(clock));
    if llm {
        let coach = advisor
            .config()
            .agent
            .coach_service()
            .context("configuring the coach backend")?;
        advisor = advisor.with_coach(Arc::new(coach));
    }

    let circle_id = match circle_path {
        Some(path) => {
            let circle: Circle = read_yaml(path)?;
            let id = circle.circle_id.clone();
            advisor.hub().insert(circle)?;
            Some(id)
        }
        None => None,
    };

    let decision = advisor.selector().decide(&profile, &tracking, time_of_day);
    let notification = advisor
        .contextual_notification_with_circle(&profile, &tracking, circle_id.as_deref())
        .await?;

    Ok(json!({
        "user_id": profile.user_id(),
        "effective_time": tracking.effective_time(time_of_day).format("%H:%M").to_string(),
        "decision": decision.label(),
        "notification": notification,
    }))
}

fn leaderboard(circle_path: &Path) -> anyhow::Result<serde_json::Value> {
    let circle: Circle = read_yaml(circle_path)?;
    circle.validate()?;
    let board: Vec<_> = circle
        .leaderboard()
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            json!({
                "position": i + 1,
                "user_id": m.user_id,
                "rank": m.rank.as_str(),
                "total_points": m.total_points,
                "current_streak": m.current_streak,
            })
        })
        .collect();

    Ok(json!({
        "circle_id": circle.circle_id,
        "name": circle.name,
        "leaderboard": board,
    }))
}

async fn scenarios(config: NudgeConfig) -> anyhow::Result<serde_json::Value> {
    let advisor = Arc::new(FitnessAdvisor::new(config));
    let date = NaiveDate::from_ymd_opt(2026, 3, 2).context("invalid scenario date")?;
    let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).context("invalid scenario time");

    let cases = vec![
        (
            "low_steps_at_noon",
            FitnessProfile::new("Sample", "Lagos", FitnessGoal::Strength),
            DailyTracking::new(date).with_steps(200, 10_000).at(hm(12, 0)?),
        ),
        (
            "lunch_missing",
            FitnessProfile::new("Sample", "Lagos", FitnessGoal::Strength),
            DailyTracking::new(date)
                .with_steps(5000, 10_000)
                .with_meal(MealSlot::Breakfast)
                .at(hm(14, 0)?),
        ),
        (
            "calorie_budget",
            FitnessProfile::new("Sample", "Lagos", FitnessGoal::WeightLoss),
            DailyTracking::new(date)
                .with_steps(8000, 10_000)
                .with_calories(1300, 1500)
                .with_meal(MealSlot::Breakfast)
                .with_meal(MealSlot::Lunch)
                .at(hm(16, 0)?),
        ),
    ];

    let runs = cases.into_iter().map(|(name, profile, tracking)| {
        let advisor = Arc::clone(&advisor);
        async move {
            let notification = advisor.contextual_notification(&profile, &tracking).await;
            (name, notification)
        }
    });

    let mut results = Vec::new();
    for (name, notification) in join_all(runs).await {
        results.push(json!({
            "scenario": name,
            "notification": notification?,
        }));
    }
    Ok(json!(results))
}
