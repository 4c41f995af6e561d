// src/main.rs
//! Cardio Tracker - command line cardio session client for the workout API

use cardio_tracker::{
    config::TrackerConfig,
    display::SessionDisplay,
    error::TrackerError,
    location::{gpsd::GpsdProvider, nmea::NmeaSerialProvider},
    session::CardioValues,
    HttpWorkoutApi, LocationProvider, Result, SessionRegistry, Workout, WorkoutApi,
};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{atomic::AtomicBool, Arc};

#[derive(Parser)]
#[command(name = "cardio-tracker", version, about = "GPS cardio session tracker")]
struct Cli {
    /// Override the workout API base URL
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the workouts scheduled on a date
    List {
        /// Calendar date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Track a live cardio session and save it on exit
    Track {
        #[arg(long)]
        workout_id: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Write the recorded route to this GPX file after the session
        #[arg(long)]
        gpx: Option<PathBuf>,
    },
    /// Save cardio values for a workout without tracking
    Save {
        #[arg(long)]
        workout_id: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Minutes of cardio (decimal, comma or dot separator)
        #[arg(long)]
        time: Option<String>,
        /// Distance in kilometers
        #[arg(long)]
        distance: Option<String>,
        /// Calories burned (whole number)
        #[arg(long)]
        calories: Option<String>,
    },
    /// Mark a workout as completed
    Complete {
        #[arg(long)]
        workout_id: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = TrackerConfig::load().unwrap_or_default();
    if let Some(url) = cli.api_url {
        config.update_api_url(url);
    }

    let api: Arc<dyn WorkoutApi> = Arc::new(HttpWorkoutApi::new(config.api_base_url.clone())?);

    match cli.command {
        Command::List { date } => {
            let workouts = api.workouts_for_date(date_or_today(date)).await?;
            print_workouts(&workouts);
            Ok(())
        }
        Command::Track {
            workout_id,
            date,
            gpx,
        } => track(&config, api, workout_id, date_or_today(date), gpx).await,
        Command::Save {
            workout_id,
            date,
            time,
            distance,
            calories,
        } => {
            let mut registry = registry_for(&config, api, date_or_today(date))?;
            registry.load().await?;
            let tracker = registry
                .get(workout_id)
                .ok_or_else(|| workout_not_found(workout_id))?;

            tracker
                .save(CardioValues {
                    time_minutes: time,
                    distance_km: distance,
                    calories,
                })
                .await?;
            println!("Cardio saved.");
            Ok(())
        }
        Command::Complete { workout_id, date } => {
            let mut registry = registry_for(&config, api, date_or_today(date))?;
            registry.load().await?;
            let tracker = registry
                .get_mut(workout_id)
                .ok_or_else(|| workout_not_found(workout_id))?;

            tracker.complete().await?;
            println!("Workout marked as completed.");
            Ok(())
        }
    }
}

/// Run a live tracking session until Ctrl+C, then stop and save
async fn track(
    config: &TrackerConfig,
    api: Arc<dyn WorkoutApi>,
    workout_id: i64,
    date: NaiveDate,
    gpx: Option<PathBuf>,
) -> Result<()> {
    let mut registry = registry_for(config, api, date)?;
    registry.load().await?;
    let tracker = registry
        .get_mut(workout_id)
        .ok_or_else(|| workout_not_found(workout_id))?;

    println!("Starting GPS tracking ({} source)...", config.source_type);
    tracker.start().await?;

    let display_running = Arc::new(AtomicBool::new(true));
    let display = SessionDisplay::new();
    display
        .run(
            tracker.draft_handle(),
            tracker.summary_handle(),
            Arc::clone(&display_running),
        )
        .await?;

    tracker.stop().await?;
    println!("Cardio saved.");

    if let Some(path) = gpx {
        let draft = tracker.draft();
        if draft.route.is_empty() {
            println!("No route recorded; skipping GPX export.");
        } else {
            let name = tracker.summary().name;
            draft.route.export_gpx(&path, &name)?;
            println!("Route written to {}", path.display());
        }
    }

    Ok(())
}

fn registry_for(
    config: &TrackerConfig,
    api: Arc<dyn WorkoutApi>,
    date: NaiveDate,
) -> Result<SessionRegistry> {
    Ok(SessionRegistry::new(
        api,
        provider_from_config(config)?,
        config.subscription_options(),
        date,
    ))
}

fn provider_from_config(config: &TrackerConfig) -> Result<Arc<dyn LocationProvider>> {
    match config.source_type.as_str() {
        "gpsd" => {
            let host = config.gpsd_host.clone().unwrap_or_else(|| "localhost".to_string());
            let port = config.gpsd_port.unwrap_or(2947);
            Ok(Arc::new(GpsdProvider::new(host, port)))
        }
        "serial" => {
            let port = config.serial_port.clone().ok_or_else(|| {
                TrackerError::Other("serial source selected but no serial_port configured".to_string())
            })?;
            let baudrate = config.serial_baudrate.unwrap_or(9600);
            Ok(Arc::new(NmeaSerialProvider::new(port, baudrate)))
        }
        other => Err(TrackerError::Other(format!(
            "unknown location source '{}' (expected gpsd or serial)",
            other
        ))),
    }
}

fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

fn workout_not_found(workout_id: i64) -> TrackerError {
    TrackerError::Other(format!("no workout with id {} on that date", workout_id))
}

fn print_workouts(workouts: &[Workout]) {
    if workouts.is_empty() {
        println!("No workouts on this day.");
        return;
    }

    for workout in workouts {
        let id = workout
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = if workout.completed == Some(true) {
            "done"
        } else {
            "open"
        };

        let mut summary = Vec::new();
        if let Some(minutes) = workout.cardio_time_minutes {
            summary.push(format!("{} min", minutes));
        }
        if let Some(km) = workout.cardio_distance_km {
            summary.push(format!("{} km", km));
        }
        if let Some(kcal) = workout.cardio_calories {
            summary.push(format!("{} kcal", kcal));
        }

        if summary.is_empty() {
            println!("  [{}] {} ({})", id, workout.name, status);
        } else {
            println!("  [{}] {} ({}) - {}", id, workout.name, status, summary.join(", "));
        }
    }
}
