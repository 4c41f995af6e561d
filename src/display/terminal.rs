// src/display/terminal.rs
//! Terminal live view of a cardio session

use crate::{
    api::Workout,
    error::{Result, TrackerError},
    session::CardioDraft,
};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};
use tokio::time::sleep;

pub struct SessionDisplay;

impl SessionDisplay {
    pub fn new() -> Self {
        Self
    }

    /// Run the display loop until Ctrl+C flips the running flag
    pub async fn run(
        &self,
        draft: Arc<RwLock<CardioDraft>>,
        summary: Arc<RwLock<Workout>>,
        running: Arc<AtomicBool>,
    ) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Hide, DisableLineWrap).map_err(TrackerError::Io)?;

        let running_clone = Arc::clone(&running);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                running_clone.store(false, Ordering::Relaxed);
            }
        });

        while running.load(Ordering::Relaxed) {
            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0)).map_err(TrackerError::Io)?;

            let draft_snapshot = draft.read().unwrap().clone();
            let summary_snapshot = summary.read().unwrap().clone();
            self.render(&mut stdout, &draft_snapshot, &summary_snapshot)?;

            stdout.flush().map_err(TrackerError::Io)?;
            sleep(Duration::from_secs(1)).await;
        }

        execute!(stdout, Show, EnableLineWrap).map_err(TrackerError::Io)?;
        println!("\nStopping session...");
        Ok(())
    }

    fn render(
        &self,
        stdout: &mut impl Write,
        draft: &CardioDraft,
        summary: &Workout,
    ) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print(format!("Cardio Tracker - {}", summary.name)),
            Print("\n"),
            Print("=".repeat(60)),
            Print("\n"),
            ResetColor
        )
        .map_err(TrackerError::Io)?;

        let state = if draft.is_saving {
            "saving..."
        } else if draft.is_running {
            "tracking"
        } else {
            "paused"
        };
        execute!(stdout, Print(format!("State: {}\n\n", state))).map_err(TrackerError::Io)?;

        self.render_session_section(stdout, draft)?;
        self.render_summary_section(stdout, summary)?;

        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("Press Ctrl+C to stop and save"),
            Print("\n"),
            ResetColor
        )
        .map_err(TrackerError::Io)?;

        Ok(())
    }

    fn render_session_section(&self, stdout: &mut impl Write, draft: &CardioDraft) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Yellow),
            Print("SESSION:\n"),
            ResetColor
        )
        .map_err(TrackerError::Io)?;

        execute!(
            stdout,
            Print(format!("  Elapsed:   {:>12}\n", draft.format_elapsed()))
        )
        .map_err(TrackerError::Io)?;

        let distance = draft.distance_km.as_deref().unwrap_or("0.00");
        execute!(
            stdout,
            Print(format!("  Distance:  {:>12} km\n", distance))
        )
        .map_err(TrackerError::Io)?;

        execute!(
            stdout,
            Print(format!("  Route:     {:>12} points\n", draft.route.len()))
        )
        .map_err(TrackerError::Io)?;

        if let Some(last) = draft.route.last() {
            execute!(
                stdout,
                Print(format!(
                    "  Last fix:  {:>12.6}, {:.6}\n",
                    last.latitude, last.longitude
                ))
            )
            .map_err(TrackerError::Io)?;
        }

        execute!(stdout, Print("\n")).map_err(TrackerError::Io)?;
        Ok(())
    }

    fn render_summary_section(&self, stdout: &mut impl Write, summary: &Workout) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print("SAVED SUMMARY:\n"),
            ResetColor
        )
        .map_err(TrackerError::Io)?;

        if !summary.has_cardio_summary() {
            execute!(stdout, Print("  (nothing saved yet)\n\n")).map_err(TrackerError::Io)?;
            return Ok(());
        }

        if let Some(minutes) = summary.cardio_time_minutes {
            execute!(stdout, Print(format!("  Time:      {:>12} min\n", minutes)))
                .map_err(TrackerError::Io)?;
        }
        if let Some(km) = summary.cardio_distance_km {
            execute!(stdout, Print(format!("  Distance:  {:>12} km\n", km)))
                .map_err(TrackerError::Io)?;
        }
        if let Some(kcal) = summary.cardio_calories {
            execute!(stdout, Print(format!("  Calories:  {:>12} kcal\n", kcal)))
                .map_err(TrackerError::Io)?;
        }
        if summary.completed == Some(true) {
            execute!(stdout, Print("  Workout completed\n")).map_err(TrackerError::Io)?;
        }

        execute!(stdout, Print("\n")).map_err(TrackerError::Io)?;
        Ok(())
    }
}

impl Default for SessionDisplay {
    fn default() -> Self {
        Self::new()
    }
}
