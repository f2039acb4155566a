//! Calendar window command handler

use chrono::{Local, NaiveDate};

use crate::config::Config;
use crate::domain::CalendarMode;
use crate::services::SetDateOutcome;
use crate::state::SharedState;

use super::format_event;

pub async fn cmd_calendar(
    config: &Config,
    date: Option<NaiveDate>,
    mode: Option<CalendarMode>,
) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let anchor = date.unwrap_or_else(|| Local::now().date_naive());
    let mode = mode.unwrap_or(state.calendar.default_mode());

    let window = match state.calendar.set_date(anchor, Some(mode)).await? {
        SetDateOutcome::NoSeries => {
            println!("No series followed.");
            println!();
            println!("Add series to {} and run again.", state.config.library.path);
            return Ok(());
        }
        SetDateOutcome::Fetched { window, .. } | SetDateOutcome::AlreadyResolved { window } => {
            window
        }
    };

    println!(
        "Calendar ({mode}) {} .. {}",
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d")
    );
    println!("{:-<60}", "");

    let offset = state.calendar.offset().await;
    let days = state.calendar.events_in_range(window).await;
    if days.is_empty() {
        println!("No episodes in this window.");
        return Ok(());
    }

    for (day, events) in days {
        println!("{} ({})", day, day.date().format("%A"));
        for event in &events {
            println!("  {}", format_event(event, offset));
        }
    }

    println!();
    println!("Legend: ✓ Watched | • Not watched");

    Ok(())
}
