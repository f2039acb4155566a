//! Single day command handler

use chrono::NaiveDate;

use crate::config::Config;
use crate::domain::CalendarMode;
use crate::state::SharedState;

use super::format_event;

pub async fn cmd_day(config: &Config, date: NaiveDate) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    state
        .calendar
        .set_date(date, Some(CalendarMode::Week))
        .await?;

    let events = state.calendar.get_events(date).await;
    println!("{} ({})", date.format("%Y-%m-%d"), date.format("%A"));
    println!("{:-<60}", "");

    if events.is_empty() {
        println!("Nothing airs on this day.");
        return Ok(());
    }

    let offset = state.calendar.offset().await;
    for event in &events {
        println!("{}", format_event(event, offset));
    }

    Ok(())
}
