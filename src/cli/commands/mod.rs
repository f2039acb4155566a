mod calendar;
mod day;
mod refresh;
mod watched;

pub use calendar::cmd_calendar;
pub use day::cmd_day;
pub use refresh::cmd_refresh;
pub use watched::cmd_watched;

use chrono::FixedOffset;

use crate::calendar::CalendarEvent;

/// One line per event, the way every command prints them. Times are shown
/// in `offset`, the same offset the day buckets use.
pub(crate) fn format_event(event: &CalendarEvent, offset: FixedOffset) -> String {
    let series = if event.series_title.is_empty() {
        format!("Series {}", event.series_id)
    } else {
        event.series_title.clone()
    };
    let marker = if event.episode.watched { "✓" } else { "•" };
    let title = event
        .episode
        .title
        .as_deref()
        .map(|t| format!(" - {t}"))
        .unwrap_or_default();

    format!(
        "{} {} {} S{:02}E{:02}{}",
        marker,
        event.air_time.with_timezone(&offset).format("%H:%M"),
        series,
        event.season_number,
        event.episode_number,
        title
    )
}
