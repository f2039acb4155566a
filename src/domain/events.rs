//! Domain events for the calendar.
//!
//! These are delivered to subscribers over the calendar's broadcast channel.

use serde::Serialize;

use crate::calendar::CalendarEvent;
use crate::domain::DayKey;

/// Notifications emitted by the calendar service.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum CalendarNotification {
    /// The batch that was just merged, exactly as it was passed to the merge.
    /// Subscribers re-read full day buckets themselves when they need them.
    EventsMerged { events: Vec<CalendarEvent> },

    CacheCleared,

    FetchFailed {
        start: DayKey,
        end: DayKey,
        message: String,
    },
}
