//! Fetch window computation for a calendar anchor and view mode.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::domain::{CalendarMode, DayKey};

/// Half-open range of calendar days `[start, end)` to fetch episodes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    #[must_use]
    pub fn start_key(&self) -> DayKey {
        DayKey::from(self.start)
    }

    #[must_use]
    pub fn end_key(&self) -> DayKey {
        DayKey::from(self.end)
    }

    /// Midnight of `start` in the calendar's offset, as epoch milliseconds.
    #[must_use]
    pub fn start_millis(&self, offset: FixedOffset) -> i64 {
        local_midnight(self.start, offset).timestamp_millis()
    }

    #[must_use]
    pub fn end_millis(&self, offset: FixedOffset) -> i64 {
        local_midnight(self.end, offset).timestamp_millis()
    }
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    (local - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// Resolves the window a calendar view needs for `anchor`.
///
/// Week view starts at the Sunday of the week before the anchor's week and
/// ends seven days after the anchor. Month view spans day -47 through day 40
/// of the anchor's month, rolling over into neighbouring months, which covers
/// the padding rows a month grid shows.
#[must_use]
pub fn compute_window(anchor: NaiveDate, mode: CalendarMode) -> DateWindow {
    match mode {
        CalendarMode::Week => {
            let weekday = i64::from(anchor.weekday().num_days_from_sunday());
            DateWindow {
                start: anchor - Duration::days(weekday + 7),
                end: anchor + Duration::days(7),
            }
        }
        CalendarMode::Month => DateWindow {
            start: day_of_month(anchor, -47),
            end: day_of_month(anchor, 40),
        },
    }
}

/// Day `day` of `anchor`'s month where out-of-range values overflow into the
/// adjacent months (day 0 is the last day of the previous month).
fn day_of_month(anchor: NaiveDate, day: i64) -> NaiveDate {
    let first = anchor - Duration::days(i64::from(anchor.day0()));
    first + Duration::days(day - 1)
}
