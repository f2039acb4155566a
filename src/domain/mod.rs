//! Domain types for the episode calendar with strong typing.
//!
//! Identifiers follow the Newtype pattern so an episode id can never be passed
//! where a series id is expected.

pub mod events;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier of an episode, stable across re-fetches.
///
/// # Examples
///
/// ```rust
/// use tvcal::domain::EpisodeId;
///
/// let id = EpisodeId::new(4_411_812);
/// assert_eq!(id.value(), 4_411_812);
/// assert_eq!(id.to_string(), "4411812");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EpisodeId(i64);

impl EpisodeId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EpisodeId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

/// Unique identifier of a series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SeriesId(i64);

impl SeriesId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SeriesId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

/// Calendar-day key used to bucket events.
///
/// Derived from an air instant by converting it into the calendar's UTC offset
/// and taking the date. Every insertion and every query goes through
/// [`DayKey::from_instant`] or [`DayKey::from`] so the derivation is identical
/// everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    #[must_use]
    pub fn from_instant(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self(instant.with_timezone(&offset).date_naive())
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Calendar view mode, selecting how wide a fetch window is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarMode {
    #[default]
    Week,
    /// Some calendar widgets call the month view "date".
    #[serde(alias = "date")]
    Month,
}

impl CalendarMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for CalendarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown calendar mode '{0}' (expected 'week' or 'month')")]
pub struct ParseModeError(String);

impl FromStr for CalendarMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" | "date" => Ok(Self::Month),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
