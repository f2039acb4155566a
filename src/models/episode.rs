use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{EpisodeId, SeriesId};

/// Episode as supplied by an [`EpisodeSource`](crate::calendar::EpisodeSource)
/// or pushed in by a watched-state toggle.
///
/// Field names follow the episode database's JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    #[serde(alias = "TVDB_ID")]
    pub id: EpisodeId,

    #[serde(alias = "ID_Serie")]
    pub series_id: SeriesId,

    /// First-aired instant in epoch milliseconds.
    #[serde(default)]
    pub firstaired: Option<i64>,

    /// First-aired instant as RFC 3339. Preferred over `firstaired` when both
    /// are present.
    #[serde(default)]
    pub firstaired_iso: Option<String>,

    #[serde(default)]
    pub seasonnumber: i32,

    #[serde(default)]
    pub episodenumber: i32,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub watched: bool,
}

impl EpisodeRecord {
    /// Parses `firstaired_iso`, returning `None` when absent or malformed.
    #[must_use]
    pub fn firstaired_iso_instant(&self) -> Option<DateTime<Utc>> {
        self.firstaired_iso
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    #[must_use]
    pub fn firstaired_instant(&self) -> Option<DateTime<Utc>> {
        self.firstaired.and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// Canonical air instant: the ISO field when usable, otherwise epoch ms.
    #[must_use]
    pub fn air_time(&self) -> Option<DateTime<Utc>> {
        self.firstaired_iso_instant()
            .or_else(|| self.firstaired_instant())
    }
}
