//! Calendar event records and their in-bucket ordering.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;

use crate::domain::{DayKey, EpisodeId, SeriesId};
use crate::models::{EpisodeRecord, SeriesRecord};

/// Rejections at the ingestion boundary. The merge itself only ever sees
/// well-formed events.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Episode {0} has no usable first-aired timestamp")]
    MissingAirTime(EpisodeId),

    #[error("Episode record has an invalid identifier: {0}")]
    InvalidIdentifier(EpisodeId),
}

/// One episode placed on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub air_time: DateTime<Utc>,
    pub air_date_key: DayKey,
    pub episode_id: EpisodeId,
    pub series_id: SeriesId,
    /// Empty when the series is unknown to the directory.
    pub series_title: String,
    pub season_number: i32,
    pub episode_number: i32,
    pub episode: EpisodeRecord,
    pub series: Option<SeriesRecord>,
}

impl CalendarEvent {
    /// Builds an event from a raw episode record.
    ///
    /// # Errors
    ///
    /// - [`IngestError::InvalidIdentifier`] for non-positive episode ids
    /// - [`IngestError::MissingAirTime`] when neither timestamp field is usable
    pub fn from_record(
        episode: EpisodeRecord,
        series: Option<SeriesRecord>,
        offset: FixedOffset,
    ) -> Result<Self, IngestError> {
        if episode.id.value() <= 0 {
            return Err(IngestError::InvalidIdentifier(episode.id));
        }

        let air_time = episode
            .air_time()
            .ok_or(IngestError::MissingAirTime(episode.id))?;

        Ok(Self {
            air_time,
            air_date_key: DayKey::from_instant(air_time, offset),
            episode_id: episode.id,
            series_id: episode.series_id,
            series_title: series.as_ref().map(|s| s.title.clone()).unwrap_or_default(),
            season_number: episode.seasonnumber,
            episode_number: episode.episodenumber,
            episode,
            series,
        })
    }

    /// Takes over `incoming`'s data while keeping this entry's series when
    /// the update arrived without one.
    pub(crate) fn absorb(&mut self, incoming: CalendarEvent) {
        let CalendarEvent {
            air_time,
            air_date_key,
            episode_id,
            series_id,
            series_title,
            season_number,
            episode_number,
            episode,
            series,
        } = incoming;

        self.air_time = air_time;
        self.air_date_key = air_date_key;
        self.episode_id = episode_id;
        self.series_id = series_id;
        self.season_number = season_number;
        self.episode_number = episode_number;
        self.episode = episode;
        if series.is_some() {
            self.series = series;
            self.series_title = series_title;
        }
    }
}

/// Total order of events within a day bucket.
///
/// Air instant first. Episodes airing at the same instant are ordered by
/// episode number within a series, and across series by title using plain
/// case-sensitive `str` ordering. The remaining keys only break ties that
/// would otherwise compare equal.
#[must_use]
pub fn bucket_order(a: &CalendarEvent, b: &CalendarEvent) -> Ordering {
    a.air_time.cmp(&b.air_time).then_with(|| {
        let tie = if a.series_id == b.series_id {
            a.episode_number
                .cmp(&b.episode_number)
                .then_with(|| a.season_number.cmp(&b.season_number))
        } else {
            a.series_title
                .cmp(&b.series_title)
                .then_with(|| a.series_id.cmp(&b.series_id))
        };
        tie.then_with(|| a.episode_id.cmp(&b.episode_id))
    })
}
