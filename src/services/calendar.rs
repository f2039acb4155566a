//! Calendar service: owns the event cache and feeds it.
//!
//! All reads and writes of the cache go through [`CalendarService`]. The cache
//! sits behind a single lock; the window guard is claimed under that lock
//! before a fetch is awaited, and the lock is never held across a fetch.
//! Fetch results are merged in the order they complete.

use chrono::{FixedOffset, NaiveDate};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::calendar::{
    CalendarEvent, ChangeNotifier, DateWindow, EpisodeSource, EventCache, IngestError, MergeStats,
    SeriesDirectory, SourceError, compute_window,
};
use crate::config::CalendarConfig;
use crate::domain::events::CalendarNotification;
use crate::domain::{CalendarMode, DayKey, EpisodeId, SeriesId};
use crate::models::{EpisodeRecord, SeriesRecord};

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Failed to fetch episodes for {start}..{end}: {source}")]
    Fetch {
        start: DayKey,
        end: DayKey,
        #[source]
        source: SourceError,
    },

    #[error("Rejected episode update: {0}")]
    Ingest(#[from] IngestError),

    #[error("Invalid calendar configuration: {0}")]
    Config(String),
}

/// What a [`CalendarService::set_date`] call ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDateOutcome {
    Fetched { window: DateWindow, stats: MergeStats },
    /// The window's start was already resolved; nothing was fetched.
    AlreadyResolved { window: DateWindow },
    /// No series are followed; nothing was fetched and the guard is untouched.
    NoSeries,
}

#[derive(Clone)]
pub struct CalendarService {
    cache: Arc<RwLock<EventCache>>,
    source: Arc<dyn EpisodeSource>,
    directory: Arc<dyn SeriesDirectory>,
    notifier: ChangeNotifier,
    settings: CalendarConfig,
}

impl CalendarService {
    /// # Errors
    ///
    /// Returns [`CalendarError::Config`] when the configured UTC offset is out
    /// of range.
    pub fn new(
        settings: CalendarConfig,
        source: Arc<dyn EpisodeSource>,
        directory: Arc<dyn SeriesDirectory>,
        notifier: ChangeNotifier,
    ) -> Result<Self, CalendarError> {
        let offset = settings.offset().ok_or_else(|| {
            CalendarError::Config(format!(
                "utc_offset_minutes out of range: {}",
                settings.utc_offset_minutes
            ))
        })?;

        Ok(Self {
            cache: Arc::new(RwLock::new(EventCache::new(offset))),
            source,
            directory,
            notifier,
            settings,
        })
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CalendarNotification> {
        self.notifier.subscribe()
    }

    /// Offset whose local dates key the day buckets.
    pub async fn offset(&self) -> FixedOffset {
        self.cache.read().await.offset()
    }

    #[must_use]
    pub const fn default_mode(&self) -> CalendarMode {
        self.settings.default_mode
    }

    /// Points the calendar at `anchor`, fetching the resolved window unless it
    /// was already fetched.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Fetch`] when the episode source fails. Whether
    /// the window may be retried afterwards follows
    /// [`CalendarConfig::retry_failed_windows`].
    pub async fn set_date(
        &self,
        anchor: NaiveDate,
        mode: Option<CalendarMode>,
    ) -> Result<SetDateOutcome, CalendarError> {
        let mode = mode.unwrap_or(self.settings.default_mode);
        let window = compute_window(anchor, mode);

        if self.directory.is_empty().await {
            debug!(%anchor, "No followed series, skipping calendar fetch");
            return Ok(SetDateOutcome::NoSeries);
        }

        let start = window.start_key();
        let claimed = self.cache.write().await.claim_window(start);
        if !claimed {
            metrics::counter!("calendar_guard_hits_total").increment(1);
            debug!(%anchor, %mode, %start, "Window already resolved");
            return Ok(SetDateOutcome::AlreadyResolved { window });
        }

        match self.get_events_for_date_range(window).await {
            Ok(stats) => Ok(SetDateOutcome::Fetched { window, stats }),
            Err(e) => {
                if self.settings.retry_failed_windows {
                    let released = self.cache.write().await.release_window(start);
                    debug!(%start, released, "Released window after failed fetch");
                }
                Err(e)
            }
        }
    }

    /// Fetches `[window.start, window.end)` and merges it, ignoring the
    /// window guard.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Fetch`] when the episode source fails; nothing
    /// is merged in that case.
    pub async fn get_events_for_date_range(
        &self,
        window: DateWindow,
    ) -> Result<MergeStats, CalendarError> {
        let offset = self.cache.read().await.offset();
        let start_ms = window.start_millis(offset);
        let end_ms = window.end_millis(offset);

        metrics::counter!("calendar_fetches_total").increment(1);
        info!(start = %window.start, end = %window.end, "Fetching calendar episodes");

        let episodes = match self.source.fetch_range(start_ms, end_ms).await {
            Ok(episodes) => episodes,
            Err(e) => {
                metrics::counter!("calendar_fetch_failures_total").increment(1);
                warn!(start = %window.start, end = %window.end, error = %e, "Calendar fetch failed");
                self.notifier.publish(CalendarNotification::FetchFailed {
                    start: window.start_key(),
                    end: window.end_key(),
                    message: e.to_string(),
                });
                return Err(CalendarError::Fetch {
                    start: window.start_key(),
                    end: window.end_key(),
                    source: e,
                });
            }
        };

        let series = self.lookup_series(&episodes).await;
        let mut events = Vec::with_capacity(episodes.len());
        for episode in episodes {
            let id = episode.id;
            let serie = series.get(&episode.series_id).cloned();
            match CalendarEvent::from_record(episode, serie, offset) {
                Ok(event) => events.push(event),
                Err(e) => warn!(episode_id = %id, error = %e, "Skipping malformed episode"),
            }
        }

        Ok(self.upsert(events).await)
    }

    async fn lookup_series(&self, episodes: &[EpisodeRecord]) -> HashMap<SeriesId, SeriesRecord> {
        let ids: HashSet<SeriesId> = episodes.iter().map(|e| e.series_id).collect();
        let lookups = ids.into_iter().map(|id| async move {
            let found = self.directory.get_by_id(id).await;
            if found.is_none() {
                debug!(series_id = %id, "Series not in directory");
            }
            found.map(|s| (id, s))
        });

        join_all(lookups).await.into_iter().flatten().collect()
    }

    /// The single merge path for fetched batches and pushed updates alike.
    /// Subscribers receive the batch exactly as passed in.
    pub async fn upsert(&self, events: Vec<CalendarEvent>) -> MergeStats {
        let stats = self.cache.write().await.upsert(&events);

        metrics::counter!("calendar_events_merged_total").increment(stats.total() as u64);
        debug!(
            batch = events.len(),
            inserted = stats.inserted,
            updated = stats.updated,
            moved = stats.moved,
            "Merged calendar events"
        );

        self.notifier
            .publish(CalendarNotification::EventsMerged { events });
        stats
    }

    /// Merges a single pushed episode change, e.g. a watched toggle.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Ingest`] when the record has no usable
    /// timestamp or identifier.
    pub async fn apply_episode_update(
        &self,
        episode: EpisodeRecord,
    ) -> Result<MergeStats, CalendarError> {
        let offset = self.cache.read().await.offset();
        let series = self.directory.get_by_id(episode.series_id).await;
        let event = CalendarEvent::from_record(episode, series, offset)?;
        Ok(self.upsert(vec![event]).await)
    }

    /// Drops all cached events and re-fetches the window around `today`,
    /// for use after the followed series changed.
    ///
    /// # Errors
    ///
    /// See [`set_date`](Self::set_date).
    pub async fn favorites_changed(
        &self,
        today: NaiveDate,
    ) -> Result<SetDateOutcome, CalendarError> {
        info!("Followed series changed, refreshing calendar");
        self.clear_cache().await;
        self.set_date(today, None).await
    }

    /// Empties the cache and resets the window guard. Does not fetch.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        self.notifier.publish(CalendarNotification::CacheCleared);
    }

    pub async fn has_event(&self, date: NaiveDate) -> bool {
        self.cache.read().await.has_event(date)
    }

    pub async fn get_events(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        self.cache.read().await.get_events(date).to_vec()
    }

    pub async fn events_in_range(&self, window: DateWindow) -> Vec<(DayKey, Vec<CalendarEvent>)> {
        self.cache
            .read()
            .await
            .events_in_range(window.start, window.end)
    }

    pub async fn locate(&self, id: EpisodeId) -> Option<DayKey> {
        self.cache.read().await.locate(id)
    }

    pub async fn last_resolved_start(&self) -> Option<DayKey> {
        self.cache.read().await.last_resolved_start()
    }
}
