//! Collaborators the calendar pulls data from.

use thiserror::Error;

use crate::domain::SeriesId;
use crate::models::{EpisodeRecord, SeriesRecord};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Episode source unavailable: {0}")]
    Unavailable(String),
}

/// Async lookup of episodes by air date.
#[async_trait::async_trait]
pub trait EpisodeSource: Send + Sync {
    /// Episodes whose first-aired instant lies in `[start_ms, end_ms)`.
    ///
    /// # Errors
    ///
    /// Any [`SourceError`]; the calendar logs it and merges nothing.
    async fn fetch_range(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<EpisodeRecord>, SourceError>;
}

/// Lookup of followed series.
#[async_trait::async_trait]
pub trait SeriesDirectory: Send + Sync {
    async fn get_by_id(&self, id: SeriesId) -> Option<SeriesRecord>;

    /// True when no series are followed, in which case there is nothing to
    /// put on the calendar.
    async fn is_empty(&self) -> bool;
}
