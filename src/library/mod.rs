//! JSON-file library of followed series and their episodes.
//!
//! [`JsonLibrary`] is the application's episode source and series directory.
//! The file is read on [`open`](JsonLibrary::open) and on
//! [`reload`](JsonLibrary::reload); lookups are served from memory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::calendar::{EpisodeSource, SeriesDirectory, SourceError};
use crate::domain::{EpisodeId, SeriesId};
use crate::models::{EpisodeRecord, SeriesRecord};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Failed to read library file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse library file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Library is not backed by a file")]
    NotFileBacked,

    #[error("Episode {0} not found in library")]
    EpisodeNotFound(EpisodeId),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryData {
    #[serde(default)]
    pub series: Vec<SeriesRecord>,

    #[serde(default)]
    pub episodes: Vec<EpisodeRecord>,
}

pub struct JsonLibrary {
    path: Option<PathBuf>,
    data: RwLock<LibraryData>,
}

impl JsonLibrary {
    #[must_use]
    pub fn in_memory(series: Vec<SeriesRecord>, episodes: Vec<EpisodeRecord>) -> Self {
        Self {
            path: None,
            data: RwLock::new(LibraryData { series, episodes }),
        }
    }

    /// Loads the library at `path`. A missing file is an empty library.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Io`] or [`LibraryError::Parse`] when the file exists but
    /// cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let path = path.into();
        let data = read_library(&path).await?;
        info!(
            path = %path.display(),
            series = data.series.len(),
            episodes = data.episodes.len(),
            "Library loaded"
        );

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Re-reads the backing file, returning the number of followed series.
    ///
    /// # Errors
    ///
    /// [`LibraryError::NotFileBacked`] for in-memory libraries, otherwise as
    /// for [`open`](Self::open).
    pub async fn reload(&self) -> Result<usize, LibraryError> {
        let path = self.path.as_ref().ok_or(LibraryError::NotFileBacked)?;
        let data = read_library(path).await?;
        let count = data.series.len();
        *self.data.write().await = data;
        Ok(count)
    }

    /// Writes the current contents back to the backing file.
    ///
    /// # Errors
    ///
    /// [`LibraryError::NotFileBacked`] for in-memory libraries, or
    /// [`LibraryError::Io`] when the write fails.
    pub async fn save(&self) -> Result<(), LibraryError> {
        let path = self.path.as_ref().ok_or(LibraryError::NotFileBacked)?;
        let content = {
            let data = self.data.read().await;
            serde_json::to_string_pretty(&*data).map_err(|source| LibraryError::Parse {
                path: path.clone(),
                source,
            })?
        };

        tokio::fs::write(path, content)
            .await
            .map_err(|source| LibraryError::Io {
                path: path.clone(),
                source,
            })
    }

    /// Sets an episode's watched flag and returns the updated record.
    ///
    /// # Errors
    ///
    /// [`LibraryError::EpisodeNotFound`] when the id is unknown.
    pub async fn set_watched(
        &self,
        id: EpisodeId,
        watched: bool,
    ) -> Result<EpisodeRecord, LibraryError> {
        let mut data = self.data.write().await;
        let episode = data
            .episodes
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(LibraryError::EpisodeNotFound(id))?;
        episode.watched = watched;
        Ok(episode.clone())
    }

    pub async fn series_count(&self) -> usize {
        self.data.read().await.series.len()
    }
}

async fn read_library(path: &Path) -> Result<LibraryData, LibraryError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Library file not found, starting empty");
            return Ok(LibraryData::default());
        }
        Err(source) => {
            return Err(LibraryError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&content).map_err(|source| LibraryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait::async_trait]
impl EpisodeSource for JsonLibrary {
    async fn fetch_range(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<EpisodeRecord>, SourceError> {
        let data = self.data.read().await;
        let mut found = Vec::new();

        for episode in &data.episodes {
            let Some(air_time) = episode.air_time() else {
                warn!(episode_id = %episode.id, "Episode without air date, skipping");
                continue;
            };
            let millis = air_time.timestamp_millis();
            if (start_ms..end_ms).contains(&millis) {
                found.push(episode.clone());
            }
        }

        Ok(found)
    }
}

#[async_trait::async_trait]
impl SeriesDirectory for JsonLibrary {
    async fn get_by_id(&self, id: SeriesId) -> Option<SeriesRecord> {
        self.data
            .read()
            .await
            .series
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    async fn is_empty(&self) -> bool {
        self.data.read().await.series.is_empty()
    }
}
