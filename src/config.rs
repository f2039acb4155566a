use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::CalendarMode;

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub calendar: CalendarConfig,

    pub library: LibraryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Calendar notification buffer per subscriber (default: 100)
    pub event_bus_buffer_size: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            worker_threads: 2,
            event_bus_buffer_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// View mode used when a caller does not pass one.
    pub default_mode: CalendarMode,

    /// Offset from UTC, in minutes, of the days events are bucketed into.
    pub utc_offset_minutes: i32,

    /// Whether a window whose fetch failed may be fetched again on the next
    /// request for it. When false the window stays resolved until the cache
    /// is cleared.
    pub retry_failed_windows: bool,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            default_mode: CalendarMode::Week,
            utc_offset_minutes: 0,
            retry_failed_windows: true,
        }
    }
}

impl CalendarConfig {
    /// The configured offset, or `None` when out of range.
    #[must_use]
    pub fn offset(&self) -> Option<FixedOffset> {
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return None;
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// JSON file listing followed series and their episodes.
    pub path: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: "library.json".to_string(),
        }
    }
}

impl LibraryConfig {
    fn resolve_against(&self, dir: &Path) -> String {
        let path = Path::new(&self.path);
        if path.is_absolute() || dir.as_os_str().is_empty() {
            return self.path.clone();
        }
        dir.join(path).to_string_lossy().into_owned()
    }
}

const CONFIG_ENV: &str = "TVCAL_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "tvcal.toml";

impl Config {
    /// Loads the first config found: `$TVCAL_CONFIG`, then `./tvcal.toml`,
    /// then the per-user locations. A relative `library.path` is taken
    /// relative to the directory of the file it was read from.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) {
            info!(path = %path.display(), "Loading config from {CONFIG_ENV}");
            return Self::load_from_path(&path);
        }

        match Self::config_paths().into_iter().find(|p| p.exists()) {
            Some(path) => {
                info!(path = %path.display(), "Loading config");
                Self::load_from_path(&path)
            }
            None => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Some(dir) = path.parent() {
            config.library.path = config.library.resolve_against(dir);
        }

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        [
            Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
            dirs::config_dir().map(|d| d.join("tvcal").join("config.toml")),
            dirs::home_dir().map(|d| d.join(".tvcal").join("config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Writes a default `tvcal.toml` in the working directory unless one
    /// exists. Returns the path when a file was created.
    pub fn create_default_if_missing() -> Result<Option<PathBuf>> {
        let path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if path.exists() {
            return Ok(None);
        }
        Self::default().save_to_path(&path)?;
        Ok(Some(path))
    }

    pub fn validate(&self) -> Result<()> {
        if self.calendar.offset().is_none() {
            anyhow::bail!(
                "calendar.utc_offset_minutes must be within +/-{MAX_OFFSET_MINUTES}, got {}",
                self.calendar.utc_offset_minutes
            );
        }

        if self.general.event_bus_buffer_size == 0 {
            anyhow::bail!("general.event_bus_buffer_size must be > 0");
        }

        if self.library.path.trim().is_empty() {
            anyhow::bail!("library.path cannot be empty");
        }

        Ok(())
    }
}
