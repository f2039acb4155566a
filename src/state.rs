use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use crate::calendar::ChangeNotifier;
use crate::config::Config;
use crate::library::JsonLibrary;
use crate::services::{CalendarService, SetDateOutcome};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub library: Arc<JsonLibrary>,

    pub calendar: CalendarService,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let library = Arc::new(JsonLibrary::open(&config.library.path).await?);
        Self::from_library(config, library)
    }

    /// Wires the calendar to an already-loaded library.
    pub fn from_library(config: Config, library: Arc<JsonLibrary>) -> anyhow::Result<Self> {
        let calendar = CalendarService::new(
            config.calendar.clone(),
            library.clone(),
            library.clone(),
            ChangeNotifier::new(config.general.event_bus_buffer_size),
        )?;

        Ok(Self {
            config: Arc::new(config),
            library,
            calendar,
        })
    }

    /// Re-reads the library file after the followed series changed on disk
    /// and rebuilds the calendar around `today`.
    pub async fn refresh_library(&self, today: NaiveDate) -> anyhow::Result<SetDateOutcome> {
        let series = self.library.reload().await?;
        info!(series, "Library reloaded");
        Ok(self.calendar.favorites_changed(today).await?)
    }
}
