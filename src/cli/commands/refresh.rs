//! Library refresh command handler

use chrono::Local;

use crate::config::Config;
use crate::services::SetDateOutcome;
use crate::state::SharedState;

pub async fn cmd_refresh(config: &Config) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let today = Local::now().date_naive();

    match state.refresh_library(today).await? {
        SetDateOutcome::NoSeries => {
            println!("No series followed in {}.", state.config.library.path);
        }
        SetDateOutcome::Fetched { window, stats } => {
            println!(
                "✓ Calendar rebuilt for {} .. {}: {} episodes",
                window.start.format("%Y-%m-%d"),
                window.end.format("%Y-%m-%d"),
                stats.total()
            );
        }
        SetDateOutcome::AlreadyResolved { window } => {
            println!(
                "Calendar for {} .. {} is up to date.",
                window.start.format("%Y-%m-%d"),
                window.end.format("%Y-%m-%d")
            );
        }
    }

    Ok(())
}
