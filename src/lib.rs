pub mod calendar;
pub mod cli;
pub mod config;
pub mod domain;
pub mod library;
pub mod models;
pub mod services;
pub mod state;

use clap::Parser;
use cli::{Cli, Commands, cmd_calendar, cmd_day, cmd_refresh, cmd_watched};
pub use config::Config;
use tracing_subscriber::EnvFilter;

pub use calendar::{CalendarEvent, DateWindow, EventCache, compute_window};
pub use services::{CalendarError, CalendarService, SetDateOutcome};

/// Runs the command line against an already-loaded config.
pub async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    init_tracing(&config);

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Calendar { date, mode }) => cmd_calendar(&config, date, mode).await,

        Some(Commands::Day { date }) => cmd_day(&config, date).await,

        Some(Commands::Watched {
            episode_id,
            unwatch,
        }) => cmd_watched(&config, episode_id, unwatch).await,

        Some(Commands::Refresh) => cmd_refresh(&config).await,

        Some(Commands::Init) => {
            match Config::create_default_if_missing()? {
                Some(path) => println!(
                    "✓ Config file created. Edit {} and run again.",
                    path.display()
                ),
                None => println!("Config file already exists."),
            }
            Ok(())
        }

        None => cmd_calendar(&config, None, None).await,
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let (json_layer, fmt_layer) = if config.general.log_json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        (Some(layer), None)
    } else {
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        (None, Some(layer))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(fmt_layer)
        .init();
}
