//! CLI module - Command-line interface for tvcal
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::CalendarMode;

/// tvcal - Episode calendar for followed TV series
#[derive(Parser)]
#[command(name = "tvcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the calendar window around a date
    #[command(alias = "cal", alias = "c")]
    Calendar {
        /// Anchor date (YYYY-MM-DD), defaults to today
        date: Option<NaiveDate>,
        /// View mode: week or month
        #[arg(long, short)]
        mode: Option<CalendarMode>,
    },

    /// Show the episodes airing on one day
    #[command(alias = "d")]
    Day {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
    },

    /// Mark an episode watched (or unwatched) and show its updated day
    #[command(alias = "w")]
    Watched {
        /// Episode ID
        episode_id: i64,
        /// Mark as not watched instead
        #[arg(long)]
        unwatch: bool,
    },

    /// Reload the library file and rebuild the calendar around today
    #[command(alias = "r")]
    Refresh,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
