//! CLI argument parsing using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::explorer::ExploreDate;

/// Almanac - what happened on this day in history
#[derive(Parser, Debug, Clone)]
#[command(name = "almanac")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Explore today's date and exit
    #[arg(long, group = "mode")]
    pub today: bool,

    /// Explore a random date and exit
    #[arg(long, group = "mode")]
    pub random: bool,

    /// Explore a date given as MM-DD (e.g. 07-20) and exit
    #[arg(short = 'd', long, value_name = "MM-DD", group = "mode")]
    pub date: Option<String>,

    /// Open event N of the list (1-5); repeatable
    #[arg(short = 'o', long = "open", value_name = "N", requires = "mode")]
    pub open: Vec<usize>,

    /// Write the export log to PATH, or stdout when no path is given
    #[arg(long, value_name = "PATH", num_args = 0..=1, requires = "mode")]
    pub export: Option<Option<PathBuf>>,

    /// Override model from settings
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// API key (overrides settings and env vars)
    #[arg(long, env = "ALMANAC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output events as JSON lines (for scripting/parsing)
    #[arg(long)]
    pub json: bool,

    /// Only print card content (no progress or banners)
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Date to explore once, if a one-shot mode was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateMode {
    Today,
    Random,
    Exact(String),
}

impl Args {
    pub fn date_mode(&self) -> Option<DateMode> {
        if self.today {
            Some(DateMode::Today)
        } else if self.random {
            Some(DateMode::Random)
        } else {
            self.date.clone().map(DateMode::Exact)
        }
    }

    /// Resolve the one-shot date, validating `--date`.
    pub fn resolve_date(&self) -> anyhow::Result<Option<ExploreDate>> {
        let date = match self.date_mode() {
            None => None,
            Some(DateMode::Today) => Some(ExploreDate::today()),
            Some(DateMode::Random) => Some(ExploreDate::random()),
            Some(DateMode::Exact(raw)) => Some(ExploreDate::parse(&raw)?),
        };
        Ok(date)
    }
}
