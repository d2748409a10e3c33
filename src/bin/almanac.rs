//! Almanac CLI - history for any day of the year
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode, starting on the cover
//! almanac
//!
//! # Explore a date, open the fourth event and print the export log
//! almanac --date 07-20 --open 4 --export
//!
//! # Today's events as JSON lines
//! almanac --today --json | jq .
//!
//! # A random date, only card content
//! almanac --random --quiet
//! ```

use anyhow::Result;
use clap::Parser;

use almanac_lib::cli::{execute_once, initialize, run_repl, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Validate the date before touching settings or the network
    let date = args.resolve_date()?;

    let mut ctx = initialize(&args).await?;

    let result = match date {
        Some(date) => execute_once(&mut ctx, date).await,
        None => run_repl(&mut ctx).await,
    };

    // Graceful shutdown
    ctx.shutdown().await?;

    result
}
