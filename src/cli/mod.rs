//! Command-line front end.
//!
//! The navigation controller reports every state change through the
//! `ExplorerRuntime` abstraction. In the CLI that runtime forwards events
//! over a channel consumed by the output loop.
//!
//! ```text
//! +----------------------+     +-------------+     +---------------+
//! | NavigationController | --> | CliRuntime  | --> | output.rs     |
//! | (explorer core)      |     | (emit())    |     | (print/JSON)  |
//! +----------------------+     +-------------+     +---------------+
//! ```
//!
//! # REPL Mode
//!
//! Without `--today`, `--random` or `--date`, the CLI enters interactive
//! REPL mode on the cover. See `repl.rs` for the commands.

mod args;
mod bootstrap;
mod output;
mod repl;
mod runner;

pub use args::{Args, DateMode};
pub use bootstrap::{initialize, CliContext};
pub use output::run_event_loop;
pub use repl::run_repl;
pub use runner::execute_once;
