//! Almanac: explore what happened on any day of the year, one card at a time.

pub mod error;
pub mod explorer;
pub mod runtime;
pub mod settings;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{AlmanacError, Result};
