//! Calendar day selection: today, a random day, or a typed `MM-DD`.
//!
//! Exploration is year-agnostic; only month and day travel to the prompt.
//! Typed input is validated against a non-leap reference year, so `02-29`
//! is rejected even though "today" may legitimately be February 29.

use std::fmt;

use chrono::{Datelike, Local, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AlmanacError, Result};

/// Non-leap year used to validate typed input and draw random days.
pub const REFERENCE_YEAR: i32 = 2023;

/// Leap year used only for rendering, so February 29 can be displayed.
const DISPLAY_YEAR: i32 = 2024;

/// A month/day pair with no year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreDate {
    month: u32,
    day: u32,
}

impl ExploreDate {
    /// Build from month and day, validated against [`REFERENCE_YEAR`].
    pub fn new(month: u32, day: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(AlmanacError::InputValidation(format!(
                "month {} is out of range 1-12",
                month
            )));
        }
        let max_day = days_in_month(REFERENCE_YEAR, month);
        if day < 1 || day > max_day {
            return Err(AlmanacError::InputValidation(format!(
                "month {} has no day {}",
                month, day
            )));
        }
        Ok(Self { month, day })
    }

    /// Parse `MM-DD` (single-digit parts such as `7-4` are accepted).
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AlmanacError::InputValidation(
                "enter a date as MM-DD, e.g. 01-01 or 12-25".to_string(),
            ));
        }

        let parts: Vec<&str> = trimmed.split('-').collect();
        if parts.len() != 2 {
            return Err(AlmanacError::InputValidation(format!(
                "'{}' is not in MM-DD format",
                trimmed
            )));
        }

        let month = parse_component(parts[0], "month")?;
        let day = parse_component(parts[1], "day")?;
        Self::new(month, day)
    }

    /// Today's month and day in local time.
    pub fn today() -> Self {
        Self::from_naive(Local::now().date_naive())
    }

    /// A uniformly chosen month, then a uniformly chosen day within it.
    pub fn random() -> Self {
        Self::random_with(&mut rand::thread_rng())
    }

    pub fn random_with<R: Rng>(rng: &mut R) -> Self {
        let month = rng.gen_range(1..=12);
        let day = rng.gen_range(1..=days_in_month(REFERENCE_YEAR, month));
        Self { month, day }
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Zero-padded `MM-DD`.
    pub fn mm_dd(&self) -> String {
        format!("{:02}-{:02}", self.month, self.day)
    }

    /// Human form such as `July 20`.
    pub fn display_name(&self) -> String {
        match NaiveDate::from_ymd_opt(DISPLAY_YEAR, self.month, self.day) {
            Some(date) => date.format("%B %-d").to_string(),
            None => self.mm_dd(),
        }
    }
}

impl fmt::Display for ExploreDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// ASCII digits only, no sign.
fn parse_component(raw: &str, what: &str) -> Result<u32> {
    let raw = raw.trim();
    let invalid = || AlmanacError::InputValidation(format!("{} '{}' is not a number", what, raw));
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    raw.parse::<u32>().map_err(|_| invalid())
}

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}
