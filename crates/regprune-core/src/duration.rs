//! Relative duration parsing for the `--older-than` cutoff.
//!
//! Accepts a single `<number><unit>` pair where the unit starts with
//! `h` (hours), `d` (days) or `m` (months of exactly 30 days).

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static DURATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*([a-z]+)").unwrap_or_else(|_| unreachable!()));

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;
const MONTH: u64 = 30 * DAY;

/// Parses a human-readable relative duration.
///
/// An empty string yields [`Duration::ZERO`], meaning "no age cutoff".
/// Matching is case-insensitive and only the first number/unit pair is
/// used, so `"1d2h"` is one day.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use regprune_core::parse_duration;
///
/// assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(7 * 24 * 3600));
/// assert_eq!(parse_duration("").unwrap(), Duration::ZERO);
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidDurationFormat`] when no number/unit pair is
/// found and [`Error::UnsupportedUnit`] when the unit is not h, d or m.
pub fn parse_duration(input: &str) -> Result<Duration> {
    if input.is_empty() {
        return Ok(Duration::ZERO);
    }

    let lowered = input.to_lowercase();
    let invalid = || Error::InvalidDurationFormat {
        input: input.to_string(),
    };

    let captures = DURATION_PATTERN.captures(&lowered).ok_or_else(invalid)?;
    let value: u64 = captures[1].parse().map_err(|_| invalid())?;
    let unit = &captures[2];

    let seconds_per_unit = match unit.chars().next() {
        Some('h') => HOUR,
        Some('d') => DAY,
        Some('m') => MONTH,
        _ => {
            return Err(Error::UnsupportedUnit {
                unit: unit.to_string(),
            })
        }
    };

    value
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}
