//! Shelf-life text
//!
//! Accepted forms:
//! - A plain number of days: `"10"`, `"2.5"`.
//! - An ISO-8601 style duration with a single unit: `"P2W"`, `"P1.5Y"`.
//! - A number followed by a unit word: `"3 days"`, `"1.5 years"`, `"2wk"`.
//!
//! A year is 365 days, a month 30 and a week 7. Fractional days are truncated.

use std::{fmt::Display, str::FromStr};

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const DAYS_PER_YEAR: f64 = 365.0;
const DAYS_PER_MONTH: f64 = 30.0;
const DAYS_PER_WEEK: f64 = 7.0;
/// Longest shelf life accepted from text or numbers
pub const MAX_DAYS: i64 = i32::MAX as i64;

static ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^P(\d+(?:\.\d+)?)([YMWD])$").expect("valid ISO regex"));
static NATURAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(\d+(?:\.\d+)?)\s*(years?|yrs?|y|months?|mos?|m|weeks?|wks?|w|days?|d)$",
    )
    .expect("valid natural regex")
});
static PLAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("valid plain regex"));

/// How long a product keeps, in whole days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ShelfLife {
    days: i64,
}

impl ShelfLife {
    pub const fn from_days(days: i64) -> Self {
        Self { days }
    }

    pub const fn days(&self) -> i64 {
        self.days
    }

    /// Expiration date for a product bought on `date`
    ///
    /// `None` when the result falls outside the supported calendar.
    pub fn expires_from(&self, date: NaiveDate) -> Option<NaiveDate> {
        let days = Days::new(self.days.unsigned_abs());
        if self.days >= 0 {
            date.checked_add_days(days)
        } else {
            date.checked_sub_days(days)
        }
    }
}

impl TryFrom<i64> for ShelfLife {
    type Error = ValidationError;

    fn try_from(days: i64) -> Result<Self, Self::Error> {
        if (0..=MAX_DAYS).contains(&days) {
            Ok(Self::from_days(days))
        } else {
            Err(ValidationError::InvalidShelfLife(days.to_string()))
        }
    }
}

impl From<ShelfLife> for i64 {
    fn from(value: ShelfLife) -> Self {
        value.days
    }
}

impl Display for ShelfLife {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.days {
            1 => write!(f, "1 day"),
            n => write!(f, "{n} days"),
        }
    }
}

impl FromStr for ShelfLife {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_shelf_life(s)
    }
}

/// Parse shelf-life text
///
/// ```
/// # use larder::shelf_life::parse_shelf_life;
/// assert_eq!(parse_shelf_life("P2W").unwrap().days(), 14);
/// assert_eq!(parse_shelf_life("1.5 years").unwrap().days(), 547);
/// assert!(parse_shelf_life("a while").is_err());
/// ```
pub fn parse_shelf_life(text: &str) -> Result<ShelfLife, ValidationError> {
    let trimmed = text.trim();
    let invalid = || ValidationError::InvalidShelfLife(text.to_string());

    let (number, multiplier) = if PLAIN_RE.is_match(trimmed) {
        (trimmed, 1.0)
    } else if let Some(caps) = ISO_RE.captures(trimmed) {
        let multiplier = match caps[2].to_ascii_uppercase().as_str() {
            "Y" => DAYS_PER_YEAR,
            "M" => DAYS_PER_MONTH,
            "W" => DAYS_PER_WEEK,
            _ => 1.0,
        };
        (caps.get(1).map_or("", |m| m.as_str()), multiplier)
    } else if let Some(caps) = NATURAL_RE.captures(trimmed) {
        let word = caps[2].to_ascii_lowercase();
        let multiplier = match word.chars().next() {
            Some('y') => DAYS_PER_YEAR,
            Some('m') => DAYS_PER_MONTH,
            Some('w') => DAYS_PER_WEEK,
            _ => 1.0,
        };
        (caps.get(1).map_or("", |m| m.as_str()), multiplier)
    } else {
        return Err(invalid());
    };

    let number: f64 = number.parse().map_err(|_| invalid())?;
    let days = (number * multiplier).trunc();
    if !days.is_finite() || days > MAX_DAYS as f64 {
        return Err(invalid());
    }
    Ok(ShelfLife::from_days(days as i64))
}
