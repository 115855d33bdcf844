//! Scraping of the contribution calendar out of profile page markup
//!
//! The calendar renders one cell per day carrying a `data-date` attribute,
//! and a screen-reader tooltip per cell whose text starts with the count
//! ("No contributions on ...", "5 contributions on ..."). Dates and counts
//! are collected separately and paired by position.

use chrono::NaiveDate;
use regex::Regex;
use tracing::warn;

use super::{ContributionDay, ContributionError};

/// Captures the date attribute of a calendar day cell
pub const DEFAULT_DATE_PATTERN: &str = r#"data-date="(.*?)" id="contribution-day-component"#;

/// Captures the leading count token of a day's tooltip
pub const DEFAULT_COUNT_PATTERN: &str =
    r#"<tool-tip .*?class="sr-only position-absolute">(.*?) contribution"#;

/// Token the upstream page uses for a day without contributions
const NO_CONTRIBUTIONS_TOKEN: &str = "No";

/// Turns page markup into a list of contribution days
pub trait Extractor: Send + Sync {
    /// Extracts the days found in `markup`, in document order
    ///
    /// An empty vector means the page held no calendar data.
    fn extract(&self, markup: &str) -> Result<Vec<ContributionDay>, ContributionError>;
}

/// Regex-based extractor for the profile contribution calendar
#[derive(Debug, Clone)]
pub struct CalendarExtractor {
    date_pattern: Regex,
    count_pattern: Regex,
}

impl CalendarExtractor {
    /// Creates an extractor using the patterns for the current calendar markup
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_patterns(DEFAULT_DATE_PATTERN, DEFAULT_COUNT_PATTERN)
    }

    /// Creates an extractor with custom patterns
    ///
    /// Each pattern must have one capture group: the date value and the
    /// count token respectively.
    pub fn with_patterns(date_pattern: &str, count_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            date_pattern: Regex::new(date_pattern)?,
            count_pattern: Regex::new(count_pattern)?,
        })
    }

    fn captures<'a>(pattern: &Regex, markup: &'a str) -> Vec<&'a str> {
        pattern
            .captures_iter(markup)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect()
    }
}

impl Extractor for CalendarExtractor {
    fn extract(&self, markup: &str) -> Result<Vec<ContributionDay>, ContributionError> {
        let dates = Self::captures(&self.date_pattern, markup);
        let counts = Self::captures(&self.count_pattern, markup);

        if dates.is_empty() || counts.is_empty() {
            return Ok(Vec::new());
        }

        if dates.len() != counts.len() {
            warn!(
                dates = dates.len(),
                counts = counts.len(),
                "Calendar dates and counts differ in length, pairing the shorter prefix"
            );
        }

        dates
            .into_iter()
            .zip(counts)
            .map(|(date, count)| -> Result<ContributionDay, ContributionError> {
                Ok(ContributionDay {
                    date: parse_date(date)?,
                    count: parse_count(count)?,
                })
            })
            .collect()
    }
}

/// Parses a `YYYY-MM-DD` date attribute
fn parse_date(token: &str) -> Result<NaiveDate, ContributionError> {
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .map_err(|e| ContributionError::Parse(format!("Invalid date '{}': {}", token, e)))
}

/// Parses a tooltip count token, mapping "No" to zero
pub fn parse_count(token: &str) -> Result<u64, ContributionError> {
    if token == NO_CONTRIBUTIONS_TOKEN {
        return Ok(0);
    }
    token
        .parse::<u64>()
        .map_err(|_| ContributionError::Parse(format!("Invalid contribution count '{}'", token)))
}
