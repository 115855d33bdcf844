//! Core data models for the contribution calendar service
//!
//! This module contains the types shared by the scraping, aggregation,
//! caching and serving layers, plus the error type returned by the fetch
//! pipeline.

pub mod aggregate;
pub mod contributions;
pub mod extract;

pub use aggregate::{aggregate, BUCKET_SIZE};
pub use contributions::ContributionClient;
pub use extract::{CalendarExtractor, Extractor};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single day cell from the contribution calendar
///
/// Ordering is by date first, then count, so sorting a scrape is
/// deterministic even if the markup repeats a date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContributionDay {
    /// Calendar date, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    /// Number of contributions made on that date
    pub count: u64,
}

/// Up to seven consecutive contribution days (one week of display)
pub type ContributionBucket = Vec<ContributionDay>;

/// Aggregated contribution calendar for one user
///
/// This is both the unit stored in the cache and the body returned to
/// clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionResult {
    /// Sum of every day's count
    pub total: u64,
    /// Days in ascending date order, chunked into weeks
    #[serde(rename = "contributions")]
    pub buckets: Vec<ContributionBucket>,
}

impl ContributionResult {
    /// Sum of the counts actually held in the buckets, or `None` on overflow
    pub fn bucket_sum(&self) -> Option<u64> {
        aggregate::checked_total(self.days())
    }

    /// Iterates over every day across all buckets, in order
    pub fn days(&self) -> impl Iterator<Item = &ContributionDay> {
        self.buckets.iter().flatten()
    }
}

/// Errors that can occur when fetching contribution data
#[derive(Debug, Error)]
pub enum ContributionError {
    /// A count token or date in the scraped markup could not be parsed
    #[error("Failed to parse contribution data: {0}")]
    Parse(String),

    /// The upstream host could not be reached
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The upstream host answered with a non-200 status
    #[error("Failed to fetch data, status code: {status}")]
    Fetch {
        /// HTTP status code returned by upstream
        status: u16,
    },
}
