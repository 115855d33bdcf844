//! Cache module for storing the aggregated contribution result
//!
//! The service keeps a single cache slot. Freshness is decided lazily from
//! the age of the stored entry: anything older than the configured number
//! of days is treated as absent, although it stays readable until the next
//! successful fetch overwrites it.

mod memory;
mod store;

pub use memory::MemoryCache;
pub use store::FileCache;

use chrono::Duration;
use thiserror::Error;

use crate::data::ContributionResult;

/// Errors that can occur when reading or writing the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache file could not be read or written
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cached bytes do not hold a valid contribution result
    #[error("Cache entry is corrupt: {0}")]
    Corrupt(String),
}

/// A single-slot store for the last fetched contribution result
pub trait CacheStore: Send + Sync {
    /// Whether an entry exists and is younger than `max_age_days` days
    fn is_valid(&self, max_age_days: u64) -> bool;

    /// Reads the stored result
    fn read(&self) -> Result<ContributionResult, CacheError>;

    /// Replaces the stored result
    fn write(&self, result: &ContributionResult) -> Result<(), CacheError>;
}

/// Strict freshness check shared by the store implementations
///
/// A negative age (timestamp in the future) counts as zero.
pub(crate) fn is_fresh(age: Duration, max_age_days: u64) -> bool {
    let max_age = i64::try_from(max_age_days)
        .ok()
        .and_then(Duration::try_days)
        .unwrap_or(Duration::MAX);
    age.max(Duration::zero()) < max_age
}

/// Rejects results whose total disagrees with their buckets
pub(crate) fn check_consistent(result: ContributionResult) -> Result<ContributionResult, CacheError> {
    let sum = result
        .bucket_sum()
        .ok_or_else(|| CacheError::Corrupt("sum of days overflows".to_string()))?;
    if sum != result.total {
        return Err(CacheError::Corrupt(format!(
            "total {} does not match sum of days {}",
            result.total, sum
        )));
    }
    Ok(result)
}
