//! Aggregation of scraped calendar days into a week-bucketed result

use super::{ContributionDay, ContributionError, ContributionResult};

/// Maximum number of days in a bucket
pub const BUCKET_SIZE: usize = 7;

/// Sorts, sums and buckets a sequence of contribution days
///
/// Days are sorted ascending by date (ties broken by count), summed into
/// `total`, and chunked into buckets of [`BUCKET_SIZE`]. The final bucket
/// holds the remainder; nothing is padded. Empty input yields an empty
/// result.
///
/// Fails with `ContributionError::Parse` if the counts do not fit in a `u64` total.
pub fn aggregate(mut days: Vec<ContributionDay>) -> Result<ContributionResult, ContributionError> {
    days.sort();

    let total = checked_total(&days)
        .ok_or_else(|| ContributionError::Parse("Contribution total overflows".to_string()))?;
    let buckets = days.chunks(BUCKET_SIZE).map(<[_]>::to_vec).collect();

    Ok(ContributionResult { total, buckets })
}

/// Sums the counts of `days`, or `None` on overflow
pub(crate) fn checked_total<'a>(days: impl IntoIterator<Item = &'a ContributionDay>) -> Option<u64> {
    days.into_iter()
        .try_fold(0u64, |total, day| total.checked_add(day.count))
}
