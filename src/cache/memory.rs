//! In-memory cache store, for tests and embedding without a filesystem

use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use super::{is_fresh, CacheError, CacheStore};
use crate::data::ContributionResult;

#[derive(Debug, Clone)]
struct Slot {
    result: ContributionResult,
    written_at: DateTime<Utc>,
}

/// Mutex-guarded single cache slot held in memory
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<Slot>>,
}

impl MemoryCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-populated with a result written at `written_at`
    pub fn with_entry(result: ContributionResult, written_at: DateTime<Utc>) -> Self {
        Self {
            slot: Mutex::new(Some(Slot { result, written_at })),
        }
    }

    /// When the current entry was written, if any
    pub fn written_at(&self) -> Option<DateTime<Utc>> {
        self.lock().as_ref().map(|slot| slot.written_at)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Slot>> {
        // Slot is only ever replaced whole, so a poisoned value is still usable
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for MemoryCache {
    fn is_valid(&self, max_age_days: u64) -> bool {
        match self.written_at() {
            Some(written_at) => is_fresh(Utc::now() - written_at, max_age_days),
            None => false,
        }
    }

    fn read(&self) -> Result<ContributionResult, CacheError> {
        self.lock()
            .as_ref()
            .map(|slot| slot.result.clone())
            .ok_or_else(|| CacheError::Corrupt("cache slot is empty".to_string()))
    }

    fn write(&self, result: &ContributionResult) -> Result<(), CacheError> {
        *self.lock() = Some(Slot {
            result: result.clone(),
            written_at: Utc::now(),
        });
        Ok(())
    }
}
