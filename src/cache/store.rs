//! File-backed cache store
//!
//! Persists the contribution result as pretty-printed JSON. The file's
//! modification time is the entry's timestamp, so no metadata is stored
//! alongside the data.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::{check_consistent, is_fresh, CacheError, CacheStore};
use crate::data::ContributionResult;

/// File name of the cache slot inside the cache directory
pub const CACHE_FILE_NAME: &str = "data.json";

/// Distinguishes temp files of concurrent writers within one process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Stores the cached result in a single JSON file
///
/// Writes go to a sibling temp file that is renamed over the cache file,
/// so a concurrent reader sees either the old or the new entry, never a
/// partial one.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Location of the cache file
    path: PathBuf,
}

impl FileCache {
    /// Creates a FileCache backed by the given file
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default cache file location
    ///
    /// Uses `~/.cache/gitcal/data.json` on Linux, or the platform equivalent.
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "gitcal")?;
        Some(project_dirs.cache_dir().join(CACHE_FILE_NAME))
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the cache file, if it exists
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    fn temp_path(&self) -> PathBuf {
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| CACHE_FILE_NAME.into());
        name.push(format!(".{}.{}.tmp", std::process::id(), seq));
        self.path.with_file_name(name)
    }
}

impl CacheStore for FileCache {
    fn is_valid(&self, max_age_days: u64) -> bool {
        match self.modified_at() {
            Some(modified) => is_fresh(Utc::now() - modified, max_age_days),
            None => false,
        }
    }

    fn read(&self) -> Result<ContributionResult, CacheError> {
        let content = fs::read_to_string(&self.path)?;
        let result: ContributionResult =
            serde_json::from_str(&content).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        check_consistent(result)
    }

    fn write(&self, result: &ContributionResult) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(result)
            .map_err(|e| CacheError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        let temp_path = self.temp_path();
        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&temp_path, &self.path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(path = %self.path.display(), total = result.total, "Wrote contribution cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ContributionDay;
    use chrono::NaiveDate;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn create_test_cache() -> (FileCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = FileCache::with_path(temp_dir.path().join(CACHE_FILE_NAME));
        (cache, temp_dir)
    }

    fn sample_result() -> ContributionResult {
        let day = |d: &str, count| ContributionDay {
            date: NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
            count,
        };
        ContributionResult {
            total: 3,
            buckets: vec![vec![day("2024-01-01", 0), day("2024-01-02", 2), day("2024-01-03", 1)]],
        }
    }

    /// Pushes the cache file's modification time into the past
    fn age_cache_file(cache: &FileCache, age: Duration) {
        let file = fs::File::options()
            .write(true)
            .open(cache.path())
            .expect("Cache file should exist");
        file.set_modified(SystemTime::now() - age)
            .expect("Should set modification time");
    }

    #[test]
    fn test_is_valid_false_when_missing() {
        let (cache, _temp_dir) = create_test_cache();
        assert!(!cache.is_valid(3));
    }

    #[test]
    fn test_is_valid_true_right_after_write() {
        let (cache, _temp_dir) = create_test_cache();

        cache.write(&sample_result()).expect("Write should succeed");

        assert!(cache.is_valid(3), "Fresh cache should be valid");
    }

    #[test]
    fn test_is_valid_false_once_aged_past_threshold() {
        let (cache, _temp_dir) = create_test_cache();
        cache.write(&sample_result()).expect("Write should succeed");

        age_cache_file(&cache, Duration::from_secs(3 * 86_400 + 60));

        assert!(!cache.is_valid(3), "Cache older than 3 days should be expired");
        assert!(cache.is_valid(4));
    }

    #[test]
    fn test_expired_entry_remains_readable() {
        let (cache, _temp_dir) = create_test_cache();
        cache.write(&sample_result()).expect("Write should succeed");
        age_cache_file(&cache, Duration::from_secs(10 * 86_400));

        assert!(!cache.is_valid(3));
        assert_eq!(cache.read().unwrap(), sample_result());
    }

    #[test]
    fn test_write_then_read_returns_same_result() {
        let (cache, _temp_dir) = create_test_cache();

        cache.write(&sample_result()).expect("Write should succeed");

        assert_eq!(cache.read().unwrap(), sample_result());
    }

    #[test]
    fn test_write_is_pretty_json_with_contributions_field() {
        let (cache, _temp_dir) = create_test_cache();

        cache.write(&sample_result()).expect("Write should succeed");

        let content = fs::read_to_string(cache.path()).expect("Should read file");
        assert!(content.contains("\"contributions\""));
        assert!(content.contains("\"2024-01-02\""));
        assert!(content.contains('\n'), "Cache file should be pretty-printed");
    }

    #[test]
    fn test_read_corrupt_json() {
        let (cache, _temp_dir) = create_test_cache();
        fs::write(cache.path(), "{\"total\": 3, \"contrib").unwrap();

        assert!(matches!(cache.read(), Err(CacheError::Corrupt(_))));
    }

    #[test]
    fn test_read_wrong_shape() {
        let (cache, _temp_dir) = create_test_cache();
        fs::write(cache.path(), r#"{"error": "Failed to fetch data"}"#).unwrap();

        assert!(matches!(cache.read(), Err(CacheError::Corrupt(_))));
    }

    #[test]
    fn test_read_inconsistent_total() {
        let (cache, _temp_dir) = create_test_cache();
        fs::write(
            cache.path(),
            r#"{"total": 99, "contributions": [[{"date": "2024-01-01", "count": 1}]]}"#,
        )
        .unwrap();

        assert!(matches!(cache.read(), Err(CacheError::Corrupt(_))));
    }

    #[test]
    fn test_read_overflowing_counts_is_corrupt() {
        let (cache, _temp_dir) = create_test_cache();
        fs::write(
            cache.path(),
            r#"{"total": 0, "contributions": [[{"date": "2024-01-01", "count": 18446744073709551615}, {"date": "2024-01-02", "count": 1}]]}"#,
        )
        .unwrap();

        assert!(matches!(cache.read(), Err(CacheError::Corrupt(_))));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let (cache, _temp_dir) = create_test_cache();
        assert!(matches!(cache.read(), Err(CacheError::Io(_))));
    }

    #[test]
    fn test_write_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache");
        let cache = FileCache::with_path(nested_path.join(CACHE_FILE_NAME));

        cache.write(&sample_result()).expect("Write should succeed");

        assert!(nested_path.join(CACHE_FILE_NAME).exists(), "Cache file should exist");
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let (cache, temp_dir) = create_test_cache();

        cache.write(&sample_result()).expect("Write should succeed");
        cache.write(&ContributionResult::default()).expect("Write should succeed");

        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(cache.read().unwrap(), ContributionResult::default());
    }

    #[test]
    fn test_overwrite_refreshes_timestamp() {
        let (cache, _temp_dir) = create_test_cache();
        cache.write(&sample_result()).expect("Write should succeed");
        age_cache_file(&cache, Duration::from_secs(5 * 86_400));
        assert!(!cache.is_valid(3));

        cache.write(&sample_result()).expect("Write should succeed");

        assert!(cache.is_valid(3));
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        if let Some(path) = FileCache::default_path() {
            let path_str = path.to_string_lossy();
            assert!(path_str.contains("gitcal"), "Cache path should contain project name");
            assert!(path_str.ends_with(CACHE_FILE_NAME));
        }
        // Test passes if default_path() returns None (e.g., no home directory in CI)
    }
}
