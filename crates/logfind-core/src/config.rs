//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LogError, Result};

/// Default directory scanned for log files.
pub const DEFAULT_LOG_DIR: &str = "/var/log/app";

/// Default number of mapped files kept open.
pub const DEFAULT_MAX_OPEN_FILES: usize = 20;

/// Default lifetime of a mapped file: 10 minutes.
pub const DEFAULT_FILE_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Default lifetime of a memoized lookup: 5 minutes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default interval between index refreshes: 60 minutes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Configuration for the retrieval engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory holding the log files.
    pub log_dir: PathBuf,
    /// Maximum number of simultaneously mapped files.
    pub max_open_files: usize,
    /// How long a mapped file stays cached.
    pub file_cache_ttl: Duration,
    /// How long a resolved lookup stays memoized.
    pub cache_ttl: Duration,
    /// How often the time-range index is rebuilt.
    pub refresh_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            max_open_files: DEFAULT_MAX_OPEN_FILES,
            file_cache_ttl: DEFAULT_FILE_CACHE_TTL,
            cache_ttl: DEFAULT_CACHE_TTL,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Creates a config for `log_dir` with default limits.
    #[must_use]
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            ..Default::default()
        }
    }

    /// Sets the mapped file capacity.
    #[must_use]
    pub const fn with_max_open_files(mut self, max: usize) -> Self {
        self.max_open_files = max;
        self
    }

    /// Sets the mapped file TTL.
    #[must_use]
    pub const fn with_file_cache_ttl(mut self, ttl: Duration) -> Self {
        self.file_cache_ttl = ttl;
        self
    }

    /// Sets the result cache TTL.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the index refresh interval.
    #[must_use]
    pub const fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] for a zero capacity or a zero
    /// duration.
    pub fn validate(&self) -> Result<()> {
        if self.max_open_files == 0 {
            return Err(LogError::InvalidConfig(
                "max_open_files must be at least 1".to_string(),
            ));
        }

        let durations = [
            ("file_cache_ttl", self.file_cache_ttl),
            ("cache_ttl", self.cache_ttl),
            ("refresh_interval", self.refresh_interval),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, d)| d.is_zero()) {
            return Err(LogError::InvalidConfig(format!("{name} must be non-zero")));
        }

        Ok(())
    }
}
