//! Query facade combining a lookup backend with result memoization.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::repository::LogRepository;
use crate::result_cache::ResultCache;
use crate::task::PeriodicTask;
use crate::timestamp::Timestamp;
use crate::traits::LogLookup;

/// Entry point for timestamp queries.
///
/// Successful lookups are memoized for the configured TTL, keyed by the
/// canonical timestamp string. Failures are never cached.
pub struct LogService<L: LogLookup = LogRepository> {
    lookup: Arc<L>,
    cache: Arc<ResultCache>,
    sweeper: Mutex<Option<PeriodicTask>>,
}

impl<L: LogLookup> std::fmt::Debug for LogService<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogService")
            .field("files", &self.lookup.file_count())
            .field("cached_results", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl LogService<LogRepository> {
    /// Opens a repository over `config.log_dir` and starts both background
    /// tasks: index refresh and result cache sweeping.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the directory cannot be
    /// listed.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let repo = LogRepository::open(config)?;
        let service = Self::new(repo, config.cache_ttl);
        service.start_sweeper();

        info!(
            dir = %config.log_dir.display(),
            files = service.file_count(),
            "log service ready"
        );
        Ok(service)
    }
}

impl<L: LogLookup> LogService<L> {
    /// Wraps `lookup` with a result cache. No background task is started.
    #[must_use]
    pub fn new(lookup: Arc<L>, cache_ttl: Duration) -> Self {
        Self {
            lookup,
            cache: Arc::new(ResultCache::new(cache_ttl)),
            sweeper: Mutex::new(None),
        }
    }

    /// Starts removing expired results once per TTL.
    ///
    /// Must be called from within a tokio runtime. Does nothing for a zero
    /// TTL.
    pub fn start_sweeper(&self) {
        let ttl = self.cache.ttl();
        if ttl.is_zero() {
            warn!("result cache TTL is zero, sweeper not started");
            return;
        }

        let cache = Arc::clone(&self.cache);
        let task = PeriodicTask::spawn("result-sweep", ttl, move || {
            let removed = cache.sweep();
            if removed > 0 {
                debug!(removed, "swept expired results");
            }
        });
        *self.sweeper.lock() = Some(task);
    }

    /// Returns the log line whose timestamp equals `timestamp`.
    ///
    /// # Errors
    ///
    /// Propagates the backend error, typically
    /// [`LogError::NotFound`](crate::LogError::NotFound).
    pub fn find_log(&self, timestamp: Timestamp) -> Result<String> {
        let key = timestamp.format();
        if let Some(message) = self.cache.get(&key) {
            debug!(%timestamp, "result cache hit");
            return Ok(message);
        }

        let message = self.lookup.find_by_timestamp(timestamp)?;
        self.cache.set(key, message.clone());
        Ok(message)
    }

    /// Parses `raw` as a canonical timestamp and looks it up.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidFormat`](crate::LogError::InvalidFormat)
    /// for a malformed timestamp, otherwise as [`LogService::find_log`].
    pub fn find_log_str(&self, raw: &str) -> Result<String> {
        let timestamp: Timestamp = raw.parse()?;
        self.find_log(timestamp)
    }

    /// Rebuilds the backend index now. Returns the indexed file count.
    ///
    /// # Errors
    ///
    /// Propagates the backend error.
    pub fn refresh_metadata(&self) -> Result<usize> {
        self.lookup.refresh()
    }

    /// Returns the number of indexed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.lookup.file_count()
    }

    /// Returns the number of memoized results, expired ones included.
    #[must_use]
    pub fn cached_results(&self) -> usize {
        self.cache.len()
    }

    /// Returns the backend.
    #[must_use]
    pub fn lookup(&self) -> &Arc<L> {
        &self.lookup
    }

    /// Stops the sweeper, closes the backend and drops memoized results.
    pub async fn close(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(task) = sweeper {
            task.shutdown().await;
        }

        self.lookup.close().await;
        self.cache.clear();
        info!("log service closed");
    }
}
