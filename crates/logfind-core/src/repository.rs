//! Directory-backed log repository.
//!
//! This module provides:
//! - [`LogRepository`] — owns the [`FileIndex`] and the [`MappedFileCache`]
//! - Directory scans that rebuild the index, on demand or periodically
//! - Timestamp lookups routed to the owning file and resolved in its mapping

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{LogError, Result};
use crate::index::FileIndex;
use crate::mapped_cache::{CacheStats, MappedFileCache};
use crate::metadata::FileMetadata;
use crate::resolver;
use crate::task::PeriodicTask;
use crate::timestamp::Timestamp;
use crate::traits::LogLookup;

/// Lifecycle of a [`LogRepository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryState {
    /// Constructed but no scan has completed yet.
    Uninitialized,
    /// Index installed and serving lookups.
    Ready,
    /// Closed; lookups and refreshes are rejected.
    Closed,
}

/// Time-range index over one directory plus the mappings of its files.
pub struct LogRepository {
    log_dir: PathBuf,
    index: RwLock<FileIndex>,
    cache: MappedFileCache,
    refresh_interval: Duration,
    refresher: Mutex<Option<PeriodicTask>>,
    state: RwLock<RepositoryState>,
}

impl std::fmt::Debug for LogRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let files = self.file_count();
        let state = self.state();
        f.debug_struct("LogRepository")
            .field("log_dir", &self.log_dir)
            .field("files", &files)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

impl LogRepository {
    /// Creates a repository and performs the initial directory scan.
    ///
    /// No background refresh is started; see [`LogRepository::open`].
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] for unusable limits and
    /// [`LogError::Io`] if the directory cannot be listed.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let repo = Self {
            log_dir: config.log_dir.clone(),
            index: RwLock::new(FileIndex::default()),
            cache: MappedFileCache::new(config.max_open_files, config.file_cache_ttl),
            refresh_interval: config.refresh_interval,
            refresher: Mutex::new(None),
            state: RwLock::new(RepositoryState::Uninitialized),
        };
        repo.refresh()?;
        Ok(repo)
    }

    /// Creates a repository and starts its periodic refresh.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Same as [`LogRepository::new`].
    pub fn open(config: &EngineConfig) -> Result<Arc<Self>> {
        let repo = Arc::new(Self::new(config)?);
        repo.start_periodic_refresh();
        Ok(repo)
    }

    /// Spawns the background task that rescans the directory every
    /// refresh interval. Replaces a previously started task.
    ///
    /// The task holds only a weak reference and stops doing work once the
    /// repository is dropped.
    pub fn start_periodic_refresh(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let task = PeriodicTask::spawn("index-refresh", self.refresh_interval, move || {
            let Some(repo) = weak.upgrade() else {
                return;
            };
            if let Some(e) = repo.scheduled_refresh() {
                error!(dir = %repo.log_dir.display(), error = %e, "index refresh failed");
            }
        });

        // Dropping the previous task closes its shutdown channel.
        if let Some(previous) = self.refresher.lock().replace(task) {
            debug!(task = previous.name(), "replaced periodic refresh");
        }
    }

    /// Rescans the directory and installs a fresh index. Returns the number
    /// of indexed files.
    ///
    /// Files whose bounds cannot be read are skipped with a warning. Cached
    /// mappings of files that vanished or changed size are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] if the directory cannot be listed and
    /// [`LogError::Closed`] after [`LogRepository::close`].
    pub fn refresh(&self) -> Result<usize> {
        self.ensure_open()?;

        let entries = fs::read_dir(&self.log_dir).map_err(|e| LogError::io(&self.log_dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(dir = %self.log_dir.display(), error = %e, "unreadable directory entry");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            match FileMetadata::read(&path) {
                Ok(meta) => files.push(meta),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping log file"),
            }
        }

        let index = FileIndex::new(files);
        let count = index.len();

        let dropped = self.cache.retain(|path, content| {
            index
                .get(path)
                .is_some_and(|meta| meta.len == content.len() as u64)
        });

        {
            let mut state = self.state.write();
            if *state == RepositoryState::Closed {
                return Err(LogError::Closed);
            }
            *self.index.write() = index;
            *state = RepositoryState::Ready;
        }

        info!(
            dir = %self.log_dir.display(),
            files = count,
            stale_mappings = dropped,
            "index refreshed"
        );
        Ok(count)
    }

    /// Returns the full line whose timestamp equals `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::NotFound`] if no indexed file covers `timestamp`
    /// or its owning file has no exactly matching line, including when the
    /// search hits a malformed line. Returns [`LogError::Io`] if the owning
    /// file cannot be mapped.
    pub fn find_by_timestamp(&self, timestamp: Timestamp) -> Result<String> {
        self.ensure_open()?;

        let path = self
            .index
            .read()
            .locate(timestamp)
            .map(|meta| meta.path.clone())
            .ok_or(LogError::NotFound)?;

        let content = self.cache.get(&path)?;
        match resolver::resolve(content.as_bytes(), timestamp) {
            Ok(line) => Ok(line.text().into_owned()),
            Err(e @ (LogError::NotFound | LogError::InvalidFormat(_))) => {
                debug!(path = %path.display(), %timestamp, error = %e, "no matching line");
                Err(LogError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Stops the periodic refresh and releases every mapping.
    ///
    /// Idempotent. Later lookups and refreshes fail with
    /// [`LogError::Closed`].
    pub async fn close(&self) {
        let task = self.refresher.lock().take();
        if let Some(task) = task {
            task.shutdown().await;
        }
        *self.state.write() = RepositoryState::Closed;

        self.cache.clear();
        *self.index.write() = FileIndex::default();
        info!(dir = %self.log_dir.display(), "log repository closed");
    }

    /// Returns the number of indexed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.index.read().len()
    }

    /// Returns a copy of the current index entries in start order.
    #[must_use]
    pub fn files(&self) -> Vec<FileMetadata> {
        self.index.read().files().to_vec()
    }

    /// Returns the mapped file cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns the scanned directory.
    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RepositoryState {
        *self.state.read()
    }

    /// Runs one timer-driven refresh and returns the failure worth
    /// reporting. A repository closed mid-tick is not a failure.
    fn scheduled_refresh(&self) -> Option<LogError> {
        match self.refresh() {
            Ok(_) | Err(LogError::Closed) => None,
            Err(e) => Some(e),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if *self.state.read() == RepositoryState::Closed {
            return Err(LogError::Closed);
        }
        Ok(())
    }
}

impl LogLookup for LogRepository {
    fn find_by_timestamp(&self, timestamp: Timestamp) -> Result<String> {
        Self::find_by_timestamp(self, timestamp)
    }

    fn refresh(&self) -> Result<usize> {
        Self::refresh(self)
    }

    fn file_count(&self) -> usize {
        Self::file_count(self)
    }

    async fn close(&self) {
        Self::close(self).await;
    }
}
