//! # logfind-core
//!
//! Timestamp-indexed retrieval over a directory of append-only log files.
//!
//! Every line starts with a fixed-width `YYYY-MM-DDTHH:MM:SS.mmm` timestamp
//! and each file is sorted by it. This crate provides:
//!
//! - [`Timestamp`] — the canonical 23-byte timestamp codec
//! - [`resolve`] — binary search for an exact line in one file's bytes
//! - [`FileMetadata`] / [`FileIndex`] — per-file time ranges and routing
//! - [`MappedFileCache`] — bounded LRU+TTL cache of memory-mapped files
//! - [`LogRepository`] — directory scanning, refresh and lookup
//! - [`ResultCache`] — short-lived memoization of answers
//! - [`LogService`] — the query facade tying it together
//!
//! ## Example
//!
//! ```rust,no_run
//! use logfind_core::{EngineConfig, LogService, Timestamp};
//!
//! # async fn run() -> logfind_core::Result<()> {
//! let service = LogService::open(&EngineConfig::new("/var/log/app"))?;
//!
//! let t: Timestamp = "2023-01-01T00:00:01.000".parse()?;
//! let line = service.find_log(t)?;
//! println!("{line}");
//!
//! service.close().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod index;
pub mod mapped_cache;
pub mod metadata;
pub mod repository;
pub mod resolver;
pub mod result_cache;
pub mod service;
pub mod task;
pub mod timestamp;
pub mod traits;

// Re-export main types
pub use config::EngineConfig;
pub use error::{ErrorKind, LogError, Result};
pub use index::FileIndex;
pub use mapped_cache::{CacheStats, FileLease, MappedContent, MappedFileCache};
pub use metadata::FileMetadata;
pub use repository::{LogRepository, RepositoryState};
pub use resolver::{resolve, LogLine};
pub use result_cache::ResultCache;
pub use service::LogService;
pub use task::PeriodicTask;
pub use timestamp::{Timestamp, TIMESTAMP_FORMAT, TIMESTAMP_LEN};
pub use traits::LogLookup;
