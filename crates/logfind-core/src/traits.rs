//! Traits for timestamp lookup backends.
//!
//! [`LogLookup`] is the seam between the query facade and whatever resolves a
//! timestamp to a line. The production implementation is
//! [`LogRepository`](crate::repository::LogRepository).

use std::future::Future;

use crate::error::Result;
use crate::timestamp::Timestamp;

/// Resolves timestamps to log lines.
pub trait LogLookup: Send + Sync + 'static {
    /// Returns the line whose timestamp equals `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::NotFound`](crate::LogError::NotFound) when nothing
    /// matches and an I/O or internal error when the backend fails.
    fn find_by_timestamp(&self, timestamp: Timestamp) -> Result<String>;

    /// Rebuilds whatever index the backend keeps. Returns the indexed file
    /// count.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be scanned.
    fn refresh(&self) -> Result<usize>;

    /// Returns the number of indexed files.
    fn file_count(&self) -> usize;

    /// Stops background work and releases held resources.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
