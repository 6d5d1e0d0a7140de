//! Time-range index over the files of a log directory.
//!
//! This module provides:
//! - [`FileIndex`] — immutable snapshot of per-file time ranges, sorted by start
//! - Routing of a timestamp to its owning file

use std::path::Path;

use crate::metadata::FileMetadata;
use crate::timestamp::Timestamp;

/// Sorted snapshot of the files in a directory and the ranges they cover.
///
/// Ranges are assumed not to overlap; gaps between files are allowed. A
/// snapshot is never edited in place, a refresh builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIndex {
    files: Vec<FileMetadata>,
}

impl FileIndex {
    /// Builds an index, sorting `files` ascending by start timestamp.
    #[must_use]
    pub fn new(mut files: Vec<FileMetadata>) -> Self {
        files.sort_by(|a, b| a.start.cmp(&b.start));
        Self { files }
    }

    /// Returns the file whose `[start, end]` range contains `timestamp`.
    ///
    /// Binary search over start timestamps: the candidate is the last file
    /// starting at or before `timestamp`.
    #[must_use]
    pub fn locate(&self, timestamp: Timestamp) -> Option<&FileMetadata> {
        let after = self.files.partition_point(|m| m.start <= timestamp);
        let candidate = self.files.get(after.checked_sub(1)?)?;
        candidate.contains(timestamp).then_some(candidate)
    }

    /// Returns the entry for `path`, if indexed.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&FileMetadata> {
        self.files.iter().find(|m| m.path == path)
    }

    /// Returns the indexed files in start order.
    #[must_use]
    pub fn files(&self) -> &[FileMetadata] {
        &self.files
    }

    /// Returns the number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no file is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
