//! Core data model for verification walks.
//!
//! This module defines the data structures produced by a walk:
//! - DirEntry: a single filesystem listing element
//! - DirectoryResult: the per-directory comparison record
//! - WalkMeta: running file/directory counters
//! - WalkOutcome / WalkStatus: the value returned by the engine

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::conflict::Conflict;

/// A thin projection of one directory listing element.
///
/// Entries are re-derived from the filesystem on every recursive call and
/// never cached across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name without any path components
    pub name: OsString,

    /// True if this entry is a directory
    pub is_dir: bool,

    /// Size in bytes (0 for directories)
    pub size: u64,
}

impl DirEntry {
    /// Name rendered for display; lossy when the name is not valid UTF-8.
    pub fn display_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }
}

/// The comparison record for a single directory pair.
///
/// A name may appear in both `conflicts` and `missing_in_destination`: a
/// size or checksum mismatch is recorded as a conflict and the entry is
/// additionally treated as not found. Downstream failure detection relies
/// on this double classification.
#[derive(Debug)]
pub struct DirectoryResult {
    /// Source side of the compared pair
    pub source_path: PathBuf,

    /// Destination side of the compared pair
    pub destination_path: PathBuf,

    /// Source entries with no usable counterpart in the destination
    pub missing_in_destination: Vec<DirEntry>,

    /// Destination entries with no counterpart in the source
    pub missing_in_source: Vec<DirEntry>,

    /// Same-named entry pairs that mismatched, with the mismatch detail
    pub conflicts: Vec<(DirEntry, Conflict)>,
}

impl DirectoryResult {
    pub fn new(source_path: &Path, destination_path: &Path) -> Self {
        DirectoryResult {
            source_path: source_path.to_path_buf(),
            destination_path: destination_path.to_path_buf(),
            missing_in_destination: Vec::new(),
            missing_in_source: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// True when no issue was recorded for this directory pair.
    pub fn ok(&self) -> bool {
        self.missing_in_destination.is_empty()
            && self.missing_in_source.is_empty()
            && self.conflicts.is_empty()
    }
}

/// Running counters for one walk.
///
/// Incremented only by the control thread, once per source entry. A separate
/// reporting thread may read them concurrently; values are monotonic and
/// eventually visible, which is all approximate progress display needs.
#[derive(Debug, Default)]
pub struct WalkMeta {
    files_visited: AtomicU64,
    directories_visited: AtomicU64,
}

impl WalkMeta {
    pub fn new() -> Self {
        WalkMeta::default()
    }

    pub(crate) fn inc_files(&self) {
        self.files_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_directories(&self) {
        self.directories_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn files_visited(&self) -> u64 {
        self.files_visited.load(Ordering::Relaxed)
    }

    pub fn directories_visited(&self) -> u64 {
        self.directories_visited.load(Ordering::Relaxed)
    }
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    /// The entire tree was compared
    Completed,

    /// The walk was cancelled; results cover only the directories fully
    /// processed before the cancellation point
    Cancelled,
}

/// The value returned by a walk that did not abort with a fatal error.
///
/// `results` holds the non-ok directory records in pre-order traversal
/// order. Listings are sorted by name, so the order is reproducible.
#[derive(Debug)]
pub struct WalkOutcome {
    pub results: Vec<DirectoryResult>,
    pub status: WalkStatus,
}
