//! Event sink trait for live issue reporting.
//!
//! The engine fires one callback per detected issue, synchronously on the
//! control thread at the moment of discovery. Implementations decouple the
//! engine from any presentation technology; the CLI prints to stderr, a
//! GUI could forward into a channel.
//!
//! `on_cancelled` is fired through the cancellation token's listener by the
//! caller that registered it, not by the engine.

use std::path::Path;

use crate::conflict::Conflict;
use crate::model::DirEntry;

/// Receives issues as they are discovered during a walk.
///
/// All methods default to no-ops so implementations only override what they
/// care about.
pub trait CheckEventSink: Send {
    /// A source entry has no usable counterpart in the destination.
    fn on_missing_in_destination(
        &self,
        _source_dir: &Path,
        _destination_dir: &Path,
        _entry: &DirEntry,
    ) {
    }

    /// A destination entry has no counterpart in the source.
    fn on_missing_in_source(&self, _source_dir: &Path, _destination_dir: &Path, _entry: &DirEntry) {
    }

    /// Two same-named entries mismatched.
    fn on_conflict(
        &self,
        _source_dir: &Path,
        _destination_dir: &Path,
        _source_entry: &DirEntry,
        _destination_entry: &DirEntry,
        _conflict: &Conflict,
    ) {
    }

    /// The walk was cancelled.
    fn on_cancelled(&self) {}
}
