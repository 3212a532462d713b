//! Copy-verification engine.
//!
//! Walks a source directory tree and verifies that a destination tree is a
//! faithful copy: every source entry present, matching in type, size and
//! (optionally) content digest, and no extra entries on the destination
//! side. The walk runs on a single control thread, reports issues through an
//! event sink as it finds them, and honors a cooperative cancellation token.
//!
//! Entry point is [`compare`]; the caller builds a [`CheckConfig`], hands in
//! a [`WalkMeta`] for progress counters and gets back a [`WalkOutcome`] with
//! the per-directory issue records.

pub mod checksums;
pub mod compare;
pub mod config;
pub mod conflict;
pub mod error;
pub mod events;
pub mod model;
pub mod pool;

pub use checksums::{digest_file, digest_to_hex, ChecksumAlgorithm};
pub use compare::compare;
pub use config::{CancellationToken, CheckConfig};
pub use conflict::Conflict;
pub use error::{Side, WalkError};
pub use events::CheckEventSink;
pub use model::{DirEntry, DirectoryResult, WalkMeta, WalkOutcome, WalkStatus};
pub use pool::DigestPool;
