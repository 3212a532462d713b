//! Conflict taxonomy.
//!
//! A conflict describes one mismatch between a source entry and a same-named
//! destination entry. Conflicts are pure data: the engine constructs and
//! stores them, and consumers pattern-match exhaustively at the rendering
//! boundary. The closed set of variants is part of the engine contract.

use std::fmt::{self, Display};

/// A structural or content mismatch between two same-named entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// One side is a file, the other a directory
    Type {
        /// True when the source holds the file and the destination the
        /// directory; false for the opposite arrangement
        source_is_file: bool,
    },

    /// Both sides are files but their byte lengths differ
    Size {
        source_size: u64,
        destination_size: u64,
    },

    /// Both sides are files of equal length but their digests differ
    Checksum {
        /// Lowercase hex digest of the source file
        source_hex: String,
        /// Lowercase hex digest of the destination file
        destination_hex: String,
    },
}

impl Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type {
                source_is_file: true,
            } => {
                write!(f, "source is a file, destination is a directory")
            }
            Self::Type {
                source_is_file: false,
            } => {
                write!(f, "source is a directory, destination is a file")
            }
            Self::Size {
                source_size,
                destination_size,
            } => {
                write!(
                    f,
                    "file sizes differ: {} / {}",
                    source_size, destination_size
                )
            }
            Self::Checksum {
                source_hex,
                destination_hex,
            } => {
                write!(f, "checksums differ: {} / {}", source_hex, destination_hex)
            }
        }
    }
}
