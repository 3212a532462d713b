//! Error types for the verification engine.
//!
//! `WalkError` covers only fatal conditions that abort an entire walk.
//! Mismatches between the two trees are never errors; they are recorded as
//! conflicts or missing entries in the DirectoryResult records. Cancellation
//! is likewise not an error; it is reported through WalkStatus.

use std::error::Error;
use std::fmt::{self, Display};
use std::io;
use std::path::PathBuf;

/// Which side of the comparison a fatal error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Destination => write!(f, "destination"),
        }
    }
}

/// Fatal walk errors. Any of these aborts the whole walk; partial results
/// are discarded and the caller receives only the error.
#[derive(Debug)]
pub enum WalkError {
    /// A compared path is not a directory (or does not exist)
    NotADirectory { side: Side, path: PathBuf },

    /// A directory's entry listing could not be read
    DirectoryUnreadable {
        side: Side,
        path: PathBuf,
        source: io::Error,
    },

    /// A digest computation returned no result
    ChecksumFailed { path: PathBuf },
}

impl Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotADirectory { side, path } => {
                write!(f, "{} is not a directory: {}", side, path.display())
            }
            Self::DirectoryUnreadable { side, path, .. } => {
                write!(
                    f,
                    "unable to read entries from {} directory: {}",
                    side,
                    path.display()
                )
            }
            Self::ChecksumFailed { path } => {
                write!(f, "checksum computation failed for: {}", path.display())
            }
        }
    }
}

impl Error for WalkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DirectoryUnreadable { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_display_names_the_side() {
        let err = WalkError::NotADirectory {
            side: Side::Destination,
            path: Path::new("/tmp/d").to_path_buf(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("destination"));
        assert!(rendered.contains("/tmp/d"));
    }

    #[test]
    fn test_unreadable_carries_io_source() {
        let err = WalkError::DirectoryUnreadable {
            side: Side::Source,
            path: Path::new("/tmp/s").to_path_buf(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
    }
}
