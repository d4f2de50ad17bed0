// Error types for the mirroring engine
// Carries enough context (operation + path) to make pass logs actionable

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for mirroring operations.
#[derive(Debug)]
pub enum SyncError {
    /// The source root was absent when a pass started. The pass is skipped
    /// so a transient unmount never wipes a valid replica.
    SourceMissing { path: PathBuf },

    /// An I/O failure on a single file or directory, with context.
    Io {
        path: Option<PathBuf>,
        operation: String,
        source: io::Error,
    },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncError::SourceMissing { path } => {
                write!(f, "source directory does not exist: {}", path.display())
            }
            SyncError::Io {
                path,
                operation,
                source,
            } => {
                if let Some(p) = path {
                    write!(f, "I/O error while {} {}: {}", operation, p.display(), source)
                } else {
                    write!(f, "I/O error while {}: {}", operation, source)
                }
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl SyncError {
    /// Create an `Io` error with context about the operation and the path.
    pub fn from_io(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        SyncError::Io {
            path,
            operation: operation.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for SyncError {
    fn from(err: io::Error) -> Self {
        SyncError::from_io(err, "unknown operation", None)
    }
}
