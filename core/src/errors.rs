//! Error types for the filemanager core crate.
//!
//! Every fallible core operation returns [`FileError`]. The agent maps these
//! to JSON-RPC error responses; batch operations record them per item instead
//! of propagating them.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Errors related to file browsing and file operations.
#[derive(Error, Debug)]
pub enum FileError {
    /// The requested file or directory was not found.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The path exists but is not the kind of entry the operation needs.
    #[error("Not a {expected}: {path}")]
    WrongType {
        path: String,
        expected: &'static str,
    },

    /// Permission was denied for the requested operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A file operation failed (I/O error, command failure, etc.).
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// The call arguments are malformed. Raised before any item is processed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Both the direct directory read and the shell fallback failed.
    #[error("Cannot read directory contents of {path}: {primary} (fallback listing also failed: {fallback})")]
    ListingFailed {
        path: String,
        primary: String,
        fallback: String,
    },

    /// A low-level I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FileError {
    /// Classify an `std::io::Error` raised while operating on `path`.
    pub fn from_io(e: io::Error, path: &Path) -> Self {
        let shown = path.display().to_string();
        match e.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(shown),
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied(shown),
            _ => FileError::OperationFailed(format!("{shown}: {e}")),
        }
    }

    /// Classify a directory-walk error. `fallback` names the walk root when
    /// the error carries no path of its own.
    pub fn from_walk(e: walkdir::Error, fallback: &Path) -> Self {
        let path = e
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| fallback.to_path_buf());
        Self::from_io(io::Error::from(e), &path)
    }

    pub fn wrong_type(path: &Path, expected: &'static str) -> Self {
        FileError::WrongType {
            path: path.display().to_string(),
            expected,
        }
    }

    /// Whether this error reports a missing path.
    pub fn is_not_found(&self) -> bool {
        match self {
            FileError::NotFound(_) => true,
            FileError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
