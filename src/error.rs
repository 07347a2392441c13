//! Error types for the companion library.
//!
//! Detail lookups surface one of these kinds so a caller can tell
//! "doesn't exist" from "exists but unreadable" from "valid image, no card".

use thiserror::Error;

/// Errors returned by card, lorebook, group and persona lookups.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The identifier resolves outside its configured root.
    #[error("Path escapes its root: {0}")]
    BadPath(String),

    /// The referenced file does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The file exists but its content is not valid JSON.
    #[error("Invalid JSON in {path}: {message}")]
    BadJson { path: String, message: String },

    /// The PNG was readable but no text chunk held a JSON payload.
    #[error("No embedded card data in {0}")]
    NoEmbeddedData(String),

    /// Any other filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LibraryError::BadPath(_) => "bad_path",
            LibraryError::NotFound(_) => "not_found",
            LibraryError::BadJson { .. } => "bad_json",
            LibraryError::NoEmbeddedData(_) => "no_embedded_data",
            LibraryError::Io(_) => "io",
        }
    }

    pub(crate) fn bad_json(path: &std::path::Path, err: &serde_json::Error) -> Self {
        LibraryError::BadJson {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Map a read failure to `NotFound` when the file is absent.
pub(crate) fn read_error(path: &std::path::Path, err: std::io::Error) -> LibraryError {
    if err.kind() == std::io::ErrorKind::NotFound {
        LibraryError::NotFound(path.display().to_string())
    } else {
        LibraryError::Io(err)
    }
}

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, LibraryError>;
