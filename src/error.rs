//! Errors returned by [`Fixture::load`](crate::Fixture::load).

use std::path::PathBuf;

use fixture_core::{EncodeError, FormatError};
use table_store::StoreError;

/// Error type for fixture loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The fixture file could not be read (including "not found").
    #[error("failed to read file '{}'", path.display())]
    FailedReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path's extension is not a supported fixture format.
    #[error("unknown file ext: '{ext}'")]
    UnknownFileExtension { ext: String },

    /// The file content does not match the fixture schema.
    #[error("invalid fixture file format: {0}")]
    InvalidFixtureFormat(#[from] FormatError),

    /// The configured encoder rejected a value.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Failure reported by the table store, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Discriminant of [`LoadError`], convenient for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    FailedReadFile,
    UnknownFileExtension,
    InvalidFixtureFormat,
    Encode,
    Store,
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::FailedReadFile { .. } => LoadErrorKind::FailedReadFile,
            LoadError::UnknownFileExtension { .. } => LoadErrorKind::UnknownFileExtension,
            LoadError::InvalidFixtureFormat(_) => LoadErrorKind::InvalidFixtureFormat,
            LoadError::Encode(_) => LoadErrorKind::Encode,
            LoadError::Store(_) => LoadErrorKind::Store,
        }
    }

    /// The store error, if this failure came from the store.
    pub fn as_store_error(&self) -> Option<&StoreError> {
        match self {
            LoadError::Store(e) => Some(e),
            _ => None,
        }
    }
}
