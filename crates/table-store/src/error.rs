//! Error type shared by all store implementations.

/// Errors returned by a [`TableStore`](crate::TableStore).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("column family '{family}' not found in table '{table}'")]
    FamilyNotFound { table: String, family: String },

    #[error("column family '{family}' already exists in table '{table}'")]
    FamilyAlreadyExists { table: String, family: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport-level failure (connection refused, timeout, TLS).
    #[error("request failed: {0}")]
    Http(String),

    /// The store answered with an error status.
    #[error("store returned status {status}: {message}")]
    Api { status: i32, message: String },

    /// The store's response could not be understood.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The client could not be set up.
    #[error("failed to connect: {0}")]
    Connect(String),
}
