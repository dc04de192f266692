//! Error types for resolution, synthesis, and query execution.

use std::path::PathBuf;

use crate::backend::BackendKind;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while resolving parameters, building a
/// descriptor, or running a statement.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required connection parameter could not be resolved through any
    /// tier (explicit value, backend env var, generic env var).
    #[error("missing required connection parameter `{field}` for {backend}")]
    MissingParameter {
        backend: BackendKind,
        field: &'static str,
    },

    /// A parameter resolved to a value the backend cannot use.
    #[error("invalid value {value:?} for connection parameter `{field}` on {backend}")]
    InvalidParameter {
        backend: BackendKind,
        field: &'static str,
        value: String,
    },

    /// No ODBC driver could be found on the host (MSSQL only).
    #[error("no ODBC driver is installed on this host")]
    DriverUnavailable,

    /// A backend name could not be parsed into a [`BackendKind`].
    #[error("unknown backend `{0}`")]
    UnknownBackend(String),

    /// The descriptor was synthesized, but no bundled engine exists for
    /// this backend; hand the descriptor to an external driver instead.
    #[error("{0} has no bundled query engine")]
    EngineUnsupported(BackendKind),

    /// The backend cannot perform the requested operation.
    #[error("{backend} does not support {operation}")]
    Unsupported {
        backend: BackendKind,
        operation: &'static str,
    },

    /// An operation requiring a live pool was called before `connect`.
    #[error("not connected")]
    NotConnected,

    /// Error surfaced by the underlying sqlx engine.
    #[error(transparent)]
    Engine(#[from] sqlx::Error),

    /// Error reading or parsing a CSV file.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Error reading a file from disk.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
