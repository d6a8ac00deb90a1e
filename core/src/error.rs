use thiserror::Error;

/// Error kinds produced by the partition-table engine (spec §7).
///
/// Recoverable problems (bad templates, out-of-space, on-disk
/// corruption the engine can route around) are always reported through
/// this type rather than a panic; callers decide whether to surface
/// them via the ask channel or abort the current operation.
#[derive(Debug, Error)]
pub enum PtableError {
    #[error("no recognized label on device: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("out of space: {0}")]
    OutOfSpace(String),

    #[error("invalid on-disk layout: {0}")]
    InvalidOnDisk(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("operation not supported by this label: {0}")]
    Unsupported(String),

    #[error("cancelled by user")]
    EscapeCancel,

    #[error("device busy: {0}")]
    BusyInUse(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PtableError>;
