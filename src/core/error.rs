//! Error types for the placements system

use thiserror::Error;

/// Main error type for the placements system
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unexpected placements version number ({found}, expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Malformed placements chunk: {0}")]
    MalformedHeader(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to load placements cell ({cell}): {reason}")]
    CellLoad { cell: String, reason: String },

    #[error("Could not find cell with id (0x{0:016x})")]
    UnknownCell(u64),

    #[error("Asset still pending: {0}")]
    AssetPending(String),

    #[error("Invalid asset: {0}")]
    AssetInvalid(String),

    #[error("Stalled for more than {0:?}")]
    Timeout(std::time::Duration),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
