use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by perfplot.
#[derive(Error, Debug)]
pub enum PerfPlotError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// None of the desired columns were found in the header row.
    #[error("Desired columns not found in log files!")]
    SeriesNotFound,

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A configured transform kind is not one of the known kinds.
    #[error("Unknown series type: {0}")]
    UnknownTransform(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the perfplot crates.
pub type Result<T> = std::result::Result<T, PerfPlotError>;
