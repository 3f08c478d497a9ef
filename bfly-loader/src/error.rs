/// Error types for the Butterfly loader
use bfly_core::error::MonitorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to read a source file
    #[error("Failed to read source: {0}")]
    Io(#[from] std::io::Error),

    /// A row is structurally unusable
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// The core rejected the parsed record
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

pub type Result<T> = std::result::Result<T, LoaderError>;
