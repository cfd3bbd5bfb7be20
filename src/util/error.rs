//! Error types for the SWC codec.

use std::path::PathBuf;
use thiserror::Error;

use super::ComponentType;

/// Main error type for SWC operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Malformed record line
    #[error("Format error at line {line}: {message}")]
    Format { line: usize, message: String },

    /// Malformed token in the connectivity stream
    #[error("Cell stream error at byte {offset}: {message}")]
    CellStream { offset: u64, message: String },

    /// Numeric kind not usable for the requested buffer
    #[error("Unsupported component type: {0}")]
    UnsupportedType(ComponentType),

    /// Caller broke an operation contract
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Attribute value does not fit the reported point data width
    #[error("Value {value} out of range for {target}")]
    ValueOutOfRange { value: String, target: ComponentType },

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a format error for a 1-based line number.
    pub fn format(line: usize, msg: impl Into<String>) -> Self {
        Self::Format { line, message: msg.into() }
    }

    /// Create a precondition error.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a cell stream error at a byte offset.
    pub fn cell_stream(offset: u64, msg: impl Into<String>) -> Self {
        Self::CellStream { offset, message: msg.into() }
    }
}

/// Result type alias for SWC operations.
pub type Result<T> = std::result::Result<T, Error>;
