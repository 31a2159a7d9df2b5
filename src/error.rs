//! Error types for the holder monitor

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the holder monitor
///
/// The analytics themselves never fail; these variants cover the edges
/// where data and settings enter the crate.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid risk policy {version}: {reason}")]
    InvalidPolicy { version: String, reason: String },

    #[error("Invalid entity table: {0}")]
    InvalidEntityTable(String),

    // Input errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Check if this error was caused by bad input data rather than settings
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::Snapshot(_) | Error::Deserialization(_) | Error::InvalidEntityTable(_)
        )
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            Error::Deserialization(e.to_string())
        } else {
            Error::Serialization(e.to_string())
        }
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
