//! Error handling for the SensorVis-RS engine
//!
//! This module defines custom error types and a Result alias for use
//! throughout the engine. No error here is fatal to the process; callers
//! log and degrade rather than propagate upward into the live path.

use thiserror::Error;

/// Main error type for SensorVis-RS operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Errors decoding an ingestion payload
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Errors related to the pub/sub transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// Errors related to the durable store
    #[error("Store error: {0}")]
    Store(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for SensorVis-RS operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::Store("insert rejected".to_string());
        assert_eq!(err.to_string(), "Store error: insert rejected");
    }

    #[test]
    fn test_decode_error_from_serde() {
        let parse: std::result::Result<crate::types::SensorReading, _> =
            serde_json::from_str("not json");
        let err: EngineError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("Decode error"));
    }
}
