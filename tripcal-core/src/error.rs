//! Error types for tripcal.

use thiserror::Error;

/// Errors that can occur in tripcal operations.
#[derive(Error, Debug)]
pub enum TripCalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote store error: {0}")]
    Transport(String),

    #[error("Invalid import: {0}")]
    MalformedImport(String),

    #[error("Invalid event: {0}")]
    Validation(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Reset is only available in collaborative mode")]
    NotCollaborative,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TripCalError {
    fn from(e: serde_json::Error) -> Self {
        TripCalError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for TripCalError {
    fn from(e: reqwest::Error) -> Self {
        TripCalError::Transport(e.to_string())
    }
}

/// Result type alias for tripcal operations.
pub type TripCalResult<T> = Result<T, TripCalError>;
