//! Error types for trialwatch-core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// The requested experiment or trial does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {kind} ID {value}")]
    InvalidId { kind: &'static str, value: String },

    #[error("{0}")]
    Other(String),
}

impl TrackerError {
    pub fn experiment_not_found(id: i64) -> Self {
        TrackerError::NotFound { kind: "Experiment", id }
    }

    pub fn trial_not_found(id: i64) -> Self {
        TrackerError::NotFound { kind: "Trial", id }
    }

    /// Classification predicate used by the poll loop: a missing resource is
    /// reported differently from every other failure.
    pub fn is_not_found(&self) -> bool {
        match self {
            TrackerError::NotFound { .. } => true,
            TrackerError::Api { status, .. } => *status == 404,
            TrackerError::Http(e) => e.status().is_some_and(|s| s.as_u16() == 404),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
