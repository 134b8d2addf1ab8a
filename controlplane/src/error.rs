//! Control plane error types

use shared::{ProcessId, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlPlaneError {
    #[error("Failed to construct {process}: {reason}")]
    Construction { process: String, reason: String },

    #[error("Failed to start {process}: {reason}")]
    Start { process: String, reason: String },

    #[error("{process} is not ready: start it before querying its address")]
    NotReady { process: String },

    #[error("Failed to stop {process}: {reason}")]
    Stop { process: String, reason: String },

    #[error("Unknown process: {name}")]
    UnknownProcess { name: String },

    #[error("Process registered twice: {name}")]
    DuplicateProcess { name: String },

    #[error("Invalid control plane state: {message}")]
    InvalidState { message: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ControlPlaneError {
    pub fn construction(process: &ProcessId, reason: impl ToString) -> Self {
        Self::Construction {
            process: process.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn start(process: &ProcessId, reason: impl ToString) -> Self {
        Self::Start {
            process: process.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn not_ready(process: &ProcessId) -> Self {
        Self::NotReady {
            process: process.to_string(),
        }
    }

    pub fn stop(process: &ProcessId, reason: impl ToString) -> Self {
        Self::Stop {
            process: process.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState { message: message.into() }
    }

    /// True for the address-before-start error kind
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }
}

pub type ControlPlaneResult<T> = Result<T, ControlPlaneError>;
