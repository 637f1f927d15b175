//! Bridge error types and mappings.
//!
//! Errors crossing the IPC boundary are serialized for the frontend as
//! `{"type": ..., "message": ...}`.

use roost_core::SupervisorError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Serializable error type for Tauri commands.
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BridgeError {
    /// Process lifecycle error.
    #[error("Process error: {0}")]
    Process(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SupervisorError> for BridgeError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::ExecutableNotFound { .. }
            | SupervisorError::SpawnError(_)
            | SupervisorError::PrematureExit(_)
            | SupervisorError::PortDiscoveryTimeout(_) => Self::Process(err.to_string()),
        }
    }
}
