//! Error types for the editor

use crate::session::EditorMode;
use dashcraft_config::ConfigError;
use thiserror::Error;

/// Why the session refused an operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Editor is busy")]
    Busy,

    #[error("No configuration loaded")]
    NoDocument,

    #[error("Operation requires {0} mode")]
    WrongMode(EditorMode),

    #[error("Visual editor not available: {0}")]
    FormUnavailable(String),

    #[error("Configuration has errors: {0}")]
    Invalid(String),

    #[error("{0}")]
    Parse(#[from] ConfigError),

    #[error("Save failed: {0}")]
    Save(#[from] SaveError),
}

/// Failure reported by the persistence collaborator
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct SaveError(pub String);

impl SaveError {
    pub fn new(message: impl Into<String>) -> Self {
        SaveError(message.into())
    }
}
