//! The contract every element implementation fulfils.

use dashcraft_config::ElementConfig;
use thiserror::Error;

/// A live, rendered element
///
/// Implementations are created empty and then configured through
/// [`Element::set_config`], both on first build and on every in-place update.
pub trait Element: Send {
    /// Apply a configuration. Returning an error replaces the element with an
    /// error placeholder.
    fn set_config(&mut self, config: &ElementConfig) -> Result<(), ElementError>;

    /// Textual snapshot of what the element currently shows
    fn render(&self) -> String;
}

/// Failure raised by an element while being constructed or configured
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElementError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing required field '{0}'")]
    MissingField(String),

    #[error("Element panicked: {0}")]
    Panicked(String),
}

impl ElementError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ElementError::InvalidConfig(message.into())
    }
}
