//! Error types for configuration documents

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration must be a mapping, found {0}")]
    NotAnObject(&'static str),

    #[error("No type provided")]
    MissingType,

    #[error("Field 'type' must be a string, found {0}")]
    InvalidType(&'static str),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// Human-readable name of a JSON value's kind, for error messages
pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "sequence",
        serde_json::Value::Object(_) => "mapping",
    }
}
