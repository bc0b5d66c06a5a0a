//! Error types for the registry system

use thiserror::Error;

/// Registry-specific errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate action id: '{0}'")]
    DuplicateActionId(String),

    #[error("duplicate function name: '{function_name}' (actions '{first}' and '{second}')")]
    DuplicateFunctionName { function_name: String, first: String, second: String },

    #[error("action not found: {0}")]
    ActionNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Registry result type
pub type RegistryResult<T> = Result<T, RegistryError>;
