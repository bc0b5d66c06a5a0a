use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("invalid metadata for action '{action_id}': {message}")]
    InvalidMetadata { action_id: String, message: String },
    #[error("invalid auth config for action '{action_id}': {message}")]
    InvalidAuthConfig { action_id: String, message: String },
    #[error("invalid example input for action '{action_id}': {message}")]
    InvalidExampleInput { action_id: String, message: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("auth data missing: {0}")]
    AuthDataMissing(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("serde: {0}")]
    Serde(String),
    #[error("db: {0}")]
    Db(String),
    #[error("other: {0}")]
    Other(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
