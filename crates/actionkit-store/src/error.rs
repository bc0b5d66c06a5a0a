use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<StoreError> for actionkit_core::CoreError {
    fn from(err: StoreError) -> Self {
        actionkit_core::CoreError::Db(err.to_string())
    }
}
