use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors surfaced by auth resolution and caller configuration.
///
/// Per-request execution failures are not represented here; they are
/// converted into error result items so one request can never abort its
/// batch siblings.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no linked account for action '{0}'")]
    NoLinkedAccount(String),

    #[error("credential for action '{0}' is expired and no refresher is configured")]
    CredentialExpired(String),

    #[error("auth resolution failed for action '{action_id}': {message}")]
    AuthResolution { action_id: String, message: String },

    #[error("store error: {0}")]
    Store(String),
}

impl From<actionkit_core::CoreError> for RuntimeError {
    fn from(err: actionkit_core::CoreError) -> Self {
        Self::Store(err.to_string())
    }
}
