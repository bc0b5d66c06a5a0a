//! Per-request call results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Execution metadata attached to every result item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallMetadata {
    /// Execution duration in milliseconds.
    pub duration_ms: u64,
    /// Timestamp of execution start.
    pub timestamp: DateTime<Utc>,
}

/// Outcome of one request within a batch.
///
/// Every item carries the originating action id and the request's
/// correlation id; the batch result order always matches request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallResult {
    Success {
        action_id: String,
        correlation_id: String,
        /// Handler output parsed against the output schema; `None` when the
        /// output schema is the void marker.
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<JsonValue>,
        metadata: CallMetadata,
    },
    Error {
        action_id: String,
        correlation_id: String,
        message: String,
        /// Underlying cause, where one is available.
        #[serde(skip_serializing_if = "Option::is_none")]
        cause: Option<String>,
        metadata: CallMetadata,
    },
}

impl CallResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn action_id(&self) -> &str {
        match self {
            Self::Success { action_id, .. } | Self::Error { action_id, .. } => action_id,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Success { correlation_id, .. } | Self::Error { correlation_id, .. } => {
                correlation_id
            }
        }
    }

    pub fn data(&self) -> Option<&JsonValue> {
        match self {
            Self::Success { data, .. } => data.as_ref(),
            Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Error { message, .. } => Some(message),
        }
    }
}
