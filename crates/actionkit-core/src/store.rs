//! Linked-account persistence contract.
//!
//! One row per action id, created when a user links an account (OAuth
//! callback or token form), updated in place on refresh, deleted on
//! disconnect. Implementations live in `actionkit-store`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::auth::AuthKind;
use crate::error::CoreResult;
use crate::types::ActionId;

/// Stored credential linking a user account to one action.
#[derive(Clone, PartialEq)]
pub struct LinkedAccount {
    pub action_id: ActionId,
    pub auth_kind: AuthKind,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Expiry as epoch seconds; `None` for non-expiring tokens.
    pub expires_at: Option<i64>,
    pub scope: Option<String>,
    /// Structured extra data collected by the token form.
    pub custom_data: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkedAccount {
    pub fn new(action_id: impl Into<ActionId>, auth_kind: AuthKind, access_token: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            action_id: action_id.into(),
            auth_kind,
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scope: None,
            custom_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_expires_at(mut self, epoch_seconds: i64) -> Self {
        self.expires_at = Some(epoch_seconds);
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_custom_data(mut self, data: JsonValue) -> Self {
        self.custom_data = Some(data);
        self
    }

    /// Whether the access token has expired as of `now` (epoch seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

impl std::fmt::Debug for LinkedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedAccount")
            .field("action_id", &self.action_id)
            .field("auth_kind", &self.auth_kind)
            .field("access_token", &"***REDACTED***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***REDACTED***"))
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Storage for linked accounts, keyed by action id.
#[async_trait]
pub trait LinkedAccountStore: Send + Sync {
    /// Insert or replace the account for an action id.
    async fn upsert(&self, account: &LinkedAccount) -> CoreResult<()>;

    async fn get(&self, action_id: &ActionId) -> CoreResult<Option<LinkedAccount>>;

    /// Remove the account. Returns whether a row existed.
    async fn delete(&self, action_id: &ActionId) -> CoreResult<bool>;

    async fn list(&self) -> CoreResult<Vec<LinkedAccount>>;

    async fn list_by_auth_kind(&self, kind: AuthKind) -> CoreResult<Vec<LinkedAccount>>;
}
