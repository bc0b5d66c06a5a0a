//! Credential resolution callbacks and the store-backed implementation.

use std::sync::Arc;

use async_trait::async_trait;

use actionkit_core::{
    ActionDefinition, LinkedAccount, LinkedAccountStore, OAuthAuthData, TokenAuthData,
};

use crate::error::{RuntimeError, RuntimeResult};

/// Fetches the credential for a `Token`-authed action.
#[async_trait]
pub trait TokenAuthResolver: Send + Sync {
    async fn fetch(&self, action: &ActionDefinition) -> RuntimeResult<TokenAuthData>;
}

/// Fetches the access token for an `OAuth`-authed action.
#[async_trait]
pub trait OAuthTokenResolver: Send + Sync {
    async fn fetch(&self, action: &ActionDefinition) -> RuntimeResult<OAuthAuthData>;
}

/// Refreshes an expired OAuth credential.
///
/// The HTTP token exchange belongs to the surrounding application; this
/// trait is the seam through which it is injected.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(
        &self,
        action: &ActionDefinition,
        account: &LinkedAccount,
    ) -> RuntimeResult<LinkedAccount>;
}

/// Resolver backed by a [`LinkedAccountStore`].
///
/// Looks up the linked account for the action id; for OAuth actions whose
/// token has expired, refreshes through the configured [`TokenRefresher`]
/// and persists the renewed account before returning it.
#[derive(Clone)]
pub struct StoreAuthResolver {
    store: Arc<dyn LinkedAccountStore>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl StoreAuthResolver {
    pub fn new(store: Arc<dyn LinkedAccountStore>) -> Self {
        Self { store, refresher: None }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    async fn account_for(&self, action: &ActionDefinition) -> RuntimeResult<LinkedAccount> {
        self.store
            .get(action.id())
            .await?
            .ok_or_else(|| RuntimeError::NoLinkedAccount(action.id().as_str().to_string()))
    }

    async fn fresh_account(&self, action: &ActionDefinition) -> RuntimeResult<LinkedAccount> {
        let account = self.account_for(action).await?;
        if !account.is_expired_at(chrono::Utc::now().timestamp()) {
            return Ok(account);
        }

        let Some(refresher) = &self.refresher else {
            return Err(RuntimeError::CredentialExpired(action.id().as_str().to_string()));
        };

        tracing::info!(action_id = %action.id(), "refreshing expired credential");
        let renewed = refresher.refresh(action, &account).await?;
        self.store.upsert(&renewed).await?;
        Ok(renewed)
    }
}

#[async_trait]
impl TokenAuthResolver for StoreAuthResolver {
    async fn fetch(&self, action: &ActionDefinition) -> RuntimeResult<TokenAuthData> {
        let account = self.account_for(action).await?;
        let mut data = TokenAuthData::new(account.access_token);
        data.custom_data = account.custom_data;
        Ok(data)
    }
}

#[async_trait]
impl OAuthTokenResolver for StoreAuthResolver {
    async fn fetch(&self, action: &ActionDefinition) -> RuntimeResult<OAuthAuthData> {
        let account = self.fresh_account(action).await?;
        let mut data = OAuthAuthData::new(account.access_token);
        data.scope = account.scope;
        Ok(data)
    }
}
