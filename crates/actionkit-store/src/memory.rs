//! In-memory linked-account store, primarily for tests and development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use actionkit_core::{ActionId, AuthKind, CoreResult, LinkedAccount, LinkedAccountStore};

/// In-memory implementation of [`LinkedAccountStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLinkedAccountStore {
    data: Arc<RwLock<HashMap<String, LinkedAccount>>>,
}

impl MemoryLinkedAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkedAccountStore for MemoryLinkedAccountStore {
    async fn upsert(&self, account: &LinkedAccount) -> CoreResult<()> {
        let mut data = self.data.write().await;
        data.insert(account.action_id.as_str().to_string(), account.clone());
        Ok(())
    }

    async fn get(&self, action_id: &ActionId) -> CoreResult<Option<LinkedAccount>> {
        let data = self.data.read().await;
        Ok(data.get(action_id.as_str()).cloned())
    }

    async fn delete(&self, action_id: &ActionId) -> CoreResult<bool> {
        let mut data = self.data.write().await;
        Ok(data.remove(action_id.as_str()).is_some())
    }

    async fn list(&self) -> CoreResult<Vec<LinkedAccount>> {
        let data = self.data.read().await;
        Ok(data.values().cloned().collect())
    }

    async fn list_by_auth_kind(&self, kind: AuthKind) -> CoreResult<Vec<LinkedAccount>> {
        let data = self.data.read().await;
        Ok(data.values().filter(|a| a.auth_kind == kind).cloned().collect())
    }
}
