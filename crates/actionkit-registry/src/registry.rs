//! Frozen, id-keyed registry of completed action definitions.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use actionkit_core::{ActionDefinition, ActionId, ActionMetadata, AuthKind};

use crate::error::{RegistryError, RegistryResult};

/// Immutable map from action id to completed definition.
///
/// Construction is all-or-nothing: the first duplicate id or function name
/// aborts the build with an error naming the offender. There are no
/// mutating methods; once built, a registry is safe to share across
/// concurrent callers without synchronization.
///
/// Insertion order is preserved, so tool listings and UI surfaces render
/// actions in declaration order.
#[derive(Clone)]
pub struct ActionRegistry {
    actions: IndexMap<ActionId, Arc<ActionDefinition>>,
}

impl ActionRegistry {
    /// Build a registry from completed definitions, checking the global
    /// uniqueness invariants in input order.
    pub fn from_actions(
        actions: impl IntoIterator<Item = ActionDefinition>,
    ) -> RegistryResult<Self> {
        let mut map: IndexMap<ActionId, Arc<ActionDefinition>> = IndexMap::new();
        let mut function_names: HashMap<String, ActionId> = HashMap::new();

        for action in actions {
            if map.contains_key(action.id()) {
                return Err(RegistryError::DuplicateActionId(action.id().as_str().to_string()));
            }
            if let Some(first) = function_names.get(action.function_name()) {
                return Err(RegistryError::DuplicateFunctionName {
                    function_name: action.function_name().to_string(),
                    first: first.as_str().to_string(),
                    second: action.id().as_str().to_string(),
                });
            }
            function_names
                .insert(action.function_name().to_string(), action.id().clone());
            map.insert(action.id().clone(), Arc::new(action));
        }

        tracing::debug!(actions = map.len(), "built action registry");
        Ok(Self { actions: map })
    }

    /// Subset constructor for filter helpers; uniqueness is inherited from
    /// the parent registry, so no re-validation happens here.
    fn from_subset(actions: IndexMap<ActionId, Arc<ActionDefinition>>) -> Self {
        Self { actions }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<ActionDefinition>> {
        self.actions.get(&ActionId::new(id))
    }

    pub fn get_by_function_name(&self, name: &str) -> Option<&Arc<ActionDefinition>> {
        self.actions.values().find(|a| a.function_name() == name)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.actions.contains_key(&ActionId::new(id))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ActionId> {
        self.actions.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ActionId, &Arc<ActionDefinition>)> {
        self.actions.iter()
    }

    /// Identity map over action ids, for type-safe literal references in
    /// consuming code.
    pub fn id_map(&self) -> HashMap<String, String> {
        self.actions
            .keys()
            .map(|id| (id.as_str().to_string(), id.as_str().to_string()))
            .collect()
    }

    /// Subset whose auth config matches the given kind.
    pub fn filter_by_auth_kind(&self, kind: AuthKind) -> Self {
        let subset = self
            .actions
            .iter()
            .filter(|(_, a)| a.auth_kind() == kind)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self::from_subset(subset)
    }

    /// Subset whose metadata satisfies the predicate.
    pub fn filter_metadata(&self, predicate: impl Fn(&ActionMetadata) -> bool) -> Self {
        let subset = self
            .actions
            .iter()
            .filter(|(_, a)| predicate(a.metadata()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self::from_subset(subset)
    }

    /// Subset containing exactly the given ids. Unknown ids are an error.
    pub fn pick(&self, ids: &[&str]) -> RegistryResult<Self> {
        let mut subset = IndexMap::new();
        for id in ids {
            let key = ActionId::new(*id);
            let action = self
                .actions
                .get(&key)
                .ok_or_else(|| RegistryError::ActionNotFound(id.to_string()))?;
            subset.insert(key, action.clone());
        }
        Ok(Self::from_subset(subset))
    }

    /// Subset without the given ids. Unknown ids are ignored.
    pub fn omit(&self, ids: &[&str]) -> Self {
        let subset = self
            .actions
            .iter()
            .filter(|(id, _)| !ids.contains(&id.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self::from_subset(subset)
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("count", &self.actions.len())
            .field("ids", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}
