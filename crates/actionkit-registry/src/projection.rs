//! Browser-safe registry projection.
//!
//! Serializes each action's schemas into transmissible documents and strips
//! everything server-only: handlers, auth configuration and validation
//! callbacks never cross this boundary. Clients rehydrate the schema
//! documents into live validators to drive forms.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use actionkit_core::{ActionKind, ActionMetadata, CoreResult, Schema};

use crate::registry::ActionRegistry;

/// Metadata-and-schema view of one action, safe to ship to a browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAction {
    pub action_id: String,
    pub function_name: String,
    pub kind: ActionKind,
    /// Serialized input schema document.
    pub input_schema: JsonValue,
    /// Serialized submission schema document, when the action's component
    /// negotiates a different input shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_schema: Option<JsonValue>,
    /// Client component key for void-output actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Projected metadata, shaped by the caller-supplied mapper.
    pub metadata: JsonValue,
}

impl ClientAction {
    /// Rehydrate the serialized input schema into a live validator.
    pub fn input_validator(&self) -> CoreResult<Schema> {
        Schema::new(self.input_schema.clone())
    }

    /// Rehydrate the serialized submission schema, if present.
    pub fn submission_validator(&self) -> CoreResult<Option<Schema>> {
        self.submission_schema.clone().map(Schema::new).transpose()
    }
}

/// Serialized, handler-free mirror of a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRegistry {
    pub actions: Vec<ClientAction>,
}

impl ClientRegistry {
    /// Project a registry through a metadata mapper (e.g. to drop
    /// internal-only metadata fields before they reach the browser).
    pub fn project(
        registry: &ActionRegistry,
        map_metadata: impl Fn(&ActionMetadata) -> JsonValue,
    ) -> Self {
        let actions = registry
            .iter()
            .map(|(id, action)| ClientAction {
                action_id: id.as_str().to_string(),
                function_name: action.function_name().to_string(),
                kind: action.kind(),
                input_schema: action.input_json_schema().clone(),
                submission_schema: action
                    .submission_schema()
                    .map(|s| s.document().clone()),
                component: action.component().map(str::to_string),
                metadata: map_metadata(action.metadata()),
            })
            .collect();
        Self { actions }
    }

    /// Project with full metadata serialization.
    pub fn project_full(registry: &ActionRegistry) -> Self {
        Self::project(registry, |metadata| {
            serde_json::to_value(metadata).unwrap_or(JsonValue::Null)
        })
    }

    pub fn get(&self, action_id: &str) -> Option<&ClientAction> {
        self.actions.iter().find(|a| a.action_id == action_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mutation_action, noauth_action, token_action};
    use serde_json::json;

    #[test]
    fn projection_strips_server_internals() {
        let registry =
            ActionRegistry::from_actions(vec![noauth_action("echo"), token_action("whoami")])
                .unwrap();
        let projection = ClientRegistry::project_full(&registry);

        let wire = serde_json::to_string(&projection).unwrap();
        assert!(!wire.contains("handler"));
        assert!(!wire.contains("auth"));
        assert!(!wire.contains("access_token"));
    }

    #[test]
    fn projection_round_trips_schema() {
        let registry = ActionRegistry::from_actions(vec![noauth_action("echo")]).unwrap();
        let projection = ClientRegistry::project_full(&registry);

        let wire = serde_json::to_string(&projection).unwrap();
        let restored: ClientRegistry = serde_json::from_str(&wire).unwrap();

        let client_action = restored.get("echo").unwrap();
        let validator = client_action.input_validator().unwrap();
        assert!(validator.validate(&json!({ "data": "hi" })).is_ok());
        assert!(validator.validate(&json!({ "data": 1 })).is_err());
    }

    #[test]
    fn metadata_mapper_shapes_output() {
        let registry = ActionRegistry::from_actions(vec![noauth_action("echo")]).unwrap();
        let projection = ClientRegistry::project(&registry, |m| {
            json!({ "title": m.title, "resource": m.resource })
        });

        let action = projection.get("echo").unwrap();
        assert_eq!(action.metadata["title"], "echo action");
        assert!(action.metadata.get("description").is_none());
    }

    #[test]
    fn mutation_projection_carries_component() {
        let registry = ActionRegistry::from_actions(vec![mutation_action("send")]).unwrap();
        let action = ClientRegistry::project_full(&registry).actions.remove(0);
        assert_eq!(action.kind, ActionKind::Mutation);
        assert_eq!(action.component.as_deref(), Some("confirm-form"));
        assert!(action.submission_schema.is_some());
        assert!(action.submission_validator().unwrap().is_some());
    }
}
