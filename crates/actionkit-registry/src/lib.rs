//! Immutable action registry, tool-definition export and client projection.

pub mod error;
pub mod projection;
pub mod registry;
pub mod tools;

pub use error::{RegistryError, RegistryResult};
pub use projection::{ClientAction, ClientRegistry};
pub use registry::ActionRegistry;
pub use tools::{tool_definitions, ToolDefinition};

#[cfg(test)]
pub(crate) mod test_support {
    use actionkit_core::{
        ActionDefinition, ActionFactory, ActionMetadata, FieldSchema, ObjectSchema, OAuthConfig,
        OAuthEndpoints, Schema, TokenAuthConfig,
    };
    use serde_json::Value as JsonValue;

    fn input_schema() -> Schema {
        ObjectSchema::new()
            .field("data", FieldSchema::string().describe("Payload"))
            .build()
            .unwrap()
    }

    fn output_schema() -> Schema {
        ObjectSchema::new().field("data", FieldSchema::string()).build().unwrap()
    }

    fn metadata(id: &str) -> ActionMetadata {
        ActionMetadata::new(format!("{id} action"), format!("The {id} action"), "Test")
    }

    pub fn noauth_action(id: &str) -> ActionDefinition {
        ActionFactory::new("test")
            .create_action(id, metadata(id))
            .unwrap()
            .input(input_schema())
            .query(output_schema())
            .no_auth()
            .handler(|input, _ctx| async move { Ok(input) })
    }

    pub fn noauth_action_named(id: &str, function_name: &str) -> ActionDefinition {
        ActionFactory::new("test")
            .create_action(id, metadata(id))
            .unwrap()
            .function_name(function_name)
            .input(input_schema())
            .query(output_schema())
            .no_auth()
            .handler(|input, _ctx| async move { Ok(input) })
    }

    pub fn token_action(id: &str) -> ActionDefinition {
        ActionFactory::new("test")
            .create_action(id, metadata(id))
            .unwrap()
            .input(input_schema())
            .query(output_schema())
            .token_auth(TokenAuthConfig::new("Link account"))
            .unwrap()
            .handler(|input, _auth, _ctx| async move { Ok(input) })
    }

    pub fn oauth_action(id: &str) -> ActionDefinition {
        let endpoints = OAuthEndpoints::Discovery {
            discovery_url: "https://example.com/.well-known/openid-configuration".into(),
        };
        ActionFactory::new("test")
            .create_action(id, metadata(id))
            .unwrap()
            .input(input_schema())
            .query(output_schema())
            .oauth(OAuthConfig::new("Connect", vec!["profile".into()], endpoints))
            .unwrap()
            .handler(|input, _auth, _ctx| async move { Ok(input) })
    }

    pub fn mutation_action(id: &str) -> ActionDefinition {
        let submission = ObjectSchema::new()
            .field("confirmed", FieldSchema::boolean())
            .build()
            .unwrap();
        ActionFactory::new("test")
            .create_action(id, metadata(id))
            .unwrap()
            .input(input_schema())
            .mutation()
            .component("confirm-form")
            .submission_schema(submission)
            .no_auth()
            .handler(|_input, _ctx| async move { Ok(JsonValue::Null) })
    }
}
