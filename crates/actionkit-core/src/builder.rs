//! Staged builders assembling an [`ActionDefinition`].
//!
//! The configuration order `id → metadata → input → kind → output → auth →
//! handler` is enforced through the type system: each stage is a distinct
//! type exposing only the transitions legal at that point, and every
//! transition consumes the stage and returns the next one. Illegal
//! combinations (a component on a data-returning action, a token handler on
//! an OAuth action) are unrepresentable.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::action::{ActionDefinition, CallContext, ErasedHandler};
use crate::auth::{
    AuthConfig, OAuthAuthData, OAuthConfig, ResolvedAuth, TokenAuthConfig, TokenAuthData,
    TokenValidator,
};
use crate::error::{CoreError, CoreResult};
use crate::metadata::ActionMetadata;
use crate::schema::{OutputSchema, Schema};
use crate::types::{ActionId, ActionKind};

/// Per-namespace entry point producing action builders.
///
/// Registry-level schemas configured here are enforced on every action the
/// factory creates: metadata is checked at `create_action`, auth payloads at
/// the `token_auth`/`oauth` transitions.
#[derive(Debug, Clone, Default)]
pub struct ActionFactory {
    namespace: String,
    metadata_schema: Option<Schema>,
    auth_metadata_schema: Option<Schema>,
    context_schema: Option<Schema>,
}

impl ActionFactory {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            metadata_schema: None,
            auth_metadata_schema: None,
            context_schema: None,
        }
    }

    pub fn with_metadata_schema(mut self, schema: Schema) -> Self {
        self.metadata_schema = Some(schema);
        self
    }

    pub fn with_auth_metadata_schema(mut self, schema: Schema) -> Self {
        self.auth_metadata_schema = Some(schema);
        self
    }

    /// Shape of the handler-context extras callers may pass through.
    pub fn with_context_schema(mut self, schema: Schema) -> Self {
        self.context_schema = Some(schema);
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Start the builder chain. Fails immediately when the metadata does not
    /// satisfy the factory's metadata schema, so no partially-constructed
    /// invalid action can exist.
    pub fn create_action(
        &self,
        id: impl Into<ActionId>,
        metadata: ActionMetadata,
    ) -> CoreResult<ActionBuilder> {
        let id = id.into();
        if let Some(schema) = &self.metadata_schema {
            metadata.validate_against(id.as_str(), schema)?;
        }
        Ok(ActionBuilder {
            function_name: id.as_str().to_string(),
            id,
            namespace: self.namespace.clone(),
            metadata,
            auth_metadata_schema: self.auth_metadata_schema.clone(),
            context_schema: self.context_schema.clone(),
        })
    }
}

/// Stage 1: id and metadata fixed; awaiting the input schema.
#[derive(Debug)]
pub struct ActionBuilder {
    id: ActionId,
    namespace: String,
    function_name: String,
    metadata: ActionMetadata,
    auth_metadata_schema: Option<Schema>,
    context_schema: Option<Schema>,
}

impl ActionBuilder {
    /// Override the LLM-facing function name (defaults to the id).
    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    pub fn input(self, schema: Schema) -> ActionWithInput {
        ActionWithInput { builder: self, input_schema: schema, example_input: None }
    }
}

/// Stage 2: input schema fixed; choose the action kind.
#[derive(Debug)]
pub struct ActionWithInput {
    builder: ActionBuilder,
    input_schema: Schema,
    example_input: Option<JsonValue>,
}

impl ActionWithInput {
    /// Attach an example input, validated against the input schema.
    pub fn example_input(mut self, example: JsonValue) -> CoreResult<Self> {
        self.input_schema.validate(&example).map_err(|e| CoreError::InvalidExampleInput {
            action_id: self.builder.id.as_str().to_string(),
            message: e.to_string(),
        })?;
        self.example_input = Some(example);
        Ok(self)
    }

    /// Data-returning action with the given output schema.
    pub fn query(self, output: Schema) -> QueryAction {
        QueryAction {
            parts: ConfiguredAction {
                builder: self.builder,
                input_schema: self.input_schema,
                example_input: self.example_input,
                kind: ActionKind::Query,
                output_schema: OutputSchema::Data(output),
                component: None,
                submission_schema: None,
            },
        }
    }

    /// Side-effect action with void output; may declare a client component.
    pub fn mutation(self) -> MutationAction {
        MutationAction {
            parts: ConfiguredAction {
                builder: self.builder,
                input_schema: self.input_schema,
                example_input: self.example_input,
                kind: ActionKind::Mutation,
                output_schema: OutputSchema::Void,
                component: None,
                submission_schema: None,
            },
        }
    }
}

/// Accumulated configuration shared by the auth stages.
#[derive(Debug)]
struct ConfiguredAction {
    builder: ActionBuilder,
    input_schema: Schema,
    example_input: Option<JsonValue>,
    kind: ActionKind,
    output_schema: OutputSchema,
    component: Option<String>,
    submission_schema: Option<Schema>,
}

impl ConfiguredAction {
    fn validate_auth_payload(&self, payload: &impl serde::Serialize) -> CoreResult<()> {
        if let Some(schema) = &self.builder.auth_metadata_schema {
            let value = serde_json::to_value(payload)?;
            schema.validate(&value).map_err(|e| CoreError::InvalidAuthConfig {
                action_id: self.builder.id.as_str().to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn finish(self, auth: AuthConfig, handler: Arc<ErasedHandler>) -> ActionDefinition {
        ActionDefinition {
            id: self.builder.id,
            namespace: self.builder.namespace,
            function_name: self.builder.function_name,
            metadata: self.builder.metadata,
            input_schema: self.input_schema,
            output_schema: self.output_schema,
            kind: self.kind,
            auth,
            handler,
            component: self.component,
            submission_schema: self.submission_schema,
            example_input: self.example_input,
            context_schema: self.builder.context_schema,
        }
    }
}

macro_rules! auth_transitions {
    ($stage:ident) => {
        impl $stage {
            /// No credential; the handler takes only input and context.
            pub fn no_auth(self) -> NoAuthAction {
                NoAuthAction { parts: self.parts }
            }

            /// Token-based auth. Re-validates the config against the
            /// factory's auth-metadata schema when one is set.
            pub fn token_auth(self, config: TokenAuthConfig) -> CoreResult<TokenAction> {
                self.parts.validate_auth_payload(&config)?;
                Ok(TokenAction { parts: self.parts, config })
            }

            /// OAuth 2.0 auth. Re-validates the config against the factory's
            /// auth-metadata schema when one is set.
            pub fn oauth(self, config: OAuthConfig) -> CoreResult<OAuthAction> {
                self.parts.validate_auth_payload(&config)?;
                Ok(OAuthAction { parts: self.parts, config })
            }
        }
    };
}

/// Stage 3 (query path): output schema fixed; choose the auth type.
#[derive(Debug)]
pub struct QueryAction {
    parts: ConfiguredAction,
}

auth_transitions!(QueryAction);

/// Stage 3 (mutation path): void output; component and submission schema may
/// be declared before choosing the auth type.
#[derive(Debug)]
pub struct MutationAction {
    parts: ConfiguredAction,
}

impl MutationAction {
    /// Client component key rendered to collect/confirm the submission.
    pub fn component(mut self, key: impl Into<String>) -> Self {
        self.parts.component = Some(key.into());
        self
    }

    /// Alternate input shape accepted from the component, distinct from the
    /// LLM-facing input schema.
    pub fn submission_schema(mut self, schema: Schema) -> Self {
        self.parts.submission_schema = Some(schema);
        self
    }
}

auth_transitions!(MutationAction);

/// Terminal stage for `None`-auth actions.
#[derive(Debug)]
pub struct NoAuthAction {
    parts: ConfiguredAction,
}

impl NoAuthAction {
    pub fn handler<F, Fut>(self, f: F) -> ActionDefinition
    where
        F: Fn(JsonValue, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CoreResult<JsonValue>> + Send + 'static,
    {
        let erased: Arc<ErasedHandler> =
            Arc::new(move |input, _auth, ctx| Box::pin(f(input, ctx)));
        self.parts.finish(AuthConfig::None, erased)
    }
}

/// Terminal stage for token-authed actions.
#[derive(Debug)]
pub struct TokenAction {
    parts: ConfiguredAction,
    config: TokenAuthConfig,
}

impl TokenAction {
    /// Attach a callback run before a user-supplied token is persisted.
    pub fn validate_token(mut self, validator: Arc<dyn TokenValidator>) -> Self {
        self.config.validate_token = Some(validator);
        self
    }

    pub fn handler<F, Fut>(self, f: F) -> ActionDefinition
    where
        F: Fn(JsonValue, TokenAuthData, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CoreResult<JsonValue>> + Send + 'static,
    {
        let id = self.parts.builder.id.clone();
        let erased: Arc<ErasedHandler> = Arc::new(move |input, auth, ctx| match auth {
            Some(ResolvedAuth::Token(token)) => Box::pin(f(input, token, ctx)),
            _ => Box::pin(futures::future::ready(Err(CoreError::AuthDataMissing(format!(
                "token auth data required for action '{id}'"
            ))))),
        });
        self.parts.finish(AuthConfig::Token(self.config), erased)
    }
}

/// Terminal stage for OAuth-authed actions.
#[derive(Debug)]
pub struct OAuthAction {
    parts: ConfiguredAction,
    config: OAuthConfig,
}

impl OAuthAction {
    pub fn handler<F, Fut>(self, f: F) -> ActionDefinition
    where
        F: Fn(JsonValue, OAuthAuthData, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CoreResult<JsonValue>> + Send + 'static,
    {
        let id = self.parts.builder.id.clone();
        let erased: Arc<ErasedHandler> = Arc::new(move |input, auth, ctx| match auth {
            Some(ResolvedAuth::OAuth(oauth)) => Box::pin(f(input, oauth, ctx)),
            _ => Box::pin(futures::future::ready(Err(CoreError::AuthDataMissing(format!(
                "oauth access token required for action '{id}'"
            ))))),
        });
        self.parts.finish(AuthConfig::OAuth(self.config), erased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::OAuthEndpoints;
    use crate::schema::{FieldSchema, ObjectSchema};
    use serde_json::json;

    fn echo_input() -> Schema {
        ObjectSchema::new()
            .field("data", FieldSchema::string().describe("Data to echo back"))
            .build()
            .unwrap()
    }

    fn echo_output() -> Schema {
        ObjectSchema::new().field("data", FieldSchema::string()).build().unwrap()
    }

    fn metadata() -> ActionMetadata {
        ActionMetadata::new("Echo", "Echo the input back", "Test")
    }

    #[tokio::test]
    async fn no_auth_query_chain() {
        let factory = ActionFactory::new("test");
        let action = factory
            .create_action("echo", metadata())
            .unwrap()
            .input(echo_input())
            .query(echo_output())
            .no_auth()
            .handler(|input, _ctx| async move { Ok(input) });

        assert_eq!(action.id().as_str(), "echo");
        assert_eq!(action.function_name(), "echo");
        assert_eq!(action.namespace(), "test");
        assert_eq!(action.kind(), ActionKind::Query);
        assert_eq!(action.auth_kind(), crate::auth::AuthKind::None);
        assert!(action.component().is_none());

        let out = action
            .invoke(json!({ "data": "hi" }), None, CallContext::default())
            .await
            .unwrap();
        assert_eq!(out, json!({ "data": "hi" }));
    }

    #[test]
    fn function_name_defaults_to_id_and_can_be_overridden() {
        let factory = ActionFactory::new("test");
        let action = factory
            .create_action("gmail-send-email", metadata())
            .unwrap()
            .function_name("send_email")
            .input(echo_input())
            .mutation()
            .no_auth()
            .handler(|_input, _ctx| async move { Ok(JsonValue::Null) });
        assert_eq!(action.function_name(), "send_email");
    }

    #[test]
    fn invalid_metadata_fails_create_action() {
        let metadata_schema = ObjectSchema::new()
            .field("title", FieldSchema::string())
            .field("description", FieldSchema::string())
            .field("resource", FieldSchema::one_of(&["Gmail"]))
            .build()
            .unwrap();
        let factory = ActionFactory::new("test").with_metadata_schema(metadata_schema);

        let err = factory.create_action("echo", metadata()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidMetadata { .. }));
        assert!(err.to_string().contains("echo"));
    }

    #[test]
    fn invalid_example_input_rejected() {
        let factory = ActionFactory::new("test");
        let err = factory
            .create_action("echo", metadata())
            .unwrap()
            .input(echo_input())
            .example_input(json!({ "data": 42 }))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidExampleInput { .. }));
    }

    #[test]
    fn mutation_component_and_submission_schema() {
        let submission = ObjectSchema::new()
            .field("confirmed", FieldSchema::boolean())
            .build()
            .unwrap();
        let factory = ActionFactory::new("test");
        let action = factory
            .create_action("send-email", metadata())
            .unwrap()
            .input(echo_input())
            .mutation()
            .component("email-form")
            .submission_schema(submission)
            .no_auth()
            .handler(|_input, _ctx| async move { Ok(JsonValue::Null) });

        assert!(action.output_schema().is_void());
        assert_eq!(action.component(), Some("email-form"));
        assert!(action.submission_schema().is_some());
    }

    #[tokio::test]
    async fn token_handler_receives_auth_data() {
        let factory = ActionFactory::new("test");
        let action = factory
            .create_action("whoami", metadata())
            .unwrap()
            .input(echo_input())
            .query(echo_output())
            .token_auth(TokenAuthConfig::new("Link account"))
            .unwrap()
            .handler(|_input, auth, _ctx| async move {
                Ok(json!({ "data": auth.access_token }))
            });

        let auth = ResolvedAuth::Token(TokenAuthData::new("tok_123"));
        let out = action
            .invoke(json!({ "data": "x" }), Some(auth), CallContext::default())
            .await
            .unwrap();
        assert_eq!(out, json!({ "data": "tok_123" }));
    }

    #[tokio::test]
    async fn token_handler_without_auth_errors() {
        let factory = ActionFactory::new("test");
        let action = factory
            .create_action("whoami", metadata())
            .unwrap()
            .input(echo_input())
            .query(echo_output())
            .token_auth(TokenAuthConfig::new("Link account"))
            .unwrap()
            .handler(|_input, _auth, _ctx| async move { Ok(JsonValue::Null) });

        let err = action
            .invoke(json!({ "data": "x" }), None, CallContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AuthDataMissing(_)));
    }

    #[test]
    fn auth_metadata_schema_gates_auth_payload() {
        // Require every OAuth config to carry at least one scope.
        let auth_schema = Schema::new(json!({
            "type": "object",
            "properties": {
                "scopes": { "type": "array", "minItems": 1 }
            }
        }))
        .unwrap();
        let factory = ActionFactory::new("test").with_auth_metadata_schema(auth_schema);

        let endpoints = OAuthEndpoints::Discovery {
            discovery_url: "https://example.com/.well-known/openid-configuration".into(),
        };
        let err = factory
            .create_action("cal", metadata())
            .unwrap()
            .input(echo_input())
            .query(echo_output())
            .oauth(OAuthConfig::new("Connect", vec![], endpoints))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAuthConfig { .. }));
    }
}
