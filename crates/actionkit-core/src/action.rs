//! The completed action record produced by the builder chain.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value as JsonValue;

use crate::auth::{AuthConfig, AuthKind, ResolvedAuth};
use crate::error::CoreResult;
use crate::metadata::ActionMetadata;
use crate::schema::{OutputSchema, Schema};
use crate::types::{ActionId, ActionKind};

/// Future returned by an action handler.
pub type HandlerFuture = BoxFuture<'static, CoreResult<JsonValue>>;

/// Type-erased handler stored on a completed definition.
///
/// The typed builder stages adapt strongly-typed closures into this shape;
/// the auth argument is `Some` exactly when the action's auth kind is
/// `Token` or `OAuth`.
pub type ErasedHandler = dyn Fn(JsonValue, Option<ResolvedAuth>, CallContext) -> HandlerFuture + Send + Sync;

/// Per-invocation context passed through to handlers.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Caller-supplied extras, validated against the action's context
    /// schema when one is configured.
    pub extras: Option<JsonValue>,
}

impl CallContext {
    pub fn new(extras: Option<JsonValue>) -> Self {
        Self { extras }
    }
}

/// A fully-configured action: metadata, schemas, auth requirement and
/// handler. Immutable once constructed; build one through
/// [`crate::builder::ActionFactory`].
#[derive(Clone)]
pub struct ActionDefinition {
    pub(crate) id: ActionId,
    pub(crate) namespace: String,
    pub(crate) function_name: String,
    pub(crate) metadata: ActionMetadata,
    pub(crate) input_schema: Schema,
    pub(crate) output_schema: OutputSchema,
    pub(crate) kind: ActionKind,
    pub(crate) auth: AuthConfig,
    pub(crate) handler: Arc<ErasedHandler>,
    pub(crate) component: Option<String>,
    pub(crate) submission_schema: Option<Schema>,
    pub(crate) example_input: Option<JsonValue>,
    pub(crate) context_schema: Option<Schema>,
}

impl ActionDefinition {
    pub fn id(&self) -> &ActionId {
        &self.id
    }

    /// Namespace of the factory that produced this definition.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name exposed to the LLM tool-calling surface. Defaults to the id.
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn metadata(&self) -> &ActionMetadata {
        &self.metadata
    }

    pub fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &OutputSchema {
        &self.output_schema
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn auth_kind(&self) -> AuthKind {
        self.auth.kind()
    }

    /// Client component key rendered for void-output actions, if any.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// Alternate input shape negotiated by the client component.
    pub fn submission_schema(&self) -> Option<&Schema> {
        self.submission_schema.as_ref()
    }

    pub fn example_input(&self) -> Option<&JsonValue> {
        self.example_input.as_ref()
    }

    pub fn context_schema(&self) -> Option<&Schema> {
        self.context_schema.as_ref()
    }

    /// The input schema's JSON Schema document (LLM tool parameters).
    pub fn input_json_schema(&self) -> &JsonValue {
        self.input_schema.document()
    }

    /// The output schema's JSON Schema document, if the action returns data.
    pub fn output_json_schema(&self) -> Option<&JsonValue> {
        self.output_schema.as_schema().map(Schema::document)
    }

    /// Drive the handler. Input/auth validation is the caller's concern;
    /// this hands the arguments straight to the stored closure.
    pub fn invoke(
        &self,
        input: JsonValue,
        auth: Option<ResolvedAuth>,
        context: CallContext,
    ) -> HandlerFuture {
        (self.handler)(input, auth, context)
    }
}

impl std::fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("function_name", &self.function_name)
            .field("kind", &self.kind)
            .field("auth", &self.auth.kind())
            .field("component", &self.component)
            .finish()
    }
}
