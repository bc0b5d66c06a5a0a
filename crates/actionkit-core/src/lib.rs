//! Core types for the ActionKit action registry.
//!
//! An action bundles display metadata, an input/output schema, an auth
//! requirement and an async handler. Definitions are assembled through the
//! staged builders in [`builder`], aggregated by `actionkit-registry`, and
//! executed by `actionkit-runtime`.

pub mod action;
pub mod auth;
pub mod builder;
pub mod error;
pub mod metadata;
pub mod sanitization;
pub mod schema;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use action::{ActionDefinition, CallContext, ErasedHandler, HandlerFuture};
pub use auth::{
    AuthButton, AuthConfig, AuthKind, OAuthAuthData, OAuthConfig, OAuthEndpoints, PkceMethod,
    ResolvedAuth, TokenAuthConfig, TokenAuthData, TokenValidator,
};
pub use builder::{
    ActionBuilder, ActionFactory, ActionWithInput, MutationAction, NoAuthAction, OAuthAction,
    QueryAction, TokenAction,
};
pub use error::{CoreError, CoreResult};
pub use metadata::{ActionMetadata, AvatarPair};
pub use sanitization::{create_debug_string, is_sensitive_field, sanitize_json_value};
pub use schema::{FieldSchema, ObjectSchema, OutputSchema, Schema};
pub use store::{LinkedAccount, LinkedAccountStore};
pub use types::{ActionId, ActionKind};
