//! Auth configuration: a sum type over exactly three variants.
//!
//! The active variant gates which handler signature the builder accepts and
//! which credential material the caller must resolve at execution time. The
//! OAuth/token HTTP exchange itself belongs to the surrounding application;
//! this module only carries the declarative configuration it needs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::CoreResult;
use crate::schema::Schema;

/// Discriminant of [`AuthConfig`], used for filtering and persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    None,
    Token,
    OAuth,
}

impl std::fmt::Display for AuthKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Token => "token",
            Self::OAuth => "oauth",
        };
        f.write_str(s)
    }
}

/// Authentication requirement of an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No credential; the handler receives no auth argument.
    None,
    /// Human-generated credential (API key, personal access token).
    Token(TokenAuthConfig),
    /// Standard OAuth 2.0 authorization-code flow.
    OAuth(OAuthConfig),
}

impl AuthConfig {
    pub fn kind(&self) -> AuthKind {
        match self {
            Self::None => AuthKind::None,
            Self::Token(_) => AuthKind::Token,
            Self::OAuth(_) => AuthKind::OAuth,
        }
    }
}

/// Button copy for the account-linking UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthButton {
    pub text: String,
}

impl AuthButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Configuration for token-based auth.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenAuthConfig {
    pub button: AuthButton,
    /// Where the user can generate the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generating_token_reference_url: Option<String>,
    /// Shape of extra structured data collected alongside the token
    /// (e.g. an instance URL or workspace id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data_schema: Option<Schema>,
    /// Optional callback invoked before a token is persisted.
    #[serde(skip)]
    pub validate_token: Option<Arc<dyn TokenValidator>>,
}

impl TokenAuthConfig {
    pub fn new(button_text: impl Into<String>) -> Self {
        Self {
            button: AuthButton::new(button_text),
            generating_token_reference_url: None,
            custom_data_schema: None,
            validate_token: None,
        }
    }

    pub fn with_reference_url(mut self, url: impl Into<String>) -> Self {
        self.generating_token_reference_url = Some(url.into());
        self
    }

    pub fn with_custom_data_schema(mut self, schema: Schema) -> Self {
        self.custom_data_schema = Some(schema);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn TokenValidator>) -> Self {
        self.validate_token = Some(validator);
        self
    }
}

impl std::fmt::Debug for TokenAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthConfig")
            .field("button", &self.button)
            .field("generating_token_reference_url", &self.generating_token_reference_url)
            .field("custom_data_schema", &self.custom_data_schema)
            .field("validate_token", &self.validate_token.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Checks a user-supplied token before it is persisted (e.g. by probing an
/// upstream `whoami` endpoint).
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, auth: &TokenAuthData) -> CoreResult<()>;
}

/// Configuration for OAuth 2.0 auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub button: AuthButton,
    /// Scopes requested during authorization.
    pub scopes: Vec<String>,
    pub endpoints: OAuthEndpoints,
}

impl OAuthConfig {
    pub fn new(
        button_text: impl Into<String>,
        scopes: Vec<String>,
        endpoints: OAuthEndpoints,
    ) -> Self {
        Self { button: AuthButton::new(button_text), scopes, endpoints }
    }
}

/// OAuth endpoint configuration: a single discovery document, or an explicit
/// endpoint set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OAuthEndpoints {
    Discovery {
        discovery_url: String,
    },
    Explicit {
        authorization_endpoint: String,
        token_endpoint: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        refresh_endpoint: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        revoke_endpoint: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code_challenge_method: Option<PkceMethod>,
    },
}

/// PKCE code-challenge method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkceMethod {
    #[serde(rename = "S256")]
    S256,
    #[serde(rename = "plain")]
    Plain,
}

/// Credential material resolved for one action invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAuth {
    Token(TokenAuthData),
    OAuth(OAuthAuthData),
}

impl ResolvedAuth {
    pub fn kind(&self) -> AuthKind {
        match self {
            Self::Token(_) => AuthKind::Token,
            Self::OAuth(_) => AuthKind::OAuth,
        }
    }
}

/// Runtime credential for token-authed actions.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAuthData {
    pub access_token: String,
    /// Extra structured data matching the config's `custom_data_schema`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<JsonValue>,
}

impl TokenAuthData {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), custom_data: None }
    }

    pub fn with_custom_data(mut self, data: JsonValue) -> Self {
        self.custom_data = Some(data);
        self
    }
}

impl std::fmt::Debug for TokenAuthData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthData")
            .field("access_token", &"***REDACTED***")
            .field("custom_data", &self.custom_data)
            .finish()
    }
}

/// Runtime credential for OAuth-authed actions.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthAuthData {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl OAuthAuthData {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), scope: None }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

impl std::fmt::Debug for OAuthAuthData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthAuthData")
            .field("access_token", &"***REDACTED***")
            .field("scope", &self.scope)
            .finish()
    }
}
