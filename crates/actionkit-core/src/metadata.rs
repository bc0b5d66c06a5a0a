use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::schema::Schema;

/// Light/dark avatar image pair for UI display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarPair {
    pub light: String,
    pub dark: String,
}

/// Display metadata for an action.
///
/// Validated against an optional registry-level metadata schema at
/// `create_action` time; see [`ActionMetadata::validate_against`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMetadata {
    /// Human-readable title (e.g. `"Send Email"`).
    pub title: String,
    /// What the action does; also surfaced as the LLM tool description.
    pub description: String,
    /// Upstream resource name (e.g. `"Gmail"`, `"Linear"`).
    pub resource: String,
    /// Avatar images for light/dark UI themes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarPair>,
    /// Keywords used for search/grouping in the development UI.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_keywords: Vec<String>,
    /// Example prompts that should trigger this action.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub example_prompts: Vec<String>,
    /// Link to the upstream API reference, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_reference: Option<String>,
    /// Copy shown in chat while the action runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading_message: Option<String>,
    /// Copy shown in chat once the action completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_message: Option<String>,
}

impl ActionMetadata {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            resource: resource.into(),
            avatar: None,
            default_keywords: Vec::new(),
            example_prompts: Vec::new(),
            api_reference: None,
            loading_message: None,
            chat_message: None,
        }
    }

    pub fn with_avatar(mut self, light: impl Into<String>, dark: impl Into<String>) -> Self {
        self.avatar = Some(AvatarPair { light: light.into(), dark: dark.into() });
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.default_keywords.push(keyword.into());
        self
    }

    pub fn with_example_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.example_prompts.push(prompt.into());
        self
    }

    pub fn with_api_reference(mut self, url: impl Into<String>) -> Self {
        self.api_reference = Some(url.into());
        self
    }

    pub fn with_loading_message(mut self, message: impl Into<String>) -> Self {
        self.loading_message = Some(message.into());
        self
    }

    pub fn with_chat_message(mut self, message: impl Into<String>) -> Self {
        self.chat_message = Some(message.into());
        self
    }

    /// Validate this metadata's JSON form against a registry-level schema.
    pub fn validate_against(&self, action_id: &str, schema: &Schema) -> CoreResult<()> {
        let value = serde_json::to_value(self)?;
        schema.validate(&value).map_err(|e| CoreError::InvalidMetadata {
            action_id: action_id.to_string(),
            message: e.to_string(),
        })
    }
}
