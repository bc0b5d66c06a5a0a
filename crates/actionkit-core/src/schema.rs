//! JSON Schema wrapper: a schema document paired with its compiled validator.
//!
//! The document form is what crosses process boundaries (LLM tool
//! definitions, client projection); `Schema::new` is the rehydration path
//! that turns a document back into a live validator.

use std::sync::Arc;

use jsonschema::JSONSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value as JsonValue};

use crate::error::{CoreError, CoreResult};

/// A compiled JSON Schema.
///
/// Cheap to clone (the compiled validator is shared behind an `Arc`).
/// Serializes as the raw schema document; deserializing re-compiles it, so a
/// serialize/deserialize round trip yields an equivalent validator.
#[derive(Clone)]
pub struct Schema {
    document: JsonValue,
    compiled: Arc<JSONSchema>,
}

impl Schema {
    /// Compile a JSON Schema document. Fails if the document is not a valid
    /// schema.
    pub fn new(document: JsonValue) -> CoreResult<Self> {
        let compiled = JSONSchema::compile(&document)
            .map_err(|e| CoreError::InvalidSchema(e.to_string()))?;
        Ok(Self { document, compiled: Arc::new(compiled) })
    }

    /// The raw schema document.
    pub fn document(&self) -> &JsonValue {
        &self.document
    }

    /// Validate a value, reporting the first validation error's message.
    pub fn validate(&self, value: &JsonValue) -> CoreResult<()> {
        if let Err(errors) = self.compiled.validate(value) {
            let first = errors.into_iter().next();
            let msg = first
                .map(|e| e.to_string())
                .unwrap_or_else(|| "value does not match schema".to_string());
            return Err(CoreError::Validation(msg));
        }
        Ok(())
    }

    pub fn is_valid(&self, value: &JsonValue) -> bool {
        self.compiled.is_valid(value)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema").field("document", &self.document).finish()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = JsonValue::deserialize(deserializer)?;
        Schema::new(document).map_err(serde::de::Error::custom)
    }
}

/// Output declaration of an action: a concrete data schema, or the explicit
/// void marker for side-effect actions whose result is rendered by a client
/// component instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "schema", rename_all = "snake_case")]
pub enum OutputSchema {
    Data(Schema),
    Void,
}

impl OutputSchema {
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            Self::Data(schema) => Some(schema),
            Self::Void => None,
        }
    }
}

/// Builder for object schemas with described fields.
///
/// Action input schemas double as LLM tool-parameter documentation, so every
/// field should carry a description (convention, not enforced).
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    description: Option<String>,
    properties: Map<String, JsonValue>,
    required: Vec<String>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a required field.
    pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.insert(name, field.into_value());
        self
    }

    /// Add an optional field.
    pub fn optional_field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.properties.insert(name.into(), field.into_value());
        self
    }

    pub fn to_value(&self) -> JsonValue {
        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        if let Some(description) = &self.description {
            schema.insert("description".into(), json!(description));
        }
        schema.insert("properties".into(), JsonValue::Object(self.properties.clone()));
        if !self.required.is_empty() {
            schema.insert("required".into(), json!(self.required));
        }
        schema.insert("additionalProperties".into(), json!(false));
        JsonValue::Object(schema)
    }

    /// Compile into a `Schema`.
    pub fn build(self) -> CoreResult<Schema> {
        Schema::new(self.to_value())
    }
}

/// A single field within an [`ObjectSchema`].
#[derive(Debug, Clone)]
pub struct FieldSchema {
    value: Map<String, JsonValue>,
}

impl FieldSchema {
    fn typed(ty: &str) -> Self {
        let mut value = Map::new();
        value.insert("type".into(), json!(ty));
        Self { value }
    }

    pub fn string() -> Self {
        Self::typed("string")
    }

    pub fn number() -> Self {
        Self::typed("number")
    }

    pub fn integer() -> Self {
        Self::typed("integer")
    }

    pub fn boolean() -> Self {
        Self::typed("boolean")
    }

    pub fn array(items: FieldSchema) -> Self {
        let mut field = Self::typed("array");
        field.value.insert("items".into(), items.into_value());
        field
    }

    pub fn object(schema: ObjectSchema) -> Self {
        let JsonValue::Object(value) = schema.to_value() else {
            unreachable!("object schema serializes to a JSON object");
        };
        Self { value }
    }

    /// Restrict a string field to a fixed set of values.
    pub fn one_of(values: &[&str]) -> Self {
        let mut field = Self::typed("string");
        field.value.insert("enum".into(), json!(values));
        field
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.value.insert("description".into(), json!(description.into()));
        self
    }

    fn into_value(self) -> JsonValue {
        JsonValue::Object(self.value)
    }
}
