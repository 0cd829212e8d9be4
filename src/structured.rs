//! JSON-schema response formats and validation of the model's structured output.
//!
//! The schema sent to the provider and the schema the reply is validated
//! against are the same value, generated from the target type by `schemars`.
//! Types whose schema root is not an object are wrapped as `{"value": ...}`,
//! since chat completions only accept object roots.

use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::core::{JsonSchemaFormat, LlmError, ResponseFormat};

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredFormat {
    name: String,
    schema: Value,
    wrapped: bool,
}

impl StructuredFormat {
    pub fn for_type<T>() -> Result<Self, LlmError>
    where
        T: schemars::JsonSchema,
    {
        let schema = schema_for!(T);
        let schema_value = serde_json::to_value(&schema)
            .map_err(|e| LlmError::Config(format!("Failed to build JSON Schema: {e}")))?;
        Self::from_value(schema_value)
    }

    pub fn from_value(mut schema_value: Value) -> Result<Self, LlmError> {
        let schema_obj = schema_value.as_object_mut().ok_or_else(|| {
            LlmError::Config("Failed to build JSON Schema: root is not an object".to_string())
        })?;

        let name = schema_obj
            .get("title")
            .ok_or_else(|| {
                LlmError::Config("Failed to build JSON Schema: Missing schema name".to_string())
            })?
            .as_str()
            .ok_or_else(|| {
                LlmError::Config("Failed to build JSON Schema: title is not a string".to_string())
            })?
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();

        let needs_wrapping = schema_obj
            .get("type")
            .and_then(|t| t.as_str())
            .map(|t| t != "object")
            .unwrap_or(false);

        if needs_wrapping {
            // Definitions stay at the root so `#/$defs/...` references still resolve.
            let mut root = Map::new();
            for key in ["$schema", "$defs"] {
                if let Some(value) = schema_obj.remove(key) {
                    root.insert(key.to_string(), value);
                }
            }
            root.insert("title".to_string(), Value::String(name.clone()));
            root.insert("type".to_string(), "object".into());
            root.insert(
                "properties".to_string(),
                serde_json::json!({ "value": schema_value }),
            );
            root.insert("required".to_string(), serde_json::json!(["value"]));
            root.insert("additionalProperties".to_string(), Value::Bool(false));
            schema_value = Value::Object(root);
        }

        Ok(Self {
            name,
            schema: schema_value,
            wrapped: needs_wrapping,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    pub fn response_format(&self) -> ResponseFormat {
        ResponseFormat::JsonSchema(JsonSchemaFormat {
            name: self.name.clone(),
            schema: self.schema.clone(),
            strict: None,
        })
    }

    /// Validates `text` against the schema and decodes it into `T`.
    pub fn parse<T>(&self, text: &str) -> Result<T, LlmError>
    where
        T: DeserializeOwned,
    {
        let mut value: Value = serde_json::from_str(text).map_err(|e| {
            LlmError::schema_validation("Structured output is not valid JSON", vec![e.to_string()])
        })?;

        let validator = jsonschema::validator_for(&self.schema)
            .map_err(|e| LlmError::Config(format!("Invalid JSON Schema '{}': {e}", self.name)))?;

        let errors: Vec<String> = validator
            .iter_errors(&value)
            .map(|error| error.to_string())
            .collect();
        if !errors.is_empty() {
            tracing::debug!(schema = %self.name, ?errors, "Structured output failed validation");
            return Err(LlmError::schema_validation(
                format!("Structured output does not match schema '{}'", self.name),
                errors,
            ));
        }

        if self.wrapped {
            value = value
                .get_mut("value")
                .map(Value::take)
                .unwrap_or(Value::Null);
        }

        serde_json::from_value(value).map_err(|e| {
            LlmError::schema_validation(
                format!("Structured output could not be decoded as '{}'", self.name),
                vec![e.to_string()],
            )
        })
    }
}
