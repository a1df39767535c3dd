pub mod conversion;
pub mod definition;

pub use conversion::*;
pub use definition::*;

use crate::config::ValidationConfig;
use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fs;

/// A complete authored form: its fields in render order plus validation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub config: ValidationConfig,
}

impl FormDefinition {
    /// Parses a form from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::JsonParseError(e.to_string()))
    }

    /// Loads a form from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self).map_err(|e| SchemaError::JsonParseError(e.to_string()))
    }
}
