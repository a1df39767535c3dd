use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When field validation runs outside of submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    /// Re-validate touched fields as their values change.
    OnChange,
    /// Validate when a field is touched (blurred).
    OnBlur,
    /// Validate only when the form is submitted.
    OnSubmit,
    /// Both on touch and on change.
    #[default]
    All,
}

impl ValidationMode {
    pub fn validates_on_touch(&self) -> bool {
        matches!(self, ValidationMode::OnBlur | ValidationMode::All)
    }

    pub fn validates_on_change(&self) -> bool {
        matches!(self, ValidationMode::OnChange | ValidationMode::All)
    }
}

/// Whether a debounced validation covers a single field or the whole form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DebounceScope {
    #[default]
    Field,
    Form,
}

/// Validation behaviour for a form session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfig {
    pub mode: ValidationMode,
    /// Zero disables debouncing: change validation runs synchronously.
    pub debounce_ms: u64,
    pub debounce_scope: DebounceScope,
    /// Emit value-clear instructions for fields that become hidden.
    pub clear_hidden_values: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::All,
            debounce_ms: 300,
            debounce_scope: DebounceScope::Field,
            clear_hidden_values: true,
        }
    }
}

impl ValidationConfig {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::JsonParseError(e.to_string()))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_debounce_scope(mut self, scope: DebounceScope) -> Self {
        self.debounce_scope = scope;
        self
    }

    pub fn with_clear_hidden_values(mut self, clear: bool) -> Self {
        self.clear_hidden_values = clear;
        self
    }
}
