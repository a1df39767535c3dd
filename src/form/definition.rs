use crate::condition::Condition;
use crate::error::ConditionSlot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed set of input kinds a field can render as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Number,
    Email,
    Url,
    Phone,
    Password,
    Date,
    Time,
    Select,
    MultiSelect,
    Radio,
    Checkbox,
    CheckboxGroup,
    File,
    Rating,
    Hidden,
}

impl FieldType {
    /// Whether values of this type are lists of selections.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            FieldType::CheckboxGroup | FieldType::MultiSelect | FieldType::File
        )
    }
}

/// One selectable choice of a select, radio, or checkbox-group field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: Value,
}

/// A validation rule attached to a field, dispatched by its `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    /// Replaces the checker's default message when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn new(kind: &str, value: Value) -> Self {
        Self {
            kind: kind.to_string(),
            value,
            message: None,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn required() -> Self {
        Self::new("required", Value::Null)
    }
    pub fn min_length(n: usize) -> Self {
        Self::new("minLength", Value::from(n))
    }
    pub fn max_length(n: usize) -> Self {
        Self::new("maxLength", Value::from(n))
    }
    pub fn pattern(regex: &str) -> Self {
        Self::new("pattern", Value::from(regex))
    }
    pub fn min(n: f64) -> Self {
        Self::new("min", Value::from(n))
    }
    pub fn max(n: f64) -> Self {
        Self::new("max", Value::from(n))
    }
    pub fn email() -> Self {
        Self::new("email", Value::Null)
    }
    pub fn url() -> Self {
        Self::new("url", Value::Null)
    }
    pub fn phone() -> Self {
        Self::new("phone", Value::Null)
    }
    pub fn min_selections(n: usize) -> Self {
        Self::new("minSelections", Value::from(n))
    }
    pub fn max_selections(n: usize) -> Self {
        Self::new("maxSelections", Value::from(n))
    }
    pub fn file_size(max_bytes: u64) -> Self {
        Self::new("fileSize", Value::from(max_bytes))
    }
    pub fn file_type(accepted: &[&str]) -> Self {
        Self::new("fileType", Value::from(accepted.to_vec()))
    }
    pub fn matches_field(other: &str) -> Self {
        Self::new("matchesField", Value::from(other))
    }
    pub fn custom(validator_name: &str) -> Self {
        Self::new("custom", Value::from(validator_name))
    }
}

/// Partial overrides of a field definition produced by a matching modification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<ValidationRule>>,
    /// Keys the engine does not interpret, passed through to the renderer.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldOverrides {
    /// Layers `other` on top of `self`; keys set in `other` win.
    pub fn merge(&mut self, other: &FieldOverrides) {
        macro_rules! take {
            ($($slot:ident),*) => {
                $( if other.$slot.is_some() { self.$slot = other.$slot.clone(); } )*
            };
        }
        take!(label, placeholder, help_text, disabled, required, options, rules);
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FieldOverrides::default()
    }
}

/// A conditional change to a field's definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub condition: Condition,
    pub changes: FieldOverrides,
}

/// The three independent conditional slots of a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifications: Vec<Modification>,
}

/// An authored field. Immutable for a session; modifications produce new
/// effective definitions via [`FieldDefinition::with_overrides`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<FieldConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    /// Renderer-specific keys the engine carries through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            label: None,
            required: false,
            rules: Vec::new(),
            conditions: None,
            options: None,
            placeholder: None,
            help_text: None,
            default_value: None,
            disabled: false,
            extra: Map::new(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn visible_when(mut self, condition: Condition) -> Self {
        self.conditions.get_or_insert_with(Default::default).visibility = Some(condition);
        self
    }

    pub fn required_when(mut self, condition: Condition) -> Self {
        self.conditions.get_or_insert_with(Default::default).required = Some(condition);
        self
    }

    pub fn modified_when(mut self, condition: Condition, changes: FieldOverrides) -> Self {
        self.conditions
            .get_or_insert_with(Default::default)
            .modifications
            .push(Modification { condition, changes });
        self
    }

    /// The name shown to users in messages.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Required by declaration: the `required` flag or a `required` rule.
    pub fn is_statically_required(&self) -> bool {
        self.required || self.rules.iter().any(|rule| rule.kind == "required")
    }

    pub fn visibility_condition(&self) -> Option<&Condition> {
        self.conditions.as_ref()?.visibility.as_ref()
    }

    pub fn required_condition(&self) -> Option<&Condition> {
        self.conditions.as_ref()?.required.as_ref()
    }

    pub fn modifications(&self) -> &[Modification] {
        self.conditions
            .as_ref()
            .map(|c| c.modifications.as_slice())
            .unwrap_or(&[])
    }

    /// Every condition attached to this field, tagged with its slot.
    pub fn all_conditions(&self) -> Vec<(ConditionSlot, &Condition)> {
        let mut conditions = Vec::new();
        if let Some(visibility) = self.visibility_condition() {
            conditions.push((ConditionSlot::Visibility, visibility));
        }
        if let Some(required) = self.required_condition() {
            conditions.push((ConditionSlot::Required, required));
        }
        for (i, modification) in self.modifications().iter().enumerate() {
            conditions.push((ConditionSlot::Modification(i), &modification.condition));
        }
        conditions
    }

    /// Produces the effective definition with merged overrides applied.
    /// Overrides may make a field required but never un-require it.
    pub fn with_overrides(&self, overrides: &FieldOverrides) -> FieldDefinition {
        let mut effective = self.clone();
        if let Some(label) = &overrides.label {
            effective.label = Some(label.clone());
        }
        if let Some(placeholder) = &overrides.placeholder {
            effective.placeholder = Some(placeholder.clone());
        }
        if let Some(help_text) = &overrides.help_text {
            effective.help_text = Some(help_text.clone());
        }
        if let Some(options) = &overrides.options {
            effective.options = Some(options.clone());
        }
        if let Some(rules) = &overrides.rules {
            effective.rules = rules.clone();
        }
        if let Some(disabled) = overrides.disabled {
            effective.disabled = disabled;
        }
        for (key, value) in &overrides.extra {
            effective.extra.insert(key.clone(), value.clone());
        }
        effective.required = self.is_statically_required() || overrides.required == Some(true);
        effective
    }
}
