use crate::condition::{DataSnapshot, is_empty, lookup};
use crate::form::{FieldDefinition, ValidationRule};
use crate::rules::{ActiveFieldState, ActiveStateMap, recompute_active_state, visible_fields};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

mod checkers;
pub mod debounce;
pub mod orchestrator;
pub mod state;

pub use debounce::{DebounceKey, Debouncer, PendingValidation};
pub use orchestrator::{ChangeValidation, ValidationOrchestrator};
pub use state::{ValidationAction, ValidationState};

/// Defines the contract for checking one rule type against a non-empty value.
///
/// Returning `None` means the value passes, or that the rule does not apply to
/// this kind of value (e.g. `minSelections` on a string).
pub trait RuleChecker: Send + Sync {
    fn rule_type(&self) -> &str;
    fn check(&self, value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String>;
}

/// A named validator referenced by `{"type": "custom", "value": "<name>"}` rules.
pub type CustomValidator = Arc<dyn Fn(&Value, &RuleContext<'_>) -> Option<String> + Send + Sync>;

/// Everything a checker may consult besides the value itself.
pub struct RuleContext<'a> {
    pub field: &'a FieldDefinition,
    pub data: &'a DataSnapshot,
    custom: &'a AHashMap<String, CustomValidator>,
}

impl<'a> RuleContext<'a> {
    pub fn label(&self) -> &str {
        self.field.display_label()
    }

    /// The rule's own message if it has one, otherwise the checker's default.
    pub fn message(&self, rule: &ValidationRule, default: impl FnOnce() -> String) -> String {
        rule.message.clone().unwrap_or_else(default)
    }

    pub fn custom_validator(&self, name: &str) -> Option<&CustomValidator> {
        self.custom.get(name)
    }
}

/// Validates single values against a field's rules.
pub struct FieldValidator {
    registry: AHashMap<String, Box<dyn RuleChecker>>,
    custom: AHashMap<String, CustomValidator>,
}

impl Default for FieldValidator {
    fn default() -> Self {
        FieldValidatorBuilder::new().build()
    }
}

pub struct FieldValidatorBuilder {
    registry: AHashMap<String, Box<dyn RuleChecker>>,
    custom: AHashMap<String, CustomValidator>,
}

impl Default for FieldValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldValidatorBuilder {
    pub fn new() -> Self {
        let mut registry: AHashMap<String, Box<dyn RuleChecker>> = AHashMap::new();
        checkers::register_default_checkers(&mut registry);
        Self {
            registry,
            custom: AHashMap::new(),
        }
    }

    /// Lets forms use `user_type` as another name for a built-in rule type.
    pub fn with_rule_alias(mut self, user_type: &str, builtin_type: &str) -> Self {
        if let Some(checker) = checkers::create_checker_by_name(builtin_type) {
            self.registry.insert(user_type.to_string(), checker);
        }
        self
    }

    /// Registers (or replaces) the checker for its rule type.
    pub fn with_checker(mut self, checker: Box<dyn RuleChecker>) -> Self {
        self.registry.insert(checker.rule_type().to_string(), checker);
        self
    }

    pub fn with_custom_validator<F>(mut self, name: &str, validator: F) -> Self
    where
        F: Fn(&Value, &RuleContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.custom.insert(name.to_string(), Arc::new(validator));
        self
    }

    pub fn build(self) -> FieldValidator {
        FieldValidator {
            registry: self.registry,
            custom: self.custom,
        }
    }
}

impl FieldValidator {
    pub fn builder() -> FieldValidatorBuilder {
        FieldValidatorBuilder::new()
    }

    pub fn has_checker(&self, rule_type: &str) -> bool {
        self.registry.contains_key(rule_type)
    }

    /// Validates `value` against `field`, whose `required` flag must already be
    /// the effective, conditionally resolved one.
    ///
    /// An empty value yields only the required message (when required) and
    /// never reaches any other checker.
    pub fn validate(
        &self,
        value: &Value,
        field: &FieldDefinition,
        data: &DataSnapshot,
    ) -> Vec<String> {
        let ctx = RuleContext {
            field,
            data,
            custom: &self.custom,
        };

        if is_empty(value) {
            if !field.is_statically_required() {
                return Vec::new();
            }
            let required_rule = field.rules.iter().find(|rule| rule.kind == "required");
            let message = required_rule
                .and_then(|rule| rule.message.clone())
                .unwrap_or_else(|| format!("{} is required", ctx.label()));
            return vec![message];
        }

        field
            .rules
            .iter()
            .filter(|rule| rule.kind != "required")
            .filter_map(|rule| match self.registry.get(&rule.kind) {
                Some(checker) => checker.check(value, rule, &ctx),
                None => {
                    tracing::trace!(field = %field.name, rule = %rule.kind, "no checker registered; skipping");
                    None
                }
            })
            .collect()
    }

    /// Validates a field in its effective form for the given active state.
    pub fn validate_active(
        &self,
        field: &FieldDefinition,
        state: &ActiveFieldState,
        data: &DataSnapshot,
    ) -> Vec<String> {
        let effective = effective_definition(field, state);
        self.validate(lookup(data, &field.name), &effective, data)
    }

    /// Validates every visible field. Hidden fields are never validated.
    pub fn validate_form(
        &self,
        fields: &[FieldDefinition],
        data: &DataSnapshot,
        active: &ActiveStateMap,
    ) -> FormValidation {
        let errors: AHashMap<String, Vec<String>> = visible_fields(fields, active)
            .filter_map(|field| {
                let state = active.get(&field.name).cloned().unwrap_or_default();
                let messages = self.validate_active(field, &state, data);
                (!messages.is_empty()).then(|| (field.name.clone(), messages))
            })
            .collect();
        FormValidation {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// The definition a field is validated against once its modifications and
/// conditional requiredness are applied.
pub fn effective_definition(field: &FieldDefinition, state: &ActiveFieldState) -> FieldDefinition {
    let mut effective = field.with_overrides(&state.modifications);
    effective.required = effective.required || state.required;
    effective
}

/// Aggregate outcome of validating a whole form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValidation {
    pub is_valid: bool,
    /// Only visible fields with at least one message appear here.
    pub errors: AHashMap<String, Vec<String>>,
}

static DEFAULT_VALIDATOR: Lazy<FieldValidator> = Lazy::new(FieldValidator::default);

/// Validates one value with the built-in checkers.
pub fn validate_field(value: &Value, field: &FieldDefinition, data: &DataSnapshot) -> Vec<String> {
    DEFAULT_VALIDATOR.validate(value, field, data)
}

/// Resolves conditional state from `data` and validates every visible field
/// with the built-in checkers.
pub fn validate_form(data: &DataSnapshot, fields: &[FieldDefinition]) -> FormValidation {
    let active = recompute_active_state(fields, data);
    DEFAULT_VALIDATOR.validate_form(fields, data, &active)
}
