use super::debounce::{DebounceKey, Debouncer, PendingValidation};
use super::state::{ValidationAction, ValidationState};
use super::FieldValidator;
use crate::condition::{DataSnapshot, lookup};
use crate::config::{DebounceScope, ValidationConfig};
use crate::error::invariant_violation;
use crate::form::FieldDefinition;
use crate::rules::{ActiveFieldState, ActiveStateMap};
use ahash::AHashMap;
use std::time::Instant;

/// What happened to validation after a value update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeValidation {
    /// Not touched yet, hidden, or the mode does not validate on change.
    Deferred,
    Scheduled { due: Instant },
    /// Ran synchronously (zero debounce).
    Validated,
}

/// Coordinates touch tracking, debounced re-validation and submit validation
/// for one form session.
///
/// Only visible fields are ever validated, and [`ValidationOrchestrator::is_valid`]
/// ignores whatever a hidden field might still hold.
pub struct ValidationOrchestrator<'a> {
    fields: &'a [FieldDefinition],
    index: AHashMap<&'a str, &'a FieldDefinition>,
    validator: &'a FieldValidator,
    config: ValidationConfig,
    state: ValidationState,
    active: ActiveStateMap,
    debouncer: Debouncer,
}

impl<'a> ValidationOrchestrator<'a> {
    pub fn new(
        fields: &'a [FieldDefinition],
        validator: &'a FieldValidator,
        config: ValidationConfig,
    ) -> Self {
        let index = fields.iter().map(|f| (f.name.as_str(), f)).collect();
        let debouncer = Debouncer::new(config.debounce());
        Self {
            fields,
            index,
            validator,
            config,
            state: ValidationState::default(),
            active: ActiveStateMap::default(),
            debouncer,
        }
    }

    pub fn state(&self) -> &ValidationState {
        &self.state
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn active_state(&self) -> &ActiveStateMap {
        &self.active
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid(&self.active)
    }

    pub fn is_visible(&self, field: &str) -> bool {
        self.active.get(field).is_none_or(|state| state.visible)
    }

    /// Messages for a field, empty while it is hidden.
    pub fn errors(&self, field: &str) -> &[String] {
        if self.is_visible(field) {
            self.state.errors(field)
        } else {
            &[]
        }
    }

    /// Messages of every visible field that has any.
    pub fn visible_errors(&self) -> AHashMap<String, Vec<String>> {
        self.state
            .field_errors()
            .iter()
            .filter(|(field, _)| self.is_visible(field))
            .map(|(field, errors)| (field.clone(), errors.clone()))
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.debouncer.has_pending()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.debouncer.next_due()
    }

    fn dispatch(&mut self, action: ValidationAction) {
        self.state = std::mem::take(&mut self.state).reduce(action);
    }

    fn field(&self, id: &str) -> Option<&'a FieldDefinition> {
        let field = self.index.get(id).copied();
        if field.is_none() {
            invariant_violation(&format!("field '{}' is not part of this form", id));
        }
        field
    }

    /// Adopts a freshly computed active state. Fields that are now hidden lose
    /// their validation state and any pending validation.
    pub fn sync_active_state(&mut self, active: ActiveStateMap) {
        let hidden: Vec<String> = active
            .iter()
            .filter(|(_, state)| !state.visible)
            .map(|(field, _)| field.clone())
            .collect();
        self.active = active;
        for field in hidden {
            if self.state.is_touched(&field) || !self.state.errors(&field).is_empty() {
                self.clear_field_validation(&field);
            }
        }
    }

    /// Resets a field to untouched with no errors.
    pub fn clear_field_validation(&mut self, id: &str) {
        tracing::debug!(field = id, "validation cleared");
        self.debouncer.cancel(&DebounceKey::Field(id.to_string()));
        self.dispatch(ValidationAction::ClearField(id.to_string()));
    }

    /// Marks a field as interacted with, validating it at once when the mode allows.
    pub fn touch_field(&mut self, id: &str, data: &DataSnapshot) {
        if self.field(id).is_none() {
            return;
        }
        self.dispatch(ValidationAction::Touch(id.to_string()));
        if self.config.mode.validates_on_touch() {
            self.validate_now(id, data);
        }
    }

    /// Informs the orchestrator that `id` changed; the caller has already written
    /// the new value into `data`.
    pub fn update_value(&mut self, id: &str, data: &DataSnapshot, now: Instant) -> ChangeValidation {
        if self.field(id).is_none()
            || !self.state.is_touched(id)
            || !self.is_visible(id)
            || !self.config.mode.validates_on_change()
        {
            return ChangeValidation::Deferred;
        }

        if self.config.debounce_ms == 0 {
            match self.config.debounce_scope {
                DebounceScope::Field => {
                    self.validate_now(id, data);
                }
                DebounceScope::Form => self.validate_touched(data),
            }
            return ChangeValidation::Validated;
        }

        let key = match self.config.debounce_scope {
            DebounceScope::Field => DebounceKey::Field(id.to_string()),
            DebounceScope::Form => DebounceKey::Form,
        };
        self.debouncer.schedule(key, id, lookup(data, id).clone(), now);
        ChangeValidation::Scheduled {
            due: now + self.debouncer.delay(),
        }
    }

    /// Fires every debounced validation due at `now`. Returns the fields whose
    /// results were applied; stale validations are dropped.
    pub fn tick(&mut self, now: Instant, data: &DataSnapshot) -> Vec<String> {
        let mut applied = Vec::new();
        for pending in self.debouncer.take_due(now) {
            if !pending.is_current(lookup(data, &pending.field)) {
                tracing::trace!(field = %pending.field, "value changed since scheduling; result discarded");
                continue;
            }
            applied.extend(self.fire(pending, data));
        }
        applied
    }

    fn fire(&mut self, pending: PendingValidation, data: &DataSnapshot) -> Vec<String> {
        match pending.key {
            DebounceKey::Field(field) => {
                if !self.state.is_touched(&field) || !self.is_visible(&field) {
                    return Vec::new();
                }
                self.validate_now(&field, data);
                vec![field]
            }
            DebounceKey::Form => {
                self.validate_touched(data);
                self.touched_visible()
            }
        }
    }

    fn touched_visible(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| self.state.is_touched(&f.name) && self.is_visible(&f.name))
            .map(|f| f.name.clone())
            .collect()
    }

    fn validate_touched(&mut self, data: &DataSnapshot) {
        for field in self.touched_visible() {
            self.validate_now(&field, data);
        }
    }

    /// Validates one field synchronously and records the result. Hidden
    /// fields are skipped and keep no errors.
    pub fn validate_now(&mut self, id: &str, data: &DataSnapshot) -> Vec<String> {
        let Some(field) = self.field(id) else {
            return Vec::new();
        };
        if !self.is_visible(id) {
            return Vec::new();
        }
        let state = self.active.get(id).cloned().unwrap_or_else(|| ActiveFieldState {
            required: field.is_statically_required(),
            ..Default::default()
        });
        let errors = self.validator.validate_active(field, &state, data);
        tracing::debug!(field = id, errors = errors.len(), "field validated");
        self.dispatch(ValidationAction::SetErrors {
            field: id.to_string(),
            errors: errors.clone(),
        });
        errors
    }

    /// Touches and validates every visible field, superseding any pending
    /// debounced validation. Returns the aggregate validity.
    pub fn validate_for_submit(&mut self, data: &DataSnapshot) -> bool {
        self.debouncer.cancel_all();
        let visible: Vec<String> = self
            .fields
            .iter()
            .filter(|f| self.is_visible(&f.name))
            .map(|f| f.name.clone())
            .collect();
        self.dispatch(ValidationAction::TouchAll(visible.clone()));
        for field in &visible {
            self.validate_now(field, data);
        }
        self.dispatch(ValidationAction::Submitted);
        self.is_valid()
    }

    pub fn reset(&mut self) {
        self.debouncer.cancel_all();
        self.dispatch(ValidationAction::Reset);
    }
}
