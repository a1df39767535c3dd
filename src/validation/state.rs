use crate::rules::ActiveStateMap;
use ahash::{AHashMap, AHashSet};

/// Tagged transitions applied to a [`ValidationState`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationAction {
    Touch(String),
    TouchAll(Vec<String>),
    /// Replaces a field's messages; an empty list removes the entry.
    SetErrors { field: String, errors: Vec<String> },
    /// Back to untouched with no errors.
    ClearField(String),
    Submitted,
    Reset,
}

/// Per-form validation record. Transitions go through [`ValidationState::reduce`],
/// which consumes the old state and returns the new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationState {
    field_errors: AHashMap<String, Vec<String>>,
    touched: AHashSet<String>,
    submitted: bool,
}

impl ValidationState {
    pub fn reduce(mut self, action: ValidationAction) -> Self {
        match action {
            ValidationAction::Touch(field) => {
                self.touched.insert(field);
            }
            ValidationAction::TouchAll(fields) => self.touched.extend(fields),
            ValidationAction::SetErrors { field, errors } => {
                if errors.is_empty() {
                    self.field_errors.remove(&field);
                } else {
                    self.field_errors.insert(field, errors);
                }
            }
            ValidationAction::ClearField(field) => {
                self.field_errors.remove(&field);
                self.touched.remove(&field);
            }
            ValidationAction::Submitted => self.submitted = true,
            ValidationAction::Reset => return ValidationState::default(),
        }
        self
    }

    pub fn errors(&self, field: &str) -> &[String] {
        self.field_errors
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn field_errors(&self) -> &AHashMap<String, Vec<String>> {
        &self.field_errors
    }

    pub fn is_touched(&self, field: &str) -> bool {
        self.touched.contains(field)
    }

    pub fn touched(&self) -> &AHashSet<String> {
        &self.touched
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// True iff no visible field has messages. Fields missing from `active`
    /// count as visible.
    pub fn is_valid(&self, active: &ActiveStateMap) -> bool {
        self.field_errors.iter().all(|(field, errors)| {
            errors.is_empty() || active.get(field).is_some_and(|state| !state.visible)
        })
    }
}
