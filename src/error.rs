use crate::graph::CyclePath;
use std::fmt;
use thiserror::Error;

/// Problems in the authored form configuration.
///
/// These never abort evaluation: the offending condition resolves to `false`
/// (or a cyclic field keeps its previous state) and the error is reported to
/// the authoring surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Circular dependency between fields: {path}")]
    CircularDependency { path: CyclePath },

    #[error("Condition on '{field}' uses an invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        field: String,
        pattern: String,
        message: String,
    },

    #[error("Condition on '{field}' uses an unknown operator '{operator}'")]
    UnknownOperator { field: String, operator: String },

    #[error("Operator '{operator}' on '{field}' expects a list value")]
    ExpectedList { field: String, operator: String },

    #[error("Condition of '{field}' references undefined field '{dependency}'")]
    UnknownDependency { field: String, dependency: String },
}

/// Errors that can occur while loading or building a form definition.
#[derive(Error, Debug, Clone)]
pub enum SchemaError {
    #[error("Failed to parse form JSON: {0}")]
    JsonParseError(String),

    #[error("Could not read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Field name '{0}' is defined more than once")]
    DuplicateField(String),

    #[error("Field at position {0} has an empty name")]
    EmptyFieldName(usize),
}

/// Errors that can occur when converting a custom user format into a `FormDefinition`.
#[derive(Error, Debug, Clone)]
pub enum FormConversionError {
    #[error("Invalid custom form data: {0}")]
    ValidationError(String),
}

/// Which condition of a field a diagnostic was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionSlot {
    Visibility,
    Required,
    Modification(usize),
    /// Reported against the dependency graph rather than a single condition.
    Graph,
}

impl fmt::Display for ConditionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionSlot::Visibility => write!(f, "visibility"),
            ConditionSlot::Required => write!(f, "required"),
            ConditionSlot::Modification(i) => write!(f, "modification[{}]", i),
            ConditionSlot::Graph => write!(f, "dependencies"),
        }
    }
}

/// A configuration error attributed to the field that owns the condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub field: String,
    pub slot: ConditionSlot,
    pub error: ConfigurationError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} / {}] {}", self.field, self.slot, self.error)
    }
}

/// Reports programmer misuse: loud in debug builds, logged and ignored in release.
pub(crate) fn invariant_violation(message: &str) {
    tracing::error!(target: "kakunin::invariant", "{}", message);
    debug_assert!(false, "invariant violation: {}", message);
}
