use crate::condition::{
    Condition, ConditionTrace, DataSnapshot, LeafCondition, LogicalOperator, Operator, is_empty,
    compile_pattern, lookup, strict_equals, to_display_string, to_number,
};
use crate::error::ConfigurationError;
use serde_json::Value;

// This macro generates the body of a numeric comparison operator.
macro_rules! compare_numbers {
    ($actual:expr, $expected:expr, $op:tt) => {
        match (to_number($actual), to_number($expected)) {
            (Some(a), Some(b)) => Ok(a $op b),
            _ => Ok(false),
        }
    };
}

/// The recursive engine for evaluating a condition tree against one data snapshot.
pub(super) struct ConditionEngine<'a> {
    data: &'a DataSnapshot,
}

impl<'a> ConditionEngine<'a> {
    pub(super) fn new(data: &'a DataSnapshot) -> Self {
        Self { data }
    }

    /// Evaluates the condition and returns a trace of the execution.
    pub(super) fn evaluate(&self, condition: &Condition) -> ConditionTrace {
        match condition {
            Condition::Leaf(leaf) => self.evaluate_leaf(leaf),
            Condition::Composite(composite) => {
                let operator = composite.logical_operator;
                // AND stops at the first false child, OR at the first true one.
                let decisive = operator == LogicalOperator::Or;
                let mut children = Vec::with_capacity(composite.conditions.len());
                let mut outcome = !decisive;
                let mut short_circuited = false;
                for child in &composite.conditions {
                    if short_circuited {
                        children.push(ConditionTrace::NotEvaluated);
                        continue;
                    }
                    let trace = self.evaluate(child);
                    if trace.outcome() == decisive {
                        outcome = decisive;
                        short_circuited = true;
                    }
                    children.push(trace);
                }
                ConditionTrace::Composite {
                    operator,
                    children,
                    outcome,
                }
            }
        }
    }

    fn evaluate_leaf(&self, leaf: &LeafCondition) -> ConditionTrace {
        let actual = lookup(self.data, &leaf.field);
        let (outcome, fault) = match apply_operator(leaf, actual) {
            Ok(outcome) => (outcome, None),
            Err(fault) => {
                tracing::warn!(
                    field = %leaf.field,
                    operator = %leaf.operator,
                    "{}; treating condition as false",
                    fault
                );
                (false, Some(fault))
            }
        };
        ConditionTrace::Leaf {
            field: leaf.field.clone(),
            operator: leaf.operator.clone(),
            expected: leaf.value.clone(),
            actual: actual.clone(),
            outcome,
            fault,
        }
    }
}

/// Applies a leaf's operator. `Err` means the condition itself is misconfigured.
fn apply_operator(leaf: &LeafCondition, actual: &Value) -> Result<bool, ConfigurationError> {
    let expected = &leaf.value;
    match &leaf.operator {
        // --- Identity ---
        Operator::Equals => Ok(strict_equals(actual, expected)),
        Operator::NotEquals => Ok(!strict_equals(actual, expected)),

        // --- Text and membership ---
        Operator::Contains => Ok(contains(actual, expected)),
        Operator::NotContains => Ok(!contains(actual, expected)),
        Operator::StartsWith => Ok(lowercase(actual).starts_with(&lowercase(expected))),
        Operator::EndsWith => Ok(lowercase(actual).ends_with(&lowercase(expected))),
        Operator::InList | Operator::NotInList => {
            let Value::Array(items) = expected else {
                return Err(ConfigurationError::ExpectedList {
                    field: leaf.field.clone(),
                    operator: leaf.operator.to_string(),
                });
            };
            let found = items.iter().any(|item| strict_equals(actual, item));
            Ok(found == (leaf.operator == Operator::InList))
        }

        // --- Emptiness ---
        Operator::IsEmpty => Ok(is_empty(actual)),
        Operator::IsNotEmpty => Ok(!is_empty(actual)),

        // --- Numeric ---
        Operator::GreaterThan => compare_numbers!(actual, expected, >),
        Operator::LessThan => compare_numbers!(actual, expected, <),
        Operator::GreaterThanOrEqual => compare_numbers!(actual, expected, >=),
        Operator::LessThanOrEqual => compare_numbers!(actual, expected, <=),

        // --- Pattern ---
        Operator::MatchesPattern => {
            let pattern = to_display_string(expected);
            let regex = compile_pattern(&pattern).map_err(|message| ConfigurationError::InvalidPattern {
                field: leaf.field.clone(),
                pattern: pattern.clone(),
                message,
            })?;
            Ok(regex.is_match(&to_display_string(actual)))
        }

        Operator::Unknown(name) => Err(ConfigurationError::UnknownOperator {
            field: leaf.field.clone(),
            operator: name.clone(),
        }),
    }
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| strict_equals(item, expected)),
        _ => lowercase(actual).contains(&lowercase(expected)),
    }
}

fn lowercase(value: &Value) -> String {
    to_display_string(value).to_lowercase()
}

/// Checks a leaf for problems that do not depend on data.
pub(crate) fn check_leaf(leaf: &LeafCondition) -> Option<ConfigurationError> {
    match &leaf.operator {
        Operator::Unknown(name) => Some(ConfigurationError::UnknownOperator {
            field: leaf.field.clone(),
            operator: name.clone(),
        }),
        Operator::InList | Operator::NotInList if !leaf.value.is_array() => {
            Some(ConfigurationError::ExpectedList {
                field: leaf.field.clone(),
                operator: leaf.operator.to_string(),
            })
        }
        Operator::MatchesPattern => {
            let pattern = to_display_string(&leaf.value);
            compile_pattern(&pattern)
                .err()
                .map(|message| ConfigurationError::InvalidPattern {
                    field: leaf.field.clone(),
                    pattern,
                    message,
                })
        }
        _ => None,
    }
}
