use crate::condition::{ConditionTrace, Operator, display_literal, to_display_string};
use serde_json::Value;

/// Formats condition traces into human-readable explanations.
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format a condition trace into a human-readable explanation.
    pub fn format_trace(trace: &ConditionTrace) -> String {
        Self::format_recursive(trace, 0)
    }

    /// Recursively formats the trace, adding parentheses only when necessary.
    fn format_recursive(trace: &ConditionTrace, parent_precedence: u8) -> String {
        let current_precedence = trace.precedence();
        let needs_parens = current_precedence < parent_precedence;

        let mut result = String::new();
        if needs_parens {
            result.push('(');
        }

        match trace {
            ConditionTrace::Composite {
                operator, children, ..
            } => {
                let parts: Vec<String> = children
                    .iter()
                    .filter(|child| !matches!(child, ConditionTrace::NotEvaluated))
                    .map(|child| Self::format_recursive(child, current_precedence))
                    .collect();
                if parts.is_empty() {
                    result.push_str(&format!("<empty {}>", operator.symbol()));
                } else {
                    result.push_str(&parts.join(&format!(" {} ", operator.symbol())));
                }
            }
            ConditionTrace::Leaf {
                field,
                operator,
                expected,
                actual,
                fault,
                ..
            } => {
                let subject = format!("${} (was {})", field, Self::format_value(actual));
                match operator {
                    Operator::IsEmpty | Operator::IsNotEmpty => {
                        result.push_str(&format!("{} {}", subject, operator))
                    }
                    _ => result.push_str(&format!(
                        "{} {} {}",
                        subject,
                        operator,
                        display_literal(expected)
                    )),
                }
                if fault.is_some() {
                    result.push_str(" [invalid]");
                }
            }
            // Skipped siblings are filtered out by the composite arm.
            ConditionTrace::NotEvaluated => {}
        }

        if needs_parens {
            result.push(')');
        }
        result
    }

    /// Format a value for display.
    fn format_value(value: &Value) -> String {
        match value {
            Value::Null => "empty".to_string(),
            Value::String(_) => display_literal(value),
            other => to_display_string(other),
        }
    }
}
