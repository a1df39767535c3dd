use crate::condition::{Condition, ConditionTrace, DataSnapshot};

mod engine;

pub(crate) use engine::check_leaf;
use engine::ConditionEngine;

/// Evaluates a condition tree against a data snapshot.
///
/// Never fails: a misconfigured leaf (unknown operator, malformed pattern,
/// non-list `in_list` operand) evaluates to `false` and is logged. Use
/// [`evaluate_traced`] to get hold of the fault itself.
///
/// Composite semantics follow the usual conventions for empty lists: an empty
/// AND is `true`, an empty OR is `false`.
pub fn evaluate(condition: &Condition, data: &DataSnapshot) -> bool {
    evaluate_traced(condition, data).outcome()
}

/// Evaluates a condition and returns the full trace, including the values each
/// leaf compared and any configuration faults encountered.
pub fn evaluate_traced(condition: &Condition, data: &DataSnapshot) -> ConditionTrace {
    ConditionEngine::new(data).evaluate(condition)
}
