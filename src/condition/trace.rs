use super::{LogicalOperator, Operator};
use crate::error::ConfigurationError;
use serde_json::Value;

/// A record of how a condition was evaluated, including the values it saw.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTrace {
    Leaf {
        field: String,
        operator: Operator,
        expected: Value,
        actual: Value,
        outcome: bool,
        /// Set when the leaf could not be evaluated as written.
        fault: Option<ConfigurationError>,
    },
    Composite {
        operator: LogicalOperator,
        children: Vec<ConditionTrace>,
        outcome: bool,
    },
    /// A sibling skipped by short-circuiting.
    NotEvaluated,
}

impl ConditionTrace {
    pub fn outcome(&self) -> bool {
        match self {
            ConditionTrace::Leaf { outcome, .. } | ConditionTrace::Composite { outcome, .. } => {
                *outcome
            }
            ConditionTrace::NotEvaluated => false,
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            ConditionTrace::Composite { operator, .. } => match operator {
                LogicalOperator::Or => 1,
                LogicalOperator::And => 2,
            },
            ConditionTrace::Leaf { .. } | ConditionTrace::NotEvaluated => 9,
        }
    }

    /// Every configuration fault hit while producing this trace, in evaluation order.
    pub fn faults(&self) -> Vec<&ConfigurationError> {
        let mut faults = Vec::new();
        self.collect_faults(&mut faults);
        faults
    }

    fn collect_faults<'a>(&'a self, faults: &mut Vec<&'a ConfigurationError>) {
        match self {
            ConditionTrace::Leaf {
                fault: Some(fault), ..
            } => faults.push(fault),
            ConditionTrace::Composite { children, .. } => {
                for child in children {
                    child.collect_faults(faults);
                }
            }
            _ => {}
        }
    }
}
