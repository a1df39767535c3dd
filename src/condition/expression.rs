use super::value::to_display_string;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// A boolean expression over form data.
///
/// Deserialised untagged: an object with a `conditions` array is a composite,
/// anything with `field`/`operator` is a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Composite(CompositeCondition),
    Leaf(LeafCondition),
}

/// A single comparison between one field's value and a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafCondition {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

/// A logical AND/OR over an ordered list of sub-conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeCondition {
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub logical_operator: LogicalOperator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// Comparison operators available to leaf conditions.
///
/// Unrecognised operator names survive deserialisation as [`Operator::Unknown`]
/// so they can be reported as configuration problems instead of failing the load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    IsEmpty,
    IsNotEmpty,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    StartsWith,
    EndsWith,
    InList,
    NotInList,
    MatchesPattern,
    Unknown(String),
}

/// Master macro tying operator variants to their wire names.
macro_rules! define_operators {
    ( $( ($variant:ident, $name:literal) ),* $(,)? ) => {
        impl Operator {
            /// The snake_case name used in serialized forms.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Operator::$variant => $name, )*
                    Operator::Unknown(name) => name.as_str(),
                }
            }
        }

        impl From<String> for Operator {
            fn from(name: String) -> Self {
                match name.as_str() {
                    $( $name => Operator::$variant, )*
                    _ => Operator::Unknown(name),
                }
            }
        }
    };
}

define_operators! {
    (Equals, "equals"),
    (NotEquals, "not_equals"),
    (Contains, "contains"),
    (NotContains, "not_contains"),
    (IsEmpty, "is_empty"),
    (IsNotEmpty, "is_not_empty"),
    (GreaterThan, "greater_than"),
    (LessThan, "less_than"),
    (GreaterThanOrEqual, "greater_than_or_equal"),
    (LessThanOrEqual, "less_than_or_equal"),
    (StartsWith, "starts_with"),
    (EndsWith, "ends_with"),
    (InList, "in_list"),
    (NotInList, "not_in_list"),
    (MatchesPattern, "matches_pattern"),
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        Operator::from(name.to_string())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Condition {
    /// Builds a leaf condition.
    pub fn leaf(field: &str, operator: impl Into<Operator>, value: Value) -> Self {
        Condition::Leaf(LeafCondition {
            field: field.to_string(),
            operator: operator.into(),
            value,
        })
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::Composite(CompositeCondition {
            conditions,
            logical_operator: LogicalOperator::And,
        })
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Composite(CompositeCondition {
            conditions,
            logical_operator: LogicalOperator::Or,
        })
    }

    /// Collects every field referenced by a leaf anywhere in the tree.
    pub fn collect_dependencies(&self, fields: &mut BTreeSet<String>) {
        match self {
            Condition::Leaf(leaf) => {
                fields.insert(leaf.field.clone());
            }
            Condition::Composite(composite) => {
                for child in &composite.conditions {
                    child.collect_dependencies(fields);
                }
            }
        }
    }

    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_dependencies(&mut fields);
        fields
    }

    /// Visits every leaf in declaration order.
    pub fn for_each_leaf<'a>(&'a self, visit: &mut impl FnMut(&'a LeafCondition)) {
        match self {
            Condition::Leaf(leaf) => visit(leaf),
            Condition::Composite(composite) => {
                for child in &composite.conditions {
                    child.for_each_leaf(visit);
                }
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Leaf(leaf) => match leaf.operator {
                Operator::IsEmpty | Operator::IsNotEmpty => {
                    write!(f, "${} {}", leaf.field, leaf.operator)
                }
                _ => write!(
                    f,
                    "${} {} {}",
                    leaf.field,
                    leaf.operator,
                    display_literal(&leaf.value)
                ),
            },
            Condition::Composite(composite) => {
                if composite.conditions.is_empty() {
                    return write!(f, "({} of nothing)", composite.logical_operator.symbol());
                }
                write!(f, "(")?;
                for (i, child) in composite.conditions.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", composite.logical_operator.symbol())?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Literals print bare, except strings which are quoted so `"true"` and `true` stay distinct.
pub(crate) fn display_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(items) => format!("[{}]", items.iter().map(display_literal).join(", ")),
        Value::Null => "null".to_string(),
        other => to_display_string(other),
    }
}
