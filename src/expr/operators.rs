//! The closed operator set

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operators an expression tree may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperatorKind {
    And,
    Or,
    Not,
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    Greater,
    /// condition, value if true, value if false
    If,
    IsDefined,
    /// array, separator
    Join,
    BaseName,
    /// first operand that is not null
    FirstNonNull,
    Length,
    /// array, index
    Index,
    Flatten,
    Transpose,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 20] = [
        OperatorKind::And,
        OperatorKind::Or,
        OperatorKind::Not,
        OperatorKind::Add,
        OperatorKind::Subtract,
        OperatorKind::Multiply,
        OperatorKind::Divide,
        OperatorKind::Equal,
        OperatorKind::NotEqual,
        OperatorKind::Less,
        OperatorKind::Greater,
        OperatorKind::If,
        OperatorKind::IsDefined,
        OperatorKind::Join,
        OperatorKind::BaseName,
        OperatorKind::FirstNonNull,
        OperatorKind::Length,
        OperatorKind::Index,
        OperatorKind::Flatten,
        OperatorKind::Transpose,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::And => "And",
            OperatorKind::Or => "Or",
            OperatorKind::Not => "Not",
            OperatorKind::Add => "Add",
            OperatorKind::Subtract => "Subtract",
            OperatorKind::Multiply => "Multiply",
            OperatorKind::Divide => "Divide",
            OperatorKind::Equal => "Equal",
            OperatorKind::NotEqual => "NotEqual",
            OperatorKind::Less => "Less",
            OperatorKind::Greater => "Greater",
            OperatorKind::If => "If",
            OperatorKind::IsDefined => "IsDefined",
            OperatorKind::Join => "Join",
            OperatorKind::BaseName => "BaseName",
            OperatorKind::FirstNonNull => "FirstNonNull",
            OperatorKind::Length => "Length",
            OperatorKind::Index => "Index",
            OperatorKind::Flatten => "Flatten",
            OperatorKind::Transpose => "Transpose",
        }
    }

    /// Minimum and (if bounded) maximum operand count.
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            OperatorKind::Not
            | OperatorKind::IsDefined
            | OperatorKind::BaseName
            | OperatorKind::Length
            | OperatorKind::Flatten
            | OperatorKind::Transpose => (1, Some(1)),
            OperatorKind::If => (3, Some(3)),
            OperatorKind::FirstNonNull => (1, None),
            _ => (2, Some(2)),
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        let (min, max) = self.arity();
        count >= min && max.map(|max| count <= max).unwrap_or(true)
    }

    /// Human-readable arity for error messages.
    pub fn describe_arity(&self) -> String {
        match self.arity() {
            (min, Some(max)) if min == max => format!("{}", min),
            (min, Some(max)) => format!("{} to {}", min, max),
            (min, None) => format!("at least {}", min),
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
