//! Pipeline expression model
//!
//! Expressions are attached to step inputs, tool defaults and output
//! collectors. The variant set is closed: every consumer matches on it
//! exhaustively, so adding a variant forces every lowering and
//! classification rule to handle it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod literals;
pub mod operators;
pub mod template;

#[cfg(test)]
mod tests;

pub use operators::OperatorKind;
pub use template::TemplatePart;

/// Placeholder in a filename pattern replaced by the source's basename.
pub const SOURCE_PLACEHOLDER: &str = "{source}";

/// Constant values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => f.write_str("None"),
            LiteralValue::Boolean(value) => write!(f, "{}", value),
            LiteralValue::Int(value) => write!(f, "{}", value),
            LiteralValue::Float(value) => f.write_str(&format_float(*value)),
            LiteralValue::String(value) => write!(f, "\"{}\"", value),
        }
    }
}

/// Render a float so it always reads back as a float (`3` becomes `3.0`).
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// An expression tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// A constant
    Literal { value: LiteralValue },

    /// An array of expressions
    ArrayLiteral { elements: Vec<Expression> },

    /// A declared input, resolved through the naming table
    InputReference {
        input_id: String,
        /// Strip the input's declared filename extensions
        #[serde(default)]
        remove_extension: bool,
    },

    /// A generated filename, optionally derived from another input's basename
    FilenameTemplate {
        pattern: String,
        #[serde(default)]
        source: Option<Box<Expression>>,
    },

    /// A filesystem glob, only meaningful when collecting outputs
    WildcardPattern { glob: String },

    /// `{name}` interpolation over named parameters
    StringTemplate {
        format: String,
        #[serde(default)]
        params: IndexMap<String, Expression>,
    },

    /// An operator applied to operands
    Operator {
        kind: OperatorKind,
        #[serde(default)]
        operands: Vec<Expression>,
    },
}

impl Expression {
    /// The input id when this is a plain reference.
    pub fn as_input_reference(&self) -> Option<&str> {
        match self {
            Expression::InputReference { input_id, .. } => Some(input_id),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Expression::Literal {
                value: LiteralValue::Null
            }
        )
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal { value } => write!(f, "{}", value),
            Expression::ArrayLiteral { elements } => {
                write!(f, "[")?;
                for (i, item) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Expression::InputReference {
                input_id,
                remove_extension,
            } => {
                write!(f, "inputs.{}", input_id)?;
                if *remove_extension {
                    write!(f, "!noext")?;
                }
                Ok(())
            }
            Expression::FilenameTemplate { pattern, source } => match source {
                Some(source) => write!(f, "filename(\"{}\", {})", pattern, source),
                None => write!(f, "filename(\"{}\")", pattern),
            },
            Expression::WildcardPattern { glob } => write!(f, "glob(\"{}\")", glob),
            Expression::StringTemplate { format, params } => {
                write!(f, "format(\"{}\"", format)?;
                for (name, value) in params {
                    write!(f, ", {}={}", name, value)?;
                }
                write!(f, ")")
            }
            Expression::Operator { kind, operands } => {
                write!(f, "{}(", kind.name())?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", operand)?;
                }
                write!(f, ")")
            }
        }
    }
}
