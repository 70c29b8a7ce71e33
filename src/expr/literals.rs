//! Expression constructors

use super::template::parse_format;
use super::{Expression, LiteralValue, OperatorKind};
use crate::error::TranslateError;
use indexmap::IndexMap;

impl Expression {
    /// Create a string literal
    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal {
            value: LiteralValue::String(value.into()),
        }
    }

    /// Create an Int literal
    pub fn int(value: i64) -> Self {
        Expression::Literal {
            value: LiteralValue::Int(value),
        }
    }

    /// Create a Float literal
    pub fn float(value: f64) -> Self {
        Expression::Literal {
            value: LiteralValue::Float(value),
        }
    }

    /// Create a Boolean literal
    pub fn boolean(value: bool) -> Self {
        Expression::Literal {
            value: LiteralValue::Boolean(value),
        }
    }

    /// Create the absent value
    pub fn null() -> Self {
        Expression::Literal {
            value: LiteralValue::Null,
        }
    }

    /// Create an array literal
    pub fn array(elements: Vec<Expression>) -> Self {
        Expression::ArrayLiteral { elements }
    }

    /// Reference an input by id
    pub fn input(input_id: impl Into<String>) -> Self {
        Expression::InputReference {
            input_id: input_id.into(),
            remove_extension: false,
        }
    }

    /// Reference an input's basename with its declared extensions removed
    pub fn input_without_extension(input_id: impl Into<String>) -> Self {
        Expression::InputReference {
            input_id: input_id.into(),
            remove_extension: true,
        }
    }

    /// A wholly generated filename
    pub fn filename(pattern: impl Into<String>) -> Self {
        Expression::FilenameTemplate {
            pattern: pattern.into(),
            source: None,
        }
    }

    /// A filename built around another expression, placed at `{source}`
    pub fn filename_from(pattern: impl Into<String>, source: Expression) -> Self {
        Expression::FilenameTemplate {
            pattern: pattern.into(),
            source: Some(Box::new(source)),
        }
    }

    /// A glob selector; the pattern syntax is checked here
    pub fn wildcard(glob: impl Into<String>) -> Result<Self, TranslateError> {
        let glob = glob.into();
        validate_glob(&glob)?;
        Ok(Expression::WildcardPattern { glob })
    }

    /// An interpolated string; every `{name}` must have a parameter
    pub fn string_template(
        format: impl Into<String>,
        params: IndexMap<String, Expression>,
    ) -> Result<Self, TranslateError> {
        let format = format.into();
        parse_format(&format, &params)?;
        Ok(Expression::StringTemplate { format, params })
    }

    /// Apply an operator
    pub fn operator(kind: OperatorKind, operands: Vec<Expression>) -> Self {
        Expression::Operator { kind, operands }
    }

    /// `condition ? then : otherwise`
    pub fn if_then_else(condition: Expression, then: Expression, otherwise: Expression) -> Self {
        Self::operator(OperatorKind::If, vec![condition, then, otherwise])
    }

    /// Whether an optional value is present
    pub fn is_defined(value: Expression) -> Self {
        Self::operator(OperatorKind::IsDefined, vec![value])
    }

    /// `left + right`
    pub fn add(left: Expression, right: Expression) -> Self {
        Self::operator(OperatorKind::Add, vec![left, right])
    }

    /// Join an array with a separator
    pub fn join(array: Expression, separator: impl Into<String>) -> Self {
        Self::operator(OperatorKind::Join, vec![array, Self::string(separator)])
    }
}

/// Reject globs the `glob` crate cannot compile.
pub fn validate_glob(glob: &str) -> Result<(), TranslateError> {
    glob::Pattern::new(glob).map_err(|e| {
        TranslateError::invalid_definition(format!("invalid glob '{}': {}", glob, e.msg))
    })?;
    Ok(())
}
