//! Parsing of `{name}` string templates into positional fragments

use super::Expression;
use crate::error::TranslateError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex"));

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Text(String),
    Param(String),
}

/// Split `format` into text and parameter slots, in order.
///
/// Fails when a placeholder names a parameter that was not supplied.
pub fn parse_format(
    format: &str,
    params: &IndexMap<String, Expression>,
) -> Result<Vec<TemplatePart>, TranslateError> {
    let mut parts = Vec::new();
    let mut last = 0;

    for captures in PLACEHOLDER.captures_iter(format) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if !params.contains_key(name.as_str()) {
            return Err(TranslateError::invalid_definition(format!(
                "string template \"{}\" has no parameter named '{}'",
                format,
                name.as_str()
            )));
        }
        if whole.start() > last {
            parts.push(TemplatePart::Text(format[last..whole.start()].to_string()));
        }
        parts.push(TemplatePart::Param(name.as_str().to_string()));
        last = whole.end();
    }

    if last < format.len() {
        parts.push(TemplatePart::Text(format[last..].to_string()));
    }
    Ok(parts)
}
