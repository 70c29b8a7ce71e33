//! Expression lowering
//!
//! [`lower`] renders an [`Expression`] tree into target text. The
//! [`LoweringContext`] says where the text will land: inside a quoted string,
//! in a code position where bare identifiers are legal, and whether output
//! selectors (globs) are allowed.

use crate::config::TranslateConfig;
use crate::env::NamingTable;
use crate::error::TranslateError;
use crate::expr::template::{parse_format, TemplatePart};
use crate::expr::{format_float, Expression, LiteralValue, OperatorKind, SOURCE_PLACEHOLDER};
use crate::expr::literals::validate_glob;
use crate::target::Target;
use crate::tree::ToolInputSpec;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

pub mod registry;

pub use registry::{OperatorRegistry, Rule, BUILTIN};

static NO_INPUTS: Lazy<IndexMap<String, ToolInputSpec>> = Lazy::new(IndexMap::new);
static DEFAULT_CONFIG: Lazy<TranslateConfig> = Lazy::new(TranslateConfig::default);

/// Everything lowering needs to know about the surrounding syntax.
#[derive(Debug, Clone, Copy)]
pub struct LoweringContext<'a> {
    pub target: Target,
    /// Already inside a quoted string; literals render bare
    pub string_environment: bool,
    /// Bare identifiers are legal; otherwise they need interpolation
    pub code_environment: bool,
    /// Collecting outputs; globs are legal and arrays hold paths
    pub output_context: bool,
    /// Operand of an enclosing code expression
    pub nested: bool,
    /// Input whose default is being lowered
    pub destination: Option<&'a str>,
    pub naming_table: &'a NamingTable,
    /// Declared inputs in scope, for types and defaults
    pub inputs: &'a IndexMap<String, ToolInputSpec>,
    pub config: &'a TranslateConfig,
}

impl<'a> LoweringContext<'a> {
    /// A code-position context with no input declarations.
    pub fn new(target: Target, naming_table: &'a NamingTable) -> Self {
        Self {
            target,
            string_environment: false,
            code_environment: true,
            output_context: false,
            nested: false,
            destination: None,
            naming_table,
            inputs: &NO_INPUTS,
            config: &DEFAULT_CONFIG,
        }
    }

    pub fn with_inputs(mut self, inputs: &'a IndexMap<String, ToolInputSpec>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_config(mut self, config: &'a TranslateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_string_environment(mut self, value: bool) -> Self {
        self.string_environment = value;
        self
    }

    pub fn with_code_environment(mut self, value: bool) -> Self {
        self.code_environment = value;
        self
    }

    /// Child context for operands: code position, not inside a string.
    pub fn in_code(self) -> Self {
        self.with_code_environment(true).with_string_environment(false)
    }

    /// Child context for text spliced into an existing string.
    pub fn in_string(self) -> Self {
        self.with_code_environment(false).with_string_environment(true)
    }

    pub fn for_output(mut self) -> Self {
        self.output_context = true;
        self
    }

    /// Lower the default of `input_id`. An optional filename input then
    /// prefers its own value over the generated one.
    pub fn for_destination(mut self, input_id: &'a str) -> Self {
        self.destination = Some(input_id);
        self
    }

    /// Child context for an operand inside code.
    fn operand(mut self) -> Self {
        self.nested = true;
        self.destination = None;
        self.in_code()
    }

    fn wrap_code(&self, code: String) -> String {
        if self.code_environment {
            code
        } else {
            self.target.interpolate(&code)
        }
    }

    fn quote(&self, text: &str) -> String {
        if self.string_environment {
            self.target.escape(text, '"')
        } else {
            self.target.quote(text)
        }
    }

    /// Render a string built from literal text and code.
    ///
    /// CWL code is JavaScript, where a string literal does not expand
    /// `$(..)`, so nested CWL strings are built by concatenation.
    fn render_segments(&self, segments: &[Segment]) -> String {
        if segments.iter().all(|s| matches!(s, Segment::Text(_))) {
            let text: String = segments.iter().map(Segment::as_str).collect();
            return self.quote(&text);
        }
        if self.target == Target::Cwl && self.nested && !self.string_environment {
            let mut parts: Vec<String> = segments
                .iter()
                .map(|segment| match segment {
                    Segment::Text(text) => self.target.quote(text),
                    Segment::Code(code) => code.clone(),
                })
                .collect();
            if parts.len() == 1 {
                return parts.remove(0);
            }
            if matches!(segments, [Segment::Code(_), Segment::Code(_), ..]) {
                parts.insert(0, "\"\"".to_string());
            }
            return format!("({})", parts.join(" + "));
        }
        let text: String = segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => self.target.escape(text, '"'),
                Segment::Code(code) => self.target.interpolate(code),
            })
            .collect();
        if self.string_environment {
            text
        } else {
            format!("\"{}\"", text)
        }
    }
}

/// A piece of an interpolated string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Code(String),
}

impl Segment {
    fn as_str(&self) -> &str {
        match self {
            Segment::Text(text) | Segment::Code(text) => text,
        }
    }
}

/// Render `expr` as target text.
pub fn lower(expr: &Expression, ctx: &LoweringContext<'_>) -> Result<String, TranslateError> {
    match expr {
        Expression::Literal { value } => Ok(lower_literal(value, ctx)),
        Expression::ArrayLiteral { elements } => lower_array(elements, ctx),
        Expression::InputReference {
            input_id,
            remove_extension,
        } => lower_reference(input_id, *remove_extension, ctx),
        Expression::FilenameTemplate { pattern, source } => {
            lower_filename(pattern, source.as_deref(), ctx)
        }
        Expression::WildcardPattern { glob } => {
            if !ctx.output_context {
                return Err(TranslateError::illegal_selector(glob.clone()));
            }
            validate_glob(glob)?;
            Ok(ctx.quote(glob))
        }
        Expression::StringTemplate { format, params } => lower_template(format, params, ctx),
        Expression::Operator { kind, operands } => lower_operator(*kind, operands, ctx),
    }
}

fn lower_literal(value: &LiteralValue, ctx: &LoweringContext<'_>) -> String {
    match value {
        LiteralValue::Null => {
            if ctx.code_environment {
                ctx.target.null_token().to_string()
            } else {
                String::new()
            }
        }
        LiteralValue::Boolean(value) => value.to_string(),
        LiteralValue::Int(value) => value.to_string(),
        LiteralValue::Float(value) => format_float(*value),
        LiteralValue::String(value) => ctx.quote(value),
    }
}

fn lower_array(elements: &[Expression], ctx: &LoweringContext<'_>) -> Result<String, TranslateError> {
    let inner = ctx.operand();
    let mut lowered = Vec::with_capacity(elements.len());
    for element in elements {
        let text = lower(element, &inner)?;
        lowered.push(if ctx.output_context {
            ctx.target.path_token(&text)
        } else {
            text
        });
    }
    let joined = lowered.join(", ");
    if ctx.output_context && ctx.target == Target::Nextflow {
        // tuple elements, no list brackets
        Ok(joined)
    } else {
        Ok(format!("[{}]", joined))
    }
}

fn lower_reference(
    input_id: &str,
    remove_extension: bool,
    ctx: &LoweringContext<'_>,
) -> Result<String, TranslateError> {
    let name = ctx
        .naming_table
        .resolve(input_id)
        .ok_or_else(|| TranslateError::unresolved_reference(input_id))?;

    let mut code = name.clone();
    if remove_extension {
        if let Some(spec) = ctx.inputs.get(input_id) {
            if spec.data_type.is_file_like() {
                for (i, extension) in spec.data_type.extensions().iter().enumerate() {
                    code = ctx.target.strip_extension(&code, extension, i == 0);
                }
            }
        }
    }
    Ok(ctx.wrap_code(code))
}

fn lower_filename(
    pattern: &str,
    source: Option<&Expression>,
    ctx: &LoweringContext<'_>,
) -> Result<String, TranslateError> {
    let segments = match source {
        None => vec![Segment::Text(pattern.to_string())],
        Some(source) => filename_segments(pattern, source, ctx)?,
    };

    let Some(variable) = destination_variable(ctx)? else {
        return Ok(ctx.render_segments(&segments));
    };
    let generated = ctx.operand().render_segments(&segments);
    let rendered = BUILTIN.render(
        OperatorKind::FirstNonNull,
        ctx.target,
        &[variable.to_string(), generated],
    )?;
    Ok(ctx.wrap_code(rendered))
}

fn filename_segments(
    pattern: &str,
    source: &Expression,
    ctx: &LoweringContext<'_>,
) -> Result<Vec<Segment>, TranslateError> {
    let mut base = lower(source, &ctx.operand())?;
    if let Some(input_id) = source.as_input_reference() {
        let optional = ctx
            .inputs
            .get(input_id)
            .map(|spec| spec.data_type.is_optional())
            .unwrap_or(false);
        if optional {
            let variable = ctx
                .naming_table
                .resolve(input_id)
                .ok_or_else(|| TranslateError::unresolved_reference(input_id))?;
            let fallback = ctx.target.quote(&ctx.config.filenames.optional_fallback);
            base = ctx.target.if_defined(variable, &base, &fallback);
        }
    }

    let mut segments = Vec::new();
    match pattern.split_once(SOURCE_PLACEHOLDER) {
        Some((before, after)) => {
            // later placeholders repeat the same basename
            let mut rest = after;
            if !before.is_empty() {
                segments.push(Segment::Text(before.to_string()));
            }
            segments.push(Segment::Code(base.clone()));
            while let Some((text, tail)) = rest.split_once(SOURCE_PLACEHOLDER) {
                if !text.is_empty() {
                    segments.push(Segment::Text(text.to_string()));
                }
                segments.push(Segment::Code(base.clone()));
                rest = tail;
            }
            if !rest.is_empty() {
                segments.push(Segment::Text(rest.to_string()));
            }
        }
        None => {
            segments.push(Segment::Code(base));
            if !pattern.is_empty() {
                segments.push(Segment::Text(pattern.to_string()));
            }
        }
    }
    Ok(segments)
}

/// Variable of an optional filename input whose default is being lowered.
fn destination_variable<'a>(ctx: &LoweringContext<'a>) -> Result<Option<&'a String>, TranslateError> {
    let Some(input_id) = ctx.destination else {
        return Ok(None);
    };
    let wrapped = ctx
        .inputs
        .get(input_id)
        .map(|spec| spec.is_filename() && spec.data_type.is_optional())
        .unwrap_or(false);
    if !wrapped {
        return Ok(None);
    }
    ctx.naming_table
        .resolve(input_id)
        .map(Some)
        .ok_or_else(|| TranslateError::unresolved_reference(input_id))
}

fn lower_template(
    format: &str,
    params: &IndexMap<String, Expression>,
    ctx: &LoweringContext<'_>,
) -> Result<String, TranslateError> {
    let inner = ctx.operand();
    let mut segments: Vec<Segment> = Vec::new();

    for part in parse_format(format, params)? {
        match part {
            TemplatePart::Text(fragment) => push_text(&mut segments, &fragment),
            TemplatePart::Param(name) => {
                let value = params
                    .get(&name)
                    .ok_or_else(|| TranslateError::unresolved_reference(name.clone()))?;
                match value {
                    Expression::Literal {
                        value: LiteralValue::String(s),
                    } => push_text(&mut segments, s),
                    Expression::Literal {
                        value: LiteralValue::Null,
                    } => {}
                    Expression::Literal { value } => push_text(&mut segments, &value.to_string()),
                    other => segments.push(Segment::Code(lower(other, &inner)?)),
                }
            }
        }
    }

    Ok(ctx.render_segments(&segments))
}

/// Append literal text, merging with a preceding text segment.
fn push_text(segments: &mut Vec<Segment>, text: &str) {
    match segments.last_mut() {
        Some(Segment::Text(existing)) => existing.push_str(text),
        _ => segments.push(Segment::Text(text.to_string())),
    }
}

fn lower_operator(
    kind: OperatorKind,
    operands: &[Expression],
    ctx: &LoweringContext<'_>,
) -> Result<String, TranslateError> {
    let inner = ctx.operand();
    let args = operands
        .iter()
        .map(|operand| lower(operand, &inner))
        .collect::<Result<Vec<_>, _>>()?;
    let rendered = BUILTIN.render(kind, ctx.target, &args)?;
    Ok(ctx.wrap_code(rendered))
}
