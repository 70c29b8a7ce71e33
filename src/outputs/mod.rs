//! Output collection planning
//!
//! Every declared tool output gets exactly one [`OutputStrategy`] from its
//! type and collector count, and every collector gets a [`FmtType`] that
//! decides how its text is produced. The planner then renders the target's
//! output declarations.

use crate::error::TranslateError;
use crate::expr::{Expression, LiteralValue};
use crate::lower::{lower, LoweringContext};
use crate::target::Target;
use crate::tree::{ToolInputSpec, ToolOutputSpec};
use crate::types::{secondary_suffix, DataType, ScalarKind};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;

pub mod secondaries;

pub use secondaries::{apply_pattern, SecondaryCollector};

/// How an output is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStrategy {
    Stream,
    SecondaryGroupArray,
    SecondaryGroup,
    FilePairArray,
    FilePair,
    PathArray,
    Path,
    Value,
}

impl OutputStrategy {
    /// Pick the strategy for `output`. The first matching rule wins.
    pub fn classify(output: &ToolOutputSpec) -> Result<Self, TranslateError> {
        let data_type = &output.data_type;
        let collectors = output.collectors.len();

        if data_type.is_stream() {
            Ok(OutputStrategy::Stream)
        } else if data_type.is_secondary_array() {
            Ok(OutputStrategy::SecondaryGroupArray)
        } else if data_type.has_secondaries() {
            Ok(OutputStrategy::SecondaryGroup)
        } else if data_type
            .element_type()
            .map(|item| item.is_file_pair())
            .unwrap_or(false)
        {
            Ok(OutputStrategy::FilePairArray)
        } else if data_type.is_file_pair() {
            Ok(OutputStrategy::FilePair)
        } else if data_type.is_file_like() && collectors == 1 {
            if data_type.is_array() {
                Ok(OutputStrategy::PathArray)
            } else {
                Ok(OutputStrategy::Path)
            }
        } else if !data_type.is_file_like() && collectors == 1 {
            Ok(OutputStrategy::Value)
        } else {
            Err(TranslateError::malformed_output(
                &output.id,
                format!(
                    "a {} output needs exactly one collector, found {}",
                    data_type, collectors
                ),
            ))
        }
    }
}

impl fmt::Display for OutputStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputStrategy::Stream => "stream",
            OutputStrategy::SecondaryGroupArray => "secondary group array",
            OutputStrategy::SecondaryGroup => "secondary group",
            OutputStrategy::FilePairArray => "file pair array",
            OutputStrategy::FilePair => "file pair",
            OutputStrategy::PathArray => "path array",
            OutputStrategy::Path => "path",
            OutputStrategy::Value => "value",
        };
        f.write_str(name)
    }
}

/// How a single collector is formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmtType {
    /// A glob or a literal filename
    Wildcard,
    /// An input whose value is a wholly generated filename
    FilenameGen,
    /// An input whose filename is derived from another input
    FilenameRef,
    /// An input with a value fixed for this step
    Static,
    /// Any other input
    Reference,
    Complex,
}

impl FmtType {
    pub fn of(
        collector: &Expression,
        inputs: &IndexMap<String, ToolInputSpec>,
        static_values: &IndexMap<String, Expression>,
    ) -> Self {
        match collector {
            Expression::WildcardPattern { .. }
            | Expression::Literal {
                value: LiteralValue::String(_),
            } => FmtType::Wildcard,
            Expression::InputReference { input_id, .. } => {
                match inputs.get(input_id).and_then(|spec| spec.default.as_ref()) {
                    Some(Expression::FilenameTemplate { source: None, .. }) => FmtType::FilenameGen,
                    Some(Expression::FilenameTemplate {
                        source: Some(_), ..
                    })
                    | Some(Expression::InputReference { .. }) => FmtType::FilenameRef,
                    _ if static_values.contains_key(input_id) => FmtType::Static,
                    _ => FmtType::Reference,
                }
            }
            _ => FmtType::Complex,
        }
    }
}

/// A recoverable problem found while planning an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanWarning {
    pub output_id: String,
    pub message: String,
}

impl PlanWarning {
    pub fn new(output_id: &str, message: impl Into<String>) -> Self {
        Self {
            output_id: output_id.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output '{}': {}", self.output_id, self.message)
    }
}

/// Target declarations for one output.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedOutput {
    pub id: String,
    pub strategy: OutputStrategy,
    pub declarations: Vec<String>,
    pub warnings: Vec<PlanWarning>,
}

/// A lowered collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Collected {
    pub(crate) fmt: FmtType,
    /// Text as it appears inside a string
    pub(crate) inner: String,
    /// Text as an expression: the bare variable for references, otherwise
    /// the quoted inner text
    pub(crate) text: String,
}

/// Plans and renders the outputs of one tool.
pub struct OutputPlanner<'a> {
    ctx: LoweringContext<'a>,
    static_values: &'a IndexMap<String, Expression>,
}

impl<'a> OutputPlanner<'a> {
    /// `ctx` must resolve the tool's own inputs.
    pub fn new(ctx: LoweringContext<'a>, static_values: &'a IndexMap<String, Expression>) -> Self {
        Self { ctx, static_values }
    }

    fn target(&self) -> Target {
        self.ctx.target
    }

    pub fn plan(&self, output: &ToolOutputSpec) -> Result<RenderedOutput, TranslateError> {
        let strategy = OutputStrategy::classify(output)?;
        log::debug!("output {} collected as {}", output.id, strategy);

        let mut warnings = Vec::new();
        let declarations = match strategy {
            OutputStrategy::Stream => self.declare_stream(output),
            OutputStrategy::Value => {
                let collected = self.collect(&output.collectors[0])?;
                self.declare_value(output, &collected)
            }
            OutputStrategy::Path | OutputStrategy::PathArray => {
                let collected = self.collect(&output.collectors[0])?;
                let wdl_type = output.data_type.to_string();
                self.declare_path(output, &collected, &wdl_type)
            }
            OutputStrategy::FilePair => self.plan_file_pair(output)?,
            OutputStrategy::FilePairArray => self.plan_file_pair_array(output, &mut warnings)?,
            OutputStrategy::SecondaryGroup => {
                let primary = self.collect(single_collector(output)?)?;
                let found =
                    secondaries::collect_secondaries(output, &primary, self.target(), &mut warnings);
                self.declare_group(output, &primary, &found)
            }
            OutputStrategy::SecondaryGroupArray => {
                if self.target() == Target::Nextflow {
                    return Err(TranslateError::unsupported_output(
                        &output.id,
                        self.target().name(),
                        "arrays of files with secondaries cannot be emitted from a process",
                    ));
                }
                let primary = self.collect(single_collector(output)?)?;
                if self.target() == Target::Wdl && primary.fmt != FmtType::Wildcard {
                    return Err(TranslateError::unsupported_output(
                        &output.id,
                        self.target().name(),
                        "arrays of files with secondaries must be collected by wildcard",
                    ));
                }
                let found =
                    secondaries::collect_secondaries(output, &primary, self.target(), &mut warnings);
                self.declare_group(output, &primary, &found)
            }
        };

        Ok(RenderedOutput {
            id: output.id.clone(),
            strategy,
            declarations,
            warnings,
        })
    }

    /// Lower one collector according to its format type.
    pub(crate) fn collect(&self, collector: &Expression) -> Result<Collected, TranslateError> {
        let fmt = FmtType::of(collector, self.ctx.inputs, self.static_values);
        log::debug!("collector {} formatted as {:?}", collector, fmt);

        let in_string = self.ctx.for_output().in_string();
        let inner = match fmt {
            FmtType::FilenameRef => {
                let input = self.referenced_input(collector)?;
                let default = input
                    .default
                    .as_ref()
                    .ok_or_else(|| TranslateError::invalid_definition("filename input has no default"))?;
                lower(default, &in_string.for_destination(&input.id))?
            }
            FmtType::Static => {
                let input_id = collector.as_input_reference().unwrap_or_default();
                let value = self
                    .static_values
                    .get(input_id)
                    .ok_or_else(|| TranslateError::unresolved_reference(input_id))?;
                lower(value, &in_string)?
            }
            FmtType::Wildcard | FmtType::FilenameGen | FmtType::Reference | FmtType::Complex => {
                lower(collector, &in_string)?
            }
        };
        let text = if fmt == FmtType::Reference {
            lower(collector, &self.ctx.for_output().in_code())?
        } else {
            format!("\"{}\"", inner)
        };
        Ok(Collected { fmt, inner, text })
    }

    fn referenced_input(&self, collector: &Expression) -> Result<&ToolInputSpec, TranslateError> {
        let input_id = collector
            .as_input_reference()
            .ok_or_else(|| TranslateError::invalid_definition("collector is not an input reference"))?;
        self.ctx
            .inputs
            .get(input_id)
            .ok_or_else(|| TranslateError::unresolved_reference(input_id))
    }

    fn plan_file_pair(&self, output: &ToolOutputSpec) -> Result<Vec<String>, TranslateError> {
        match output.collectors.as_slice() {
            [single] => {
                let collected = self.collect(single)?;
                if collected.fmt != FmtType::Wildcard {
                    return Err(TranslateError::malformed_output(
                        &output.id,
                        "a file pair with one collector must collect by wildcard",
                    ));
                }
                Ok(self.declare_path(output, &collected, "Array[File]"))
            }
            [first, second] => {
                let first = self.collect(first)?;
                let second = self.collect(second)?;
                Ok(self.declare_pair(output, &first, &second))
            }
            other => Err(TranslateError::malformed_output(
                &output.id,
                format!("a file pair needs two collectors or one wildcard, found {}", other.len()),
            )),
        }
    }

    fn plan_file_pair_array(
        &self,
        output: &ToolOutputSpec,
        warnings: &mut Vec<PlanWarning>,
    ) -> Result<Vec<String>, TranslateError> {
        let unsupported = || {
            TranslateError::unsupported_output(
                &output.id,
                self.target().name(),
                "arrays of file pairs must be collected by a single wildcard",
            )
        };
        let [single] = output.collectors.as_slice() else {
            return Err(unsupported());
        };
        let collected = self.collect(single)?;
        if collected.fmt != FmtType::Wildcard {
            return Err(unsupported());
        }
        let warning = PlanWarning::new(&output.id, "file pairs are collected as a flat list of files");
        log::warn!("{}", warning);
        warnings.push(warning);
        Ok(self.declare_path(output, &collected, "Array[File]"))
    }

    fn nextflow_emit(&self, output: &ToolOutputSpec) -> String {
        if output.data_type.is_optional() {
            format!(", emit: {}, optional: true", output.id)
        } else {
            format!(", emit: {}", output.id)
        }
    }

    fn declare_stream(&self, output: &ToolOutputSpec) -> Vec<String> {
        let stderr = output.data_type.kind() == ScalarKind::Stderr;
        let declaration = match self.target() {
            Target::Wdl => {
                let call = if stderr { "stderr()" } else { "stdout()" };
                format!("File {} = {}", output.id, call)
            }
            Target::Cwl => {
                let mut map = Map::new();
                map.insert("id".to_string(), Value::from(output.id.clone()));
                map.insert(
                    "type".to_string(),
                    Value::from(if stderr { "stderr" } else { "stdout" }),
                );
                Value::Object(map).to_string()
            }
            Target::Nextflow => {
                if stderr {
                    format!(
                        "path \"{}\"{}",
                        self.ctx.config.nextflow.stderr_path,
                        self.nextflow_emit(output)
                    )
                } else {
                    format!("stdout{}", self.nextflow_emit(output))
                }
            }
        };
        vec![declaration]
    }

    fn declare_value(&self, output: &ToolOutputSpec, collected: &Collected) -> Vec<String> {
        let wildcard = collected.fmt == FmtType::Wildcard;
        let declaration = match self.target() {
            Target::Wdl => {
                let expr = if wildcard {
                    format!("{}(glob({})[0])", wdl_reader(&output.data_type), collected.text)
                } else {
                    collected.text.clone()
                };
                format!("{} {} = {}", output.data_type, output.id, expr)
            }
            Target::Cwl => {
                let mut binding = Map::new();
                if wildcard {
                    binding.insert("glob".to_string(), Value::from(collected.inner.clone()));
                    binding.insert("loadContents".to_string(), Value::Bool(true));
                    binding.insert("outputEval".to_string(), Value::from("$(self[0].contents)"));
                } else {
                    binding.insert("outputEval".to_string(), Value::from(collected.inner.clone()));
                }
                self.cwl_output(output, binding, None)
            }
            Target::Nextflow => format!("val({}){}", collected.text, self.nextflow_emit(output)),
        };
        vec![declaration]
    }

    fn declare_path(&self, output: &ToolOutputSpec, collected: &Collected, wdl_type: &str) -> Vec<String> {
        let declaration = match self.target() {
            Target::Wdl => {
                let optional = if output.data_type.is_optional() && !wdl_type.ends_with('?') {
                    "?"
                } else {
                    ""
                };
                let expr = wdl_collect(collected, wdl_type.starts_with("Array"));
                format!("{}{} {} = {}", wdl_type, optional, output.id, expr)
            }
            Target::Cwl => {
                let mut binding = Map::new();
                binding.insert("glob".to_string(), Value::from(collected.inner.clone()));
                self.cwl_output(output, binding, None)
            }
            Target::Nextflow => format!("path {}{}", collected.text, self.nextflow_emit(output)),
        };
        vec![declaration]
    }

    fn declare_pair(&self, output: &ToolOutputSpec, first: &Collected, second: &Collected) -> Vec<String> {
        let declaration = match self.target() {
            Target::Wdl => format!(
                "{} {} = [{}, {}]",
                output.data_type,
                output.id,
                wdl_collect(first, false),
                wdl_collect(second, false)
            ),
            Target::Cwl => {
                let mut binding = Map::new();
                binding.insert(
                    "glob".to_string(),
                    Value::Array(vec![
                        Value::from(first.inner.clone()),
                        Value::from(second.inner.clone()),
                    ]),
                );
                self.cwl_output(output, binding, None)
            }
            Target::Nextflow => format!(
                "tuple path({}), path({}){}",
                first.text,
                second.text,
                self.nextflow_emit(output)
            ),
        };
        vec![declaration]
    }

    fn declare_group(
        &self,
        output: &ToolOutputSpec,
        primary: &Collected,
        found: &[SecondaryCollector],
    ) -> Vec<String> {
        let array = output.data_type.is_array();
        match self.target() {
            Target::Wdl => {
                let optional = if output.data_type.is_optional() { "?" } else { "" };
                let file_type = if array { "Array[File]" } else { "File" };
                let mut declarations = vec![format!(
                    "{} {} = {}",
                    output.data_type,
                    output.id,
                    wdl_collect(primary, array)
                )];
                for secondary in found {
                    let expr = if secondary.is_glob {
                        wdl_glob(&secondary.text, array)
                    } else {
                        secondary.text.clone()
                    };
                    declarations.push(format!(
                        "{}{} {}_{} = {}",
                        file_type,
                        optional,
                        output.id,
                        secondary_suffix(&secondary.extension),
                        expr
                    ));
                }
                declarations
            }
            Target::Cwl => {
                let patterns = output
                    .data_type
                    .secondaries()
                    .iter()
                    .map(|ext| Value::from(output.secondary_pattern(ext)))
                    .collect();
                let mut binding = Map::new();
                binding.insert("glob".to_string(), Value::from(primary.inner.clone()));
                vec![self.cwl_output(output, binding, Some(patterns))]
            }
            Target::Nextflow => {
                let members: Vec<String> = std::iter::once(primary.text.as_str())
                    .chain(found.iter().map(|s| s.text.as_str()))
                    .map(|text| format!("path({})", text))
                    .collect();
                vec![format!("tuple {}{}", members.join(", "), self.nextflow_emit(output))]
            }
        }
    }

    fn cwl_output(
        &self,
        output: &ToolOutputSpec,
        binding: Map<String, Value>,
        secondary_files: Option<Vec<Value>>,
    ) -> String {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::from(output.id.clone()));
        map.insert(
            "type".to_string(),
            Value::from(output.data_type.render(Target::Cwl)),
        );
        if let Some(patterns) = secondary_files {
            map.insert("secondaryFiles".to_string(), Value::Array(patterns));
        }
        map.insert("outputBinding".to_string(), Value::Object(binding));
        Value::Object(map).to_string()
    }
}

fn single_collector(output: &ToolOutputSpec) -> Result<&Expression, TranslateError> {
    match output.collectors.as_slice() {
        [single] => Ok(single),
        other => Err(TranslateError::malformed_output(
            &output.id,
            format!("a file with secondaries needs one primary collector, found {}", other.len()),
        )),
    }
}

fn wdl_glob(text: &str, array: bool) -> String {
    if array {
        format!("glob({})", text)
    } else {
        format!("glob({})[0]", text)
    }
}

fn wdl_collect(collected: &Collected, array: bool) -> String {
    if collected.fmt == FmtType::Wildcard {
        wdl_glob(&collected.text, array)
    } else {
        collected.text.clone()
    }
}

/// WDL function reading a collected file into a value of `data_type`.
fn wdl_reader(data_type: &DataType) -> &'static str {
    if data_type.is_array() {
        return "read_lines";
    }
    match data_type.kind() {
        ScalarKind::Int => "read_int",
        ScalarKind::Float => "read_float",
        ScalarKind::Boolean => "read_boolean",
        _ => "read_string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslateConfig;
    use crate::env::NamingTable;

    struct Fixture {
        names: NamingTable,
        inputs: IndexMap<String, ToolInputSpec>,
        statics: IndexMap<String, Expression>,
        config: TranslateConfig,
    }

    impl Fixture {
        fn new(inputs: Vec<ToolInputSpec>) -> Self {
            let names = NamingTable::identity(inputs.iter().map(|i| i.id.as_str()));
            Self {
                names,
                inputs: inputs.into_iter().map(|i| (i.id.clone(), i)).collect(),
                statics: IndexMap::new(),
                config: TranslateConfig::default(),
            }
        }

        fn plan(&self, target: Target, output: &ToolOutputSpec) -> Result<RenderedOutput, TranslateError> {
            let ctx = LoweringContext::new(target, &self.names)
                .with_inputs(&self.inputs)
                .with_config(&self.config);
            OutputPlanner::new(ctx, &self.statics).plan(output)
        }
    }

    fn glob(pattern: &str) -> Expression {
        Expression::wildcard(pattern).unwrap()
    }

    fn bam_output() -> ToolOutputSpec {
        ToolOutputSpec::new(
            "out",
            DataType::file_with_secondaries(".bam", &[".bai"], false),
            vec![glob("*.bam")],
        )
    }

    #[test]
    fn test_strategy_priority() {
        let cases = vec![
            (ToolOutputSpec::stream("log", DataType::stdout()), OutputStrategy::Stream),
            (bam_output(), OutputStrategy::SecondaryGroup),
            (
                ToolOutputSpec::new(
                    "bams",
                    DataType::array(DataType::file_with_secondaries(".bam", &[".bai"], false), false),
                    vec![glob("*.bam")],
                ),
                OutputStrategy::SecondaryGroupArray,
            ),
            (
                ToolOutputSpec::new("reads", DataType::file_pair(false), vec![glob("*.fq")]),
                OutputStrategy::FilePair,
            ),
            (
                ToolOutputSpec::new(
                    "pairs",
                    DataType::array(DataType::file_pair(false), false),
                    vec![glob("*.fq")],
                ),
                OutputStrategy::FilePairArray,
            ),
            (
                ToolOutputSpec::new("all", DataType::array(DataType::file(false), false), vec![glob("*")]),
                OutputStrategy::PathArray,
            ),
            (
                ToolOutputSpec::new("one", DataType::file(false), vec![glob("*.txt")]),
                OutputStrategy::Path,
            ),
            (
                ToolOutputSpec::new("n", DataType::int(false), vec![glob("count.txt")]),
                OutputStrategy::Value,
            ),
        ];
        for (output, expected) in cases {
            assert_eq!(OutputStrategy::classify(&output).unwrap(), expected, "{}", output.id);
        }
    }

    #[test]
    fn test_strategy_exclusivity() {
        let types = vec![
            DataType::string(false),
            DataType::file(true),
            DataType::array(DataType::int(false), false),
            DataType::array(DataType::file(false), false),
            DataType::stdout(),
            DataType::file_pair(false),
        ];
        for data_type in types {
            for collectors in 0..3 {
                let output = ToolOutputSpec::new(
                    "o",
                    data_type.clone(),
                    (0..collectors).map(|_| glob("*.txt")).collect(),
                );
                match OutputStrategy::classify(&output) {
                    Ok(_) | Err(TranslateError::MalformedOutputDefinition { .. }) => {}
                    Err(other) => panic!("unexpected error: {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_wrong_collector_count_is_malformed() {
        let output = ToolOutputSpec::new("one", DataType::file(false), vec![]);
        match OutputStrategy::classify(&output) {
            Err(TranslateError::MalformedOutputDefinition { output_id, message }) => {
                assert_eq!(output_id, "one");
                assert!(message.contains("found 0"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_bam_with_index() {
        let fixture = Fixture::new(vec![]);
        let rendered = fixture.plan(Target::Wdl, &bam_output()).unwrap();
        assert_eq!(rendered.strategy, OutputStrategy::SecondaryGroup);
        assert_eq!(
            rendered.declarations,
            vec![
                "File out = glob(\"*.bam\")[0]".to_string(),
                "File out_bai = glob(\"*.bai\")[0]".to_string(),
            ]
        );
        assert!(rendered.warnings.is_empty());

        let rendered = fixture.plan(Target::Nextflow, &bam_output()).unwrap();
        assert_eq!(
            rendered.declarations,
            vec!["tuple path(\"*.bam\"), path(\"*.bai\"), emit: out".to_string()]
        );
    }

    #[test]
    fn test_cwl_secondary_files() {
        let fixture = Fixture::new(vec![]);
        let output = bam_output().with_secondary_override(".bai", "^.bai");
        let rendered = fixture.plan(Target::Cwl, &output).unwrap();
        let value: Value = serde_json::from_str(&rendered.declarations[0]).unwrap();
        assert_eq!(value["id"], "out");
        assert_eq!(value["type"], "File");
        assert_eq!(value["secondaryFiles"][0], "^.bai");
        assert_eq!(value["outputBinding"]["glob"], "*.bam");
    }

    #[test]
    fn test_streams() {
        let fixture = Fixture::new(vec![]);
        let out = ToolOutputSpec::stream("out", DataType::stdout());
        let err = ToolOutputSpec::stream("err", DataType::stderr());

        assert_eq!(fixture.plan(Target::Wdl, &out).unwrap().declarations, vec!["File out = stdout()"]);
        assert_eq!(fixture.plan(Target::Wdl, &err).unwrap().declarations, vec!["File err = stderr()"]);
        assert_eq!(
            fixture.plan(Target::Nextflow, &out).unwrap().declarations,
            vec!["stdout, emit: out"]
        );
        assert_eq!(
            fixture.plan(Target::Nextflow, &err).unwrap().declarations,
            vec!["path \".command.err\", emit: err"]
        );
        assert_eq!(
            fixture.plan(Target::Cwl, &out).unwrap().declarations,
            vec!["{\"id\":\"out\",\"type\":\"stdout\"}"]
        );
    }

    #[test]
    fn test_reference_collector() {
        let fixture = Fixture::new(vec![ToolInputSpec::new("bam", DataType::file(false))]);
        let output = ToolOutputSpec::new("out", DataType::file(false), vec![Expression::input("bam")]);
        assert_eq!(fixture.plan(Target::Wdl, &output).unwrap().declarations, vec!["File out = bam"]);
        assert_eq!(
            fixture.plan(Target::Nextflow, &output).unwrap().declarations,
            vec!["path bam, emit: out"]
        );
    }

    #[test]
    fn test_reference_collector_with_secondaries() {
        let fixture = Fixture::new(vec![ToolInputSpec::new(
            "bam",
            DataType::file_with_secondaries(".bam", &[".bai"], false),
        )]);
        let output = ToolOutputSpec::new(
            "out",
            DataType::file_with_secondaries(".bam", &[".bai"], false),
            vec![Expression::input("bam")],
        );
        let rendered = fixture.plan(Target::Wdl, &output).unwrap();
        assert_eq!(rendered.declarations[1], "File out_bai = \"~{bam}.bai\"");
        let rendered = fixture.plan(Target::Nextflow, &output).unwrap();
        assert_eq!(
            rendered.declarations[0],
            "tuple path(bam), path(\"${bam}.bai\"), emit: out"
        );
    }

    #[test]
    fn test_generated_filename_collector() {
        let fixture = Fixture::new(vec![ToolInputSpec::new("out_name", DataType::string(false))
            .with_default(Expression::filename("generated.txt"))]);
        let output = ToolOutputSpec::new("out", DataType::file(false), vec![Expression::input("out_name")]);
        assert_eq!(
            fixture.plan(Target::Wdl, &output).unwrap().declarations,
            vec!["File out = \"~{out_name}\""]
        );
        assert_eq!(
            fixture.plan(Target::Nextflow, &output).unwrap().declarations,
            vec!["path \"${out_name}\", emit: out"]
        );
    }

    #[test]
    fn test_derived_filename_collector() {
        let fixture = Fixture::new(vec![
            ToolInputSpec::new("bam", DataType::file(false).with_extensions(&[".bam"])),
            ToolInputSpec::new("sorted", DataType::string(false)).with_default(Expression::filename_from(
                "{source}.sorted.bam",
                Expression::input_without_extension("bam"),
            )),
        ]);
        let output = ToolOutputSpec::new(
            "out",
            DataType::file_with_secondaries(".bam", &[".bai"], false),
            vec![Expression::input("sorted")],
        );
        let rendered = fixture.plan(Target::Wdl, &output).unwrap();
        assert_eq!(
            rendered.declarations,
            vec![
                "File out = \"~{basename(bam, \".bam\")}.sorted.bam\"".to_string(),
                "File out_bai = \"~{basename(bam, \".bam\")}.sorted.bai\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_derived_filename_without_literal_extension() {
        let fixture = Fixture::new(vec![
            ToolInputSpec::new("bam", DataType::file(false).with_extensions(&[".bam"])),
            ToolInputSpec::new("sorted", DataType::string(false)).with_default(Expression::filename_from(
                "{source}.sorted",
                Expression::input_without_extension("bam"),
            )),
        ]);
        let output = ToolOutputSpec::new(
            "out",
            DataType::file_with_secondaries(".bam", &[".bai"], false),
            vec![Expression::input("sorted")],
        );
        let rendered = fixture.plan(Target::Wdl, &output).unwrap();
        assert_eq!(
            rendered.declarations,
            vec![
                "File out = \"~{basename(bam, \".bam\")}.sorted\"".to_string(),
                "File out_bai = glob(\"*.bai\")[0]".to_string(),
            ]
        );
        assert_eq!(rendered.warnings.len(), 1);
        assert_eq!(rendered.warnings[0].output_id, "out");
    }

    #[test]
    fn test_optional_filename_collector_prefers_supplied_value() {
        let fixture = Fixture::new(vec![
            ToolInputSpec::new("bam", DataType::file(false).with_extensions(&[".bam"])),
            ToolInputSpec::new("sorted", DataType::string(true)).with_default(Expression::filename_from(
                "{source}.sorted.bam",
                Expression::input_without_extension("bam"),
            )),
        ]);
        let output = ToolOutputSpec::new("out", DataType::file(false), vec![Expression::input("sorted")]);
        assert_eq!(
            fixture.plan(Target::Wdl, &output).unwrap().declarations,
            vec!["File out = \"~{select_first([sorted, \"~{basename(bam, \".bam\")}.sorted.bam\"])}\""]
        );
    }

    #[test]
    fn test_filename_reference_chain() {
        let fixture = Fixture::new(vec![
            ToolInputSpec::new("prefix", DataType::string(false)),
            ToolInputSpec::new("out_name", DataType::string(false)).with_default(Expression::input("prefix")),
        ]);
        let collector = Expression::input("out_name");
        assert_eq!(
            FmtType::of(&collector, &fixture.inputs, &fixture.statics),
            FmtType::FilenameRef
        );

        let output = ToolOutputSpec::new("out", DataType::file(false), vec![collector]);
        assert_eq!(
            fixture.plan(Target::Wdl, &output).unwrap().declarations,
            vec!["File out = \"~{prefix}\""]
        );
        assert_eq!(
            fixture.plan(Target::Nextflow, &output).unwrap().declarations,
            vec!["path \"${prefix}\", emit: out"]
        );
    }

    #[test]
    fn test_static_collector() {
        let mut fixture = Fixture::new(vec![ToolInputSpec::new("name", DataType::string(false))]);
        fixture.statics.insert("name".to_string(), Expression::string("fixed.txt"));
        let output = ToolOutputSpec::new("out", DataType::file(false), vec![Expression::input("name")]);
        assert_eq!(
            fixture.plan(Target::Wdl, &output).unwrap().declarations,
            vec!["File out = \"fixed.txt\""]
        );
    }

    #[test]
    fn test_value_output() {
        let fixture = Fixture::new(vec![]);
        let output = ToolOutputSpec::new("n", DataType::int(false), vec![glob("count.txt")]);
        assert_eq!(
            fixture.plan(Target::Wdl, &output).unwrap().declarations,
            vec!["Int n = read_int(glob(\"count.txt\")[0])"]
        );
        assert_eq!(
            fixture.plan(Target::Nextflow, &output).unwrap().declarations,
            vec!["val(\"count.txt\"), emit: n"]
        );
        let rendered = fixture.plan(Target::Cwl, &output).unwrap();
        let value: Value = serde_json::from_str(&rendered.declarations[0]).unwrap();
        assert_eq!(value["outputBinding"]["loadContents"], true);
    }

    #[test]
    fn test_optional_nextflow_output() {
        let fixture = Fixture::new(vec![]);
        let output = ToolOutputSpec::new("log", DataType::file(true), vec![glob("*.log")]);
        assert_eq!(
            fixture.plan(Target::Nextflow, &output).unwrap().declarations,
            vec!["path \"*.log\", emit: log, optional: true"]
        );
        assert_eq!(
            fixture.plan(Target::Wdl, &output).unwrap().declarations,
            vec!["File? log = glob(\"*.log\")[0]"]
        );
    }

    #[test]
    fn test_file_pair_collectors() {
        let fixture = Fixture::new(vec![]);
        let output = ToolOutputSpec::new(
            "reads",
            DataType::file_pair(false),
            vec![glob("*_1.fq"), glob("*_2.fq")],
        );
        assert_eq!(
            fixture.plan(Target::Nextflow, &output).unwrap().declarations,
            vec!["tuple path(\"*_1.fq\"), path(\"*_2.fq\"), emit: reads"]
        );
        assert_eq!(
            fixture.plan(Target::Wdl, &output).unwrap().declarations,
            vec!["Array[File] reads = [glob(\"*_1.fq\")[0], glob(\"*_2.fq\")[0]]"]
        );

        let single = ToolOutputSpec::new("reads", DataType::file_pair(false), vec![glob("*.fq")]);
        assert_eq!(
            fixture.plan(Target::Wdl, &single).unwrap().declarations,
            vec!["Array[File] reads = glob(\"*.fq\")"]
        );

        let three = ToolOutputSpec::new(
            "reads",
            DataType::file_pair(false),
            vec![glob("a"), glob("b"), glob("c")],
        );
        assert!(matches!(
            fixture.plan(Target::Wdl, &three),
            Err(TranslateError::MalformedOutputDefinition { .. })
        ));
    }

    #[test]
    fn test_file_pair_array() {
        let fixture = Fixture::new(vec![ToolInputSpec::new("prefix", DataType::string(false))]);
        let pairs = DataType::array(DataType::file_pair(false), false);
        let output = ToolOutputSpec::new("pairs", pairs.clone(), vec![glob("*.fq")]);
        let rendered = fixture.plan(Target::Nextflow, &output).unwrap();
        assert_eq!(rendered.declarations, vec!["path \"*.fq\", emit: pairs"]);
        assert_eq!(rendered.warnings.len(), 1);

        let by_reference = ToolOutputSpec::new("pairs", pairs, vec![Expression::input("prefix")]);
        assert!(matches!(
            fixture.plan(Target::Nextflow, &by_reference),
            Err(TranslateError::UnsupportedOutputShape { .. })
        ));
    }

    #[test]
    fn test_secondary_array() {
        let fixture = Fixture::new(vec![ToolInputSpec::new("bams", DataType::string(false))]);
        let data_type = DataType::array(DataType::file_with_secondaries(".bam", &[".bai"], false), false);
        let output = ToolOutputSpec::new("bams_out", data_type.clone(), vec![glob("*.bam")]);

        let rendered = fixture.plan(Target::Wdl, &output).unwrap();
        assert_eq!(
            rendered.declarations,
            vec![
                "Array[File] bams_out = glob(\"*.bam\")".to_string(),
                "Array[File] bams_out_bai = glob(\"*.bai\")".to_string(),
            ]
        );
        match fixture.plan(Target::Nextflow, &output) {
            Err(TranslateError::UnsupportedOutputShape { target, .. }) => assert_eq!(target, "Nextflow"),
            other => panic!("unexpected result: {:?}", other),
        }

        let by_reference = ToolOutputSpec::new("bams_out", data_type, vec![Expression::input("bams")]);
        assert!(matches!(
            fixture.plan(Target::Wdl, &by_reference),
            Err(TranslateError::UnsupportedOutputShape { .. })
        ));
    }

    #[test]
    fn test_fallback_warning_is_reported() {
        let fixture = Fixture::new(vec![ToolInputSpec::new("prefix", DataType::string(false))]);
        let output = ToolOutputSpec::new(
            "out",
            DataType::file_with_secondaries(".bam", &[".bai"], false),
            vec![Expression::string_template(
                "{p}.out",
                [("p".to_string(), Expression::input("prefix"))].into_iter().collect(),
            )
            .unwrap()],
        );
        let rendered = fixture.plan(Target::Wdl, &output).unwrap();
        assert_eq!(rendered.declarations[0], "File out = \"~{prefix}.out\"");
        assert_eq!(rendered.declarations[1], "File out_bai = glob(\"*.bai\")[0]");
        assert_eq!(rendered.warnings.len(), 1);
    }
}
