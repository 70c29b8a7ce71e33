//! Step lowering: call arguments, scatter and outputs for one step.
//!
//! [`Translator`] is the entry point. It checks the operator registry once at
//! construction and then lowers steps independently, so a workflow can report
//! every failing step together.

use crate::config::TranslateConfig;
use crate::env::NamingTable;
use crate::error::{ErrorCollector, TranslateError};
use crate::lower::{lower, LoweringContext, BUILTIN};
use crate::mismatch::{self, MismatchKind};
use crate::outputs::{OutputPlanner, RenderedOutput};
use crate::scatter::{self, ScatterField, ScatterPlan};
use crate::target::Target;
use crate::tree::{DataEdge, StepDefinition, ToolDefinition, ToolInputSpec};
use crate::types::{secondary_suffix, strip_caret};

/// One `name = value` argument of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgument {
    pub input_id: String,
    pub text: String,
}

impl CallArgument {
    pub fn new(input_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            input_id: input_id.into(),
            text: text.into(),
        }
    }
}

/// Everything the templating layer needs to emit one step.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredStep {
    pub alias: String,
    pub scatter: Option<ScatterPlan>,
    pub arguments: Vec<CallArgument>,
    pub outputs: Vec<RenderedOutput>,
}

impl LoweredStep {
    pub fn argument(&self, input_id: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.input_id == input_id)
            .map(|a| a.text.as_str())
    }

    /// Argument lines in the target's call syntax.
    pub fn render_call(&self, target: Target) -> Vec<String> {
        self.arguments
            .iter()
            .map(|argument| match target {
                Target::Wdl => format!("{}={}", argument.input_id, argument.text),
                Target::Cwl => format!("{}: {}", argument.input_id, argument.text),
                Target::Nextflow => argument.text.clone(),
            })
            .collect()
    }
}

/// Process input declaration for a Nextflow tool input.
pub fn nextflow_qualifier(input: &ToolInputSpec) -> String {
    let data_type = &input.data_type;
    if data_type.has_secondaries() {
        let members: Vec<String> = std::iter::once(input.id.clone())
            .chain(
                data_type
                    .secondaries()
                    .iter()
                    .map(|ext| format!("{}_{}", input.id, secondary_suffix(ext))),
            )
            .map(|name| format!("path({})", name))
            .collect();
        format!("tuple {}", members.join(", "))
    } else if data_type.is_file_like() {
        format!("path {}", input.id)
    } else {
        format!("val {}", input.id)
    }
}

/// Naming table for references inside a tool's own definition.
fn tool_naming_table(tool: &ToolDefinition, target: Target) -> NamingTable {
    tool.inputs
        .iter()
        .map(|input| {
            let name = match target {
                Target::Cwl => format!("inputs.{}", input.id),
                Target::Wdl | Target::Nextflow => input.id.clone(),
            };
            (input.id.clone(), name)
        })
        .collect()
}

/// Lowers steps for any target.
#[derive(Debug, Clone)]
pub struct Translator {
    config: TranslateConfig,
}

impl Translator {
    /// Fails if any operator lacks a rule for some target.
    pub fn new(config: TranslateConfig) -> Result<Self, TranslateError> {
        BUILTIN.check_complete()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TranslateConfig {
        &self.config
    }

    /// Lower one step against the workflow-scope naming table.
    pub fn lower_step(
        &self,
        step: &StepDefinition,
        target: Target,
        names: &NamingTable,
    ) -> Result<LoweredStep, TranslateError> {
        let lowerer = StepLowerer {
            step,
            target,
            names,
            config: &self.config,
        };
        let lowered = lowerer.lower()?;
        log::info!(
            "lowered step {} for {}: {} argument(s), {} output(s){}",
            step.id,
            target,
            lowered.arguments.len(),
            lowered.outputs.len(),
            if lowered.scatter.is_some() { ", scattered" } else { "" }
        );
        Ok(lowered)
    }

    /// Lower every step, reporting all failures together.
    pub fn lower_workflow(
        &self,
        steps: &[StepDefinition],
        target: Target,
        names: &NamingTable,
    ) -> Result<Vec<LoweredStep>, TranslateError> {
        let mut errors = ErrorCollector::new();
        let mut lowered = Vec::with_capacity(steps.len());
        for step in steps {
            let result = errors.try_with(|| {
                self.lower_step(step, target, names)
                    .map_err(|error| error.in_step(&step.id))
            });
            if let Some(result) = result {
                lowered.push(result);
            }
        }
        if errors.has_errors() {
            log::debug!(
                "{} of {} step(s) failed for {}",
                errors.error_count(),
                steps.len(),
                target
            );
        }
        errors.maybe_raise()?;
        Ok(lowered)
    }
}

/// The edge's source already travels with a file for `extension`.
fn carries_secondary(edge: &DataEdge, extension: &str) -> bool {
    edge.source_type.as_ref().is_some_and(|source_type| {
        source_type
            .secondaries()
            .iter()
            .any(|s| strip_caret(s) == strip_caret(extension))
    })
}

struct StepLowerer<'a> {
    step: &'a StepDefinition,
    target: Target,
    names: &'a NamingTable,
    config: &'a TranslateConfig,
}

impl<'a> StepLowerer<'a> {
    fn workflow_context(&self) -> LoweringContext<'_> {
        LoweringContext::new(self.target, self.names).with_config(self.config)
    }

    fn lower(&self) -> Result<LoweredStep, TranslateError> {
        self.check_destinations()?;
        let scatter = self.plan_scatter()?;
        let arguments = self.lower_arguments(scatter.as_ref())?;

        let tool_names = tool_naming_table(&self.step.tool, self.target);
        let inputs = self.step.tool.input_table();
        let ctx = LoweringContext::new(self.target, &tool_names)
            .with_inputs(&inputs)
            .with_config(self.config);
        let planner = OutputPlanner::new(ctx, &self.step.static_values);
        let outputs = self
            .step
            .tool
            .outputs
            .iter()
            .map(|output| planner.plan(output))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LoweredStep {
            alias: self.step.id.clone(),
            scatter,
            arguments,
            outputs,
        })
    }

    /// Every edge must land on an input the tool declares.
    fn check_destinations(&self) -> Result<(), TranslateError> {
        let tool = &self.step.tool;
        match self.step.edges.iter().find(|e| tool.input(&e.destination).is_none()) {
            Some(edge) => Err(TranslateError::invalid_definition(format!(
                "step '{}' binds '{}', which tool '{}' does not declare",
                self.step.id, edge.destination, tool.id
            ))),
            None => Ok(()),
        }
    }

    fn edge(&self, input_id: &str) -> Result<&'a DataEdge, TranslateError> {
        self.step.edge_for(input_id).ok_or_else(|| {
            TranslateError::invalid_definition(format!(
                "step '{}' scatters over '{}', which has no incoming edge",
                self.step.id, input_id
            ))
        })
    }

    fn lower_source(&self, edge: &DataEdge) -> Result<String, TranslateError> {
        let expression = edge.source.to_expression();
        if expression.is_null() {
            return Ok(self.target.null_token().to_string());
        }
        lower(&expression, &self.workflow_context())
    }

    fn plan_scatter(&self) -> Result<Option<ScatterPlan>, TranslateError> {
        let Some(spec) = &self.step.scatter else {
            return Ok(None);
        };
        spec.validate()?;

        let mut fields = Vec::with_capacity(spec.fields.len());
        for input_id in &spec.fields {
            let edge = self.edge(input_id)?;
            let source = self.lower_source(edge)?;
            let mut field = ScatterField::new(input_id.clone(), source.clone());
            if !self.target.has_native_dot_scatter() && edge.dest_type.has_secondaries() {
                for extension in edge.dest_type.secondaries() {
                    let suffix = secondary_suffix(extension);
                    field = field.with_secondary(
                        format!("{}_{}", source, suffix),
                        format!("{}_{}", input_id, suffix),
                    );
                }
            }
            fields.push(field);
        }
        scatter::expand(&fields, self.target, self.config).map(Some)
    }

    fn lower_arguments(
        &self,
        scatter: Option<&ScatterPlan>,
    ) -> Result<Vec<CallArgument>, TranslateError> {
        let mut arguments = Vec::new();
        for input in &self.step.tool.inputs {
            let Some(edge) = self.step.edge_for(&input.id) else {
                continue;
            };
            let scattered = self.step.is_scattered_on(&input.id);
            let source = self.lower_source(edge)?;

            let kind = match &edge.source_type {
                Some(source_type) => mismatch::check(
                    &self.step.id,
                    &input.id,
                    source_type,
                    &edge.dest_type,
                    scattered,
                )?,
                None => MismatchKind::None,
            };
            log::debug!("{}.{}: {}", self.step.id, input.id, kind);

            let plan = scatter.filter(|_| scattered);
            let text = match plan {
                Some(plan) => self.scatter_argument(plan, &input.id, edge, &source),
                None => match &edge.source_type {
                    Some(source_type) => {
                        mismatch::inject(kind, &source, source_type, &edge.dest_type, self.target)?
                    }
                    None => source.clone(),
                },
            };
            arguments.push(CallArgument::new(input.id.clone(), text.clone()));

            let dest_type = &edge.dest_type;
            if self.target.splits_secondaries()
                && (dest_type.has_secondaries() || dest_type.is_secondary_array())
            {
                for extension in dest_type.secondaries() {
                    let suffix = secondary_suffix(extension);
                    let name = format!("{}_{}", input.id, suffix);
                    let value = match plan.and_then(|p| p.binding(&name)) {
                        Some(binding) => binding.to_string(),
                        None if carries_secondary(edge, extension) => {
                            format!("{}_{}", source, suffix)
                        }
                        None => mismatch::derive_secondary(
                            &text,
                            extension,
                            dest_type.is_array(),
                            self.target,
                        )?,
                    };
                    arguments.push(CallArgument::new(name, value));
                }
            }
        }
        Ok(arguments)
    }

    /// Text bound to a scattered destination inside the scatter body.
    fn scatter_argument(
        &self,
        plan: &ScatterPlan,
        input_id: &str,
        edge: &DataEdge,
        source: &str,
    ) -> String {
        if self.target == Target::Nextflow && edge.dest_type.has_secondaries() {
            let members: Vec<String> = std::iter::once(input_id.to_string())
                .chain(
                    edge.dest_type
                        .secondaries()
                        .iter()
                        .map(|ext| format!("{}_{}", input_id, secondary_suffix(ext))),
                )
                .filter_map(|name| plan.binding(&name).map(|b| b.to_string()))
                .collect();
            return format!("[{}]", members.join(", "));
        }
        plan.binding(input_id)
            .map(|b| b.to_string())
            .unwrap_or_else(|| source.to_string())
    }
}
