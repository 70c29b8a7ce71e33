//! Pipeline IR: tools, steps, data edges and scatter annotations
//!
//! These nodes are produced upstream (or loaded from JSON) and handed to the
//! lowering engine fully resolved. Nothing here is mutated during lowering.

use crate::env::NamingTable;
use crate::error::TranslateError;
use crate::expr::Expression;
use crate::target::Target;
use crate::types::DataType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A declared tool input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInputSpec {
    pub id: String,
    pub data_type: DataType,
    #[serde(default)]
    pub default: Option<Expression>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub is_flag: bool,
}

impl ToolInputSpec {
    pub fn new(id: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            data_type,
            default: None,
            prefix: None,
            position: None,
            is_flag: false,
        }
    }

    pub fn with_default(mut self, default: Expression) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_position(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }

    /// An input whose value is a generated filename.
    pub fn is_filename(&self) -> bool {
        matches!(self.default, Some(Expression::FilenameTemplate { .. }))
    }
}

/// A declared tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutputSpec {
    pub id: String,
    pub data_type: DataType,
    /// How to find or construct the produced artifact
    #[serde(default)]
    pub collectors: Vec<Expression>,
    /// Secondary extension to rewrite pattern, e.g. `.bai` -> `^.bai`
    #[serde(default)]
    pub secondary_pattern_overrides: IndexMap<String, String>,
}

impl ToolOutputSpec {
    pub fn new(id: impl Into<String>, data_type: DataType, collectors: Vec<Expression>) -> Self {
        Self {
            id: id.into(),
            data_type,
            collectors,
            secondary_pattern_overrides: IndexMap::new(),
        }
    }

    /// A stdout or stderr capture; streams need no collector.
    pub fn stream(id: impl Into<String>, data_type: DataType) -> Self {
        Self::new(id, data_type, Vec::new())
    }

    pub fn with_secondary_override(
        mut self,
        extension: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        self.secondary_pattern_overrides
            .insert(extension.into(), pattern.into());
        self
    }

    /// Rewrite pattern for a secondary extension.
    pub fn secondary_pattern<'a>(&'a self, extension: &'a str) -> &'a str {
        self.secondary_pattern_overrides
            .get(extension)
            .map(|s| s.as_str())
            .unwrap_or(extension)
    }
}

/// A tool: ordered inputs and outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub id: String,
    #[serde(default)]
    pub inputs: Vec<ToolInputSpec>,
    #[serde(default)]
    pub outputs: Vec<ToolOutputSpec>,
}

impl ToolDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: ToolInputSpec) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(mut self, output: ToolOutputSpec) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn input(&self, id: &str) -> Option<&ToolInputSpec> {
        self.inputs.iter().find(|i| i.id == id)
    }

    /// Inputs keyed by id, in declaration order.
    pub fn input_table(&self) -> IndexMap<String, ToolInputSpec> {
        self.inputs
            .iter()
            .map(|i| (i.id.clone(), i.clone()))
            .collect()
    }
}

/// Where a step input's value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgeSource {
    WorkflowInput { id: String },
    StepOutput { step: String, output: String },
    /// A value bound directly on the step
    Value(Expression),
}

impl EdgeSource {
    /// Expression to lower against the workflow-scope naming table.
    pub fn to_expression(&self) -> Expression {
        match self {
            EdgeSource::WorkflowInput { id } => Expression::input(id.clone()),
            EdgeSource::StepOutput { step, output } => {
                Expression::input(NamingTable::step_output_key(step, output))
            }
            EdgeSource::Value(expr) => expr.clone(),
        }
    }
}

/// A directed edge into one step input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEdge {
    pub source: EdgeSource,
    pub destination: String,
    /// Resolved type of a referenced source
    #[serde(default)]
    pub source_type: Option<DataType>,
    pub dest_type: DataType,
}

impl DataEdge {
    pub fn new(
        source: EdgeSource,
        destination: impl Into<String>,
        source_type: Option<DataType>,
        dest_type: DataType,
    ) -> Self {
        Self {
            source,
            destination: destination.into(),
            source_type,
            dest_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScatterMethod {
    #[default]
    Dot,
    Cross,
}

/// Inputs a step is scattered over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScatterSpec {
    pub fields: Vec<String>,
    #[serde(default)]
    pub method: ScatterMethod,
}

impl ScatterSpec {
    pub fn dot(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            method: ScatterMethod::Dot,
        }
    }

    pub fn contains(&self, input_id: &str) -> bool {
        self.fields.iter().any(|f| f == input_id)
    }

    /// Only non-empty dot scatters can be expanded.
    pub fn validate(&self) -> Result<(), TranslateError> {
        if self.fields.is_empty() {
            return Err(TranslateError::invalid_definition(
                "scatter must name at least one field",
            ));
        }
        if self.method == ScatterMethod::Cross {
            return Err(TranslateError::invalid_definition(format!(
                "cross-product scatter over [{}] is not supported",
                self.fields.join(", ")
            )));
        }
        Ok(())
    }
}

/// One invocation of a tool inside a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: String,
    pub tool: ToolDefinition,
    #[serde(default)]
    pub edges: Vec<DataEdge>,
    #[serde(default)]
    pub scatter: Option<ScatterSpec>,
    /// Inputs whose value is fixed for this invocation
    #[serde(default)]
    pub static_values: IndexMap<String, Expression>,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>, tool: ToolDefinition) -> Self {
        Self {
            id: id.into(),
            tool,
            edges: Vec::new(),
            scatter: None,
            static_values: IndexMap::new(),
        }
    }

    pub fn with_edge(mut self, edge: DataEdge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn with_scatter(mut self, scatter: ScatterSpec) -> Self {
        self.scatter = Some(scatter);
        self
    }

    pub fn with_static_value(mut self, input_id: impl Into<String>, value: Expression) -> Self {
        self.static_values.insert(input_id.into(), value);
        self
    }

    pub fn edge_for(&self, input_id: &str) -> Option<&DataEdge> {
        self.edges.iter().find(|e| e.destination == input_id)
    }

    pub fn is_scattered_on(&self, input_id: &str) -> bool {
        self.scatter
            .as_ref()
            .map(|s| s.contains(input_id))
            .unwrap_or(false)
    }
}

/// A workflow to translate: its steps and, per target, the variable name of
/// every workflow input and step output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    #[serde(default)]
    pub targets: Vec<Target>,
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub naming_tables: IndexMap<Target, IndexMap<String, String>>,
}

impl TranslationUnit {
    /// Naming table for `target`; empty when none was supplied.
    pub fn naming_table(&self, target: Target) -> NamingTable {
        self.naming_tables
            .get(&target)
            .map(|names| names.iter().map(|(id, name)| (id.clone(), name.clone())).collect())
            .unwrap_or_default()
    }
}
