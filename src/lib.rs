//! # pipelower
//!
//! Lowers a backend-agnostic pipeline description into WDL, CWL and Nextflow.
//!
//! The crate renders expression trees attached to step inputs, expands
//! multi-field dot scatters, coerces mismatched types at step boundaries and
//! plans how every tool output is collected. Block templating and writing
//! files are left to the caller.

pub mod call;
pub mod config;
pub mod env;
pub mod error;
pub mod expr;
pub mod lower;
pub mod mismatch;
pub mod outputs;
pub mod scatter;
pub mod target;
pub mod tree;
pub mod types;

pub use call::{nextflow_qualifier, CallArgument, LoweredStep, Translator};
pub use config::TranslateConfig;
pub use env::{Binding, Bindings, NamingTable};
pub use error::{ErrorCollector, TranslateError};
pub use expr::{Expression, LiteralValue, OperatorKind};
pub use lower::{lower, LoweringContext};
pub use mismatch::MismatchKind;
pub use outputs::{FmtType, OutputPlanner, OutputStrategy, PlanWarning, RenderedOutput};
pub use scatter::{Projection, ScatterField, ScatterHeader, ScatterPlan};
pub use target::Target;
pub use tree::{
    DataEdge, EdgeSource, ScatterMethod, ScatterSpec, StepDefinition, ToolDefinition,
    ToolInputSpec, ToolOutputSpec, TranslationUnit,
};
pub use types::{DataType, ScalarKind};
