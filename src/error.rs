//! Error types for pipeline lowering.
//!
//! Every failure names the construct it came from (input id, output id,
//! operator, step) so a caller can point at the offending part of the IR.
//! All variants are fatal for the step being lowered. The one recoverable
//! condition, the secondary-file wildcard fallback, is reported as a
//! [`crate::outputs::PlanWarning`] instead.

use thiserror::Error;

/// Main error type for all lowering failures.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// An input id had no entry in the naming table
    #[error("Unresolved reference '{input_id}': no variable name is bound for this input")]
    UnresolvedReference { input_id: String },

    /// A wildcard selector appeared outside an output-collection context
    #[error("A wildcard selector ('{glob}') cannot be used as an argument value")]
    IllegalSelectorContext { glob: String },

    /// An operator has no rendering rule for the target
    #[error("Operator {operator} is not supported for {target}: {reason}")]
    UnsupportedOperator {
        operator: String,
        target: String,
        reason: String,
    },

    /// A data edge joins two shapes no coercion can reconcile
    #[error("Incompatible types for input '{input_id}' of step '{step}': cannot pass {source_type} to {dest_type}")]
    IncompatibleTypes {
        step: String,
        input_id: String,
        source_type: String,
        dest_type: String,
    },

    /// An output strategy that the target cannot express
    #[error("Output '{output_id}' cannot be collected in {target}: {message}")]
    UnsupportedOutputShape {
        output_id: String,
        target: String,
        message: String,
    },

    /// An output that matches no collection strategy
    #[error("Malformed output definition '{output_id}': {message}")]
    MalformedOutputDefinition { output_id: String, message: String },

    /// Structurally invalid IR (bad glob, arity, template or scatter)
    #[error("Invalid definition: {message}")]
    InvalidDefinition { message: String },

    /// The operator registry is missing (operator, target) rules
    #[error("Operator registry is incomplete, missing: {}", .missing.join(", "))]
    IncompleteOperatorRegistry { missing: Vec<String> },

    /// Failure reading or parsing configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Failure reading an input document
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        cause: std::io::Error,
    },

    /// A failure raised while lowering one step of a workflow
    #[error("Step '{step}': {cause}")]
    InStep {
        step: String,
        #[source]
        cause: Box<TranslateError>,
    },

    /// Multiple errors collected while lowering a workflow
    #[error("Multiple lowering errors ({count} errors)")]
    MultipleErrors {
        errors: Vec<TranslateError>,
        count: usize,
    },
}

impl TranslateError {
    /// Create an unresolved reference error.
    pub fn unresolved_reference(input_id: impl Into<String>) -> Self {
        TranslateError::UnresolvedReference {
            input_id: input_id.into(),
        }
    }

    /// Create an illegal selector context error.
    pub fn illegal_selector(glob: impl Into<String>) -> Self {
        TranslateError::IllegalSelectorContext { glob: glob.into() }
    }

    /// Create an unsupported operator error.
    pub fn unsupported_operator(
        operator: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TranslateError::UnsupportedOperator {
            operator: operator.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported output shape error.
    pub fn unsupported_output(
        output_id: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        TranslateError::UnsupportedOutputShape {
            output_id: output_id.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a malformed output definition error.
    pub fn malformed_output(output_id: impl Into<String>, message: impl Into<String>) -> Self {
        TranslateError::MalformedOutputDefinition {
            output_id: output_id.into(),
            message: message.into(),
        }
    }

    /// Create an invalid definition error.
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        TranslateError::InvalidDefinition {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        TranslateError::Config {
            message: message.into(),
        }
    }

    /// Combine multiple errors into one.
    pub fn multiple_errors(errors: Vec<TranslateError>) -> Self {
        let count = errors.len();
        TranslateError::MultipleErrors { errors, count }
    }

    /// Attribute this error to `step`, unless it already names one.
    pub fn in_step(self, step: impl Into<String>) -> Self {
        match self {
            TranslateError::InStep { .. } | TranslateError::MultipleErrors { .. } => self,
            cause => TranslateError::InStep {
                step: step.into(),
                cause: Box::new(cause),
            },
        }
    }

    /// Step the error was raised in, if known.
    pub fn step(&self) -> Option<&str> {
        match self {
            TranslateError::InStep { step, .. } => Some(step),
            TranslateError::IncompatibleTypes { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Id of the input or output this error is about, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            TranslateError::InStep { cause, .. } => cause.subject(),
            TranslateError::UnresolvedReference { input_id } => Some(input_id),
            TranslateError::IncompatibleTypes { input_id, .. } => Some(input_id),
            TranslateError::UnsupportedOutputShape { output_id, .. } => Some(output_id),
            TranslateError::MalformedOutputDefinition { output_id, .. } => Some(output_id),
            _ => None,
        }
    }
}

/// Collects errors across independent lowering units.
///
/// Lets a workflow keep lowering its remaining steps after one fails, then
/// report everything at once.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<TranslateError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a closure, capturing any error it returns.
    /// Returns the result if successful, None if an error was captured.
    pub fn try_with<T, F>(&mut self, f: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, TranslateError>,
    {
        match f() {
            Ok(result) => Some(result),
            Err(error) => {
                self.append(error);
                None
            }
        }
    }

    /// Append an error, flattening nested collections.
    pub fn append(&mut self, error: TranslateError) {
        match error {
            TranslateError::MultipleErrors { errors, .. } => self.errors.extend(errors),
            _ => self.errors.push(error),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Return collected errors, if any.
    pub fn maybe_raise(mut self) -> Result<(), TranslateError> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(TranslateError::multiple_errors(self.errors)),
        }
    }
}
