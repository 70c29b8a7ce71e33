//! Dot-product scatter expansion
//!
//! A scatter over one field binds a loop variable to each element of that
//! field's source array. Over several fields the sources are zipped into a
//! right-nested pair `pair(f1, pair(f2, ... fn))` and every field is recovered
//! by walking that pair:
//!
//! ```text
//! field 1        .left
//! field k        .right repeated k-1 times, then .left
//! field n        .right repeated n-1 times
//! ```
//!
//! A field with secondary files is first transposed from m+1 parallel arrays
//! into rows, and each group member is then indexed `[0..m]` off the field's
//! projection.

use crate::config::TranslateConfig;
use crate::error::TranslateError;
use crate::target::Target;
use indexmap::IndexMap;
use std::fmt;

/// One step of a walk into a nested pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStep {
    Left,
    Right,
}

/// Path from the loop variable to one field's element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection {
    steps: Vec<PairStep>,
}

impl Projection {
    /// Projection of field `k` (1-based) among `n` zipped fields.
    pub fn for_field(k: usize, n: usize) -> Self {
        let mut steps = Vec::new();
        if n > 1 {
            steps.extend(std::iter::repeat(PairStep::Right).take(k - 1));
            if k < n {
                steps.push(PairStep::Left);
            }
        }
        Self { steps }
    }

    pub fn steps(&self) -> &[PairStep] {
        &self.steps
    }

    /// Accessor chain in the target's syntax.
    pub fn render(&self, target: Target) -> String {
        self.steps
            .iter()
            .map(|step| target.pair_accessor(*step == PairStep::Left))
            .collect()
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                PairStep::Left => f.write_str(".left")?,
                PairStep::Right => f.write_str(".right")?,
            }
        }
        Ok(())
    }
}

/// A scattered input and where its elements come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScatterField {
    pub input_id: String,
    /// Lowered source array
    pub source: String,
    /// Lowered arrays of each secondary file, in extension order
    pub secondaries: Vec<String>,
    /// Destination names bound from this field: the input itself, then one
    /// per secondary
    pub sub_bindings: Vec<String>,
}

impl ScatterField {
    pub fn new(input_id: impl Into<String>, source: impl Into<String>) -> Self {
        let input_id = input_id.into();
        Self {
            sub_bindings: vec![input_id.clone()],
            input_id,
            source: source.into(),
            secondaries: Vec::new(),
        }
    }

    /// Attach a secondary-file array and the destination it binds to.
    pub fn with_secondary(mut self, source: impl Into<String>, binding: impl Into<String>) -> Self {
        self.secondaries.push(source.into());
        self.sub_bindings.push(binding.into());
        self
    }

    pub fn is_grouped(&self) -> bool {
        !self.secondaries.is_empty()
    }

    /// Sources of every group member, primary first.
    fn group_sources(&self) -> Vec<String> {
        std::iter::once(self.source.clone())
            .chain(self.secondaries.iter().cloned())
            .collect()
    }
}

/// How the surrounding block introduces the scatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScatterHeader {
    /// An explicit loop over a (possibly zipped) collection
    Loop { variable: String, collection: String },
    /// The target scatters over the named inputs itself
    Native { fields: Vec<String>, method: String },
}

impl ScatterHeader {
    pub fn render(&self, target: Target) -> String {
        match self {
            ScatterHeader::Loop {
                variable,
                collection,
            } => match target {
                Target::Wdl => format!("scatter ({} in {})", variable, collection),
                Target::Cwl | Target::Nextflow => format!("for ({} in {})", variable, collection),
            },
            ScatterHeader::Native { fields, method } => {
                format!("scatter: [{}]\nscatterMethod: {}", fields.join(", "), method)
            }
        }
    }
}

/// Result of expanding a scatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScatterPlan {
    pub header: ScatterHeader,
    /// Projection of each field, by input id
    pub projections: IndexMap<String, Projection>,
    /// Destination name to the text it is bound to inside the scatter
    pub bindings: IndexMap<String, String>,
}

impl ScatterPlan {
    pub fn binding(&self, destination: &str) -> Option<&str> {
        self.bindings.get(destination).map(|s| s.as_str())
    }

    /// Bindings of every member of a grouped field, primary first.
    pub fn group_bindings(&self, field: &ScatterField) -> Vec<&str> {
        field
            .sub_bindings
            .iter()
            .filter_map(|name| self.binding(name))
            .collect()
    }
}

/// Expand a dot scatter over `fields` for `target`.
pub fn expand(
    fields: &[ScatterField],
    target: Target,
    config: &TranslateConfig,
) -> Result<ScatterPlan, TranslateError> {
    if fields.is_empty() {
        return Err(TranslateError::invalid_definition(
            "scatter must name at least one field",
        ));
    }
    let n = fields.len();
    let projections: IndexMap<String, Projection> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| (field.input_id.clone(), Projection::for_field(i + 1, n)))
        .collect();

    if target.has_native_dot_scatter() {
        let mut bindings = IndexMap::new();
        for field in fields {
            for (name, source) in field.sub_bindings.iter().zip(field.group_sources()) {
                bindings.insert(name.clone(), source);
            }
        }
        let header = ScatterHeader::Native {
            fields: fields.iter().map(|f| f.input_id.clone()).collect(),
            method: config.cwl.scatter_method.clone(),
        };
        return Ok(ScatterPlan {
            header,
            projections,
            bindings,
        });
    }

    let variable = if n == 1 {
        config.scatter.single_variable.clone()
    } else {
        config.scatter.multi_variable.clone()
    };

    let sources: Vec<String> = fields
        .iter()
        .map(|field| {
            if field.is_grouped() {
                target.transpose(&field.group_sources())
            } else {
                field.source.clone()
            }
        })
        .collect();
    let collection = zip_right(&sources, target);

    let mut bindings = IndexMap::new();
    for field in fields {
        let path = format!("{}{}", variable, projections[&field.input_id].render(target));
        if field.is_grouped() {
            for (j, name) in field.sub_bindings.iter().enumerate() {
                bindings.insert(name.clone(), format!("{}[{}]", path, j));
            }
        } else {
            bindings.insert(field.input_id.clone(), path);
        }
    }

    log::debug!(
        "scatter over [{}] as {} in {}",
        fields
            .iter()
            .map(|f| f.input_id.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        variable,
        collection
    );

    Ok(ScatterPlan {
        header: ScatterHeader::Loop {
            variable,
            collection,
        },
        projections,
        bindings,
    })
}

/// `zip(s1, zip(s2, ... sn))`, or the lone source.
fn zip_right(sources: &[String], target: Target) -> String {
    match sources {
        [] => String::new(),
        [only] => only.clone(),
        [first, rest @ ..] => target.zip(first, &zip_right(rest, target)),
    }
}
