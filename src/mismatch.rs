//! Type-mismatch classification and coercion at step boundaries
//!
//! Each data edge is classified once, from its resolved source type, the
//! destination input type and whether the destination is scattered. The
//! first matching rule wins:
//!
//! 1. Shapes and secondary sets agree: no coercion
//! 2. The destination is scattered and the source array's element agrees
//!    with it: the scatter binding supplies one element per iteration
//! 3. A scalar feeds an array of the same leaf: wrap it in a one-element list
//! 4. File-like types at the same array depth whose secondary sets differ
//!    in content or order: regroup the files, deriving any secondary the
//!    source lacks from the primary's name
//! 5. Anything else is incompatible

use crate::error::TranslateError;
use crate::target::Target;
use crate::types::{strip_caret, DataType};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    None,
    ArrayToScalarViaScatter,
    ScalarToArrayWrap,
    SecondaryGroupReshape,
    Incompatible,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MismatchKind::None => "none",
            MismatchKind::ArrayToScalarViaScatter => "array-to-scalar via scatter",
            MismatchKind::ScalarToArrayWrap => "scalar-to-array wrap",
            MismatchKind::SecondaryGroupReshape => "secondary group reshape",
            MismatchKind::Incompatible => "incompatible",
        };
        f.write_str(name)
    }
}

/// Classify the edge `source -> dest`.
pub fn classify(source: &DataType, dest: &DataType, scattered: bool) -> MismatchKind {
    if source.shapes_match(dest) && source.secondaries_match(dest) {
        return MismatchKind::None;
    }
    if scattered {
        if let Some(element) = source.element_type() {
            if element.shapes_match(dest) && element.secondaries_match(dest) {
                return MismatchKind::ArrayToScalarViaScatter;
            }
        }
    }
    if source.array_depth() == 0 {
        if let Some(element) = dest.element_type() {
            if !element.is_array() && element.shapes_match(source) {
                return MismatchKind::ScalarToArrayWrap;
            }
        }
    }
    if source.is_file_like() && source.shapes_match(dest) && !source.secondaries_match(dest) {
        return MismatchKind::SecondaryGroupReshape;
    }
    MismatchKind::Incompatible
}

/// Classify and reject incompatible edges.
pub fn check(
    step: &str,
    input_id: &str,
    source: &DataType,
    dest: &DataType,
    scattered: bool,
) -> Result<MismatchKind, TranslateError> {
    match classify(source, dest, scattered) {
        MismatchKind::Incompatible => Err(TranslateError::IncompatibleTypes {
            step: step.to_string(),
            input_id: input_id.to_string(),
            source_type: source.to_string(),
            dest_type: dest.to_string(),
        }),
        kind => Ok(kind),
    }
}

/// Where one member of the destination group comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupMember {
    /// Position in the source group, the primary being 0
    Source(usize),
    /// A secondary the source lacks, named after the primary
    Derived(String),
}

/// Members of the destination group, primary first, in the destination's
/// extension order.
pub fn reshape_members(source: &DataType, dest: &DataType) -> Vec<GroupMember> {
    let mut members = vec![GroupMember::Source(0)];
    for wanted in dest.secondaries() {
        let position = source
            .secondaries()
            .iter()
            .position(|s| strip_caret(s) == strip_caret(wanted));
        members.push(match position {
            Some(i) => GroupMember::Source(i + 1),
            None => GroupMember::Derived(wanted.clone()),
        });
    }
    members
}

/// Name a secondary after a primary file held in `primary`.
///
/// A plain extension is appended; each caret first strips one extension
/// from the primary. Arrays of primaries are mapped element-wise. CWL stages
/// secondaries from the destination's own patterns, so its text is the
/// primary itself.
pub fn derive_secondary(
    primary: &str,
    extension: &str,
    array: bool,
    target: Target,
) -> Result<String, TranslateError> {
    let carets = extension.len() - strip_caret(extension).len();
    let suffix = strip_caret(extension);
    let tail = format!(r"(\.[^./]+){{{}}}$", carets);
    Ok(match (target, array) {
        (Target::Cwl, _) => primary.to_string(),
        (Target::Wdl, false) if carets == 0 => format!("\"~{{{}}}{}\"", primary, suffix),
        (Target::Wdl, false) => format!(
            "\"~{{sub({}, \"{}\", \"\")}}{}\"",
            primary,
            tail.replace('\\', r"\\"),
            suffix
        ),
        (Target::Wdl, true) if carets == 0 => format!("suffix(\"{}\", {})", suffix, primary),
        (Target::Wdl, true) => {
            return Err(TranslateError::invalid_definition(format!(
                "cannot derive secondary {} for every element of {} in WDL",
                extension, primary
            )))
        }
        (Target::Nextflow, false) if carets == 0 => format!("file(\"${{{}}}{}\")", primary, suffix),
        (Target::Nextflow, false) => format!(
            "file({}.toString().replaceAll(/{}/, '') + '{}')",
            primary, tail, suffix
        ),
        (Target::Nextflow, true) => format!(
            "{}.collect{{ f -> {} }}",
            primary,
            derive_secondary("f", extension, false, target)?
        ),
    })
}

/// Apply the coercion for `kind` to an already-lowered source.
pub fn inject(
    kind: MismatchKind,
    lowered: &str,
    source: &DataType,
    dest: &DataType,
    target: Target,
) -> Result<String, TranslateError> {
    match kind {
        MismatchKind::None | MismatchKind::ArrayToScalarViaScatter => Ok(lowered.to_string()),
        MismatchKind::ScalarToArrayWrap => Ok(match target {
            Target::Wdl | Target::Cwl => format!("[{}]", lowered),
            Target::Nextflow => format!("{}.toList()", lowered),
        }),
        MismatchKind::SecondaryGroupReshape => match target {
            // secondaries travel as separate variables or alongside the file
            Target::Wdl | Target::Cwl => Ok(lowered.to_string()),
            Target::Nextflow => nextflow_reshape(lowered, source, dest),
        },
        MismatchKind::Incompatible => Err(TranslateError::invalid_definition(format!(
            "cannot coerce {} to {}",
            source, dest
        ))),
    }
}

/// Channel operator regrouping `source` tuples into `dest` order.
fn nextflow_reshape(
    lowered: &str,
    source: &DataType,
    dest: &DataType,
) -> Result<String, TranslateError> {
    let grouped = !source.secondaries().is_empty();
    let (variable, primary) = if grouped {
        ("tuple", "tuple[0]")
    } else {
        ("primary", "primary")
    };

    let mut members = Vec::new();
    for member in reshape_members(source, dest) {
        members.push(match member {
            GroupMember::Source(0) => primary.to_string(),
            GroupMember::Source(i) => format!("tuple[{}]", i),
            GroupMember::Derived(extension) => {
                derive_secondary(primary, &extension, false, Target::Nextflow)?
            }
        });
    }
    let body = if dest.secondaries().is_empty() {
        primary.to_string()
    } else {
        format!("[{}]", members.join(", "))
    };

    if source.is_array() {
        Ok(format!(
            "{}.map{{ items -> items.collect{{ {} -> {} }} }}",
            lowered, variable, body
        ))
    } else {
        Ok(format!("{}.map{{ {} -> {} }}", lowered, variable, body))
    }
}
