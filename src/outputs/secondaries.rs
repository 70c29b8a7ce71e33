//! Collection patterns for secondary files
//!
//! Secondaries are located relative to the primary collector. A plain pattern
//! such as `.bai` replaces the primary extension; a caret pattern such as
//! `^.tbi` first strips one dot-component of the primary extension per caret
//! and appends the rest. When the primary text gives no anchor the secondary
//! is collected by wildcard and a warning is recorded.

use super::{Collected, FmtType, PlanWarning};
use crate::target::Target;
use crate::tree::ToolOutputSpec;
use crate::types::strip_caret;

/// How one secondary file is collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryCollector {
    /// Declared secondary extension, as written on the type
    pub extension: String,
    /// Quoted collection text
    pub text: String,
    /// Text is a glob rather than a concrete filename
    pub is_glob: bool,
}

/// Extension a secondary file carries given the primary's extension.
///
/// `.bam` + `.bai` -> `.bai`, `.vcf.gz` + `^.tbi` -> `.vcf.tbi`,
/// `.vcf.gz` + `^^.tbi` -> `.tbi`.
pub fn apply_pattern(primary_extension: &str, pattern: &str) -> String {
    let carets = pattern.len() - strip_caret(pattern).len();
    if carets == 0 {
        return pattern.to_string();
    }
    let components: Vec<&str> = primary_extension
        .split('.')
        .filter(|c| !c.is_empty())
        .collect();
    let keep = components.len().saturating_sub(carets);
    let mut extension: String = components[..keep]
        .iter()
        .map(|c| format!(".{}", c))
        .collect();
    extension.push_str(strip_caret(pattern));
    extension
}

/// Collectors for every secondary of `output`, in declaration order.
pub(crate) fn collect_secondaries(
    output: &ToolOutputSpec,
    primary: &Collected,
    target: Target,
    warnings: &mut Vec<PlanWarning>,
) -> Vec<SecondaryCollector> {
    let primary_extension = output.data_type.primary_extension();
    let anchor = primary_extension.and_then(|ext| {
        rfind_literal(&primary.inner, ext).map(|start| (ext, start, start + ext.len()))
    });

    output
        .data_type
        .secondaries()
        .iter()
        .map(|extension| {
            let pattern = output.secondary_pattern(extension);
            let caret = pattern.starts_with('^');

            if primary.fmt == FmtType::Reference {
                if !caret {
                    return SecondaryCollector {
                        extension: extension.clone(),
                        text: format!("\"{}{}\"", primary.inner, pattern),
                        is_glob: false,
                    };
                }
                return fallback(output, extension, pattern, target, warnings);
            }

            match anchor {
                Some((primary_ext, start, stop)) => {
                    let replaced = format!(
                        "{}{}{}",
                        &primary.inner[..start],
                        apply_pattern(primary_ext, pattern),
                        &primary.inner[stop..]
                    );
                    SecondaryCollector {
                        extension: extension.clone(),
                        text: format!("\"{}\"", replaced),
                        is_glob: primary.fmt == FmtType::Wildcard,
                    }
                }
                None => fallback(output, extension, pattern, target, warnings),
            }
        })
        .collect()
}

/// Byte ranges of `text` outside `~{..}`, `${..}` and `$(..)` blocks.
fn literal_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + 1 < bytes.len() {
        let opens = match (bytes[i], bytes[i + 1]) {
            (b'~', b'{') | (b'$', b'{') | (b'$', b'(') => i == 0 || bytes[i - 1] != b'\\',
            _ => false,
        };
        if !opens {
            i += 1;
            continue;
        }
        let (open, close) = if bytes[i + 1] == b'{' {
            (b'{', b'}')
        } else {
            (b'(', b')')
        };
        spans.push((start, i));
        let mut depth = 0usize;
        let mut j = i + 1;
        while j < bytes.len() {
            if bytes[j] == open {
                depth += 1;
            } else if bytes[j] == close {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            j += 1;
        }
        i = (j + 1).min(bytes.len());
        start = i;
    }
    spans.push((start, bytes.len()));
    spans
}

/// Last occurrence of `needle` in the literal text of `text`.
fn rfind_literal(text: &str, needle: &str) -> Option<usize> {
    literal_spans(text)
        .into_iter()
        .rev()
        .find_map(|(start, stop)| text[start..stop].rfind(needle).map(|i| start + i))
}

fn fallback(
    output: &ToolOutputSpec,
    extension: &str,
    pattern: &str,
    target: Target,
    warnings: &mut Vec<PlanWarning>,
) -> SecondaryCollector {
    let glob = format!("*{}", strip_caret(pattern));
    let warning = PlanWarning::new(
        &output.id,
        format!(
            "secondary file {} cannot be located from the primary collector; collecting \"{}\" instead",
            extension, glob
        ),
    );
    log::warn!("{} ({})", warning, target);
    warnings.push(warning);
    SecondaryCollector {
        extension: extension.to_string(),
        text: format!("\"{}\"", glob),
        is_glob: true,
    }
}
