//! Target workflow languages and their syntactic idioms.
//!
//! Everything that differs between WDL, CWL and Nextflow at the level of a
//! single token (quotes, null, interpolation, zip, projections) lives here so
//! the lowering engine can stay target-agnostic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A workflow language the engine can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Wdl,
    Cwl,
    Nextflow,
}

impl Target {
    /// All targets, in registry order.
    pub const ALL: [Target; 3] = [Target::Wdl, Target::Cwl, Target::Nextflow];

    pub fn name(&self) -> &'static str {
        match self {
            Target::Wdl => "WDL",
            Target::Cwl => "CWL",
            Target::Nextflow => "Nextflow",
        }
    }

    /// Preferred string delimiter.
    pub fn quote_char(&self) -> char {
        match self {
            Target::Nextflow => '\'',
            Target::Wdl | Target::Cwl => '"',
        }
    }

    /// Delimiter used when the text already contains the preferred one.
    pub fn alternate_quote_char(&self) -> char {
        match self {
            Target::Nextflow => '"',
            Target::Wdl | Target::Cwl => '\'',
        }
    }

    /// Quote `text` as a string literal.
    ///
    /// The alternate delimiter is chosen when it avoids escaping the
    /// delimiter. Backslashes and interpolation markers are always escaped.
    pub fn quote(&self, text: &str) -> String {
        let primary = self.quote_char();
        let alternate = self.alternate_quote_char();
        let delimiter = if text.contains(primary) && !text.contains(alternate) {
            alternate
        } else {
            primary
        };
        format!("{delimiter}{}{delimiter}", self.escape(text, delimiter))
    }

    /// Escape literal text for a string delimited by `delimiter`, so that
    /// nothing in it is interpolated.
    pub fn escape(&self, text: &str, delimiter: char) -> String {
        let mut escaped = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            let next = chars.peek().copied();
            let marker = match (self, c, next) {
                (_, '\\', _) => true,
                (_, c, _) if c == delimiter => true,
                (Target::Wdl, '~' | '$', Some('{')) => true,
                (Target::Cwl, '$', Some('(' | '{')) => true,
                (Target::Nextflow, '$', _) => delimiter == '"',
                _ => false,
            };
            if marker {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    pub fn null_token(&self) -> &'static str {
        match self {
            Target::Wdl => "None",
            Target::Cwl | Target::Nextflow => "null",
        }
    }

    /// Wrap code so it is evaluated inside a string.
    pub fn interpolate(&self, code: &str) -> String {
        match self {
            Target::Wdl => format!("~{{{code}}}"),
            Target::Cwl => format!("$({code})"),
            Target::Nextflow => format!("${{{code}}}"),
        }
    }

    /// Strip one filename extension from a file-valued expression.
    ///
    /// `code` is the value so far; WDL takes the basename on the first call
    /// and nests further ones.
    pub fn strip_extension(&self, code: &str, extension: &str, first: bool) -> String {
        match self {
            Target::Wdl => format!("basename({code}, \"{extension}\")"),
            Target::Cwl => {
                let base = if first {
                    format!("{code}.basename")
                } else {
                    code.to_string()
                };
                format!("{base}.replace(/{}$/, \"\")", regex::escape(extension))
            }
            Target::Nextflow => {
                let base = if first {
                    format!("{code}.name")
                } else {
                    code.to_string()
                };
                format!("{base}.replaceAll(/{}$/, '')", regex::escape(extension))
            }
        }
    }

    /// `condition ? present : absent` for an optional value.
    pub fn if_defined(&self, variable: &str, present: &str, absent: &str) -> String {
        match self {
            Target::Wdl => format!("if defined({variable}) then {present} else {absent}"),
            Target::Cwl | Target::Nextflow => format!("{variable} ? {present} : {absent}"),
        }
    }

    /// Token marking an element of an output collection as a path.
    pub fn path_token(&self, code: &str) -> String {
        match self {
            Target::Nextflow => format!("path({code})"),
            Target::Wdl | Target::Cwl => code.to_string(),
        }
    }

    /// Pair two parallel arrays element-wise.
    pub fn zip(&self, left: &str, right: &str) -> String {
        match self {
            Target::Wdl => format!("zip({left}, {right})"),
            Target::Cwl => format!("[{left}, {right}]"),
            Target::Nextflow => format!("[{left}, {right}].transpose()"),
        }
    }

    /// Turn a list of parallel arrays into an array of rows.
    pub fn transpose(&self, arrays: &[String]) -> String {
        let list = arrays.join(", ");
        match self {
            Target::Wdl => format!("transpose([{list}])"),
            Target::Cwl | Target::Nextflow => format!("[{list}].transpose()"),
        }
    }

    /// Accessor for the left (`true`) or right half of a pair.
    pub fn pair_accessor(&self, left: bool) -> &'static str {
        match (self, left) {
            (Target::Wdl, true) => ".left",
            (Target::Wdl, false) => ".right",
            (_, true) => "[0]",
            (_, false) => "[1]",
        }
    }

    /// Whether the target scatters over several inputs without zip plumbing.
    pub fn has_native_dot_scatter(&self) -> bool {
        matches!(self, Target::Cwl)
    }

    /// Whether secondary files are passed as separate variables.
    pub fn splits_secondaries(&self) -> bool {
        matches!(self, Target::Wdl)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wdl" => Ok(Target::Wdl),
            "cwl" => Ok(Target::Cwl),
            "nextflow" | "nf" => Ok(Target::Nextflow),
            other => Err(format!("unknown target '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_prefers_primary() {
        assert_eq!(Target::Wdl.quote("TestString"), "\"TestString\"");
        assert_eq!(Target::Nextflow.quote("TestString"), "'TestString'");
    }

    #[test]
    fn test_quote_switches_delimiter() {
        assert_eq!(Target::Wdl.quote("say \"hi\""), "'say \"hi\"'");
        assert_eq!(Target::Nextflow.quote("it's"), "\"it's\"");
    }

    #[test]
    fn test_quote_escapes_when_both_present() {
        assert_eq!(Target::Wdl.quote("a\"b'c"), "\"a\\\"b'c\"");
    }

    #[test]
    fn test_quote_escapes_interpolation() {
        assert_eq!(Target::Wdl.quote("~{x}"), "\"\\~{x}\"");
        assert_eq!(Target::Wdl.quote("${x} costs $5"), "\"\\${x} costs $5\"");
        assert_eq!(Target::Cwl.quote("$(inputs.x)"), "\"\\$(inputs.x)\"");
        assert_eq!(Target::Nextflow.quote("${x}"), "'${x}'");
        assert_eq!(Target::Nextflow.quote("it's ${x}"), "\"it's \\${x}\"");
    }

    #[test]
    fn test_quote_escapes_backslashes() {
        assert_eq!(Target::Wdl.quote("a\\b"), "\"a\\\\b\"");
        assert_eq!(Target::Nextflow.quote("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_interpolation_markers() {
        assert_eq!(Target::Wdl.interpolate("x"), "~{x}");
        assert_eq!(Target::Cwl.interpolate("inputs.x"), "$(inputs.x)");
        assert_eq!(Target::Nextflow.interpolate("x"), "${x}");
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(
            Target::Wdl.strip_extension("fileInp", ".txt", true),
            "basename(fileInp, \".txt\")"
        );
        assert_eq!(
            Target::Cwl.strip_extension("inputs.bam", ".bam", true),
            "inputs.bam.basename.replace(/\\.bam$/, \"\")"
        );
        let first = Target::Nextflow.strip_extension("reads", ".gz", true);
        assert_eq!(
            Target::Nextflow.strip_extension(&first, ".fastq", false),
            "reads.name.replaceAll(/\\.gz$/, '').replaceAll(/\\.fastq$/, '')"
        );
    }

    #[test]
    fn test_pair_accessors() {
        assert_eq!(Target::Wdl.pair_accessor(true), ".left");
        assert_eq!(Target::Wdl.pair_accessor(false), ".right");
        assert_eq!(Target::Nextflow.pair_accessor(false), "[1]");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("WDL".parse::<Target>(), Ok(Target::Wdl));
        assert_eq!("nf".parse::<Target>(), Ok(Target::Nextflow));
        assert!("snakemake".parse::<Target>().is_err());
    }
}
