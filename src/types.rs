//! Pipeline data types
//!
//! A type is either a scalar leaf or an array of some element type. Each node
//! carries its own `optional` flag; optionality of an array says nothing about
//! its elements. File-like scalars additionally carry their filename
//! extensions and the ordered list of secondary files that travel with them.
//!
//! Shape rules:
//! 1. Two types share a shape when their array depth and leaf kind agree,
//!    ignoring optionality
//! 2. `Stdout` and `Stderr` have the shape of `File`
//! 3. Secondary-file sets are compared separately, with carets stripped

use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leaf kinds of the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Boolean,
    File,
    Directory,
    /// Captured standard output of a tool
    Stdout,
    /// Captured standard error of a tool
    Stderr,
    /// Two files travelling together, e.g. paired-end reads
    FilePair,
}

impl ScalarKind {
    pub fn is_file_like(&self) -> bool {
        matches!(
            self,
            ScalarKind::File
                | ScalarKind::Directory
                | ScalarKind::Stdout
                | ScalarKind::Stderr
                | ScalarKind::FilePair
        )
    }

    /// Kind used for shape comparison.
    fn shape_class(&self) -> ScalarKind {
        match self {
            ScalarKind::Stdout | ScalarKind::Stderr => ScalarKind::File,
            other => *other,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Int => "Int",
            ScalarKind::Float => "Float",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::File => "File",
            ScalarKind::Directory => "Directory",
            ScalarKind::Stdout => "Stdout",
            ScalarKind::Stderr => "Stderr",
            ScalarKind::FilePair => "FilePair",
        }
    }
}

/// A pipeline data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Scalar {
        kind: ScalarKind,
        #[serde(default)]
        optional: bool,
        /// Declared filename extensions, primary first
        #[serde(default)]
        extensions: Vec<String>,
        /// Secondary-file extensions, possibly caret-prefixed
        #[serde(default)]
        secondaries: Vec<String>,
    },
    Array {
        item_type: Box<DataType>,
        #[serde(default)]
        optional: bool,
    },
}

impl DataType {
    /// Create a scalar type with no extensions.
    pub fn scalar(kind: ScalarKind, optional: bool) -> Self {
        DataType::Scalar {
            kind,
            optional,
            extensions: Vec::new(),
            secondaries: Vec::new(),
        }
    }

    pub fn string(optional: bool) -> Self {
        Self::scalar(ScalarKind::String, optional)
    }

    pub fn int(optional: bool) -> Self {
        Self::scalar(ScalarKind::Int, optional)
    }

    pub fn float(optional: bool) -> Self {
        Self::scalar(ScalarKind::Float, optional)
    }

    pub fn boolean(optional: bool) -> Self {
        Self::scalar(ScalarKind::Boolean, optional)
    }

    pub fn file(optional: bool) -> Self {
        Self::scalar(ScalarKind::File, optional)
    }

    pub fn directory(optional: bool) -> Self {
        Self::scalar(ScalarKind::Directory, optional)
    }

    pub fn stdout() -> Self {
        Self::scalar(ScalarKind::Stdout, false)
    }

    pub fn stderr() -> Self {
        Self::scalar(ScalarKind::Stderr, false)
    }

    pub fn file_pair(optional: bool) -> Self {
        Self::scalar(ScalarKind::FilePair, optional)
    }

    /// A file with a primary extension and secondary files, e.g. an indexed BAM.
    pub fn file_with_secondaries(extension: &str, secondaries: &[&str], optional: bool) -> Self {
        DataType::Scalar {
            kind: ScalarKind::File,
            optional,
            extensions: vec![extension.to_string()],
            secondaries: secondaries.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn array(item_type: DataType, optional: bool) -> Self {
        DataType::Array {
            item_type: Box::new(item_type),
            optional,
        }
    }

    /// Replace the declared extensions of a scalar. Arrays are returned as-is.
    pub fn with_extensions(mut self, new_extensions: &[&str]) -> Self {
        if let DataType::Scalar { extensions, .. } = &mut self {
            *extensions = new_extensions.iter().map(|s| s.to_string()).collect();
        }
        self
    }

    pub fn is_optional(&self) -> bool {
        match self {
            DataType::Scalar { optional, .. } | DataType::Array { optional, .. } => *optional,
        }
    }

    /// Copy of this type with the top-level optional flag set.
    pub fn with_optional(mut self, value: bool) -> Self {
        match &mut self {
            DataType::Scalar { optional, .. } | DataType::Array { optional, .. } => {
                *optional = value
            }
        }
        self
    }

    pub fn is_array(&self) -> bool {
        matches!(self, DataType::Array { .. })
    }

    /// Element type of an array, or None for scalars.
    pub fn element_type(&self) -> Option<&DataType> {
        match self {
            DataType::Array { item_type, .. } => Some(item_type),
            DataType::Scalar { .. } => None,
        }
    }

    /// Strip all array wrapping and return the leaf.
    pub fn base_type(&self) -> &DataType {
        let mut current = self;
        while let DataType::Array { item_type, .. } = current {
            current = item_type;
        }
        current
    }

    pub fn array_depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let DataType::Array { item_type, .. } = current {
            depth += 1;
            current = item_type;
        }
        depth
    }

    /// Leaf kind after stripping arrays.
    pub fn kind(&self) -> ScalarKind {
        match self.base_type() {
            DataType::Scalar { kind, .. } => *kind,
            // base_type never returns an array
            DataType::Array { .. } => ScalarKind::String,
        }
    }

    pub fn is_file_like(&self) -> bool {
        self.kind().is_file_like()
    }

    /// A bare (non-array) stdout or stderr stream.
    pub fn is_stream(&self) -> bool {
        !self.is_array() && matches!(self.kind(), ScalarKind::Stdout | ScalarKind::Stderr)
    }

    pub fn is_file_pair(&self) -> bool {
        !self.is_array() && self.kind() == ScalarKind::FilePair
    }

    /// Declared extensions of the leaf.
    pub fn extensions(&self) -> &[String] {
        match self.base_type() {
            DataType::Scalar { extensions, .. } => extensions,
            DataType::Array { .. } => &[],
        }
    }

    pub fn primary_extension(&self) -> Option<&str> {
        self.extensions().first().map(|s| s.as_str())
    }

    /// Secondary-file extensions of the leaf.
    pub fn secondaries(&self) -> &[String] {
        match self.base_type() {
            DataType::Scalar { secondaries, .. } => secondaries,
            DataType::Array { .. } => &[],
        }
    }

    /// A single file with secondaries (not an array of them).
    pub fn has_secondaries(&self) -> bool {
        !self.is_array() && self.kind() == ScalarKind::File && !self.secondaries().is_empty()
    }

    /// An array whose element is a file with secondaries.
    pub fn is_secondary_array(&self) -> bool {
        self.element_type()
            .map(|item| item.has_secondaries())
            .unwrap_or(false)
    }

    /// Array depth and leaf kind agree, ignoring optionality.
    pub fn shapes_match(&self, other: &DataType) -> bool {
        self.array_depth() == other.array_depth()
            && self.kind().shape_class() == other.kind().shape_class()
    }

    /// Secondary-file sets agree in content and order, ignoring carets.
    pub fn secondaries_match(&self, other: &DataType) -> bool {
        let ours: Vec<&str> = self.secondaries().iter().map(|s| strip_caret(s)).collect();
        let theirs: Vec<&str> = other.secondaries().iter().map(|s| strip_caret(s)).collect();
        ours == theirs
    }

    /// Type annotation in the target's syntax.
    pub fn render(&self, target: Target) -> String {
        match target {
            Target::Wdl => self.to_string(),
            Target::Cwl => self.render_cwl(),
            Target::Nextflow => {
                if self.has_secondaries() {
                    "tuple".to_string()
                } else if self.is_file_like() {
                    "path".to_string()
                } else {
                    "val".to_string()
                }
            }
        }
    }

    fn render_cwl(&self) -> String {
        let optional = if self.is_optional() { "?" } else { "" };
        match self {
            DataType::Array { item_type, .. } => format!("{}[]{}", item_type.render_cwl(), optional),
            DataType::Scalar { kind, .. } => {
                let name = match kind {
                    ScalarKind::String => "string",
                    ScalarKind::Int => "int",
                    ScalarKind::Float => "float",
                    ScalarKind::Boolean => "boolean",
                    ScalarKind::Directory => "Directory",
                    ScalarKind::Stdout => "stdout",
                    ScalarKind::Stderr => "stderr",
                    ScalarKind::File => "File",
                    ScalarKind::FilePair => "File[]",
                };
                format!("{name}{optional}")
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Array { item_type, .. } => write!(f, "Array[{}]", item_type)?,
            DataType::Scalar { kind, .. } => match kind {
                ScalarKind::Stdout | ScalarKind::Stderr => f.write_str("File")?,
                ScalarKind::FilePair => f.write_str("Array[File]")?,
                other => f.write_str(other.name())?,
            },
        }
        if self.is_optional() {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// Remove leading carets from a secondary extension.
pub fn strip_caret(extension: &str) -> &str {
    extension.trim_start_matches('^')
}

/// Variable-name suffix for a secondary extension: `.bai` -> `bai`,
/// `^.fa.fai` -> `fa_fai`.
pub fn secondary_suffix(extension: &str) -> String {
    strip_caret(extension)
        .trim_start_matches('.')
        .replace(['.', '-'], "_")
}
