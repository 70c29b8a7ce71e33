//! Translation settings loaded from TOML
//!
//! Every key is optional; missing keys keep their defaults.
//!
//! ```toml
//! [scatter]
//! single_variable = "i"
//! multi_variable = "Q"
//!
//! [filenames]
//! optional_fallback = "generated"
//!
//! [nextflow]
//! stderr_path = ".command.err"
//!
//! [cwl]
//! scatter_method = "dotproduct"
//! ```

use crate::error::TranslateError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    pub scatter: ScatterConfig,
    pub filenames: FilenameConfig,
    pub nextflow: NextflowConfig,
    pub cwl: CwlConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    /// Loop variable for a single-field scatter
    pub single_variable: String,
    /// Loop variable for a zipped multi-field scatter
    pub multi_variable: String,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            single_variable: "i".to_string(),
            multi_variable: "Q".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilenameConfig {
    /// Used in place of an absent optional source of a generated filename
    pub optional_fallback: String,
}

impl Default for FilenameConfig {
    fn default() -> Self {
        Self {
            optional_fallback: "generated".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextflowConfig {
    /// Where a process's stderr can be collected from
    pub stderr_path: String,
}

impl Default for NextflowConfig {
    fn default() -> Self {
        Self {
            stderr_path: ".command.err".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CwlConfig {
    pub scatter_method: String,
}

impl Default for CwlConfig {
    fn default() -> Self {
        Self {
            scatter_method: "dotproduct".to_string(),
        }
    }
}

impl TranslateConfig {
    /// Load settings from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, TranslateError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents).map_err(|e| match e {
                TranslateError::Config { message } => TranslateError::config_error(format!(
                    "Failed to parse {} as TOML: {}",
                    path.display(),
                    message
                )),
                other => other,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(TranslateError::config_error(format!(
                "Failed to read {}: {}",
                path.display(),
                err
            ))),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, TranslateError> {
        toml::from_str(contents).map_err(|e| TranslateError::config_error(e.to_string()))
    }

    pub fn with_scatter_variables(
        mut self,
        single: impl Into<String>,
        multi: impl Into<String>,
    ) -> Self {
        self.scatter.single_variable = single.into();
        self.scatter.multi_variable = multi.into();
        self
    }

    pub fn with_optional_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.filenames.optional_fallback = fallback.into();
        self
    }

    pub fn with_nextflow_stderr_path(mut self, path: impl Into<String>) -> Self {
        self.nextflow.stderr_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TranslateConfig::default();
        assert_eq!(config.scatter.single_variable, "i");
        assert_eq!(config.scatter.multi_variable, "Q");
        assert_eq!(config.filenames.optional_fallback, "generated");
        assert_eq!(config.nextflow.stderr_path, ".command.err");
        assert_eq!(config.cwl.scatter_method, "dotproduct");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TranslateConfig::from_toml("[scatter]\nmulti_variable = \"pair\"\n").unwrap();
        assert_eq!(config.scatter.multi_variable, "pair");
        assert_eq!(config.scatter.single_variable, "i");
        assert_eq!(config.filenames.optional_fallback, "generated");
    }

    #[test]
    fn test_invalid_toml() {
        let result = TranslateConfig::from_toml("[scatter\nmulti_variable = ");
        assert!(matches!(result, Err(TranslateError::Config { .. })));
    }

    #[test]
    fn test_builders() {
        let config = TranslateConfig::default()
            .with_scatter_variables("x", "P")
            .with_optional_fallback("default")
            .with_nextflow_stderr_path("stderr.txt");
        assert_eq!(config.scatter.single_variable, "x");
        assert_eq!(config.scatter.multi_variable, "P");
        assert_eq!(config.filenames.optional_fallback, "default");
        assert_eq!(config.nextflow.stderr_path, "stderr.txt");
    }
}
