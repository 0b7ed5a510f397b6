//! YAML configuration for planning runs.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Command-line flags override what is loaded here.

use crate::error::{ConfigError, ConfigResult};
use crate::output::{OutputBasis, OutputMode};
use crate::section::DEFAULT_SECTION_LIMIT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default prefix of every output file name
pub const DEFAULT_TITLE: &str = "loaddata";

/// Default spreadsheet extension
pub const DEFAULT_EXTENSION: &str = ".xls";

/// A relationship not present in schema metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdditionalForeignKeyConfig {
    /// Optional constraint name
    pub name: Option<String>,
    /// Owning (referencing) table
    pub table: String,
    /// Referenced table
    pub referenced_table: String,
    /// Extra join predicate; such FKs are relaxed first while leveling
    pub fixed_condition: Option<String>,
}

/// Complete YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionerConfig {
    /// Output file name prefix
    pub title: String,
    /// Spreadsheet or delimiter files
    pub basis: OutputBasis,
    /// Spreadsheet extension
    pub extension: String,
    /// Guideline for the number of tables per section
    pub section_limit: usize,
    /// Replace or override existing files
    pub mode: OutputMode,
    /// Tables treated as already loaded (never emitted)
    pub skip_tables: Vec<String>,
    /// Relationships to add to the schema
    pub additional_foreign_keys: Vec<AdditionalForeignKeyConfig>,
}

impl Default for SectionerConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            basis: OutputBasis::default(),
            extension: DEFAULT_EXTENSION.to_string(),
            section_limit: DEFAULT_SECTION_LIMIT,
            mode: OutputMode::default(),
            skip_tables: Vec::new(),
            additional_foreign_keys: Vec::new(),
        }
    }
}

impl SectionerConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content, path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str, path: &Path) -> ConfigResult<Self> {
        serde_yaml_ng::from_str(content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values no run could use
    pub fn validate(&self) -> ConfigResult<()> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Invalid("title must not be empty".to_string()));
        }
        if self.section_limit == 0 {
            return Err(ConfigError::Invalid(
                "section_limit must be at least 1".to_string(),
            ));
        }
        for fk in &self.additional_foreign_keys {
            if fk.table.is_empty() || fk.referenced_table.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "additional foreign key needs both table and referenced_table: {:?}",
                    fk
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = SectionerConfig::from_yaml("{}", Path::new("test.yaml")).unwrap();
        assert_eq!(config.title, DEFAULT_TITLE);
        assert_eq!(config.section_limit, DEFAULT_SECTION_LIMIT);
        assert_eq!(config.basis, OutputBasis::Spreadsheet);
        assert_eq!(config.mode, OutputMode::Replace);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
title: cyclic
basis: delimiter
section_limit: 5
mode: override
skip_tables: [SYNONYM_MEMBER]
additional_foreign_keys:
  - table: MEMBER_LOGIN
    referenced_table: MEMBER_STATUS
    fixed_condition: "$$foreignAlias$$.DISPLAY_ORDER = 1"
"#;
        let config = SectionerConfig::from_yaml(yaml, Path::new("test.yaml")).unwrap();
        assert_eq!(config.title, "cyclic");
        assert_eq!(config.basis, OutputBasis::Delimiter);
        assert_eq!(config.mode, OutputMode::Override);
        assert_eq!(config.skip_tables, vec!["SYNONYM_MEMBER"]);
        assert_eq!(config.additional_foreign_keys.len(), 1);
        assert!(config.additional_foreign_keys[0].fixed_condition.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = SectionerConfig {
            section_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
