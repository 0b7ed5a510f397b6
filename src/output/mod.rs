//! Mapping of sections onto output files.
//!
//! Two modes are supported:
//! - replace: sections are numbered from `01` and each gets fresh files
//! - override: tables go back into the files that already hold them, unknown
//!   tables go to section 99

mod existing;
mod naming;
mod orderer;

pub use existing::*;
pub use naming::*;
pub use orderer::*;

use crate::schema::{Schema, TableId};
use crate::section::Section;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of file a section is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputBasis {
    /// One workbook per section, one sheet per table
    #[default]
    Spreadsheet,
    /// One TSV file per table
    Delimiter,
}

impl std::str::FromStr for OutputBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spreadsheet" | "xls" => Ok(OutputBasis::Spreadsheet),
            "delimiter" | "tsv" => Ok(OutputBasis::Delimiter),
            _ => Err(format!(
                "Unknown output basis: {}. Valid options: spreadsheet, delimiter",
                s
            )),
        }
    }
}

impl fmt::Display for OutputBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputBasis::Spreadsheet => write!(f, "spreadsheet"),
            OutputBasis::Delimiter => write!(f, "delimiter"),
        }
    }
}

/// How existing output files are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Renumber everything from scratch
    #[default]
    Replace,
    /// Keep tables in the files that already hold them
    Override,
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(OutputMode::Replace),
            "override" => Ok(OutputMode::Override),
            _ => Err(format!(
                "Unknown output mode: {}. Valid options: replace, override",
                s
            )),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Replace => write!(f, "replace"),
            OutputMode::Override => write!(f, "override"),
        }
    }
}

/// Where and how files are named
#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub title: String,
    pub basis: OutputBasis,
    /// Spreadsheet extension including the dot
    pub extension: String,
}

impl OutputSettings {
    pub fn new(dir: impl Into<PathBuf>, title: impl Into<String>, basis: OutputBasis) -> Self {
        Self {
            dir: dir.into(),
            title: title.into(),
            basis,
            extension: crate::config::DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = if extension.is_empty() || extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{}", extension)
        };
        self
    }
}

/// One target file and the section written into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputResource {
    pub path: PathBuf,
    pub section: Section,
    /// The file was found by the existing-output scan
    pub existing: bool,
}

impl OutputResource {
    pub fn section_number(&self) -> u32 {
        self.section.number
    }

    pub fn main_name(&self) -> &str {
        &self.section.main_name
    }

    /// Member tables in final write order
    pub fn tables(&self, schema: &Schema) -> Vec<TableId> {
        self.section.ordered_tables(schema)
    }
}

/// Ordered file → resource mapping handed to serialization
#[derive(Debug, Clone, Default)]
pub struct OutputPlan {
    pub resources: Vec<OutputResource>,
}

impl OutputPlan {
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputResource> {
        self.resources.iter()
    }

    /// Resource bound to `path`
    pub fn get(&self, path: &Path) -> Option<&OutputResource> {
        self.resources.iter().find(|r| r.path == path)
    }

    /// Every table in write order
    pub fn flat_tables(&self, schema: &Schema) -> Vec<TableId> {
        self.resources
            .iter()
            .flat_map(|r| r.tables(schema))
            .collect()
    }
}
