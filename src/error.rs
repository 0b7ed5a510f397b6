//! Error types shared by the library.
//!
//! Only two things can fail: loading inputs (configuration, schema snapshots,
//! existing-file manifests) and the table-count consistency check that guards every
//! sectioning phase. Everything else resolves through a deterministic fallback.

use std::path::PathBuf;
use thiserror::Error;

/// Internal-consistency failure while sectioning. Fatal for the whole run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SectionError {
    #[error("table count mismatch after {phase}: expected {expected}, got {actual}")]
    TableCountMismatch {
        phase: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised while loading configuration or collaborator snapshots
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("additional foreign key {table} -> {referenced_table}: unknown table '{missing}'")]
    UnknownTable {
        table: String,
        referenced_table: String,
        missing: String,
    },

    #[error("{0}")]
    Invalid(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
