//! Snapshot of output files left by a previous run.
//!
//! Used in override mode only. Names recorded in files may be `$`-prefixed short
//! forms of long table names; a short-name table resolves them.

use crate::error::{ConfigError, ConfigResult};
use crate::schema::TableSchema;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix marking a shortened table name
pub const SHORT_NAME_PREFIX: char = '$';

/// Existing files, the tables they hold, and short-name resolution
#[derive(Debug, Clone, Default)]
pub struct ExistingFileInfo {
    /// Lowercased recorded table name → first file holding it
    table_files: AHashMap<String, PathBuf>,
    /// File → recorded table names, in file order
    table_orders: AHashMap<PathBuf, Vec<String>>,
    /// Lowercased short name → real name
    short_names: AHashMap<String, String>,
    /// Lowercased real name → lowercased short name (first wins)
    real_to_short: AHashMap<String, String>,
}

/// YAML manifest describing existing files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExistingManifest {
    pub files: Vec<ExistingFileEntry>,
    pub short_names: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExistingFileEntry {
    pub path: PathBuf,
    pub tables: Vec<String>,
}

impl ExistingFileInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file and its table order. Tables already seen in an earlier file
    /// stay with that file.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, tables: Vec<String>) {
        let path = path.into();
        for table in &tables {
            self.table_files
                .entry(table.to_lowercase())
                .or_insert_with(|| path.clone());
        }
        self.table_orders.insert(path, tables);
    }

    pub fn add_short_name(&mut self, short: &str, real: &str) {
        let short_key = short.to_lowercase();
        self.real_to_short
            .entry(real.to_lowercase())
            .or_insert_with(|| short_key.clone());
        self.short_names.insert(short_key, real.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.table_orders.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.table_orders.len()
    }

    /// Real table name for a recorded name
    pub fn resolve_name<'n>(&'n self, recorded: &'n str) -> &'n str {
        if recorded.starts_with(SHORT_NAME_PREFIX) {
            if let Some(real) = self.short_names.get(&recorded.to_lowercase()) {
                return real;
            }
        }
        recorded
    }

    /// First existing file holding the table, by qualified name, pure name, or the
    /// short name standing in for either
    pub fn file_for(&self, table: &TableSchema) -> Option<&PathBuf> {
        let candidates = [table.qualified_name().to_lowercase(), table.name.to_lowercase()];
        candidates
            .iter()
            .find_map(|name| self.table_files.get(name))
            .or_else(|| {
                candidates.iter().find_map(|name| {
                    self.real_to_short
                        .get(name)
                        .and_then(|short| self.table_files.get(short))
                })
            })
    }

    /// Recorded table order of a file, short names resolved
    pub fn recorded_order(&self, path: &Path) -> Option<Vec<String>> {
        self.table_orders.get(path).map(|tables| {
            tables
                .iter()
                .map(|t| self.resolve_name(t).to_string())
                .collect()
        })
    }

    /// Build from a manifest; relative paths are taken from the manifest's directory
    pub fn from_manifest(manifest: ExistingManifest, base: &Path) -> Self {
        let mut info = Self::new();
        for (short, real) in &manifest.short_names {
            info.add_short_name(short, real);
        }
        for entry in manifest.files {
            let path = if entry.path.is_relative() {
                base.join(&entry.path)
            } else {
                entry.path
            };
            info.add_file(path, entry.tables);
        }
        info
    }

    /// Load a YAML manifest
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: ExistingManifest =
            serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self::from_manifest(manifest, base))
    }

    /// Scan a directory of delimiter files; each `*-<TABLE>.tsv` holds one table
    pub fn scan_delimiter_dir(dir: &Path) -> ConfigResult<Self> {
        let escaped = glob::Pattern::escape(&dir.to_string_lossy());
        let pattern = Path::new(&escaped).join("*.tsv");
        let pattern_str = pattern.to_string_lossy();
        let entries = glob::glob(&pattern_str).map_err(|e| {
            ConfigError::Invalid(format!("invalid glob pattern '{}': {}", pattern_str, e))
        })?;

        let mut info = Self::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                ConfigError::Invalid(format!("error reading path for '{}': {}", pattern_str, e))
            })?;
            let table = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|stem| stem.split_once('-'))
                .map(|(_, table)| table.to_string());
            match table {
                Some(table) => info.add_file(path, vec![table]),
                None => tracing::warn!(path = %path.display(), "skipping unrecognized file"),
            }
        }

        tracing::debug!(dir = %dir.display(), files = info.file_count(), "existing files scanned");
        Ok(info)
    }
}
