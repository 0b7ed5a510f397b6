//! Schema snapshot loading.
//!
//! A snapshot is either a YAML document listing tables and their foreign keys, or a
//! SQL script whose DDL is read by [`SchemaBuilder`]. Relationships configured as
//! additional foreign keys are injected before FK resolution.

use super::{ForeignKey, Schema, SchemaBuilder, TableId, TableSchema};
use crate::config::AdditionalForeignKeyConfig;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// YAML representation of a whole schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableSnapshot>,
}

/// YAML representation of one table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSnapshot {
    pub name: String,
    pub schema: Option<String>,
    pub foreign_keys: Vec<ForeignKeySnapshot>,
}

/// YAML representation of one foreign key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignKeySnapshot {
    pub name: Option<String>,
    pub references: String,
    pub fixed_condition: Option<String>,
    pub additional: bool,
}

impl SchemaSnapshot {
    /// Parse a YAML snapshot document
    pub fn from_yaml(content: &str, path: &Path) -> ConfigResult<Self> {
        serde_yaml_ng::from_str(content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Turn the snapshot into an unresolved schema
    pub fn into_schema(self) -> Schema {
        let mut schema = Schema::new();
        for table in self.tables {
            let mut ts = TableSchema::new(table.name, TableId(0));
            ts.schema = table.schema;
            ts.foreign_keys = table
                .foreign_keys
                .into_iter()
                .map(|fk| ForeignKey {
                    name: fk.name,
                    referenced_table: fk.references,
                    referenced_table_id: None,
                    fixed_condition: fk.fixed_condition,
                    is_additional: fk.additional,
                })
                .collect();
            schema.add_table(ts);
        }
        schema
    }
}

/// Load a schema from a YAML snapshot or SQL DDL file, injecting configured
/// additional foreign keys, and resolve it.
pub fn load_schema(
    path: &Path,
    additional: &[AdditionalForeignKeyConfig],
) -> ConfigResult<Schema> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "yaml" | "yml"))
        .unwrap_or(false);

    let mut schema = if is_yaml {
        SchemaSnapshot::from_yaml(&content, path)?.into_schema()
    } else {
        let mut builder = SchemaBuilder::new();
        builder.parse_script(&content);
        builder.build()
    };

    inject_additional_foreign_keys(&mut schema, additional)?;
    schema.resolve_foreign_keys();

    tracing::debug!(
        path = %path.display(),
        tables = schema.len(),
        additional = additional.len(),
        "schema loaded"
    );

    Ok(schema)
}

/// Attach configured relationships to their owning tables.
///
/// Both ends must name tables that exist in the schema.
pub fn inject_additional_foreign_keys(
    schema: &mut Schema,
    additional: &[AdditionalForeignKeyConfig],
) -> ConfigResult<()> {
    for config in additional {
        let unknown = |missing: &str| ConfigError::UnknownTable {
            table: config.table.clone(),
            referenced_table: config.referenced_table.clone(),
            missing: missing.to_string(),
        };

        let owner = schema
            .get_table_id(&config.table)
            .ok_or_else(|| unknown(&config.table))?;
        let target = schema
            .get_table(&config.referenced_table)
            .map(|t| t.name.clone())
            .ok_or_else(|| unknown(&config.referenced_table))?;

        let mut fk = ForeignKey::new(target).additional();
        fk.name = config.name.clone();
        fk.fixed_condition = config.fixed_condition.clone();

        if let Some(table) = schema.table_mut(owner) {
            table.foreign_keys.push(fk);
        }
    }
    Ok(())
}
