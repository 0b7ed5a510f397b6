//! Schema model for dependency-aware export ordering.
//!
//! This module provides:
//! - Data models for tables and their foreign keys (with relaxation flags)
//! - Loaders for YAML schema snapshots and SQL DDL
//! - Reverse referrer lists derived from the FK graph

mod ddl;
mod graph;
mod snapshot;

pub use ddl::*;
pub use graph::*;
pub use snapshot::*;

use ahash::AHashMap;
use std::fmt;

/// Unique identifier for a table within a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl TableId {
    /// Index into `Schema::table_schemas`
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Foreign key from an owning table to a referenced table
#[derive(Debug, Clone)]
pub struct ForeignKey {
    /// Constraint name (optional)
    pub name: Option<String>,
    /// Referenced table pure name
    pub referenced_table: String,
    /// Resolved referenced table ID (set after schema is complete)
    pub referenced_table_id: Option<TableId>,
    /// Fixed join predicate, if the relationship carries one
    pub fixed_condition: Option<String>,
    /// Injected by configuration rather than read from schema metadata
    pub is_additional: bool,
}

impl ForeignKey {
    /// Create a plain FK to the named table
    pub fn new(referenced_table: impl Into<String>) -> Self {
        Self {
            name: None,
            referenced_table: referenced_table.into(),
            referenced_table_id: None,
            fixed_condition: None,
            is_additional: false,
        }
    }

    pub fn with_fixed_condition(mut self, condition: impl Into<String>) -> Self {
        self.fixed_condition = Some(condition.into());
        self
    }

    pub fn additional(mut self) -> Self {
        self.is_additional = true;
        self
    }

    /// Whether the join carries an extra fixed predicate
    pub fn has_fixed_condition(&self) -> bool {
        self.fixed_condition.is_some()
    }

    /// Whether this FK points back at its owning table
    pub fn is_self_reference(&self, owner: TableId) -> bool {
        self.referenced_table_id == Some(owner)
    }
}

/// Table definition as seen by the ordering algorithms
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Table pure name
    pub name: String,
    /// Schema qualifier (None for the main schema)
    pub schema: Option<String>,
    /// Table ID within the schema
    pub id: TableId,
    /// Foreign key constraints, in declaration order
    pub foreign_keys: Vec<ForeignKey>,
    /// Tables that reference this table (rebuilt by `Schema::resolve_foreign_keys`)
    pub referrers: Vec<TableId>,
}

impl TableSchema {
    /// Create a new table without foreign keys
    pub fn new(name: String, id: TableId) -> Self {
        Self {
            name,
            schema: None,
            id,
            foreign_keys: Vec::new(),
            referrers: Vec::new(),
        }
    }

    /// Schema-aware name, e.g. `nextschema.MEMBER`
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Name used inside output file names
    pub fn display_name(&self) -> String {
        self.qualified_name()
    }

    /// Check if any FK of this table references itself
    pub fn has_self_reference(&self) -> bool {
        self.foreign_keys
            .iter()
            .any(|fk| fk.is_self_reference(self.id))
    }
}

/// Complete database schema.
///
/// Tables are indexed by qualified name. A pure name also resolves while exactly one
/// schema-qualified table carries it; a table of the main schema always owns its
/// pure name.
#[derive(Debug)]
pub struct Schema {
    /// Map from qualified table name to table ID
    pub tables: AHashMap<String, TableId>,
    /// Table schemas indexed by TableId
    pub table_schemas: Vec<TableSchema>,
    /// Lowercased qualified name → first table registered under it
    lowered: AHashMap<String, TableId>,
    /// Lowercased pure name of qualified tables → table, `None` once ambiguous
    aliases: AHashMap<String, Option<TableId>>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self {
            tables: AHashMap::new(),
            table_schemas: Vec::new(),
            lowered: AHashMap::new(),
            aliases: AHashMap::new(),
        }
    }

    /// Get table ID by qualified or pure name (case-insensitive)
    pub fn get_table_id(&self, name: &str) -> Option<TableId> {
        // Try exact match first
        if let Some(&id) = self.tables.get(name) {
            return Some(id);
        }
        let name_lower = name.to_lowercase();
        self.lowered
            .get(&name_lower)
            .copied()
            .or_else(|| self.aliases.get(&name_lower).copied().flatten())
    }

    /// Get table ID by qualified name only (case-insensitive)
    pub fn find_qualified(&self, qualified_name: &str) -> Option<TableId> {
        self.tables
            .get(qualified_name)
            .or_else(|| self.lowered.get(&qualified_name.to_lowercase()))
            .copied()
    }

    /// Get table schema by ID
    pub fn table(&self, id: TableId) -> Option<&TableSchema> {
        self.table_schemas.get(id.index())
    }

    /// Get mutable table schema by ID
    pub fn table_mut(&mut self, id: TableId) -> Option<&mut TableSchema> {
        self.table_schemas.get_mut(id.index())
    }

    /// Get table schema by name
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.get_table_id(name).and_then(|id| self.table(id))
    }

    /// Pure name for a table ID
    pub fn table_name(&self, id: TableId) -> &str {
        self.table(id).map(|t| t.name.as_str()).unwrap_or_default()
    }

    /// Add a new table schema, returning its ID
    pub fn add_table(&mut self, mut schema: TableSchema) -> TableId {
        let id = TableId(self.table_schemas.len() as u32);
        schema.id = id;

        let qualified = schema.qualified_name();
        self.tables.entry(qualified.clone()).or_insert(id);
        self.lowered.entry(qualified.to_lowercase()).or_insert(id);

        if schema.schema.is_some() {
            let alias = schema.name.to_lowercase();
            match self.aliases.get(&alias) {
                None => {
                    self.aliases.insert(alias, Some(id));
                }
                Some(Some(_)) => {
                    tracing::debug!(
                        table = %schema.name,
                        "pure name shared by several schemas, qualify references to it"
                    );
                    self.aliases.insert(alias, None);
                }
                Some(None) => {}
            }
        }

        self.table_schemas.push(schema);
        id
    }

    /// Resolve all foreign key references to table IDs and rebuild referrer lists
    pub fn resolve_foreign_keys(&mut self) {
        let resolved: Vec<Vec<Option<TableId>>> = self
            .table_schemas
            .iter()
            .map(|table| {
                table
                    .foreign_keys
                    .iter()
                    .map(|fk| self.get_table_id(&fk.referenced_table))
                    .collect()
            })
            .collect();

        for (table, targets) in self.table_schemas.iter_mut().zip(resolved) {
            table.referrers.clear();
            for (fk, target) in table.foreign_keys.iter_mut().zip(targets) {
                fk.referenced_table_id = target;
            }
        }

        let mut referrers: Vec<Vec<TableId>> = vec![Vec::new(); self.table_schemas.len()];
        for table in &self.table_schemas {
            for fk in &table.foreign_keys {
                if let Some(target) = fk.referenced_table_id {
                    let list = &mut referrers[target.index()];
                    if !list.contains(&table.id) {
                        list.push(table.id);
                    }
                }
            }
        }
        for (table, list) in self.table_schemas.iter_mut().zip(referrers) {
            table.referrers = list;
        }
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.table_schemas.len()
    }

    /// Check if schema is empty
    pub fn is_empty(&self) -> bool {
        self.table_schemas.is_empty()
    }

    /// Iterate over all table schemas
    pub fn iter(&self) -> impl Iterator<Item = &TableSchema> {
        self.table_schemas.iter()
    }

    /// All table IDs in insertion order
    pub fn table_ids(&self) -> impl Iterator<Item = TableId> + '_ {
        self.table_schemas.iter().map(|t| t.id)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
