//! Schema dependency graph for FK-aware ordering.
//!
//! Provides:
//! - Index-based dependency lists carrying the FK relaxation flags
//! - Reverse referrer lists without self references
//! - Readiness checks used by the leveling loop

use super::{Schema, TableId};
use crate::order::Relaxation;

/// One outgoing dependency of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    /// Referenced table
    pub target: TableId,
    /// The FK carries a fixed condition
    pub fixed_condition: bool,
    /// The FK was injected by configuration
    pub additional: bool,
}

impl Dependency {
    /// Whether the current relaxation lets this dependency be ignored
    pub fn is_relaxed_by(&self, relaxation: Relaxation) -> bool {
        match relaxation {
            Relaxation::FixedCondition => self.fixed_condition,
            Relaxation::AdditionalForeignKey => self.fixed_condition || self.additional,
        }
    }
}

/// Schema dependency graph built from foreign key relationships.
///
/// Self references and FKs to unknown tables are dropped when the graph is built,
/// so every remaining dependency points at another table of the schema.
#[derive(Debug)]
pub struct SchemaGraph<'a> {
    /// The underlying schema
    pub schema: &'a Schema,
    /// For each table, the tables it references (FK declaration order)
    pub dependencies: Vec<Vec<Dependency>>,
    /// For each table, the tables referencing it
    pub referrers: Vec<Vec<TableId>>,
}

impl<'a> SchemaGraph<'a> {
    /// Build a dependency graph from a resolved schema
    pub fn from_schema(schema: &'a Schema) -> Self {
        let n = schema.len();
        let mut dependencies: Vec<Vec<Dependency>> = vec![Vec::new(); n];
        let mut referrers: Vec<Vec<TableId>> = vec![Vec::new(); n];

        for table in schema.iter() {
            for fk in &table.foreign_keys {
                let Some(target) = fk.referenced_table_id else {
                    continue;
                };
                if fk.is_self_reference(table.id) {
                    continue;
                }
                dependencies[table.id.index()].push(Dependency {
                    target,
                    fixed_condition: fk.has_fixed_condition(),
                    additional: fk.is_additional,
                });
                let list = &mut referrers[target.index()];
                if !list.contains(&table.id) {
                    list.push(table.id);
                }
            }
        }

        Self {
            schema,
            dependencies,
            referrers,
        }
    }

    /// Get the number of tables in the graph
    pub fn len(&self) -> usize {
        self.schema.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    /// Get the table name for a table ID
    pub fn table_name(&self, id: TableId) -> &str {
        self.schema.table_name(id)
    }

    /// Outgoing dependencies of a table
    pub fn dependencies(&self, id: TableId) -> &[Dependency] {
        &self.dependencies[id.index()]
    }

    /// Tables referencing this one (self references excluded)
    pub fn referrers(&self, id: TableId) -> &[TableId] {
        &self.referrers[id.index()]
    }

    /// A table is ready once every dependency that is not relaxed away is registered
    pub fn is_ready(&self, id: TableId, relaxation: Relaxation, registered: &[bool]) -> bool {
        self.dependencies(id)
            .iter()
            .all(|dep| dep.is_relaxed_by(relaxation) || registered[dep.target.index()])
    }

    /// Distinct referenced tables of `id` that are members of `within`
    pub fn targets_within(&self, id: TableId, within: &[bool]) -> Vec<TableId> {
        let mut targets = Vec::new();
        for dep in self.dependencies(id) {
            if within[dep.target.index()] && !targets.contains(&dep.target) {
                targets.push(dep.target);
            }
        }
        targets
    }

    /// Get root tables (tables with no dependencies at all)
    pub fn root_tables(&self) -> Vec<TableId> {
        self.dependencies
            .iter()
            .enumerate()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(i, _)| TableId(i as u32))
            .collect()
    }
}
