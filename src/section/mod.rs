//! Partitioning of the dependency order into named, size-bounded sections.
//!
//! Sections are what end up in one spreadsheet file (or one numbered run of
//! delimiter files). Their size follows a guideline limit on a best-effort basis.

mod grouper;
mod main_name;
mod prefix;

pub use grouper::*;
pub use main_name::*;
pub use prefix::{first_prefix, second_prefix};

use crate::error::SectionError;
use crate::schema::{Schema, TableId};

/// Default guideline for the number of tables per section
pub const DEFAULT_SECTION_LIMIT: usize = 9;

/// Named group of tables emitted together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// 1-based section number
    pub number: u32,
    /// Label derived from member names
    pub main_name: String,
    /// Members in dependency order
    pub tables: Vec<TableId>,
    /// Externally recorded member order (names), applied over `tables`
    pub table_order: Option<Vec<String>>,
}

impl Section {
    pub fn new(number: u32, main_name: impl Into<String>, tables: Vec<TableId>) -> Self {
        Self {
            number,
            main_name: main_name.into(),
            tables,
            table_order: None,
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Members with the recorded order applied.
    ///
    /// Tables named in the recorded order come first, in that order; the rest
    /// keep their relative position.
    pub fn ordered_tables(&self, schema: &Schema) -> Vec<TableId> {
        let Some(order) = &self.table_order else {
            return self.tables.clone();
        };

        let position = |id: TableId| {
            schema.table(id).and_then(|t| {
                let qualified = t.qualified_name();
                order.iter().position(|name| {
                    name.eq_ignore_ascii_case(&t.name) || name.eq_ignore_ascii_case(&qualified)
                })
            })
        };

        let mut recorded: Vec<(usize, TableId)> = Vec::new();
        let mut rest: Vec<TableId> = Vec::new();
        for &id in &self.tables {
            match position(id) {
                Some(pos) => recorded.push((pos, id)),
                None => rest.push(id),
            }
        }
        recorded.sort_by_key(|&(pos, _)| pos);
        recorded.into_iter().map(|(_, id)| id).chain(rest).collect()
    }
}

/// Fail when a transform lost or duplicated tables
pub fn ensure_count(
    phase: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), SectionError> {
    if expected == actual {
        Ok(())
    } else {
        tracing::error!(phase, expected, actual, "table count mismatch");
        Err(SectionError::TableCountMismatch {
            phase,
            expected,
            actual,
        })
    }
}
