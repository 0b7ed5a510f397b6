//! Dependency ordering of tables for replayable export.
//!
//! Tables are leveled by foreign-key dependency: every level only depends on
//! earlier levels. When no progress can be made, dependencies are relaxed in two
//! steps (fixed-condition FKs, then additional FKs) before the residual set is
//! handed to [`CycleRecoverer`].

mod cycle;
mod leveler;

pub use cycle::*;
pub use leveler::*;

use crate::schema::{TableId, TableSchema};
use std::cmp::Ordering;
use std::fmt;

/// Which foreign keys may be ignored while leveling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Relaxation {
    /// Ignore FKs carrying a fixed condition
    FixedCondition,
    /// Additionally ignore FKs injected by configuration
    AdditionalForeignKey,
}

impl Relaxation {
    /// Next, more permissive relaxation, if any
    pub fn escalate(self) -> Option<Self> {
        match self {
            Relaxation::FixedCondition => Some(Relaxation::AdditionalForeignKey),
            Relaxation::AdditionalForeignKey => None,
        }
    }

    /// Numeric level as used in log output (1 or 2)
    pub fn level(self) -> u8 {
        match self {
            Relaxation::FixedCondition => 1,
            Relaxation::AdditionalForeignKey => 2,
        }
    }
}

impl fmt::Display for Relaxation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relaxation::FixedCondition => write!(f, "fixed-condition"),
            Relaxation::AdditionalForeignKey => write!(f, "additional-fk"),
        }
    }
}

/// How a level came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    /// All relevant dependencies were registered under this relaxation
    Resolved(Relaxation),
    /// Residual tables ordered by cycle recovery
    CycleRecovered,
}

/// Ordered group of tables with no unresolved dependency on later or sibling tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub tables: Vec<TableId>,
    pub source: LevelSource,
}

impl Level {
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Output of [`DependencyGraphOrderer::order`]
#[derive(Debug, Clone, Default)]
pub struct LevelingResult {
    pub levels: Vec<Level>,
    /// Tables that needed cycle recovery, in the order they were handed over
    pub residual: Vec<TableId>,
}

impl LevelingResult {
    /// Concatenation of all levels
    pub fn flat_order(&self) -> Vec<TableId> {
        self.levels
            .iter()
            .flat_map(|l| l.tables.iter().copied())
            .collect()
    }

    pub fn table_count(&self) -> usize {
        self.levels.iter().map(Level::len).sum()
    }

    pub fn has_cycles(&self) -> bool {
        !self.residual.is_empty()
    }
}

/// Comparison used to break ties within a level
pub type TableOrder = fn(&TableSchema, &TableSchema) -> Ordering;

/// Lexicographic by qualified name, then by ID for full determinism
pub fn by_qualified_name(a: &TableSchema, b: &TableSchema) -> Ordering {
    a.qualified_name()
        .cmp(&b.qualified_name())
        .then_with(|| a.id.cmp(&b.id))
}
