//! Iterative fixed-point leveling with escalating relaxation.

use super::{by_qualified_name, CycleRecoverer, Level, LevelSource, LevelingResult, Relaxation, TableOrder};
use crate::error::SectionError;
use crate::schema::{SchemaGraph, TableId};
use crate::section::ensure_count;

/// Progress of the leveling loop.
///
/// `Leveling` keeps emitting levels under the current relaxation until a pass makes
/// no progress, then escalates once; a stall at the last relaxation moves to
/// `Recovering`, which always finishes in `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelingState {
    Leveling(Relaxation),
    Recovering,
    Done,
}

/// Levels tables so that each one follows the tables it references
pub struct DependencyGraphOrderer<'g, 'a> {
    graph: &'g SchemaGraph<'a>,
    table_order: TableOrder,
}

impl<'g, 'a> DependencyGraphOrderer<'g, 'a> {
    pub fn new(graph: &'g SchemaGraph<'a>) -> Self {
        Self {
            graph,
            table_order: by_qualified_name,
        }
    }

    /// Level every table except `skipped`.
    ///
    /// Skipped tables count as already registered: they satisfy the dependencies
    /// of others but never appear in the result. Losing or duplicating a table is
    /// reported as [`SectionError::TableCountMismatch`].
    pub fn order(&self, skipped: &[TableId]) -> Result<LevelingResult, SectionError> {
        let n = self.graph.len();
        let mut registered = vec![false; n];
        for &id in skipped {
            registered[id.index()] = true;
        }

        let mut remaining: Vec<TableId> = self
            .graph
            .schema
            .table_ids()
            .filter(|id| !registered[id.index()])
            .collect();
        self.sort(&mut remaining);
        let expected = remaining.len();

        let mut result = LevelingResult::default();
        let mut state = LevelingState::Leveling(Relaxation::FixedCondition);

        loop {
            state = match state {
                LevelingState::Leveling(_) if remaining.is_empty() => LevelingState::Done,
                LevelingState::Leveling(relaxation) => {
                    let (ready, blocked): (Vec<TableId>, Vec<TableId>) = remaining
                        .iter()
                        .partition(|&&id| self.graph.is_ready(id, relaxation, &registered));

                    if ready.is_empty() {
                        match relaxation.escalate() {
                            Some(next) => {
                                tracing::warn!(
                                    blocked = blocked.len(),
                                    from = relaxation.level(),
                                    to = next.level(),
                                    "leveling stalled, relaxing dependencies"
                                );
                                LevelingState::Leveling(next)
                            }
                            None => LevelingState::Recovering,
                        }
                    } else {
                        // Registration happens after the pass so siblings never
                        // satisfy each other.
                        for id in &ready {
                            registered[id.index()] = true;
                        }
                        tracing::debug!(
                            level = result.levels.len() + 1,
                            tables = ready.len(),
                            relaxation = %relaxation,
                            "level resolved"
                        );
                        result.levels.push(Level {
                            tables: ready,
                            source: LevelSource::Resolved(relaxation),
                        });
                        remaining = blocked;
                        LevelingState::Leveling(relaxation)
                    }
                }
                LevelingState::Recovering => {
                    let names: Vec<&str> = remaining
                        .iter()
                        .map(|&id| self.graph.table_name(id))
                        .collect();
                    tracing::warn!(tables = ?names, "cyclic foreign keys, recovering order");
                    let recovered = CycleRecoverer::new(self.graph).recover(&remaining);
                    result.residual = std::mem::take(&mut remaining);
                    result.levels.push(Level {
                        tables: recovered,
                        source: LevelSource::CycleRecovered,
                    });
                    LevelingState::Done
                }
                LevelingState::Done => break,
            };
        }

        ensure_count("leveling", expected, result.table_count())?;
        Ok(result)
    }

    fn sort(&self, tables: &mut [TableId]) {
        let schema = self.graph.schema;
        let order = self.table_order;
        tables.sort_by(|&a, &b| match (schema.table(a), schema.table(b)) {
            (Some(ta), Some(tb)) => order(ta, tb),
            _ => a.cmp(&b),
        });
    }
}
