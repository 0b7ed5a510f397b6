//! Fallback ordering for tables caught in FK cycles.

use crate::schema::{SchemaGraph, TableId};

/// Orders the residual tables the leveler could not resolve.
///
/// Tables no other residual table references are peeled off in batches. The
/// batches are emitted in reverse discovery order, so the irreducible cyclic core
/// comes first and the tables merely pointing into it follow.
pub struct CycleRecoverer<'g, 'a> {
    graph: &'g SchemaGraph<'a>,
}

impl<'g, 'a> CycleRecoverer<'g, 'a> {
    pub fn new(graph: &'g SchemaGraph<'a>) -> Self {
        Self { graph }
    }

    /// Flat emission order of exactly the given tables
    pub fn recover(&self, residual: &[TableId]) -> Vec<TableId> {
        self.peel(residual).into_iter().rev().flatten().collect()
    }

    /// Recovery batches in discovery order.
    ///
    /// Each scan removes every table without a referrer still in the residual set.
    /// A scan removing nothing ends the loop with the rest as the final batch.
    pub fn peel(&self, residual: &[TableId]) -> Vec<Vec<TableId>> {
        let mut in_residual = vec![false; self.graph.len()];
        for &id in residual {
            in_residual[id.index()] = true;
        }

        let mut remaining = residual.to_vec();
        let mut batches = Vec::new();

        while !remaining.is_empty() {
            let (free, referenced): (Vec<TableId>, Vec<TableId>) =
                remaining.iter().partition(|&&id| {
                    !self
                        .graph
                        .referrers(id)
                        .iter()
                        .any(|r| in_residual[r.index()])
                });

            if free.is_empty() {
                batches.push(referenced);
                break;
            }

            for id in &free {
                in_residual[id.index()] = false;
            }
            batches.push(free);
            remaining = referenced;
        }

        batches
    }
}
