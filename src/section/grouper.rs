//! Splitting levels by name prefix and joining small pieces back up to the limit.

use super::{derive_main_name, ensure_count, first_prefix, second_prefix, Section};
use crate::error::SectionError;
use crate::order::Level;
use crate::schema::{SchemaGraph, TableId};

/// Prefix shared by every member of a group
#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupPrefix {
    first: String,
    second: Option<String>,
}

/// Working section: members plus the prefix that formed it, if any
#[derive(Debug, Clone)]
struct Chunk {
    tables: Vec<TableId>,
    group: Option<GroupPrefix>,
}

impl Chunk {
    fn plain(tables: Vec<TableId>) -> Self {
        Self {
            tables,
            group: None,
        }
    }

    fn len(&self) -> usize {
        self.tables.len()
    }

    fn is_group(&self) -> bool {
        self.group.is_some()
    }

    fn first_prefix(&self) -> Option<&str> {
        self.group.as_ref().map(|g| g.first.as_str())
    }
}

fn count(chunks: &[Chunk]) -> usize {
    chunks.iter().map(Chunk::len).sum()
}

/// Partitions leveled tables into sections near a guideline size
pub struct SectionGrouper<'g, 'a> {
    graph: &'g SchemaGraph<'a>,
    limit: usize,
}

impl<'g, 'a> SectionGrouper<'g, 'a> {
    /// `limit` below 1 is treated as 1
    pub fn new(graph: &'g SchemaGraph<'a>, limit: usize) -> Self {
        Self {
            graph,
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Section the levels, numbering sections from 1.
    ///
    /// Each level is one initial run; runs above the limit are split by prefix.
    pub fn group(&self, levels: &[Level]) -> Result<Vec<Section>, SectionError> {
        let expected: usize = levels.iter().map(Level::len).sum();
        let mut member = vec![false; self.graph.len()];
        for level in levels {
            for id in &level.tables {
                member[id.index()] = true;
            }
        }

        let chunks: Vec<Chunk> = levels
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| Chunk::plain(l.tables.clone()))
            .collect();

        let chunks = self.split_first_level(chunks);
        ensure_count("first-level grouping", expected, count(&chunks))?;

        let chunks = self.split_second_level(chunks);
        ensure_count("second-level grouping", expected, count(&chunks))?;

        let chunks = self.join_by_size(chunks, &member);
        ensure_count("size joining", expected, count(&chunks))?;

        let sections: Vec<Section> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let names: Vec<&str> = chunk
                    .tables
                    .iter()
                    .map(|&id| self.graph.table_name(id))
                    .collect();
                Section::new(i as u32 + 1, derive_main_name(&names), chunk.tables)
            })
            .collect();

        tracing::debug!(
            sections = sections.len(),
            tables = expected,
            limit = self.limit,
            "sections grouped"
        );
        Ok(sections)
    }

    fn split_first_level(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        let mut result = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if chunk.len() > self.limit && !chunk.is_group() {
                for (key, tables) in self.runs_by(&chunk.tables, first_prefix) {
                    result.push(piece(tables, key, None));
                }
            } else {
                result.push(chunk);
            }
        }
        result
    }

    fn split_second_level(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        let mut result = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let uniform_first = chunk
                .group
                .as_ref()
                .filter(|g| g.second.is_none())
                .map(|g| g.first.clone());
            match uniform_first {
                Some(first) if chunk.len() > self.limit => {
                    for (key, tables) in self.runs_by(&chunk.tables, second_prefix) {
                        result.push(piece(tables, first.clone(), Some(key)));
                    }
                }
                _ => result.push(chunk),
            }
        }
        result
    }

    /// Consecutive runs sharing the same prefix under `key`
    fn runs_by(&self, tables: &[TableId], key: fn(&str) -> &str) -> Vec<(String, Vec<TableId>)> {
        let mut runs: Vec<(String, Vec<TableId>)> = Vec::new();
        for &id in tables {
            let prefix = key(self.graph.table_name(id));
            match runs.last_mut() {
                Some((current, members)) if current.as_str() == prefix => members.push(id),
                _ => runs.push((prefix.to_string(), vec![id])),
            }
        }
        runs
    }

    fn join_by_size(&self, chunks: Vec<Chunk>, member: &[bool]) -> Vec<Chunk> {
        let mut joined: Vec<Chunk> = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if chunk.len() == 1 && self.attach_lone_table(&mut joined, chunk.tables[0], member) {
                continue;
            }
            match joined.last_mut() {
                Some(last) if self.can_merge(last, &chunk) => merge_into(last, chunk),
                _ => joined.push(chunk),
            }
        }
        joined
    }

    /// Append a single table to the section holding the only table it references.
    ///
    /// Scans backward and stops at the first section containing the referenced
    /// table; that section must be small for the table to join it.
    fn attach_lone_table(&self, joined: &mut [Chunk], id: TableId, member: &[bool]) -> bool {
        let targets = self.graph.targets_within(id, member);
        let [target] = targets.as_slice() else {
            return false;
        };

        let Some(previous) = joined
            .iter_mut()
            .rev()
            .find(|c| c.tables.contains(target))
        else {
            return false;
        };

        if previous.is_group() && previous.len() >= self.limit {
            return false;
        }

        let prefix = first_prefix(self.graph.table_name(id));
        if previous.first_prefix().is_some_and(|p| p != prefix) {
            previous.group = None;
        }
        previous.tables.push(id);
        true
    }

    fn can_merge(&self, left: &Chunk, right: &Chunk) -> bool {
        if left.len() + right.len() > self.limit {
            return false;
        }
        !left.is_group()
            || !right.is_group()
            || left.first_prefix() == right.first_prefix()
            || (left.len() <= 3 && right.len() <= 3)
    }
}

fn piece(tables: Vec<TableId>, first: String, second: Option<String>) -> Chunk {
    // A single table is not a group of anything.
    if tables.len() < 2 {
        return Chunk::plain(tables);
    }
    Chunk {
        tables,
        group: Some(GroupPrefix { first, second }),
    }
}

fn merge_into(left: &mut Chunk, right: Chunk) {
    left.group = match (left.group.take(), right.group) {
        (Some(l), Some(r)) if l.first == r.first => Some(GroupPrefix {
            second: l.second.filter(|s| r.second.as_deref() == Some(s.as_str())),
            first: l.first,
        }),
        _ => None,
    };
    left.tables.extend(right.tables);
}
