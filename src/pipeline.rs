//! End-to-end planning: level, section, and map sections onto files.

use crate::config::SectionerConfig;
use crate::error::SectionError;
use crate::order::{DependencyGraphOrderer, LevelingResult};
use crate::output::{ExistingFileInfo, OutputFileOrderer, OutputMode, OutputPlan, OutputSettings};
use crate::schema::{Schema, SchemaGraph, TableId};
use crate::section::{Section, SectionGrouper};

/// Everything one run decides
#[derive(Debug, Clone)]
pub struct Plan {
    pub leveling: LevelingResult,
    pub sections: Vec<Section>,
    pub output: OutputPlan,
}

/// Resolve the configured skip list to table IDs, ignoring unknown names
pub fn skipped_tables(schema: &Schema, config: &SectionerConfig) -> Vec<TableId> {
    config
        .skip_tables
        .iter()
        .filter_map(|name| {
            let id = schema.get_table_id(name);
            if id.is_none() {
                tracing::warn!(table = %name, "skip table not found in schema");
            }
            id
        })
        .collect()
}

/// Level the schema only
pub fn level(schema: &Schema, config: &SectionerConfig) -> Result<LevelingResult, SectionError> {
    let graph = SchemaGraph::from_schema(schema);
    DependencyGraphOrderer::new(&graph).order(&skipped_tables(schema, config))
}

/// Run the whole pipeline.
///
/// `existing` is only consulted in override mode; without it every table is new.
pub fn plan(
    schema: &Schema,
    config: &SectionerConfig,
    settings: &OutputSettings,
    existing: Option<&ExistingFileInfo>,
) -> Result<Plan, SectionError> {
    let graph = SchemaGraph::from_schema(schema);
    let leveling = DependencyGraphOrderer::new(&graph).order(&skipped_tables(schema, config))?;
    let sections = SectionGrouper::new(&graph, config.section_limit).group(&leveling.levels)?;

    let orderer = OutputFileOrderer::new(schema, settings);
    let output = match config.mode {
        OutputMode::Replace => orderer.replace(&sections),
        OutputMode::Override => {
            let empty = ExistingFileInfo::new();
            orderer.override_existing(&sections, existing.unwrap_or(&empty))
        }
    };

    tracing::info!(
        tables = leveling.table_count(),
        levels = leveling.levels.len(),
        sections = sections.len(),
        files = output.len(),
        mode = %config.mode,
        "plan ready"
    );

    Ok(Plan {
        leveling,
        sections,
        output,
    })
}
