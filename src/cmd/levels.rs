//! Levels command - print the dependency levels of a schema.

use super::load_inputs;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use table_sectioner::order::{LevelSource, LevelingResult};
use table_sectioner::pipeline;
use table_sectioner::schema::{Schema, SchemaGraph};

#[derive(Debug, Serialize)]
struct LevelsJson {
    levels: Vec<LevelJson>,
    cyclic_tables: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LevelJson {
    number: usize,
    source: String,
    tables: Vec<String>,
}

pub fn run(schema: PathBuf, config: Option<PathBuf>, check: bool, json: bool) -> Result<()> {
    let (config, schema) = load_inputs(&schema, config.as_deref())?;

    if schema.is_empty() {
        eprintln!("No tables found in the schema.");
        return Ok(());
    }

    let result = pipeline::level(&schema, &config).context("leveling failed")?;
    let roots = SchemaGraph::from_schema(&schema).root_tables().len();

    if json {
        let out = to_json(&schema, &result);
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (i, level) in result.levels.iter().enumerate() {
            println!("Level {} ({}):", i + 1, source_label(level.source));
            for &id in &level.tables {
                println!("  {}", schema.table_name(id));
            }
        }
        eprintln!(
            "\n{} tables in {} levels ({} without dependencies).",
            result.table_count(),
            result.levels.len(),
            roots
        );
    }

    if result.has_cycles() {
        eprintln!("\nWarning: Circular dependencies detected!");
        eprintln!("The following tables needed cycle recovery:");
        for &id in &result.residual {
            eprintln!("  - {}", schema.table_name(id));
        }
        if check {
            bail!("check failed: cannot level all tables without cycle recovery");
        }
    }

    Ok(())
}

fn source_label(source: LevelSource) -> String {
    match source {
        LevelSource::Resolved(relaxation) => format!("relaxed: {}", relaxation),
        LevelSource::CycleRecovered => "cycle recovered".to_string(),
    }
}

fn to_json(schema: &Schema, result: &LevelingResult) -> LevelsJson {
    LevelsJson {
        levels: result
            .levels
            .iter()
            .enumerate()
            .map(|(i, level)| LevelJson {
                number: i + 1,
                source: source_label(level.source),
                tables: level
                    .tables
                    .iter()
                    .map(|&id| schema.table_name(id).to_string())
                    .collect(),
            })
            .collect(),
        cyclic_tables: result
            .residual
            .iter()
            .map(|&id| schema.table_name(id).to_string())
            .collect(),
    }
}
