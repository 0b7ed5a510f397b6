//! Plan command - print which tables go into which output file, in order.

use super::load_inputs;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use table_sectioner::output::{ExistingFileInfo, OutputBasis, OutputMode, OutputPlan, OutputSettings};
use table_sectioner::pipeline;
use table_sectioner::schema::Schema;

/// Plan command options
pub struct PlanOptions {
    pub schema: PathBuf,
    pub config: Option<PathBuf>,
    pub output: PathBuf,
    pub basis: Option<String>,
    pub mode: Option<String>,
    pub existing: Option<PathBuf>,
    pub limit: Option<usize>,
    pub title: Option<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PlanJson {
    mode: String,
    basis: String,
    files: Vec<FileJson>,
    cyclic_tables: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FileJson {
    path: String,
    section: u32,
    main_name: String,
    existing: bool,
    tables: Vec<String>,
}

pub fn run(opts: PlanOptions) -> Result<()> {
    let (mut config, schema) = load_inputs(&opts.schema, opts.config.as_deref())?;

    if let Some(basis) = opts.basis.as_deref() {
        config.basis = basis.parse::<OutputBasis>().map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(mode) = opts.mode.as_deref() {
        config.mode = mode.parse::<OutputMode>().map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(limit) = opts.limit {
        config.section_limit = limit;
    }
    if let Some(title) = &opts.title {
        config.title = title.clone();
    }
    config.validate()?;

    if schema.is_empty() {
        eprintln!("No tables found in the schema.");
        return Ok(());
    }

    let settings = OutputSettings::new(&opts.output, config.title.clone(), config.basis)
        .with_extension(&config.extension);

    let existing = match config.mode {
        OutputMode::Replace => None,
        OutputMode::Override => Some(load_existing(&opts, config.basis)?),
    };

    let plan = pipeline::plan(&schema, &config, &settings, existing.as_ref())
        .context("sectioning failed, no plan written")?;

    if plan.leveling.has_cycles() {
        eprintln!("Warning: Circular dependencies detected!");
        eprintln!("The following tables were ordered by cycle recovery:");
        for &id in &plan.leveling.residual {
            eprintln!("  - {}", schema.table_name(id));
        }
        eprintln!();
    }

    if opts.json {
        let out = to_json(&schema, &plan.output, &config.mode, &config.basis, &plan.leveling.residual);
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_text(&schema, &plan.output);
    }

    eprintln!(
        "\nPlanned {} tables in {} sections across {} files ({} mode).",
        plan.leveling.table_count(),
        plan.sections.len(),
        plan.output.len(),
        config.mode
    );

    Ok(())
}

/// Existing files from the manifest, or from scanning the output directory
fn load_existing(opts: &PlanOptions, basis: OutputBasis) -> Result<ExistingFileInfo> {
    if let Some(path) = &opts.existing {
        return ExistingFileInfo::load(path)
            .with_context(|| format!("loading existing-file manifest {}", path.display()));
    }
    match basis {
        OutputBasis::Delimiter if opts.output.is_dir() => {
            Ok(ExistingFileInfo::scan_delimiter_dir(&opts.output)?)
        }
        OutputBasis::Delimiter => Ok(ExistingFileInfo::new()),
        OutputBasis::Spreadsheet => {
            eprintln!("No existing-file manifest given; every table is treated as new.");
            Ok(ExistingFileInfo::new())
        }
    }
}

fn print_text(schema: &Schema, plan: &OutputPlan) {
    for resource in plan.iter() {
        let marker = if resource.existing { " (existing)" } else { "" };
        println!(
            "[{:02}] {}{}",
            resource.section_number(),
            resource.path.display(),
            marker
        );
        for id in resource.tables(schema) {
            println!("    {}", schema.table_name(id));
        }
    }
}

fn to_json(
    schema: &Schema,
    plan: &OutputPlan,
    mode: &OutputMode,
    basis: &OutputBasis,
    residual: &[table_sectioner::schema::TableId],
) -> PlanJson {
    PlanJson {
        mode: mode.to_string(),
        basis: basis.to_string(),
        files: plan
            .iter()
            .map(|r| FileJson {
                path: r.path.display().to_string(),
                section: r.section_number(),
                main_name: r.main_name().to_string(),
                existing: r.existing,
                tables: r
                    .tables(schema)
                    .into_iter()
                    .map(|id| schema.table_name(id).to_string())
                    .collect(),
            })
            .collect(),
        cyclic_tables: residual
            .iter()
            .map(|&id| schema.table_name(id).to_string())
            .collect(),
    }
}
