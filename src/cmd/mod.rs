mod levels;
mod plan;

use anyhow::Context;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::{Path, PathBuf};
use table_sectioner::config::SectionerConfig;
use table_sectioner::schema::{load_schema, Schema};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "table-sectioner")]
#[command(version)]
#[command(about = "Order tables by FK dependency and section them into replayable export files", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan output files: level, section, and map sections onto files
    Plan {
        /// Schema snapshot (.yaml/.yml) or SQL DDL file
        schema: PathBuf,

        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory the planned files belong to
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Output basis: spreadsheet or delimiter (default from config)
        #[arg(long)]
        basis: Option<String>,

        /// Output mode: replace or override (default from config)
        #[arg(long)]
        mode: Option<String>,

        /// YAML manifest of existing files (override mode; default scans the output directory)
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Guideline number of tables per section
        #[arg(short, long)]
        limit: Option<usize>,

        /// File name prefix
        #[arg(short, long)]
        title: Option<String>,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Show dependency levels only
    Levels {
        /// Schema snapshot (.yaml/.yml) or SQL DDL file
        schema: PathBuf,

        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fail when cycle recovery was needed
        #[arg(long)]
        check: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    match cli.command {
        Commands::Plan {
            schema,
            config,
            output,
            basis,
            mode,
            existing,
            limit,
            title,
            json,
        } => plan::run(plan::PlanOptions {
            schema,
            config,
            output,
            basis,
            mode,
            existing,
            limit,
            title,
            json,
        }),
        Commands::Levels {
            schema,
            config,
            check,
            json,
        } => levels::run(schema, config, check, json),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "table-sectioner",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` wins over `-v`
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("table_sectioner={}", default_level)));

    // A second init (tests calling run twice) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Load config (or defaults) and the schema it describes
fn load_inputs(schema_path: &Path, config_path: Option<&Path>) -> anyhow::Result<(SectionerConfig, Schema)> {
    if !schema_path.exists() {
        anyhow::bail!("schema file does not exist: {}", schema_path.display());
    }

    let config = match config_path {
        Some(path) => SectionerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SectionerConfig::default(),
    };

    let schema = load_schema(schema_path, &config.additional_foreign_keys)
        .with_context(|| format!("loading schema {}", schema_path.display()))?;

    Ok((config, schema))
}
