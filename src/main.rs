// chan-parity CLI - compare two output sets, check signal histories
// Reports go to stdout; logs go to stderr (RUST_LOG, default "warn").

use anyhow::{Context, Result};
use chan_parity::{
    check_file, consistency_check, load_registry, render_consistency, render_run, render_schema,
    to_json, CompareConfig, TableReconciler,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chan-parity")]
#[command(about = "Reconcile two sets of chan analysis CSV outputs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every artifact of two output directories
    Compare {
        /// First output directory
        #[arg(long, default_value = chan_parity::DEFAULT_DIR_A)]
        dir1: PathBuf,

        /// Second output directory
        #[arg(long, default_value = chan_parity::DEFAULT_DIR_B)]
        dir2: PathBuf,

        /// Compare <SYMBOL>_output with the symbol's reference dump (overrides --dir1/--dir2)
        #[arg(long)]
        symbol: Option<String>,

        /// Schema version (default: latest)
        #[arg(long)]
        schema_version: Option<String>,

        /// TOML schema file replacing the built-in schemas
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Only compare this artifact (repeatable)
        #[arg(long = "artifact")]
        artifacts: Vec<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Exit non-zero unless every artifact is identical
        #[arg(long)]
        strict: bool,
    },

    /// Find rows sharing a key that disagree on the comparison columns
    CheckDups {
        /// CSV file to check
        file: PathBuf,

        /// Key column (default: begin_time)
        #[arg(long)]
        key: Option<String>,

        /// Comma-separated comparison columns
        #[arg(long)]
        columns: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the registered artifacts and column categories
    Schema {
        /// Schema version (default: latest)
        #[arg(long)]
        schema_version: Option<String>,

        /// TOML schema file replacing the built-in schemas
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Ok(false) when --strict saw a non-identical artifact
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Compare {
            dir1,
            dir2,
            symbol,
            schema_version,
            schema,
            artifacts,
            json,
            strict,
        } => {
            let config = match symbol {
                Some(symbol) => CompareConfig::for_symbol(&symbol),
                None => CompareConfig::default().with_dirs(dir1, dir2),
            }
            .with_version(schema_version)
            .with_schema_file(schema)
            .with_artifacts(artifacts);

            let registry = config.registry().context("Failed to load schema registry")?;
            let reconciler = TableReconciler::new(&registry, config.version.as_deref())?;
            let report = reconciler
                .reconcile_dirs(&config.dir_a, &config.dir_b, &config.artifacts)
                .context("Failed to compare output directories")?;

            if json {
                println!("{}", to_json(&report)?);
            } else {
                print!("{}", render_run(&report));
            }

            Ok(!strict || report.is_clean())
        }

        Commands::CheckDups { file, key, columns, json } => {
            let check = consistency_check(key.as_deref(), columns.as_deref())?;
            let report = check_file(&file, &check)
                .with_context(|| format!("Failed to check {}", file.display()))?;

            if json {
                println!("{}", to_json(&report)?);
            } else {
                print!("{}", render_consistency(&report));
            }

            Ok(true)
        }

        Commands::Schema { schema_version, schema } => {
            let registry = load_registry(schema.as_deref()).context("Failed to load schema registry")?;
            let version = registry.resolve(schema_version.as_deref())?;
            print!("{}", render_schema(version));

            Ok(true)
        }
    }
}
