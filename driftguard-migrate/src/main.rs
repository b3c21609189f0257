//! driftguard Migration Generator CLI
//!
//! Command-line interface for generating migrations from a schema dump and
//! the journals of previously generated migrations.

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::*;
use driftguard::migration::VersionClock;
use driftguard::source::SchemaSource;
use driftguard::{Dialect, GeneratorConfig};
use driftguard_migrate::journal::JournalHistory;
use driftguard_migrate::snapshot_loader::SnapshotSource;
use driftguard_migrate::writer::{FsWriter, JsonLedger};
use driftguard_migrate::{BatchReport, Generator, Outcome};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "driftguard-migrate")]
#[command(about = "Generate migrations from database schema drift")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (section [generator])
    #[arg(long, default_value = driftguard::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Schema dump file or directory (TOML or JSON)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Database dialect (mysql, pgsql, sqlite, mssql, oci, cubrid, generic)
    #[arg(long)]
    dialect: Option<Dialect>,

    /// Migrations directory path
    #[arg(long)]
    migrations_dir: Option<PathBuf>,

    /// Use portable column kinds and elide default lengths
    #[arg(long)]
    general_schema: Option<bool>,

    /// Table prefix rendered as the {{%name}} placeholder
    #[arg(long)]
    table_prefix: Option<String>,

    /// Migrations to leave out of history replay (name or m<version>_<name>)
    #[arg(long = "skip")]
    skip_migrations: Vec<String>,

    /// Record generated versions as applied
    #[arg(long)]
    record_history: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tables in the schema dump
    List,

    /// Generate create migrations, ordered by foreign key references
    Create {
        /// Table names, comma separated or repeated; `*` for every table
        #[arg(required = true)]
        tables: Vec<String>,
    },

    /// Generate update migrations from the difference with history
    Update {
        /// Table names, comma separated or repeated; `*` for every table
        #[arg(required = true)]
        tables: Vec<String>,

        /// Show the differences without writing anything
        #[arg(long)]
        only_show: bool,
    },
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let quiet = cli.quiet;
    match run(cli) {
        Ok(true) => {
            if !quiet {
                println!("{}", "✅ Success".green());
            }
            process::exit(0);
        }
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Returns `false` when some table failed
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = load_config(&cli)?;

    let schema_path = cli
        .schema
        .clone()
        .or_else(|| std::env::var("DRIFTGUARD_SCHEMA").ok().map(PathBuf::from))
        .context("Schema dump not provided. Use --schema or set DRIFTGUARD_SCHEMA")?;
    let schema = SnapshotSource::load(&schema_path, config.dialect, config.table_options())?;

    match cli.command {
        Commands::List => handle_list(&schema),
        Commands::Create { tables } => handle_create(&config, &schema, &tables),
        Commands::Update { tables, only_show } => handle_update(&config, &schema, &tables, only_show),
    }
}

/// Config file and environment, then command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<GeneratorConfig> {
    let mut config = GeneratorConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }
    if let Some(dir) = &cli.migrations_dir {
        config.migrations_dir = dir.clone();
    }
    if let Some(general) = cli.general_schema {
        config.general_schema = general;
    }
    if let Some(prefix) = &cli.table_prefix {
        config.use_table_prefix = !prefix.is_empty();
        config.table_prefix = prefix.clone();
    }
    if !cli.skip_migrations.is_empty() {
        config.skip_migrations = cli.skip_migrations.clone();
    }
    if cli.record_history {
        config.record_history = true;
    }
    Ok(config)
}

fn handle_list(schema: &SnapshotSource) -> anyhow::Result<bool> {
    let names = schema.table_names()?;
    println!("\n📋 {} ({})\n", "Tables".cyan().bold(), names.len());
    for name in &names {
        println!("  • {}", name);
    }
    Ok(true)
}

fn handle_create(config: &GeneratorConfig, schema: &SnapshotSource, tables: &[String]) -> anyhow::Result<bool> {
    let mut writer = FsWriter;
    let mut ledger = JsonLedger::new(config.migrations_dir.join("ledger.jsonl"));
    let clock = version_clock(config)?;

    let mut generator = Generator::new(config, schema, &mut writer, clock, Local::now().naive_local())
        .with_ledger(&mut ledger);
    let report = generator.create(tables)?;
    Ok(print_report(&report))
}

fn handle_update(
    config: &GeneratorConfig,
    schema: &SnapshotSource,
    tables: &[String],
    only_show: bool,
) -> anyhow::Result<bool> {
    let history = JournalHistory::new(&config.migrations_dir, config.dialect, config.table_options());
    let mut writer = FsWriter;
    let mut ledger = JsonLedger::new(config.migrations_dir.join("ledger.jsonl"));
    let clock = version_clock(config)?;

    let mut generator = Generator::new(config, schema, &mut writer, clock, Local::now().naive_local())
        .with_ledger(&mut ledger);
    let report = generator.update(tables, &history, only_show)?;
    Ok(print_report(&report))
}

/// Versions start after the newest migration already in the directory
fn version_clock(config: &GeneratorConfig) -> anyhow::Result<VersionClock> {
    VersionClock::for_directory(&config.migrations_dir)
        .with_context(|| format!("Failed to scan {}", config.migrations_dir.display()))
}

/// Print per-table outcomes; returns `false` when any table failed
fn print_report(report: &BatchReport) -> bool {
    println!();
    for entry in &report.outcomes {
        match &entry.outcome {
            Outcome::Generated { path } => {
                println!("  {} {} → {}", "✓".green(), entry.table, path.display());
            }
            Outcome::Unchanged => {
                println!("  {} {} (no changes)", "=".cyan(), entry.table);
            }
            Outcome::Shown { differences } => {
                println!("  {} {} ({} difference(s))", "≠".yellow(), entry.table, differences.len());
                for difference in differences {
                    println!("      - {}", difference);
                }
            }
            Outcome::Failed { error } => {
                println!("  {} {}: {}", "✗".red(), entry.table, error);
            }
        }
    }
    println!("\n📈 Summary: {} migration(s) generated", report.generated);
    !report.has_failures()
}
