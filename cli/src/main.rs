use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tablemap_core::{Dialect, QueryBuilder, Registry, TableState};
use tablemap_db::{DbConfig, SchemaFile};
use tablemap_sqlite::{Migrator, TableOutcome, connect};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tablemap")]
#[command(about = "Apply table metadata to a database and inspect the generated DDL")]
#[command(version)]
struct Cli {
    /// Log every generated statement.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create missing tables and add missing columns.
    Migrate(DatabaseArgs),
    /// Show what `migrate` would do without changing the database.
    Status(DatabaseArgs),
    /// Print the CREATE statements for a schema without connecting.
    Ddl(DdlArgs),
}

#[derive(Debug, Args)]
struct DatabaseArgs {
    /// Database configuration YAML file.
    #[arg(long)]
    config: PathBuf,
    /// Schema YAML file, or a directory of them.
    #[arg(long)]
    schema: PathBuf,
}

#[derive(Debug, Args)]
struct DdlArgs {
    /// Schema YAML file, or a directory of them.
    #[arg(long)]
    schema: PathBuf,
    /// SQL dialect to render (postgres, mysql, sqlite).
    #[arg(long, default_value = "postgres")]
    dialect: String,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Migrate(args) => run_migrate(args),
        Command::Status(args) => run_status(args),
        Command::Ddl(args) => run_ddl(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("warning: failed to set up logging: {e}");
    }
}

fn run_migrate(args: DatabaseArgs) -> Result<(), String> {
    let (config, registry) = load_inputs(&args)?;
    let pool = connect(&config).map_err(|e| format!("Failed to connect: {e}"))?;
    let report = Migrator::new(pool, registry)
        .migrate()
        .map_err(|e| format!("Migration failed: {e}"))?;

    for (table, outcome) in &report.tables {
        match outcome {
            TableOutcome::Created => println!("{table}: created"),
            TableOutcome::Altered { added } => {
                println!("{table}: added {}", added.join(", "));
            }
            TableOutcome::UpToDate => println!("{table}: up to date"),
        }
    }
    println!(
        "Migration complete: {} created, {} altered, {} up to date.",
        report.created().len(),
        report.altered().len(),
        report.up_to_date().len()
    );
    Ok(())
}

fn run_status(args: DatabaseArgs) -> Result<(), String> {
    let (config, registry) = load_inputs(&args)?;
    let pool = connect(&config).map_err(|e| format!("Failed to connect: {e}"))?;
    let plans = Migrator::new(pool, registry)
        .status()
        .map_err(|e| format!("Failed to get migration status: {e}"))?;

    println!("Migration Status:");
    for plan in &plans {
        match &plan.state {
            TableState::NeedsAlter { missing } => {
                println!("  {}: {} ({})", plan.table, plan.state.as_str(), missing.join(", "));
            }
            state => println!("  {}: {}", plan.table, state.as_str()),
        }
    }
    let pending = plans.iter().filter(|p| !p.is_noop()).count();
    println!("  Pending tables: {pending}");
    Ok(())
}

fn run_ddl(args: DdlArgs) -> Result<(), String> {
    let dialect: Dialect = args.dialect.parse().map_err(|e| format!("{e}"))?;
    let registry = load_registry(&args.schema)?;
    let builder = QueryBuilder::new(dialect);

    for table in registry.tables() {
        let statements = builder
            .create_table(table)
            .map_err(|e| format!("Failed to render table '{}': {e}", table.name()))?;
        for statement in statements.iter().filter(|s| !s.trim().is_empty()) {
            println!("{statement};");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_inputs(args: &DatabaseArgs) -> Result<(DbConfig, Arc<Registry>), String> {
    let config = DbConfig::load(&args.config)
        .map_err(|e| format!("Failed to load config '{}': {e}", args.config.display()))?;
    let registry = load_registry(&args.schema)?;
    Ok((config, Arc::new(registry)))
}

fn load_registry(path: &Path) -> Result<Registry, String> {
    let schema = SchemaFile::open(path)
        .map_err(|e| format!("Failed to load schema '{}': {e}", path.display()))?;
    if schema.tables.is_empty() {
        return Err(format!("Schema '{}' declares no tables", path.display()));
    }
    schema
        .registry()
        .map_err(|e| format!("Invalid schema '{}': {e}", path.display()))
}
