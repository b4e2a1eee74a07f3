//! Formforge Database CLI Tool
//!
//! Creates form tables, checks database connectivity and prints the DDL of
//! the configured forms.

use clap::{Parser, Subcommand};
use colored::Colorize;
use formforge::{DatabaseConfig, FormPool, FormforgeConfig};
use formforge_db::commands::{self, TestReport};
use formforge_db::forms::{load_registry, LoadedForms};
use formforge_db::DbToolError;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "formforge-db")]
#[command(about = "Database setup and health checks for formforge forms")]
#[command(version = "0.1.0")]
struct Cli {
    /// Database connection URL
    #[arg(long)]
    database_url: Option<String>,

    /// Form configuration file or directory
    #[arg(long, default_value = "forms")]
    forms: PathBuf,

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
    /// Create the table, indexes and trigger of every form
    Setup,

    /// Check connectivity and list form tables with their row counts
    Test {
        /// Number of concurrent SELECT 1 queries
        #[arg(long, default_value = "10")]
        concurrency: usize,
    },

    /// Print the DDL of every form without connecting
    Sql,
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

    match run(&cli) {
        Ok(()) => {
            if !cli.quiet && !matches!(cli.command, Commands::Sql) {
                println!("{}", "✅ Success".green());
            }
        }
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let forms = load_registry(&cli.forms)?;
    if forms.is_example && !cli.quiet {
        eprintln!(
            "{} no form configurations in {}, using the built-in example",
            "⚠️".yellow(),
            cli.forms.display()
        );
    }

    match cli.command {
        Commands::Sql => {
            print!("{}", commands::sql(&forms.registry));
            Ok(())
        }
        Commands::Setup => handle_setup(cli, &forms),
        Commands::Test { concurrency } => handle_test(cli, &forms, concurrency),
    }
}

/// Flag, then `DATABASE_URL`, then the `[database]` configuration section.
fn database_config(cli: &Cli) -> anyhow::Result<DatabaseConfig> {
    let mut config = FormforgeConfig::load()?.database;
    if let Some(url) = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
    {
        config.url = url;
    }
    if config.url.trim().is_empty() {
        return Err(DbToolError::MissingDatabaseUrl.into());
    }
    Ok(config)
}

fn open_pool(cli: &Cli) -> anyhow::Result<FormPool> {
    let config = database_config(cli)?;
    let pool = FormPool::open(&config).map_err(DbToolError::from)?;
    Ok(pool)
}

fn handle_setup(cli: &Cli, forms: &LoadedForms) -> anyhow::Result<()> {
    let pool = open_pool(cli)?;
    println!("Setting up {} form table(s)...", forms.registry.len());

    let reports = commands::setup(&forms.registry, &pool)?;
    for report in &reports {
        println!(
            "  {} {} ({} statements)",
            "✓".green(),
            report.table.bold(),
            report.statements
        );
    }
    pool.close();
    Ok(())
}

fn handle_test(cli: &Cli, forms: &LoadedForms, concurrency: usize) -> anyhow::Result<()> {
    let pool = Arc::new(open_pool(cli)?);
    println!("Testing database connection...");

    let report = commands::test_database(Arc::clone(&pool), &forms.registry, concurrency)?;
    print_test_report(&report);

    if let Ok(pool) = Arc::try_unwrap(pool) {
        pool.close();
    }
    Ok(())
}

fn print_test_report(report: &TestReport) {
    println!("\n📊 Database Status\n");
    println!("Server: {}", report.server_version);
    println!(
        "Connections: {}/{} healthy",
        report.healthy_connections, report.pool_size
    );
    println!("Concurrent queries: {} ok", report.concurrent_queries);

    println!("\n📋 Form Tables ({}):", report.tables.len());
    for table in &report.tables {
        match table.rows {
            Some(rows) => println!("  {} {} ({} rows)", "✓".green(), table.table, rows),
            None => println!(
                "  {} {} (not created; run `formforge-db setup`)",
                "⏳".yellow(),
                table.table
            ),
        }
    }
}
