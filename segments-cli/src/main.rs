use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use segments::customers::{self, CustomerRecord};
use segments::{
    parse_query, validate_tree, Dialect, Node, PredicateCompiler, Segment, SegmentConfig,
    SegmentEvaluator, SqlValue, SqliteExecutor,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "segments")]
#[command(about = "Compile and evaluate customer segments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the fields segment conditions may use
    Fields,
    /// Report every invalid node of a segment query
    Validate {
        /// Query JSON, or @path to a file containing it
        query: String,
    },
    /// Print the SQL predicate and parameters of a segment query
    Compile {
        /// Query JSON, or @path to a file containing it
        query: String,
    },
    /// Run a segment against the customer database at DATABASE_URL
    Evaluate {
        /// Segment record JSON, or @path to a file containing it
        segment: String,
    },
}

#[derive(Debug, Serialize)]
struct CompileOutput<'a> {
    dialect: String,
    fragment: &'a str,
    parameters: &'a [SqlValue],
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if it exists
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SegmentConfig::from_env();

    match cli.command {
        Commands::Fields => fields_command(),
        Commands::Validate { query } => validate_command(&read_arg(&query)?, &config),
        Commands::Compile { query } => compile_command(&read_arg(&query)?, &config),
        Commands::Evaluate { segment } => evaluate_command(&read_arg(&segment)?, config).await,
    }
}

/// Inline argument, or file contents when prefixed with `@`
fn read_arg(raw: &str) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => fs_err::read_to_string(path).context("Failed to read argument file"),
        None => Ok(raw.to_string()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fields_command() -> Result<()> {
    print_json(&customers::registry().catalog())
}

fn validate_command(query: &str, config: &SegmentConfig) -> Result<()> {
    let root = parse_query(query)?;
    config.limits.check(&root)?;

    let issues = validate_tree(&Node::Container(root), &customers::registry());
    if issues.is_empty() {
        println!("ok");
        return Ok(());
    }
    for issue in &issues {
        println!("{}: {}", issue.path, issue.error);
    }
    bail!("{} invalid node(s)", issues.len())
}

fn compile_command(query: &str, config: &SegmentConfig) -> Result<()> {
    let root = parse_query(query)?;
    config.limits.check(&root)?;

    let registry = customers::registry();
    let predicate =
        PredicateCompiler::new(&registry, config.dialect).compile(&Node::Container(root))?;
    print_json(&CompileOutput {
        dialect: config.dialect.to_string(),
        fragment: &predicate.fragment,
        parameters: &predicate.parameters,
    })
}

async fn evaluate_command(segment: &str, config: SegmentConfig) -> Result<()> {
    let segment: Segment = serde_json::from_str(segment).context("Invalid segment record")?;

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./store.db?mode=ro".to_string());
    let pool = SqlitePool::connect(&database_url)
        .await
        .with_context(|| format!("Failed to open database at {}", database_url))?;
    tracing::info!("Database opened at {}", database_url);

    let evaluator = SegmentEvaluator::new(
        Arc::new(customers::registry()),
        customers::base_query(),
        sqlite_config(config),
    );
    let executor = SqliteExecutor::<CustomerRecord>::new(pool);
    let rows = evaluator.evaluate(&segment, &executor).await?;
    print_json(&rows)
}

/// The evaluate command always runs against SQLite, whatever dialect compile uses
fn sqlite_config(config: SegmentConfig) -> SegmentConfig {
    if config.dialect != Dialect::Sqlite {
        tracing::warn!(
            "SEGMENT_SQL_DIALECT={} ignored, evaluate runs against SQLite",
            config.dialect
        );
    }
    SegmentConfig {
        dialect: Dialect::Sqlite,
        ..config
    }
}
