use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sqlsentinel::{QueryInput, Schema, SentinelError};

#[derive(Parser)]
#[command(name = "sqlsentinel")]
#[command(author, version, about = "Semantic validation of generated SQL against a schema")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SchemaArgs {
    /// Path to the schema (JSON document, or DDL with --ddl)
    #[arg(short, long)]
    schema: PathBuf,

    /// Read the schema as CREATE TABLE statements
    #[arg(long)]
    ddl: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SqlInput {
    /// SQL text to check
    #[arg(long)]
    sql: Option<String>,

    /// File containing the SQL to check
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tables, columns, functions and aliases referenced by SQL
    Identifiers {
        #[command(flatten)]
        input: SqlInput,

        /// SQL dialect (postgres, sqlite, duckdb, bigquery, snowflake, clickhouse, mysql)
        #[arg(short, long, default_value = "")]
        dialect: String,
    },
    /// Report phantom tables, columns and functions
    Detect {
        #[command(flatten)]
        schema: SchemaArgs,

        #[command(flatten)]
        input: SqlInput,

        #[arg(short, long, default_value = "")]
        dialect: String,
    },
    /// Validate SQL against a schema
    Validate {
        #[command(flatten)]
        schema: SchemaArgs,

        #[command(flatten)]
        input: SqlInput,

        #[arg(short, long, default_value = "")]
        dialect: String,
    },
    /// Check JOIN conditions against declared foreign keys
    Joins {
        #[command(flatten)]
        schema: SchemaArgs,

        #[command(flatten)]
        input: SqlInput,

        #[arg(short, long, default_value = "")]
        dialect: String,
    },
    /// List the tables joinable with a table through foreign keys
    JoinTargets {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Table to look up
        #[arg(short, long)]
        table: String,
    },
    /// Validate a JSON array of {"id", "sql"} queries
    Batch {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Path to the JSON query list
        #[arg(short, long)]
        queries: PathBuf,

        #[arg(short, long, default_value = "")]
        dialect: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Identifiers { input, dialect } => {
            let sql = input.read()?;
            print_json(&sqlsentinel::extract_identifiers(&sql, &dialect))?;
        }
        Commands::Detect {
            schema,
            input,
            dialect,
        } => {
            let schema = schema.load(&dialect)?;
            let sql = input.read()?;
            print_json(&sqlsentinel::detect(&sql, &schema, &dialect))?;
        }
        Commands::Validate {
            schema,
            input,
            dialect,
        } => {
            let schema = schema.load(&dialect)?;
            let sql = input.read()?;
            print_json(&sqlsentinel::validate(&sql, &schema, &dialect))?;
        }
        Commands::Joins {
            schema,
            input,
            dialect,
        } => {
            let schema = schema.load(&dialect)?;
            let sql = input.read()?;
            print_json(&sqlsentinel::join_checks(&sql, &schema, &dialect))?;
        }
        Commands::JoinTargets { schema, table } => {
            let schema = schema.load("")?;
            print_json(&sqlsentinel::valid_join_paths(&table, &schema))?;
        }
        Commands::Batch {
            schema,
            queries,
            dialect,
        } => {
            let schema = schema.load(&dialect)?;
            let queries = read_queries(&queries)?;
            print_json(&sqlsentinel::validate_batch(&queries, &schema, &dialect))?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays valid JSON. RUST_LOG wins over --verbose.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

impl SchemaArgs {
    fn load(&self, dialect: &str) -> Result<Schema> {
        let schema = if self.ddl {
            Schema::from_ddl_file(&self.schema, dialect)?
        } else {
            Schema::from_json_file(&self.schema)?
        };
        tracing::debug!(
            path = %self.schema.display(),
            tables = schema.tables().len(),
            "loaded schema"
        );
        Ok(schema)
    }
}

impl SqlInput {
    fn read(&self) -> Result<String> {
        match (&self.sql, &self.file) {
            (Some(sql), _) => Ok(sql.clone()),
            (None, Some(path)) => Ok(read_file(path)?),
            (None, None) => anyhow::bail!("either --sql or --file is required"),
        }
    }
}

fn read_file(path: &Path) -> Result<String, SentinelError> {
    std::fs::read_to_string(path).map_err(|e| SentinelError::SqlFileReadError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_queries(path: &Path) -> Result<Vec<QueryInput>> {
    let content = read_file(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse query list: {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
