//! CLI commands and argument parsing

use crate::decode::DecoderFormat;
use crate::types::{KeyEncoding, SchemaStrategy};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Flatten nested records and load them into a table
#[derive(Parser, Debug)]
#[command(name = "flatsink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Load configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Sink database file (`:memory:` for an in-memory database)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Destination table (`table` or `schema.table`)
    #[arg(short, long, global = true)]
    pub table: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Truncate the table and reload every record in batches
    FullRefresh {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        shape: ShapeArgs,

        /// Rows per batch
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Merge every record into the table by key
    Upsert {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        shape: ShapeArgs,

        /// Column identifying a record
        #[arg(long)]
        key_column: Option<String>,
    },

    /// Print the column set the records would load into
    Infer {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        shape: ShapeArgs,
    },

    /// Print records as flattened rows
    Flatten {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        shape: ShapeArgs,

        /// Maximum records to print (0 = all)
        #[arg(long, default_value = "0")]
        limit: usize,
    },
}

/// Where records come from
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Record file
    #[arg(short, long)]
    pub source: PathBuf,

    /// Record file format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: DecoderFormat,

    /// Dotted path to the record array inside a JSON document
    #[arg(long)]
    pub records_path: Option<String>,

    /// Only read requests for this table from a DynamoDB request file
    #[arg(long)]
    pub dynamo_table: Option<String>,
}

/// How records are flattened into columns
#[derive(Args, Debug, Clone, Default)]
pub struct ShapeArgs {
    /// Flat key separator
    #[arg(long)]
    pub separator: Option<String>,

    /// Flat key encoding (`plain` or `escaped`)
    #[arg(long)]
    pub key_encoding: Option<KeyEncoding>,

    /// Column set strategy (`sample` or `full_scan`)
    #[arg(long)]
    pub schema_strategy: Option<SchemaStrategy>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one document per line)
    Json,
    /// Human-readable output
    Pretty,
}
