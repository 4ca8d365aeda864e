//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, InputArgs, OutputFormat, ShapeArgs};
use crate::config::LoadConfig;
use crate::database::DuckDbSink;
use crate::decode::{DecoderFormat, DynamoDecoder, JsonDecoder};
use crate::error::{Error, Result};
use crate::handler::{full_refresh_handler, incremental_upsert_handler, LoadResponse};
use crate::schema::inferrer_for;
use crate::source::{FileSource, Source};
use serde_json::{json, Value};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::FullRefresh {
                input,
                shape,
                batch_size,
            } => {
                let mut config = self.build_config(shape)?;
                if let Some(size) = batch_size {
                    config = config.with_batch_size(*size);
                }
                let source = build_source(input);
                let response = full_refresh_handler(&config, &source, DuckDbSink::open);
                self.finish(&response)
            }
            Commands::Upsert {
                input,
                shape,
                key_column,
            } => {
                let mut config = self.build_config(shape)?;
                if let Some(key) = key_column {
                    config = config.with_key_column(key.clone());
                }
                let source = build_source(input);
                let response = incremental_upsert_handler(&config, &source, DuckDbSink::open);
                self.finish(&response)
            }
            Commands::Infer { input, shape } => self.infer(input, shape),
            Commands::Flatten {
                input,
                shape,
                limit,
            } => self.flatten(input, shape, *limit),
        }
    }

    /// Build the run config: file (or defaults), then environment, then flags
    fn build_config(&self, shape: &ShapeArgs) -> Result<LoadConfig> {
        let config = match &self.cli.config {
            Some(path) => LoadConfig::from_file(path)?,
            None => LoadConfig::default(),
        };
        let mut config = config.with_env_overrides(|name| std::env::var(name).ok())?;

        if let Some(database) = &self.cli.database {
            config = config.with_database(database.clone());
        }
        if let Some(table) = &self.cli.table {
            config = config.with_table(table.clone());
        }
        if let Some(separator) = &shape.separator {
            config = config.with_separator(separator.clone());
        }
        if let Some(encoding) = shape.key_encoding {
            config = config.with_key_encoding(encoding);
        }
        if let Some(strategy) = shape.schema_strategy {
            config = config.with_schema_strategy(strategy);
        }

        Ok(config)
    }

    /// Print the column set
    fn infer(&self, input: &InputArgs, shape: &ShapeArgs) -> Result<()> {
        let config = self.build_config(shape)?;
        config.validate()?;
        let source = build_source(input);
        let inferrer = inferrer_for(config.schema_strategy);

        let columns = inferrer.infer(source.scan()?, &config.flattener())?;
        let message = match columns {
            Some(columns) => json!({
                "strategy": inferrer.name(),
                "columns": columns,
            }),
            None => json!({
                "strategy": inferrer.name(),
                "columns": [],
                "emptySource": true,
            }),
        };
        self.output_message(&message);
        Ok(())
    }

    /// Print flattened records
    fn flatten(&self, input: &InputArgs, shape: &ShapeArgs, limit: usize) -> Result<()> {
        let config = self.build_config(shape)?;
        config.validate()?;
        let source = build_source(input);
        let flattener = config.flattener();

        let limit = if limit == 0 { usize::MAX } else { limit };
        for record in source.scan()?.take(limit) {
            let flat = flattener.flatten(&record?);
            self.output_message(&serde_json::to_value(flat)?);
        }
        Ok(())
    }

    /// Print a load response; a failed run becomes an error
    fn finish(&self, response: &LoadResponse) -> Result<()> {
        self.output_message(&serde_json::to_value(response)?);
        if response.is_success() {
            Ok(())
        } else {
            Err(Error::Other(response.body.clone()))
        }
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Build the file source for the input flags
fn build_source(input: &InputArgs) -> FileSource {
    match (input.format, &input.records_path, &input.dynamo_table) {
        (DecoderFormat::Json, Some(path), _) => {
            FileSource::with_decoder(&input.source, Box::new(JsonDecoder::with_path(path.clone())))
        }
        (DecoderFormat::Dynamo, _, Some(table)) => FileSource::with_decoder(
            &input.source,
            Box::new(DynamoDecoder::document().with_table(table.clone())),
        ),
        (format, _, _) => FileSource::new(&input.source, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KeyEncoding, SchemaStrategy};
    use clap::Parser;
    use std::io::Write;

    fn runner(args: &[&str]) -> Runner {
        let mut argv = vec!["flatsink"];
        argv.extend_from_slice(args);
        Runner::new(Cli::parse_from(argv))
    }

    fn shape(runner: &Runner) -> ShapeArgs {
        match &runner.cli.command {
            Commands::FullRefresh { shape, .. }
            | Commands::Upsert { shape, .. }
            | Commands::Infer { shape, .. }
            | Commands::Flatten { shape, .. } => shape.clone(),
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "table: from_file\nbatch_size: 10\nseparator: \"__\"").unwrap();
        let path = file.path().display().to_string();

        let runner = runner(&[
            "--config",
            &path,
            "--table",
            "from_flag",
            "infer",
            "--source",
            "records.json",
            "--key-encoding",
            "escaped",
            "--schema-strategy",
            "full_scan",
        ]);
        let config = runner.build_config(&shape(&runner)).unwrap();

        assert_eq!(config.table, "from_flag");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.separator, "__");
        assert_eq!(config.key_encoding, KeyEncoding::Escaped);
        assert_eq!(config.schema_strategy, SchemaStrategy::FullScan);
    }

    #[test]
    fn test_parse_load_commands() {
        let runner = runner(&[
            "upsert",
            "--source",
            "items.jsonl",
            "--format",
            "dynamo-jsonl",
            "--key-column",
            "id",
        ]);
        match &runner.cli.command {
            Commands::Upsert {
                input, key_column, ..
            } => {
                assert_eq!(input.format, DecoderFormat::DynamoJsonl);
                assert_eq!(key_column.as_deref(), Some("id"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_full_refresh_into_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("records.json");
        std::fs::write(&source, r#"[{"uuid": "a", "n": {"x": 1}}]"#).unwrap();
        let database = dir.path().join("out.duckdb").display().to_string();
        let source = source.display().to_string();

        let runner = runner(&[
            "--database",
            &database,
            "--table",
            "items",
            "full-refresh",
            "--source",
            &source,
        ]);
        runner.run().unwrap();

        let sink = DuckDbSink::open(&LoadConfig::default().with_database(database).with_table("items"))
            .unwrap();
        assert_eq!(sink.fetch_rows("uuid").unwrap(), vec![json!({"n_x": 1, "uuid": "a"})]);
    }

    #[test]
    fn test_failed_load_is_an_error() {
        let runner = runner(&["full-refresh", "--source", "/no/such/records.json"]);
        assert!(runner.run().is_err());
    }
}
