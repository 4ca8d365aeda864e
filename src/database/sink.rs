//! DuckDB-backed sink

use super::sql::{duckdb_value_to_json, json_to_typed_value, quote_identifier, SqlType};
use crate::config::LoadConfig;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::schema::ColumnSet;
use crate::sink::Sink;
use crate::types::{JsonObject, JsonValue, MergeOutcome};
use duckdb::{params_from_iter, Connection};
use std::collections::BTreeMap;

/// Metadata column set when a row is inserted
pub const LOADED_AT_COLUMN: &str = "_loaded_at";

/// Sink writing to one DuckDB relation
pub struct DuckDbSink {
    /// DuckDB connection (the run's session)
    conn: Connection,
    /// Database path (for logging)
    database: String,
    /// Relation name as configured (`table` or `schema.table`)
    table: String,
    /// Columns bound for this run but not yet added to the relation
    pending: Vec<String>,
    /// Known column types, keyed by lowercased name
    column_types: BTreeMap<String, SqlType>,
}

impl DuckDbSink {
    /// Open a session on the configured database
    pub fn open(config: &LoadConfig) -> Result<Self> {
        let conn = if config.database == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.database)
        }
        .map_err(|e| {
            Error::sink_unavailable(format!(
                "Failed to open DuckDB database '{}': {e}",
                config.database
            ))
        })?;

        tracing::debug!("Opened DuckDB database {}", config.database);
        Ok(Self::from_connection(conn, &config.database, &config.table))
    }

    /// Wrap an existing connection
    pub fn from_connection(
        conn: Connection,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            database: database.into(),
            table: table.into(),
            pending: Vec::new(),
            column_types: BTreeMap::new(),
        }
    }

    /// Underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Relation name, each part quoted
    fn qualified_table(&self) -> String {
        self.table
            .split('.')
            .map(quote_identifier)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// (schema, table) for catalog lookups
    fn schema_and_name(&self) -> (String, String) {
        match self.table.split_once('.') {
            Some((schema, name)) => (schema.to_string(), name.to_string()),
            None => ("main".to_string(), self.table.clone()),
        }
    }

    /// (name, data type) of every column, in ordinal order
    fn catalog_columns(&self) -> Result<Vec<(String, String)>> {
        let (schema, name) = self.schema_and_name();
        let mut stmt = self
            .conn
            .prepare(
                "SELECT column_name, data_type FROM information_schema.columns
                 WHERE table_schema = ? AND table_name = ?
                 ORDER BY ordinal_position",
            )
            .map_err(|e| Error::write_failure(format!("Failed to prepare column query: {e}")))?;

        let columns = stmt
            .query_map(params_from_iter([schema, name]), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| Error::write_failure(format!("Failed to query columns: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::write_failure(format!("Failed to read columns: {e}")))?;

        Ok(columns)
    }

    /// Columns the relation has, in ordinal order
    pub fn existing_columns(&self) -> Result<Vec<String>> {
        Ok(self
            .catalog_columns()?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Catalog type of a column, `None` when it does not exist
    pub fn column_type(&self, column: &str) -> Result<Option<String>> {
        Ok(self
            .catalog_columns()?
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, data_type)| data_type))
    }

    /// Number of rows in the relation
    pub fn row_count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.qualified_table());
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| Error::write_failure(format!("Failed to count rows: {e}")))?;
        Ok(count as usize)
    }

    /// Every row as a JSON object (without the metadata column), ordered by
    /// `order_by`
    pub fn fetch_rows(&self, order_by: &str) -> Result<Vec<JsonValue>> {
        let columns: Vec<String> = self
            .existing_columns()?
            .into_iter()
            .filter(|c| c != LOADED_AT_COLUMN)
            .collect();
        if columns.is_empty() {
            return Ok(vec![]);
        }

        let select = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {select} FROM {} ORDER BY {}",
            self.qualified_table(),
            quote_identifier(order_by)
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| Error::write_failure(format!("Failed to prepare select: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                let mut object = JsonObject::new();
                for (idx, name) in columns.iter().enumerate() {
                    let value: duckdb::types::Value = row.get(idx)?;
                    object.insert(name.clone(), duckdb_value_to_json(value));
                }
                Ok(JsonValue::Object(object))
            })
            .map_err(|e| Error::write_failure(format!("Failed to select rows: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::write_failure(format!("Failed to read rows: {e}")))?;

        Ok(rows)
    }

    /// Add pending columns and widen existing ones so every value in `rows`
    /// fits its column
    fn prepare_columns(&mut self, rows: &[Row], columns: &ColumnSet) -> Result<()> {
        let table = self.qualified_table();

        for column in std::mem::take(&mut self.pending) {
            let sql_type = SqlType::for_values(rows.iter().filter_map(|r| r.get(&column)))
                .unwrap_or(SqlType::Varchar);

            let sql = format!(
                "ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {} {}",
                quote_identifier(&column),
                sql_type.as_sql()
            );
            self.conn.execute_batch(&sql).map_err(|e| {
                Error::write_failure(format!("Failed to add column '{column}': {e}"))
            })?;
            tracing::debug!("Added column {} {}", column, sql_type.as_sql());
            self.column_types.insert(column.to_lowercase(), sql_type);
        }

        for column in columns.iter() {
            let Some(&current) = self.column_types.get(&column.to_lowercase()) else {
                continue;
            };
            let Some(incoming) = SqlType::for_values(rows.iter().filter_map(|r| r.get(column)))
            else {
                continue;
            };
            let widened = current.widen(incoming);
            if widened == current {
                continue;
            }

            let sql = format!(
                "ALTER TABLE {table} ALTER COLUMN {} TYPE {}",
                quote_identifier(column),
                widened.as_sql()
            );
            self.conn.execute_batch(&sql).map_err(|e| {
                Error::write_failure(format!("Failed to widen column '{column}': {e}"))
            })?;
            tracing::info!(
                "Widened column {} from {} to {}",
                column,
                current.as_sql(),
                widened.as_sql()
            );
            self.column_types.insert(column.to_lowercase(), widened);
        }

        Ok(())
    }

    fn insert_sql(&self, columns: &ColumnSet) -> String {
        if columns.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", self.qualified_table());
        }

        let names = columns
            .iter()
            .map(quote_identifier)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders})",
            self.qualified_table()
        )
    }
}

/// Row values in column order, converted to each column's type
fn typed_params(
    row: &Row,
    columns: &ColumnSet,
    types: &BTreeMap<String, SqlType>,
) -> Vec<duckdb::types::Value> {
    columns
        .iter()
        .zip(row.values_for(columns))
        .map(|(column, value)| {
            json_to_typed_value(value, types.get(&column.to_lowercase()).copied())
        })
        .collect()
}

/// First pair of columns whose names differ only by case
fn case_conflict(columns: &ColumnSet) -> Option<(&str, &str)> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for column in columns.iter() {
        if let Some(first) = seen.insert(column.to_lowercase(), column) {
            return Some((first, column));
        }
    }
    None
}

impl Sink for DuckDbSink {
    fn ensure_relation_exists(&mut self) -> Result<()> {
        if let Some((schema, _)) = self.table.split_once('.') {
            self.conn
                .execute_batch(&format!(
                    "CREATE SCHEMA IF NOT EXISTS {}",
                    quote_identifier(schema)
                ))
                .map_err(|e| Error::write_failure(format!("Failed to create schema: {e}")))?;
        }

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({} TIMESTAMP DEFAULT current_timestamp)",
            self.qualified_table(),
            quote_identifier(LOADED_AT_COLUMN)
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|e| Error::write_failure(format!("Failed to create table: {e}")))?;

        Ok(())
    }

    fn bind_columns(&mut self, columns: &ColumnSet) -> Result<()> {
        // DuckDB identifiers are case-insensitive
        if let Some((first, second)) = case_conflict(columns) {
            return Err(Error::column_conflict(first, second));
        }

        let existing = self.catalog_columns()?;
        self.column_types = existing
            .iter()
            .filter_map(|(name, data_type)| {
                SqlType::from_sql(data_type).map(|t| (name.to_lowercase(), t))
            })
            .collect();

        let existing: Vec<String> = existing
            .into_iter()
            .map(|(name, _)| name.to_lowercase())
            .collect();
        self.pending = columns
            .iter()
            .filter(|c| !existing.contains(&c.to_lowercase()))
            .map(String::from)
            .collect();

        if !self.pending.is_empty() {
            tracing::info!(
                "{} new column(s) for {}: {}",
                self.pending.len(),
                self.table,
                self.pending.join(", ")
            );
        }
        Ok(())
    }

    fn truncate(&mut self) -> Result<()> {
        let sql = format!("DELETE FROM {}", self.qualified_table());
        self.conn
            .execute_batch(&sql)
            .map_err(|e| Error::write_failure(format!("Failed to truncate {}: {e}", self.table)))
    }

    fn write_batch(&mut self, rows: &[Row], columns: &ColumnSet) -> Result<usize> {
        self.prepare_columns(rows, columns)?;
        let sql = self.insert_sql(columns);

        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::write_failure(format!("Failed to begin transaction: {e}")))?;
        {
            let mut stmt = tx
                .prepare(&sql)
                .map_err(|e| Error::write_failure(format!("Failed to prepare insert: {e}")))?;
            for row in rows {
                let params = typed_params(row, columns, &self.column_types);
                stmt.execute(params_from_iter(params))
                    .map_err(|e| Error::write_failure(format!("Failed to insert row: {e}")))?;
            }
        }
        tx.commit()
            .map_err(|e| Error::write_failure(format!("Failed to commit batch: {e}")))?;

        Ok(rows.len())
    }

    fn merge_row(
        &mut self,
        row: &Row,
        columns: &ColumnSet,
        key_column: &str,
    ) -> Result<MergeOutcome> {
        let key = row
            .non_null(key_column)
            .ok_or_else(|| Error::write_failure(format!("row has no '{key_column}' value")))?;
        self.prepare_columns(std::slice::from_ref(row), columns)?;
        let key = json_to_typed_value(
            key,
            self.column_types.get(&key_column.to_lowercase()).copied(),
        );

        let updates: Vec<&str> = columns.excluding(key_column).collect();
        if !updates.is_empty() {
            let assignments = updates
                .iter()
                .map(|c| format!("{} = ?", quote_identifier(c)))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE {} SET {assignments} WHERE {} = ?",
                self.qualified_table(),
                quote_identifier(key_column)
            );

            let mut params: Vec<duckdb::types::Value> = updates
                .iter()
                .map(|c| {
                    row.get(c).map_or(duckdb::types::Value::Null, |v| {
                        json_to_typed_value(v, self.column_types.get(&c.to_lowercase()).copied())
                    })
                })
                .collect();
            params.push(key.clone());

            let changed = self
                .conn
                .execute(&sql, params_from_iter(params))
                .map_err(|e| Error::write_failure(format!("Failed to update row: {e}")))?;
            if changed > 0 {
                return Ok(MergeOutcome::Matched);
            }
        } else {
            let sql = format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?",
                self.qualified_table(),
                quote_identifier(key_column)
            );
            let found: i64 = self
                .conn
                .query_row(&sql, params_from_iter([key]), |r| r.get(0))
                .map_err(|e| Error::write_failure(format!("Failed to look up key: {e}")))?;
            if found > 0 {
                return Ok(MergeOutcome::Matched);
            }
        }

        let sql = self.insert_sql(columns);
        let params = typed_params(row, columns, &self.column_types);
        self.conn
            .execute(&sql, params_from_iter(params))
            .map_err(|e| Error::write_failure(format!("Failed to insert row: {e}")))?;

        Ok(MergeOutcome::Inserted)
    }

    fn describe(&self) -> String {
        format!("duckdb:{}/{}", self.database, self.table)
    }
}
