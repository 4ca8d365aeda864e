//! DuckDB sink support
//!
//! This module provides the tabular sink backed by a DuckDB database file
//! (or an in-memory database).
//!
//! The relation is created with a single `_loaded_at` column. Columns are
//! added on the first write after a column set is bound, typed from every
//! value in that write. A later value that does not fit widens the column:
//! `BIGINT` and `DOUBLE` meet at `DOUBLE`, any other mix becomes `VARCHAR`.

mod sink;
mod sql;

pub use sink::{DuckDbSink, LOADED_AT_COLUMN};
pub use sql::{
    duckdb_value_to_json, json_to_duckdb_value, json_to_typed_value, quote_identifier, SqlType,
};
