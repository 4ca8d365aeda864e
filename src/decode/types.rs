//! Decoder types and traits
//!
//! Defines the core decoder abstractions.

use super::decoders::{DynamoDecoder, JsonDecoder, JsonlDecoder};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DecoderFormat {
    /// JSON document: an array of records or a single record
    #[default]
    Json,
    /// JSON Lines (one record per line)
    Jsonl,
    /// DynamoDB batch-write request document
    Dynamo,
    /// DynamoDB export lines (`{"Item": {...}}` per line)
    DynamoJsonl,
}

/// Trait for decoding file content into records
pub trait RecordDecoder: Send + Sync {
    /// Decode a body into records
    ///
    /// Line-delimited decoders are handed one line at a time.
    fn decode(&self, body: &str) -> Result<Vec<Value>>;

    /// Whether the body should be fed line by line
    fn is_line_delimited(&self) -> bool {
        false
    }
}

/// Build the decoder for a format
pub fn decoder_for(format: DecoderFormat) -> Box<dyn RecordDecoder> {
    match format {
        DecoderFormat::Json => Box::new(JsonDecoder::new()),
        DecoderFormat::Jsonl => Box::new(JsonlDecoder::new()),
        DecoderFormat::Dynamo => Box::new(DynamoDecoder::document()),
        DecoderFormat::DynamoJsonl => Box::new(DynamoDecoder::lines()),
    }
}
