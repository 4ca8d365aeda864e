//! Record decoder module
//!
//! Supports: JSON, JSONL, DynamoDB-typed JSON
//!
//! # Overview
//!
//! Decoders turn raw file content into nested records. The DynamoDB decoders
//! also convert typed attribute values (`{"S": "x"}`, `{"N": "1"}`, ...) into
//! plain JSON before the records reach the flattener.

mod attribute;
mod decoders;
mod types;

pub use attribute::{attribute_to_json, item_to_json};
pub use decoders::{DynamoDecoder, JsonDecoder, JsonlDecoder};
pub use types::{decoder_for, DecoderFormat, RecordDecoder};
