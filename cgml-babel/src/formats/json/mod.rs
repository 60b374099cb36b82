//! JSON view of the document model
//!
//! The model serialized with serde as pretty-printed JSON. Action fields keep
//! whatever shape they have: a string in text mode, a list of records in
//! structured mode.

use crate::error::CgmlError;
use crate::format::Format;
use crate::model::Document;

/// Format implementation for the JSON model dump
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Document model as JSON"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, CgmlError> {
        serde_json::from_str(source).map_err(|e| CgmlError::Parse(e.to_string()))
    }

    fn serialize(&self, doc: &Document) -> Result<String, CgmlError> {
        serde_json::to_string_pretty(doc).map_err(|e| CgmlError::Serialization(e.to_string()))
    }
}
