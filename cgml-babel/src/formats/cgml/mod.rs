//! Cyberiada-GraphML format
//!
//! Two registry entries share this implementation: `cgml` decodes action
//! payloads into trigger/action records, `cgml-text` keeps them as raw text.
//! On serialization the document is first brought into the entry's mode.

use crate::common::convert_mode;
use crate::error::CgmlError;
use crate::format::Format;
use crate::model::{Document, Mode};
use crate::{ExportOptions, ImportOptions};
use std::collections::HashMap;

/// Format implementation for CGML documents
#[derive(Debug, Clone, Copy)]
pub struct CgmlFormat {
    mode: Mode,
}

impl CgmlFormat {
    pub fn new(mode: Mode) -> Self {
        CgmlFormat { mode }
    }

    pub fn structured() -> Self {
        Self::new(Mode::Structured)
    }

    pub fn text() -> Self {
        Self::new(Mode::Text)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Parse with strict key checking.
    pub fn parse_strict(&self, source: &str) -> Result<Document, CgmlError> {
        crate::parse_with_options(
            source,
            &ImportOptions {
                mode: self.mode,
                strict_keys: true,
            },
        )
    }
}

impl Default for CgmlFormat {
    fn default() -> Self {
        Self::structured()
    }
}

impl Format for CgmlFormat {
    fn name(&self) -> &str {
        match self.mode {
            Mode::Structured => "cgml",
            Mode::Text => "cgml-text",
        }
    }

    fn description(&self) -> &str {
        match self.mode {
            Mode::Structured => "Cyberiada-GraphML with parsed trigger/action records",
            Mode::Text => "Cyberiada-GraphML with raw action text",
        }
    }

    fn file_extensions(&self) -> &[&str] {
        match self.mode {
            Mode::Structured => &["graphml", "cgml"],
            Mode::Text => &[],
        }
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, CgmlError> {
        crate::parse(source, self.mode)
    }

    fn serialize(&self, doc: &Document) -> Result<String, CgmlError> {
        self.serialize_with_options(doc, &HashMap::new())
    }

    /// Supported parameters: `indent` (spaces per level, `0` for one line).
    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<String, CgmlError> {
        let mut export = ExportOptions {
            mode: self.mode,
            ..ExportOptions::default()
        };
        for (key, value) in options {
            match key.as_str() {
                "indent" => {
                    export.indent = value.parse().map_err(|_| {
                        CgmlError::NotSupported(format!("Invalid indent '{value}'"))
                    })?
                }
                other => {
                    return Err(CgmlError::NotSupported(format!(
                        "Format '{}' does not support parameter '{other}'",
                        self.name()
                    )))
                }
            }
        }

        crate::serialize_with_options(&convert_mode(doc, self.mode)?, &export)
    }
}
