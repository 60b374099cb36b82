//! Cyberiada-GraphML interchange for state machines
//!
//!     This crate reads and writes CGML (Cyberiada-GraphML), a GraphML dialect for hierarchical
//!     state machines, and exposes the content as a flat, strongly typed document model
//!     (./model.rs). A document holds one or more state machines; each machine has states,
//!     transitions, pseudo-states (initial, final, choice, terminate), notes, components and a
//!     meta block.
//!
//!     TLDR: For contributors:
//!         - XML is only ever touched in ./tree: the reader (roxmltree) and writer (quick-xml)
//!           convert between text and the attributed tree. Nothing else sees XML.
//!         - The importer and exporter in ./common only convert between the attributed tree and
//!           the model. They never look at text.
//!         - Payload micro-grammars (trigger/action records, `key/ value` parameters) live in
//!           ./common too, and are exposed for editors that work on single fields.
//!         - Every failure is a [`CgmlError`]; nothing panics on bad input.
//!
//! Architecture
//!
//!     The pipeline in both directions:
//!
//!         text ⇄ tree::RawDocument ⇄ model::Document
//!
//!     The attributed tree is a faithful, normalized copy of the XML: every repeatable child is a
//!     list, text is trimmed and a `<data>` element has at most one shape. This keeps the
//!     semantic code free of XML quirks, and lets us test import and export on plain values.
//!
//!     This is a pure lib, that is, it powers the cgml-cli but is shell agnostic: no code
//!     should suppose a shell environment, be it printing, env vars etc. Logging goes through
//!     `tracing`; installing a subscriber is the caller's business.
//!
//!     The file structure :
//!     .
//!     ├── error.rs                # CgmlError
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── model.rs                # Document model
//!     ├── schema.rs               # Key vocabulary and declared-key registry
//!     ├── tree                    # Attributed tree, XML reader and writer
//!     ├── common                  # Import/export and the payload micro-grammars
//!     ├── formats
//!     │   ├── cgml                # cgml and cgml-text
//!     │   ├── json                # model as JSON
//!     │   └── treeviz             # visual tree, serialize only
//!     └── lib.rs
//!
//! Testing
//!     tests
//!     ├── lib.rs
//!     ├── common                  # fixture loading
//!     ├── roundtrip               # parse → serialize → parse identity
//!     ├── import                  # model contents and fatal errors
//!     ├── export                  # output structure
//!     └── fixtures
//!
//!     Note that rust does not by default discover tests in subdirectories, so we need to include these
//!     in the mod.
//!
//! Core Algorithms
//!
//!     The interesting work is reconstructing the nesting of states from a flat model and the
//!     reverse. See ./common/nested_to_flat.rs (import) and ./common/flat_to_nested.rs (export).
//!
//! Modes
//!
//!     Action payloads can be decoded into trigger/action records ([`Mode::Structured`], the
//!     default) or kept as raw text ([`Mode::Text`]). Both modes round-trip: importing a
//!     document, exporting it and importing the result again yields the same model.
//!
pub mod common;
pub mod error;
pub mod format;
pub mod formats;
pub mod model;
pub mod registry;
pub mod schema;
pub mod tree;

pub use error::{CgmlError, Result};
pub use format::Format;
pub use model::{Document, Mode};
pub use registry::FormatRegistry;

/// Knobs for [`parse_with_options`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub mode: Mode,
    /// Reject data entries whose key is not declared for their element kind
    pub strict_keys: bool,
}

/// Knobs for [`serialize_with_options`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub mode: Mode,
    /// Spaces per nesting level, 0 writes a single line
    pub indent: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            mode: Mode::default(),
            indent: tree::WriterOptions::default().indent,
        }
    }
}

/// Parse CGML text into a document.
pub fn parse(source: &str, mode: Mode) -> Result<Document> {
    parse_with_options(
        source,
        &ImportOptions {
            mode,
            ..ImportOptions::default()
        },
    )
}

pub fn parse_with_options(source: &str, options: &ImportOptions) -> Result<Document> {
    let raw = tree::read_document(source)?;
    common::import_document(&raw, options)
}

/// Serialize a document as CGML text.
///
/// Every action field must already have the shape of `mode`.
pub fn serialize(document: &Document, mode: Mode) -> Result<String> {
    serialize_with_options(
        document,
        &ExportOptions {
            mode,
            ..ExportOptions::default()
        },
    )
}

pub fn serialize_with_options(document: &Document, options: &ExportOptions) -> Result<String> {
    let raw = common::export_document(document, options.mode)?;
    tree::write_document(
        &raw,
        tree::WriterOptions {
            indent: options.indent,
        },
    )
}
