//! CLI-specific transforms
//!
//! This module defines the views available to `cgml inspect`. Each transform
//! is a stage + format combination (e.g., "model-treeviz", "tree-json").
//!
//! ## Transform Pipeline
//!
//! Importing a CGML file goes through two stages:
//!
//! 1. **Reading** - Text → attributed tree (the GraphML elements, normalized)
//!    - `tree-json`: The tree as JSON, before any CGML interpretation
//!
//! 2. **Import** - Attributed tree → document model (flat state machines)
//!    - `model-json`: The model as JSON, actions as trigger/action records
//!    - `model-text-json`: The model as JSON, actions as raw text
//!    - `model-treeviz`: Tree visualization with Unicode icons
//!
//! ## Extra Parameters
//!
//! Transforms can accept extra parameters via `--extra-<name> [value]`:
//!
//! - `actions`: When set to "true", `model-treeviz` lists the action records
//!   of every state and transition.
//!
//! Example: `cgml inspect blinker.graphml --extra-actions`

use cgml_babel::formats::treeviz::to_treeviz_str_with_params;
use cgml_babel::{parse_with_options, tree, ImportOptions, Mode};
use std::collections::HashMap;

/// All available CLI transforms (stage + format combinations)
pub const AVAILABLE_TRANSFORMS: &[&str] = &[
    "tree-json",
    "model-json",
    "model-text-json",
    "model-treeviz",
];

/// Execute a named transform on a source file with optional extra parameters
///
/// `options` controls key strictness; the two JSON model views force their own
/// mode, `model-treeviz` uses the configured one.
///
/// # Returns
///
/// The transformed output as a string, or an error message
pub fn execute_transform(
    source: &str,
    transform_name: &str,
    options: &ImportOptions,
    extra_params: &HashMap<String, String>,
) -> Result<String, String> {
    match transform_name {
        "tree-json" => {
            let raw = tree::read_document(source).map_err(|e| format!("Transform failed: {e}"))?;
            to_json(&raw)
        }
        "model-json" => to_json(&import(source, options, Some(Mode::Structured))?),
        "model-text-json" => to_json(&import(source, options, Some(Mode::Text))?),
        "model-treeviz" => {
            let doc = import(source, options, None)?;
            Ok(to_treeviz_str_with_params(&doc, extra_params))
        }
        _ => Err(format!("Unknown transform: {transform_name}")),
    }
}

fn import(
    source: &str,
    options: &ImportOptions,
    mode: Option<Mode>,
) -> Result<cgml_babel::Document, String> {
    let options = ImportOptions {
        mode: mode.unwrap_or(options.mode),
        ..*options
    };
    parse_with_options(source, &options).map_err(|e| format!("Transform failed: {e}"))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value)
        .map(|json| json + "\n")
        .map_err(|e| format!("JSON serialization failed: {e}"))
}
