//! Fixture loading shared by the integration tests.

use cgml_babel::{Document, Mode};
use std::path::PathBuf;

/// Every fixture that must survive a round trip unchanged
pub const ROUNDTRIP_FIXTURES: &[&str] = &[
    "blinker.graphml",
    "self_loop.graphml",
    "nested.graphml",
    "two_machines.graphml",
    "empty_state.graphml",
    "pseudo_states.graphml",
    "components.graphml",
    "passthrough.graphml",
];

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"))
}

pub fn parse_fixture(name: &str, mode: Mode) -> Document {
    cgml_babel::parse(&fixture(name), mode)
        .unwrap_or_else(|e| panic!("Failed to parse {name}: {e}"))
}

/// Minimal document around a graph body, for error cases.
pub fn wrap_graph(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <data key="gFormat">Cyberiada-GraphML-1.0</data>
  <graph id="G">
{body}
  </graph>
</graphml>
"#
    )
}
