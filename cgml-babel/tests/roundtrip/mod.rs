//! Round-trip identity: parse → serialize → parse yields the same model.

use crate::common::{fixture, parse_fixture, ROUNDTRIP_FIXTURES};
use cgml_babel::{parse, serialize, Mode};

fn assert_roundtrip(name: &str, mode: Mode) {
    let first = parse_fixture(name, mode);
    let written = serialize(&first, mode).unwrap_or_else(|e| panic!("{name}: {e}"));
    let second = parse(&written, mode).unwrap_or_else(|e| panic!("{name} reparse: {e}"));
    assert_eq!(first, second, "{name} changed in {} mode", mode.as_str());

    let rewritten = serialize(&second, mode).unwrap();
    assert_eq!(written, rewritten, "{name} output is not stable");
}

#[test]
fn test_fixtures_roundtrip_structured() {
    for name in ROUNDTRIP_FIXTURES {
        assert_roundtrip(name, Mode::Structured);
    }
}

#[test]
fn test_fixtures_roundtrip_text() {
    for name in ROUNDTRIP_FIXTURES {
        assert_roundtrip(name, Mode::Text);
    }
}

#[test]
fn test_modes_agree_on_everything_but_actions() {
    for name in ROUNDTRIP_FIXTURES {
        let structured = parse_fixture(name, Mode::Structured);
        let text = parse_fixture(name, Mode::Text);
        let converted = cgml_babel::common::convert_mode(&text, Mode::Structured).unwrap();
        assert_eq!(structured, converted, "{name}");
    }
}

#[test]
fn test_keys_roundtrip_verbatim() {
    let source = fixture("passthrough.graphml");
    let doc = parse(&source, Mode::Structured).unwrap();
    let again = parse(&serialize(&doc, Mode::Structured).unwrap(), Mode::Structured).unwrap();
    assert_eq!(doc.keys, again.keys);
    assert_eq!(doc.keys.len(), 17);
    assert_eq!(doc.keys[16].scope, "all");
}

#[test]
fn test_json_roundtrip() {
    let registry = cgml_babel::FormatRegistry::with_defaults();
    for name in ROUNDTRIP_FIXTURES {
        let doc = parse_fixture(name, Mode::Structured);
        let json = registry.serialize(&doc, "json").unwrap();
        assert_eq!(registry.parse(&json, "json").unwrap(), doc, "{name}");
    }
}

#[test]
fn test_character_references_roundtrip() {
    let source = crate::common::wrap_graph(
        r#"    <node id="n0">
      <data key="dName">On&#13;Off</data>
      <data key="dData">entry/
led.on()&#13;
timer.start()</data>
    </node>
    <edge id="t&#9;0" source="n0" target="n0"/>"#,
    );
    for mode in [Mode::Structured, Mode::Text] {
        let first = parse(&source, mode).unwrap();
        assert_eq!(first.state_machines["G"].states["n0"].name, "On\rOff");
        assert!(first.state_machines["G"].transitions.contains_key("t\t0"));

        let written = serialize(&first, mode).unwrap();
        assert!(written.contains("On&#13;Off"));
        assert!(written.contains("t&#9;0"));
        assert_eq!(parse(&written, mode).unwrap(), first, "{}", mode.as_str());
    }
}
