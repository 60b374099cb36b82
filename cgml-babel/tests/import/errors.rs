//! Fatal import conditions. Each aborts the whole call.

use crate::common::{fixture, wrap_graph};
use cgml_babel::{parse, parse_with_options, CgmlError, ImportOptions, Mode};

fn parse_graph(body: &str) -> Result<cgml_babel::Document, CgmlError> {
    parse(&wrap_graph(body), Mode::Structured)
}

#[test]
fn test_conflicting_format() {
    let source = r#"<graphml>
  <data key="gFormat">Cyberiada-GraphML-1.0</data>
  <data key="gFormat">yEd</data>
  <graph id="G"/>
</graphml>"#;
    assert_eq!(
        parse(source, Mode::Structured).unwrap_err(),
        CgmlError::DuplicateFormat {
            old: "Cyberiada-GraphML-1.0".to_string(),
            new: "yEd".to_string(),
        }
    );
}

#[test]
fn test_unknown_or_missing_format() {
    let unknown = r#"<graphml><data key="gFormat">yEd</data><graph id="G"/></graphml>"#;
    assert_eq!(
        parse(unknown, Mode::Structured).unwrap_err(),
        CgmlError::UnknownFormat("yEd".to_string())
    );

    let missing = r#"<graphml><graph id="G"/></graphml>"#;
    assert!(matches!(
        parse(missing, Mode::Structured),
        Err(CgmlError::UnknownFormat(_))
    ));
}

#[test]
fn test_two_meta_notes() {
    let meta = |id: &str| {
        format!(
            r#"<node id="{id}">
                 <data key="dNote">formal</data>
                 <data key="dName">CGML_META</data>
                 <data key="dData">platform/ ArduinoUno</data>
               </node>"#
        )
    };
    let result = parse_graph(&format!("{}{}", meta("m1"), meta("m2")));
    assert_eq!(
        result.unwrap_err(),
        CgmlError::DuplicateMeta {
            state_machine: "G".to_string(),
            node: "m2".to_string(),
        }
    );
}

#[test]
fn test_geometry_without_coordinates() {
    let result = parse_graph(
        r#"<node id="n"><data key="dGeometry"><rect width="10" height="10"/></data></node>"#,
    );
    assert_eq!(
        result.unwrap_err(),
        CgmlError::MissingCoordinate {
            element: "dGeometry".to_string(),
            coordinate: "x and y",
        }
    );

    let empty = parse_graph(r#"<node id="n"><data key="dGeometry"/></node>"#);
    assert_eq!(
        empty.unwrap_err(),
        CgmlError::MissingCoordinate {
            element: "n".to_string(),
            coordinate: "x and y",
        }
    );
}

#[test]
fn test_duplicate_component_id() {
    let component = |node: &str| {
        format!(
            r#"<node id="{node}">
                 <data key="dNote">formal</data>
                 <data key="dName">CGML_COMPONENT</data>
                 <data key="dData">id/ timer

type/ Timer</data>
               </node>"#
        )
    };
    let result = parse_graph(&format!("{}{}", component("c1"), component("c2")));
    assert_eq!(
        result.unwrap_err(),
        CgmlError::DuplicateComponent("timer".to_string())
    );
}

#[test]
fn test_state_record_without_trigger() {
    let result = parse_graph(
        r#"<node id="s"><data key="dData">/
orphan()</data></node>"#,
    );
    assert_eq!(
        result.unwrap_err(),
        CgmlError::MissingTrigger {
            element: "s".to_string(),
            record: String::new(),
        }
    );
}

#[test]
fn test_transition_phrase_matching_no_grammar() {
    let result = parse_graph(
        r#"<node id="s"/>
<edge id="t0" source="s" target="s"><data key="dData">button.click[on/
led.off()</data></edge>"#,
    );
    assert_eq!(
        result.unwrap_err(),
        CgmlError::MissingTrigger {
            element: "t0".to_string(),
            record: "button.click[on".to_string(),
        }
    );
}

#[test]
fn test_text_mode_does_not_parse_actions() {
    let source = wrap_graph(
        r#"<node id="s"><data key="dData">/
orphan()</data></node>"#,
    );
    assert!(parse(&source, Mode::Text).is_ok());
}

#[test]
fn test_formal_note_with_unknown_name() {
    let result = parse_graph(
        r#"<node id="n"><data key="dNote">formal</data><data key="dName">CGML_OTHER</data></node>"#,
    );
    assert_eq!(
        result.unwrap_err(),
        CgmlError::UnknownFormalNote {
            node: "n".to_string(),
            name: "CGML_OTHER".to_string(),
        }
    );
}

#[test]
fn test_malformed_component_parameters() {
    let result = parse_graph(
        r#"<node id="c">
             <data key="dNote">formal</data>
             <data key="dName">CGML_COMPONENT</data>
             <data key="dData">id/ c

no separator here</data>
           </node>"#,
    );
    assert_eq!(
        result.unwrap_err(),
        CgmlError::MalformedParameter("no separator here".to_string())
    );
}

#[test]
fn test_misplaced_state_machine_key() {
    let result = parse_graph(r#"<node id="n"><data key="dStateMachine"/></node>"#);
    assert_eq!(
        result.unwrap_err(),
        CgmlError::MisplacedKey {
            key: "dStateMachine".to_string(),
            element: "n".to_string(),
        }
    );
}

#[test]
fn test_duplicate_key_declaration() {
    let source = r#"<graphml>
  <data key="gFormat">Cyberiada-GraphML-1.0</data>
  <key id="dName" for="node"/>
  <key id="dName" for="node"/>
</graphml>"#;
    assert!(matches!(
        parse(source, Mode::Structured),
        Err(CgmlError::DuplicateKey { .. })
    ));
}

#[test]
fn test_strict_mode_rejects_undeclared_key() {
    let source = fixture("blinker.graphml").replace(
        "<data key=\"dName\">Off</data>",
        "<data key=\"dName\">Off</data><data key=\"dSecret\">x</data>",
    );
    let strict = ImportOptions {
        mode: Mode::Structured,
        strict_keys: true,
    };
    assert_eq!(
        parse_with_options(&source, &strict).unwrap_err(),
        CgmlError::UndeclaredKey {
            key: "dSecret".to_string(),
            scope: "node".to_string(),
        }
    );
    // Lenient by default: the entry becomes passthrough
    let doc = parse(&source, Mode::Structured).unwrap();
    assert_eq!(
        doc.state_machines["G"].states["off"].unsupported_data_nodes[0].key,
        "dSecret"
    );
}

#[test]
fn test_malformed_xml() {
    assert!(matches!(
        parse("<graphml><graph>", Mode::Structured),
        Err(CgmlError::Xml(_))
    ));
}
