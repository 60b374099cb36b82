//! Export tests: structure of the written CGML

use crate::common::parse_fixture;
use cgml_babel::model::{Note, NoteType, Point, Rectangle, State, Vertex, VertexType};
use cgml_babel::tree::{self, Shape};
use cgml_babel::{serialize, serialize_with_options, CgmlError, Document, ExportOptions, Mode};

fn reread(document: &Document) -> tree::RawDocument {
    tree::read_document(&serialize(document, Mode::Structured).unwrap()).unwrap()
}

#[test]
fn test_header_and_graph_attributes() {
    let doc = parse_fixture("blinker.graphml", Mode::Structured);
    let output = serialize(&doc, Mode::Structured).unwrap();

    assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(output.contains("xmlns=\"http://graphml.graphdrawing.org/xmlns\""));
    assert!(output.contains("<data key=\"gFormat\">Cyberiada-GraphML-1.0</data>"));
    assert!(output.contains("edgedefault=\"directed\""));

    let raw = tree::read_document(&output).unwrap();
    assert_eq!(raw.keys, doc.keys);
    assert_eq!(raw.graphs.len(), 1);
    assert_eq!(raw.graphs[0].data[0].key, "dStateMachine");
}

#[test]
fn test_meta_first_then_anchor_edges() {
    let doc = parse_fixture("blinker.graphml", Mode::Structured);
    let raw = reread(&doc);
    let graph = &raw.graphs[0];

    let nodes: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(nodes, vec!["coreMeta", "off", "on", "diod1", "timer1", "init"]);

    let edges: Vec<_> = graph.edges.iter().filter_map(|e| e.id.as_deref()).collect();
    assert_eq!(
        edges,
        vec![
            "coreMeta-diod1",
            "coreMeta-timer1",
            "init-off",
            "off-on",
            "on-off"
        ]
    );
}

#[test]
fn test_meta_payload_order() {
    let doc = parse_fixture("blinker.graphml", Mode::Structured);
    let raw = reread(&doc);
    let meta = raw.graphs[0].nodes[0].find_data("dData").unwrap();
    assert_eq!(
        meta.content,
        "platform/ ArduinoUno\n\nstandardVersion/ 1.0\n\nauthor/ Lapki\n\nname/ Blink"
    );
}

#[test]
fn test_machine_without_meta_has_no_meta_node() {
    let doc = parse_fixture("self_loop.graphml", Mode::Structured);
    let raw = reread(&doc);
    let graph = &raw.graphs[0];
    assert!(graph
        .nodes
        .iter()
        .all(|node| node.find_data("dNote").is_none()));
}

#[test]
fn test_nested_graph_ids_follow_parents() {
    let doc = parse_fixture("nested.graphml", Mode::Structured);
    let raw = reread(&doc);
    let top = raw.graphs[0]
        .nodes
        .iter()
        .find(|node| node.id == "top")
        .unwrap();
    let inner = top.graph.as_ref().unwrap();
    assert_eq!(inner.id.as_deref(), Some("top"));
    let middle = inner.nodes.iter().find(|node| node.id == "middle").unwrap();
    assert_eq!(middle.graph.as_ref().unwrap().id.as_deref(), Some("middle"));
}

#[test]
fn test_point_and_rect_geometry() {
    let mut doc = Document::new();
    let mut machine = cgml_babel::model::StateMachine::default();
    let mut state = State::new("Sized", Mode::Structured);
    state.bounds = Rectangle::new(1.0, 2.0, 3.0, 4.0);
    machine.states.insert("s".to_string(), state);
    let mut vertex = Vertex::new(VertexType::Initial);
    vertex.position = Some(Rectangle::from_point(Point::new(5.0, 6.0)));
    machine.initial_states.insert("i".to_string(), vertex);
    machine.notes.insert(
        "n".to_string(),
        Note {
            position: Point::new(7.0, 8.0),
            text: "hello".to_string(),
            note_type: NoteType::Informal,
            ..Note::default()
        },
    );
    doc.state_machines.insert("G".to_string(), machine);

    let raw = reread(&doc);
    let shape = |id: &str| {
        raw.graphs[0]
            .nodes
            .iter()
            .find(|node| node.id == id)
            .and_then(|node| node.find_data("dGeometry"))
            .and_then(|entry| entry.shape)
    };
    assert_eq!(shape("s"), Some(Shape::Rect(Rectangle::new(1.0, 2.0, 3.0, 4.0))));
    assert_eq!(shape("i"), Some(Shape::Point(Point::new(5.0, 6.0))));
    assert_eq!(shape("n"), Some(Shape::Point(Point::new(7.0, 8.0))));
}

#[test]
fn test_indent_zero_writes_single_line_markup() {
    let doc = parse_fixture("self_loop.graphml", Mode::Structured);
    let output = serialize_with_options(
        &doc,
        &ExportOptions {
            mode: Mode::Structured,
            indent: 0,
        },
    )
    .unwrap();
    assert!(!output.contains("\n  <"));
    assert_eq!(cgml_babel::parse(&output, Mode::Structured).unwrap(), doc);
}

#[test]
fn test_text_document_rejected_in_structured_mode() {
    let doc = parse_fixture("blinker.graphml", Mode::Text);
    assert!(matches!(
        serialize(&doc, Mode::Structured),
        Err(CgmlError::ModeMismatch { .. })
    ));
}

#[test]
fn test_escaped_payloads() {
    let doc = parse_fixture("pseudo_states.graphml", Mode::Structured);
    let output = serialize(&doc, Mode::Structured).unwrap();
    assert!(output.contains("[count &gt; 3]/"));
}
