//! What the importer builds from the fixtures.

use crate::common::{fixture, parse_fixture};
use cgml_babel::model::{Action, Actions, NoteType, Point, Rectangle, TransitionAction, Trigger};
use cgml_babel::tree::DataEntry;
use cgml_babel::{parse_with_options, ImportOptions, Mode};

#[test]
fn test_blinker_end_to_end() {
    let doc = parse_fixture("blinker.graphml", Mode::Structured);
    assert_eq!(doc.format, "Cyberiada-GraphML-1.0");
    assert_eq!(doc.state_machines.len(), 1);

    let machine = &doc.state_machines["G"];
    assert_eq!(machine.name.as_deref(), Some("Blinker"));
    assert_eq!(machine.platform.as_deref(), Some("ArduinoUno"));
    assert_eq!(machine.standard_version.as_deref(), Some("1.0"));
    assert_eq!(machine.meta.id, "coreMeta");
    assert_eq!(
        machine.meta.values.keys().collect::<Vec<_>>(),
        vec!["author", "name"]
    );

    assert_eq!(machine.states.len(), 2);
    let off = &machine.states["off"];
    assert_eq!(off.name, "Off");
    assert_eq!(off.bounds, Rectangle::new(82.0, 57.0, 450.0, 95.0));
    assert_eq!(
        off.actions,
        Actions::Structured(vec![Action {
            trigger: Trigger::event("entry"),
            action: Some("diod1.turnOff()\ntimer1.start(1000)".to_string()),
        }])
    );
    let on = &machine.states["on"];
    assert_eq!(on.color.as_deref(), Some("#FFCC00"));
    match &on.actions {
        Actions::Structured(actions) => {
            assert_eq!(actions.len(), 2);
            assert_eq!(actions[1].trigger, Trigger::event("exit"));
            assert_eq!(actions[1].action, None);
        }
        other => panic!("Expected structured actions, got {other:?}"),
    }

    let init = &machine.initial_states["init"];
    assert_eq!(init.position, Some(Rectangle::from_point(Point::new(-50.0, 100.0))));

    let ids: Vec<_> = machine.transitions.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["init-off", "off-on", "on-off"]);
    let off_on = &machine.transitions["off-on"];
    assert_eq!(off_on.source, "off");
    assert_eq!(off_on.target, "on");
    assert_eq!(off_on.color.as_deref(), Some("#F29727"));
    assert_eq!(off_on.label_position, Some(Point::new(457.0, 173.0)));
    assert_eq!(
        off_on.actions,
        Actions::Structured(vec![TransitionAction {
            trigger: Some(Trigger::event("timer1.timeout")),
            action: None,
        }])
    );
    assert_eq!(
        machine.transitions["init-off"].actions,
        Actions::Structured(vec![])
    );

    let diod = &machine.components["diod1"];
    assert_eq!(diod.component_type, "LED");
    assert_eq!(diod.parameters["pin"], "12");
    assert_eq!(diod.order, 0);
    assert_eq!(machine.components["timer1"].order, 1);
}

#[test]
fn test_components_keep_declaration_order() {
    let doc = parse_fixture("components.graphml", Mode::Structured);
    let machine = &doc.state_machines["G"];

    let ordered: Vec<_> = machine
        .ordered_components()
        .into_iter()
        .map(|(id, _)| id.as_str())
        .collect();
    assert_eq!(ordered, vec!["zeta", "alpha", "mid"]);
    assert_eq!(machine.platform.as_deref(), Some("BearlogaDefend"));
}

#[test]
fn test_component_edges_are_stripped() {
    let doc = parse_fixture("components.graphml", Mode::Structured);
    assert!(doc.state_machines["G"].transitions.is_empty());
}

#[test]
fn test_edges_from_meta_id_kept_without_meta() {
    // "meta" is an ordinary state here, so its edges are real transitions
    let source = crate::common::wrap_graph(
        r#"<node id="meta"><data key="dName">Meta</data></node>
           <node id="b"/>
           <edge id="e" source="meta" target="b"/>"#,
    );
    let doc = cgml_babel::parse(&source, Mode::Structured).unwrap();
    assert!(doc.state_machines["G"].transitions.contains_key("e"));
}

#[test]
fn test_nested_parents() {
    let doc = parse_fixture("nested.graphml", Mode::Structured);
    let machine = &doc.state_machines["G"];

    assert_eq!(machine.states["top"].parent, None);
    assert_eq!(machine.states["middle"].parent.as_deref(), Some("top"));
    assert_eq!(machine.states["bottom"].parent.as_deref(), Some("middle"));
    assert_eq!(machine.states["outside"].parent, None);
    assert_eq!(
        machine.initial_states["middle-init"].parent.as_deref(),
        Some("middle")
    );
    assert_eq!(machine.notes["remark"].parent.as_deref(), Some("top"));
    assert_eq!(machine.notes["remark"].note_type, NoteType::Informal);
    assert_eq!(machine.transitions.len(), 2);
}

#[test]
fn test_pseudo_states() {
    let doc = parse_fixture("pseudo_states.graphml", Mode::Structured);
    let machine = &doc.state_machines["G"];

    assert!(machine.initial_states.contains_key("start"));
    assert!(machine.choices.contains_key("decide"));
    assert!(machine.terminates.contains_key("stop"));
    assert_eq!(
        machine.unknown_vertexes["history"].vertex_type.as_str(),
        "shallowHistory"
    );
    assert_eq!(machine.choices["decide"].data.as_deref(), Some("enough?"));
    assert_eq!(
        machine.choices["decide"].position,
        Some(Rectangle::new(400.0, 40.0, 20.0, 20.0))
    );
    assert_eq!(machine.terminates["stop"].position, None);
}

#[test]
fn test_transition_from_initial_needs_no_trigger() {
    let doc = parse_fixture("pseudo_states.graphml", Mode::Structured);
    let machine = &doc.state_machines["G"];
    assert_eq!(
        machine.transitions["e0"].actions,
        Actions::Structured(vec![TransitionAction {
            trigger: None,
            action: Some("setup()".to_string()),
        }])
    );
    assert_eq!(
        machine.transitions["e2"].actions,
        Actions::Structured(vec![TransitionAction {
            trigger: Some(Trigger {
                condition: Some("count > 3".to_string()),
                ..Trigger::default()
            }),
            action: None,
        }])
    );
}

#[test]
fn test_self_loop() {
    let doc = parse_fixture("self_loop.graphml", Mode::Structured);
    let tick = &doc.state_machines["G"].transitions["tick"];
    assert_eq!(tick.source, tick.target);
    assert_eq!(tick.pivot.as_deref(), Some("busy"));
    assert_eq!(tick.position, Some(Point::new(400.0, -40.0)));

    let done = &doc.state_machines["G"].transitions["done"];
    assert_eq!(
        done.actions,
        Actions::Structured(vec![TransitionAction {
            trigger: Some(Trigger {
                event: Some("timer.timeout".to_string()),
                condition: Some("counter == 10".to_string()),
                postfix: Some("propagate".to_string()),
            }),
            action: None,
        }])
    );
}

#[test]
fn test_two_machines() {
    let doc = parse_fixture("two_machines.graphml", Mode::Structured);
    assert_eq!(
        doc.state_machines.keys().collect::<Vec<_>>(),
        vec!["left", "right"]
    );
    assert_eq!(doc.state_machines["left"].states["a"].name, "A");
    assert_eq!(doc.state_machines["right"].states["a"].name, "A again");
    assert_eq!(
        doc.state_machines["left"].position,
        Some(Rectangle::new(0.0, 0.0, 400.0, 300.0))
    );
    assert!(doc.state_machines["right"].finals.contains_key("fin"));
}

#[test]
fn test_empty_state() {
    let doc = parse_fixture("empty_state.graphml", Mode::Structured);
    let state = &doc.state_machines["G"].states["empty"];
    assert_eq!(state.name, "");
    assert_eq!(state.bounds, Rectangle::default());
    assert!(state.actions.is_empty());
}

#[test]
fn test_passthrough_preserved() {
    let doc = parse_fixture("passthrough.graphml", Mode::Structured);
    let machine = &doc.state_machines["G"];

    assert_eq!(
        machine.unsupported_data_nodes,
        vec![DataEntry::text("dAuthor", "someone")]
    );
    assert_eq!(
        machine.states["s"].unsupported_data_nodes,
        vec![
            DataEntry::text("dHint", "state hint"),
            DataEntry::text("dHint", "second state hint"),
        ]
    );
    assert_eq!(
        machine.notes["note"].unsupported_data_nodes,
        vec![DataEntry::text("dHint", "note hint")]
    );
    assert_eq!(machine.notes["note"].name.as_deref(), Some("Reminder"));
    assert_eq!(
        machine.components["comp"].unsupported_data_nodes,
        vec![DataEntry::text("dHint", "component hint")]
    );
    assert_eq!(
        machine.transitions["loop"].unsupported_data_nodes,
        vec![DataEntry::text("dHint", "edge hint")]
    );
}

#[test]
fn test_strict_mode_accepts_declared_keys() {
    let strict = ImportOptions {
        mode: Mode::Structured,
        strict_keys: true,
    };
    for name in ["blinker.graphml", "passthrough.graphml", "nested.graphml"] {
        assert!(
            parse_with_options(&fixture(name), &strict).is_ok(),
            "{name} should pass strict key checks"
        );
    }
}

#[test]
fn test_text_mode_keeps_raw_payloads() {
    let doc = parse_fixture("blinker.graphml", Mode::Text);
    let machine = &doc.state_machines["G"];
    assert_eq!(
        machine.states["off"].actions,
        Actions::Text("entry/\ndiod1.turnOff()\ntimer1.start(1000)".to_string())
    );
    assert_eq!(
        machine.transitions["off-on"].actions,
        Actions::Text("timer1.timeout/".to_string())
    );
}

#[test]
fn test_legacy_geometry_attributes() {
    let source = crate::common::wrap_graph(
        r#"<node id="s"><data key="dGeometry" x="10" y="20" width="30" height="40"/></node>
           <node id="i"><data key="dVertex">initial</data><data key="dGeometry" x="1" y="2"/></node>"#,
    );
    let doc = cgml_babel::parse(&source, Mode::Structured).unwrap();
    let machine = &doc.state_machines["G"];
    assert_eq!(machine.states["s"].bounds, Rectangle::new(10.0, 20.0, 30.0, 40.0));
    assert_eq!(
        machine.initial_states["i"].position,
        Some(Rectangle::from_point(Point::new(1.0, 2.0)))
    );
}

#[test]
fn test_nested_graph_data_is_not_kept() {
    let source = crate::common::wrap_graph(
        r#"<node id="p">
             <data key="dName">Parent</data>
             <graph id="p:">
               <data key="dName">Inner</data>
               <data key="dColor">#ff0000</data>
               <node id="c"><data key="dName">Child</data></node>
             </graph>
           </node>"#,
    );
    let doc = cgml_babel::parse(&source, Mode::Structured).unwrap();
    let machine = &doc.state_machines["G"];
    assert_eq!(machine.states["p"].name, "Parent");
    assert!(machine.states["p"].unsupported_data_nodes.is_empty());
    assert_eq!(machine.states["c"].parent.as_deref(), Some("p"));
    assert!(machine.unsupported_data_nodes.is_empty());
}
