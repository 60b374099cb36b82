//! Converts the flat document model back into the nested attributed tree.
//!
//! # The High-Level Concept
//!
//! In the model, hierarchy is only a `parent` link on states, notes and
//! vertices. The tree needs the opposite: each child sits inside a `<graph>`
//! under its parent's `<node>`. Rather than recursing from the roots and
//! looking children up as we go, the exporter builds every entity node first
//! and then wires them together, so a bad parent link is found once and
//! reported instead of silently dropping a subtree.
//!
//! # The Algorithm
//!
//! 1. **Mode check:**
//!    - Every action field must have the shape of the requested [`Mode`]
//!
//! 2. **Flatten:**
//!    - Build one tree [`Node`] per state, note and vertex, tagged with its
//!      parent id and kind
//!
//! 3. **Wire (post-order):**
//!    - Index nodes by id; an unknown parent id is an error
//!    - Assemble each root, pulling its children into a nested graph whose id
//!      is the parent's id
//!    - Nodes never reached from a root sit on a parent cycle
//!
//! 4. **Machine graph:**
//!    - Meta node, root states, components by `order`, root notes, root vertices
//!    - Anchor edges from the meta node to each component, then transitions
//!
//! The model is only read; export never changes the document.
//! `nested_to_flat` performs the reverse conversion.

use super::actions::{serialize_actions, serialize_transition_actions};
use super::nested_to_flat::{
    COMPONENT_NOTE_NAME, META_NOTE_NAME, PLATFORM_KEY, STANDARD_VERSION_KEY,
};
use super::parameters::serialize_parameters;
use crate::error::{CgmlError, Result};
use crate::model::{
    Actions, Component, Document, Mode, Note, State, StateMachine, Transition, Vertex,
};
use crate::schema::DataKey;
use crate::tree::{DataEntry, Edge, Graph, Node, RawDocument, Rectangle, Shape};
use std::collections::HashMap;

/// Node id used for the meta note when the model does not name one.
pub const DEFAULT_META_ID: &str = "coreMeta";

/// Convert a document into an attributed tree.
pub fn export_document(document: &Document, mode: Mode) -> Result<RawDocument> {
    let mut graphs = Vec::with_capacity(document.state_machines.len());
    for (id, machine) in &document.state_machines {
        tracing::debug!(state_machine = %id, "exporting state machine");
        graphs.push(export_machine(id, machine, mode)?);
    }

    Ok(RawDocument {
        data: vec![DataEntry::text(DataKey::Format.as_str(), &document.format)],
        keys: document.keys.clone(),
        graphs,
    })
}

fn export_machine(id: &str, machine: &StateMachine, mode: Mode) -> Result<Graph> {
    check_mode(machine, mode)?;

    let mut data = vec![DataEntry::text(DataKey::StateMachine.as_str(), "")];
    if let Some(name) = &machine.name {
        data.push(DataEntry::text(DataKey::Name.as_str(), name));
    }
    if let Some(position) = &machine.position {
        data.push(geometry(position));
    }
    data.extend(machine.unsupported_data_nodes.iter().cloned());

    let roots = wire(flatten(machine))?;
    let roots_of = |kind: EntityKind| {
        roots
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, node)| node.clone())
    };

    let meta_id = if machine.meta.id.is_empty() {
        DEFAULT_META_ID
    } else {
        machine.meta.id.as_str()
    };
    let components = machine.ordered_components();

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    if machine.has_meta() {
        nodes.push(meta_node(meta_id, machine));
        edges.extend(components.iter().map(|(node_id, _)| Edge {
            id: Some(format!("{meta_id}-{node_id}")),
            source: meta_id.to_string(),
            target: node_id.to_string(),
            data: Vec::new(),
        }));
    }
    nodes.extend(roots_of(EntityKind::State));
    nodes.extend(
        components
            .iter()
            .map(|(node_id, component)| component_node(node_id, component)),
    );
    nodes.extend(roots_of(EntityKind::Note));
    nodes.extend(roots_of(EntityKind::Vertex));

    edges.extend(
        machine
            .transitions
            .iter()
            .map(|(id, transition)| transition_edge(id, transition)),
    );

    Ok(Graph {
        id: Some(id.to_string()),
        edge_default: Some("directed".to_string()),
        data,
        nodes,
        edges,
    })
}

fn check_mode(machine: &StateMachine, mode: Mode) -> Result<()> {
    let mismatch = |element: &str| CgmlError::ModeMismatch {
        element: element.to_string(),
        mode: mode.as_str(),
    };
    if let Some((id, _)) = machine
        .states
        .iter()
        .find(|(_, state)| !state.actions.matches(mode))
    {
        return Err(mismatch(id));
    }
    if let Some((id, _)) = machine
        .transitions
        .iter()
        .find(|(_, transition)| !transition.actions.matches(mode))
    {
        return Err(mismatch(id));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityKind {
    State,
    Note,
    Vertex,
}

struct FlatEntry<'a> {
    parent: Option<&'a str>,
    kind: EntityKind,
    node: Node,
}

fn flatten(machine: &StateMachine) -> Vec<FlatEntry<'_>> {
    let states = machine.states.iter().map(|(id, state)| FlatEntry {
        parent: state.parent.as_deref(),
        kind: EntityKind::State,
        node: state_node(id, state),
    });
    let notes = machine.notes.iter().map(|(id, note)| FlatEntry {
        parent: note.parent.as_deref(),
        kind: EntityKind::Note,
        node: note_node(id, note),
    });
    let vertices = machine.vertices().map(|(id, vertex)| FlatEntry {
        parent: vertex.parent.as_deref(),
        kind: EntityKind::Vertex,
        node: vertex_node(id, vertex),
    });
    states.chain(notes).chain(vertices).collect()
}

/// Attach every entry under its parent; returns the roots in entry order.
fn wire(entries: Vec<FlatEntry<'_>>) -> Result<Vec<(EntityKind, Node)>> {
    let positions: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| (entry.node.id.clone(), index))
        .collect();

    let mut children = vec![Vec::new(); entries.len()];
    let mut roots = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match entry.parent {
            None => roots.push(index),
            Some(parent) => {
                let position =
                    positions
                        .get(parent)
                        .ok_or_else(|| CgmlError::UnknownParent {
                            element: entry.node.id.clone(),
                            parent: parent.to_string(),
                        })?;
                children[*position].push(index);
            }
        }
    }

    let mut slots: Vec<Option<FlatEntry<'_>>> = entries.into_iter().map(Some).collect();
    let assembled: Vec<_> = roots
        .into_iter()
        .filter_map(|root| assemble(root, &mut slots, &children))
        .collect();

    if let Some(orphan) = slots.iter().flatten().next() {
        return Err(CgmlError::CyclicParent(orphan.node.id.clone()));
    }
    Ok(assembled)
}

fn assemble(
    index: usize,
    slots: &mut [Option<FlatEntry<'_>>],
    children: &[Vec<usize>],
) -> Option<(EntityKind, Node)> {
    let entry = slots[index].take()?;
    let mut node = entry.node;

    let nested: Vec<Node> = children[index]
        .iter()
        .filter_map(|&child| assemble(child, slots, children))
        .map(|(_, child)| child)
        .collect();
    if !nested.is_empty() {
        node.graph = Some(Graph {
            id: Some(node.id.clone()),
            nodes: nested,
            ..Graph::default()
        });
    }

    Some((entry.kind, node))
}

fn state_node(id: &str, state: &State) -> Node {
    let payload = match &state.actions {
        Actions::Text(text) => text.clone(),
        Actions::Structured(actions) => serialize_actions(actions),
    };

    let mut node = Node::new(id);
    node.data.push(DataEntry::text(DataKey::Name.as_str(), &state.name));
    node.data.push(DataEntry::text(DataKey::Data.as_str(), payload));
    node.data.push(geometry(&state.bounds));
    if let Some(color) = &state.color {
        node.data.push(DataEntry::text(DataKey::Color.as_str(), color));
    }
    node.data.extend(state.unsupported_data_nodes.iter().cloned());
    node
}

fn note_node(id: &str, note: &Note) -> Node {
    let mut node = Node::new(id);
    node.data.push(DataEntry::with_shape(
        DataKey::Geometry.as_str(),
        Shape::Point(note.position),
    ));
    node.data.push(DataEntry::text(
        DataKey::Note.as_str(),
        note.note_type.as_str(),
    ));
    node.data.extend(note.unsupported_data_nodes.iter().cloned());
    if let Some(name) = &note.name {
        node.data.push(DataEntry::text(DataKey::Name.as_str(), name));
    }
    node.data.push(DataEntry::text(DataKey::Data.as_str(), &note.text));
    node
}

fn vertex_node(id: &str, vertex: &Vertex) -> Node {
    let mut node = Node::new(id);
    node.data.push(DataEntry::text(
        DataKey::Vertex.as_str(),
        vertex.vertex_type.as_str(),
    ));
    if let Some(position) = &vertex.position {
        node.data.push(geometry(position));
    }
    if let Some(name) = &vertex.data {
        node.data.push(DataEntry::text(DataKey::Name.as_str(), name));
    }
    node.data.extend(vertex.unsupported_data_nodes.iter().cloned());
    node
}

fn component_node(id: &str, component: &Component) -> Node {
    let required = [
        ("id", component.id.as_str()),
        ("type", component.component_type.as_str()),
    ];
    let parameters = component
        .parameters
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()));

    let mut node = Node::new(id);
    node.data.push(DataEntry::text(DataKey::Note.as_str(), "formal"));
    node.data.push(DataEntry::text(
        DataKey::Name.as_str(),
        COMPONENT_NOTE_NAME,
    ));
    node.data.push(DataEntry::text(
        DataKey::Data.as_str(),
        serialize_parameters(required.into_iter().chain(parameters)),
    ));
    node.data.extend(component.unsupported_data_nodes.iter().cloned());
    node
}

fn meta_node(id: &str, machine: &StateMachine) -> Node {
    let lifted = [
        (PLATFORM_KEY, machine.platform.as_deref()),
        (STANDARD_VERSION_KEY, machine.standard_version.as_deref()),
    ];
    let values = lifted
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .chain(
            machine
                .meta
                .values
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );

    let mut node = Node::new(id);
    node.data.push(DataEntry::text(DataKey::Note.as_str(), "formal"));
    node.data.push(DataEntry::text(DataKey::Name.as_str(), META_NOTE_NAME));
    node.data.push(DataEntry::text(
        DataKey::Data.as_str(),
        serialize_parameters(values),
    ));
    node
}

fn transition_edge(id: &str, transition: &Transition) -> Edge {
    let payload = match &transition.actions {
        Actions::Text(text) => text.clone(),
        Actions::Structured(actions) => serialize_transition_actions(actions),
    };

    let mut data = Vec::new();
    if !payload.is_empty() {
        data.push(DataEntry::text(DataKey::Data.as_str(), payload));
    }
    if let Some(color) = &transition.color {
        data.push(DataEntry::text(DataKey::Color.as_str(), color));
    }
    if let Some(position) = transition.position {
        data.push(DataEntry::with_shape(
            DataKey::Geometry.as_str(),
            Shape::Point(position),
        ));
    }
    if let Some(label) = transition.label_position {
        data.push(DataEntry::with_shape(
            DataKey::LabelGeometry.as_str(),
            Shape::Point(label),
        ));
    }
    if let Some(pivot) = &transition.pivot {
        data.push(DataEntry::text(DataKey::Pivot.as_str(), pivot));
    }
    data.extend(transition.unsupported_data_nodes.iter().cloned());

    Edge {
        id: Some(id.to_string()),
        source: transition.source.clone(),
        target: transition.target.clone(),
        data,
    }
}

/// Rect when the rectangle has a size, point otherwise.
fn geometry(rectangle: &Rectangle) -> DataEntry {
    let shape = if rectangle.has_size() {
        Shape::Rect(*rectangle)
    } else {
        Shape::Point(rectangle.origin())
    };
    DataEntry::with_shape(DataKey::Geometry.as_str(), shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, Meta, Point, Trigger, VertexType};
    use std::collections::BTreeMap;

    fn machine_with_states(states: &[(&str, Option<&str>)]) -> StateMachine {
        let mut machine = StateMachine::default();
        for (id, parent) in states {
            let mut state = State::new(id.to_uppercase(), Mode::Structured);
            state.parent = parent.map(str::to_string);
            machine.states.insert(id.to_string(), state);
        }
        machine
    }

    fn single(machine: StateMachine) -> Document {
        let mut document = Document::new();
        document.state_machines.insert("G".to_string(), machine);
        document
    }

    fn export(document: &Document) -> Result<Graph> {
        export_document(document, Mode::Structured).map(|raw| raw.graphs[0].clone())
    }

    #[test]
    fn test_children_nest_under_parent() {
        let graph = export(&single(machine_with_states(&[
            ("a", None),
            ("b", Some("a")),
            ("c", Some("b")),
        ])))
        .unwrap();

        assert_eq!(graph.nodes.len(), 1);
        let a = &graph.nodes[0];
        let a_graph = a.graph.as_ref().unwrap();
        assert_eq!(a_graph.id.as_deref(), Some("a"));
        let b = &a_graph.nodes[0];
        assert_eq!(b.id, "b");
        assert_eq!(b.graph.as_ref().unwrap().nodes[0].id, "c");
    }

    #[test]
    fn test_unknown_parent_is_an_error() {
        let result = export(&single(machine_with_states(&[("a", Some("ghost"))])));
        assert_eq!(
            result.unwrap_err(),
            CgmlError::UnknownParent {
                element: "a".to_string(),
                parent: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_parent_cycle_is_an_error() {
        let result = export(&single(machine_with_states(&[
            ("root", None),
            ("x", Some("y")),
            ("y", Some("x")),
        ])));
        assert!(matches!(result, Err(CgmlError::CyclicParent(_))));
    }

    #[test]
    fn test_top_level_order_and_anchor_edges() {
        let mut machine = machine_with_states(&[("s", None)]);
        machine.platform = Some("ArduinoUno".to_string());
        machine.meta = Meta {
            id: "m".to_string(),
            values: BTreeMap::new(),
        };
        for (node, order) in [("z", 0), ("a", 1)] {
            machine.components.insert(
                node.to_string(),
                Component {
                    id: format!("comp_{node}"),
                    component_type: "Timer".to_string(),
                    parameters: BTreeMap::new(),
                    order,
                    unsupported_data_nodes: Vec::new(),
                },
            );
        }
        machine.notes.insert("n".to_string(), Note::default());
        machine
            .initial_states
            .insert("i".to_string(), Vertex::new(VertexType::Initial));

        let graph = export(&single(machine)).unwrap();
        let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["m", "s", "z", "a", "n", "i"]);

        let edges: Vec<_> = graph.edges.iter().filter_map(|e| e.id.as_deref()).collect();
        assert_eq!(edges, vec!["m-z", "m-a"]);

        let meta_data = graph.nodes[0].find_data("dData").unwrap();
        assert_eq!(meta_data.content, "platform/ ArduinoUno\n\n");
        let component_data = graph.nodes[2].find_data("dData").unwrap();
        assert_eq!(component_data.content, "id/ comp_z\n\ntype/ Timer\n\n");
    }

    #[test]
    fn test_no_meta_node_without_meta() {
        let mut machine = machine_with_states(&[]);
        machine.components.insert(
            "c".to_string(),
            Component {
                id: "c".to_string(),
                component_type: "Led".to_string(),
                parameters: BTreeMap::new(),
                order: 0,
                unsupported_data_nodes: Vec::new(),
            },
        );
        let graph = export(&single(machine)).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_point_sized_geometry_is_written_as_point() {
        let mut machine = StateMachine::default();
        let mut vertex = Vertex::new(VertexType::Choice);
        vertex.position = Some(Rectangle::from_point(Point::new(4.0, 2.0)));
        machine.choices.insert("c".to_string(), vertex);

        let graph = export(&single(machine)).unwrap();
        let geometry = graph.nodes[0].find_data("dGeometry").unwrap();
        assert_eq!(geometry.shape, Some(Shape::Point(Point::new(4.0, 2.0))));
    }

    #[test]
    fn test_transition_data_order() {
        let mut machine = StateMachine::default();
        let mut transition = Transition::new("e", "a", "b", Mode::Structured);
        transition.actions = Actions::Structured(vec![]);
        transition.pivot = Some("a".to_string());
        transition.color = Some("#000".to_string());
        transition.label_position = Some(Point::new(1.0, 1.0));
        transition
            .unsupported_data_nodes
            .push(DataEntry::text("dExtra", "x"));
        machine.transitions.insert("e".to_string(), transition);

        let graph = export(&single(machine)).unwrap();
        let keys: Vec<_> = graph.edges[0].data.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["dColor", "dLabelGeometry", "dPivot", "dExtra"]);
    }

    #[test]
    fn test_mode_mismatch_is_an_error() {
        let mut machine = StateMachine::default();
        let mut state = State::new("A", Mode::Structured);
        state.actions = Actions::Structured(vec![Action {
            trigger: Trigger::event("entry"),
            action: None,
        }]);
        machine.states.insert("a".to_string(), state);

        let result = export_document(&single(machine), Mode::Text);
        assert_eq!(
            result.unwrap_err(),
            CgmlError::ModeMismatch {
                element: "a".to_string(),
                mode: "text",
            }
        );
    }

    #[test]
    fn test_export_leaves_document_untouched() {
        let document = single(machine_with_states(&[("a", None), ("b", Some("a"))]));
        let before = document.clone();
        export_document(&document, Mode::Structured).unwrap();
        assert_eq!(document, before);
    }
}
