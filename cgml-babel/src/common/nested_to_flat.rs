//! Converts the nested attributed tree into the flat document model.
//!
//! # The High-Level Concept
//!
//! A CGML document nests states inside states through `<graph>` elements
//! hung below `<node>`. The model flattens that: every state, vertex and note
//! of a state machine lives in one container per kind, and nesting survives
//! only as a `parent` link. Importing is therefore a depth-first walk that
//! classifies each node, decodes the data entries it owns and files the result
//! under the machine, remembering the id of the node it was found under.
//!
//! # The Algorithm
//!
//! 1. **Header:**
//!    - Build the [`KeySchema`] from the `<key>` declarations
//!    - Capture `gFormat` and reject a missing, conflicting or unknown tag
//!
//! 2. **State machines:**
//!    - Every top-level graph opens a fresh [`MachineContext`]
//!    - Graph data sets the machine name and canvas, the rest is kept verbatim
//!
//! 3. **Nodes (depth-first):**
//!    - Classify as note, vertex or state ([`NodeKind`])
//!    - Decode the keys the kind owns; any other key is passthrough
//!    - Formal notes become the machine's meta block or a component
//!    - Recurse into a nested graph with the node id as parent
//!
//! 4. **Edges:**
//!    - Every edge at any depth becomes a transition keyed by its id
//!
//! 5. **Completion:**
//!    - Drop the structural edges leaving the meta node
//!    - Lift `platform` and `standardVersion` out of the meta values
//!
//! The context is created per machine and dropped at the end of the call, so
//! concurrent imports never share state. `flat_to_nested` performs the
//! reverse conversion.

use super::actions::{parse_actions, parse_transition_actions};
use super::parameters::parse_parameters;
use crate::error::{CgmlError, Result};
use crate::model::{
    Actions, Component, Document, Meta, Mode, Note, NoteType, State, StateMachine, Transition,
    Vertex, VertexType, KNOWN_FORMATS,
};
use crate::schema::{DataKey, KeySchema, KeyScope};
use crate::tree::{DataEntry, Edge, Graph, Node, Point, RawDocument, Rectangle, Shape};
use crate::ImportOptions;
use std::collections::{BTreeMap, HashSet};

pub(crate) const META_NOTE_NAME: &str = "CGML_META";
pub(crate) const COMPONENT_NOTE_NAME: &str = "CGML_COMPONENT";
pub(crate) const PLATFORM_KEY: &str = "platform";
pub(crate) const STANDARD_VERSION_KEY: &str = "standardVersion";

/// Convert an attributed tree into a document.
pub fn import_document(raw: &RawDocument, options: &ImportOptions) -> Result<Document> {
    let schema = KeySchema::from_keys(&raw.keys)?;
    let format = read_format(raw, &schema, options)?;

    let mut state_machines = BTreeMap::new();
    for (index, graph) in raw.graphs.iter().enumerate() {
        let id = graph.id.clone().unwrap_or_else(|| format!("G{index}"));
        if state_machines.contains_key(&id) {
            return Err(CgmlError::DuplicateStateMachine(id));
        }
        tracing::debug!(state_machine = %id, "importing state machine");

        let context = MachineContext::new(&id, &schema, options);
        let machine = context.import_graph(graph)?;
        state_machines.insert(id, machine);
    }

    Ok(Document {
        format,
        keys: raw.keys.clone(),
        state_machines,
    })
}

fn read_format(raw: &RawDocument, schema: &KeySchema, options: &ImportOptions) -> Result<String> {
    let mut format: Option<String> = None;
    for entry in &raw.data {
        if options.strict_keys {
            schema.check(KeyScope::Graphml, &entry.key)?;
        }
        if DataKey::from_key(&entry.key) != Some(DataKey::Format) {
            tracing::warn!(key = %entry.key, "ignoring document-level data");
            continue;
        }
        match &format {
            Some(old) if *old != entry.content => {
                return Err(CgmlError::DuplicateFormat {
                    old: old.clone(),
                    new: entry.content.clone(),
                });
            }
            _ => format = Some(entry.content.clone()),
        }
    }

    match format {
        Some(format) if KNOWN_FORMATS.contains(&format.as_str()) => Ok(format),
        Some(format) => Err(CgmlError::UnknownFormat(format)),
        None => Err(CgmlError::UnknownFormat(String::new())),
    }
}

/// What a `<node>` stands for, decided once from its markers
enum NodeKind<'a> {
    Note { marker: &'a str },
    Vertex { marker: &'a str },
    State,
}

fn classify(node: &Node) -> NodeKind<'_> {
    if let Some(note) = node.find_data(DataKey::Note.as_str()) {
        NodeKind::Note {
            marker: &note.content,
        }
    } else if let Some(vertex) = node.find_data(DataKey::Vertex.as_str()) {
        NodeKind::Vertex {
            marker: &vertex.content,
        }
    } else {
        NodeKind::State
    }
}

/// Per-machine import state threaded through the walk
struct MachineContext<'a> {
    id: &'a str,
    schema: &'a KeySchema,
    options: &'a ImportOptions,
    machine: StateMachine,
    component_order: usize,
    component_ids: HashSet<String>,
    meta_seen: bool,
    edge_count: usize,
}

impl<'a> MachineContext<'a> {
    fn new(id: &'a str, schema: &'a KeySchema, options: &'a ImportOptions) -> Self {
        MachineContext {
            id,
            schema,
            options,
            machine: StateMachine::default(),
            component_order: 0,
            component_ids: HashSet::new(),
            meta_seen: false,
            edge_count: 0,
        }
    }

    fn import_graph(mut self, graph: &Graph) -> Result<StateMachine> {
        for entry in &graph.data {
            self.check_key(KeyScope::Graph, entry)?;
            match DataKey::from_key(&entry.key) {
                Some(DataKey::StateMachine) => {}
                Some(DataKey::Name) => self.machine.name = Some(entry.content.clone()),
                Some(DataKey::Geometry) => {
                    self.machine.position = Some(rectangle_of(entry, self.id)?)
                }
                _ => {
                    tracing::trace!(key = %entry.key, "graph passthrough");
                    self.machine.unsupported_data_nodes.push(entry.clone());
                }
            }
        }

        self.walk_graph(graph, None)?;
        Ok(self.finish())
    }

    fn walk_graph(&mut self, graph: &Graph, parent: Option<&str>) -> Result<()> {
        for node in &graph.nodes {
            match classify(node) {
                NodeKind::Note { marker } => self.import_note(node, marker, parent)?,
                NodeKind::Vertex { marker } => self.import_vertex(node, marker, parent)?,
                NodeKind::State => self.import_state(node, parent)?,
            }

            if let Some(nested) = &node.graph {
                for entry in &nested.data {
                    tracing::warn!(node = %node.id, key = %entry.key, "ignoring nested graph data");
                }
                self.walk_graph(nested, Some(&node.id))?;
            }
        }

        for edge in &graph.edges {
            self.import_edge(edge)?;
        }
        Ok(())
    }

    fn import_state(&mut self, node: &Node, parent: Option<&str>) -> Result<()> {
        let mode = self.options.mode;
        let mut state = State::new(String::new(), mode);
        state.parent = parent.map(str::to_string);

        for entry in &node.data {
            self.check_key(KeyScope::Node, entry)?;
            match DataKey::from_key(&entry.key) {
                Some(DataKey::Name) => state.name = entry.content.clone(),
                Some(DataKey::Data) => {
                    state.actions = match mode {
                        Mode::Text => Actions::Text(entry.content.clone()),
                        Mode::Structured => {
                            Actions::Structured(parse_actions(&entry.content, &node.id)?)
                        }
                    }
                }
                Some(DataKey::Geometry) => state.bounds = rectangle_of(entry, &node.id)?,
                Some(DataKey::Color) => state.color = Some(entry.content.clone()),
                key => passthrough(key, entry, &node.id, &mut state.unsupported_data_nodes)?,
            }
        }

        self.machine.states.insert(node.id.clone(), state);
        Ok(())
    }

    fn import_vertex(&mut self, node: &Node, marker: &str, parent: Option<&str>) -> Result<()> {
        let vertex_type = VertexType::from(marker);
        let mut vertex = Vertex::new(vertex_type.clone());
        vertex.parent = parent.map(str::to_string);

        for entry in &node.data {
            self.check_key(KeyScope::Node, entry)?;
            match DataKey::from_key(&entry.key) {
                Some(DataKey::Vertex) => {}
                Some(DataKey::Name) => vertex.data = Some(entry.content.clone()),
                Some(DataKey::Geometry) => vertex.position = Some(rectangle_of(entry, &node.id)?),
                key => passthrough(key, entry, &node.id, &mut vertex.unsupported_data_nodes)?,
            }
        }

        if let VertexType::Unknown(raw) = &vertex_type {
            tracing::debug!(node = %node.id, vertex_type = %raw, "unknown vertex type");
        }
        self.machine
            .vertex_container_mut(&vertex_type)
            .insert(node.id.clone(), vertex);
        Ok(())
    }

    fn import_note(&mut self, node: &Node, marker: &str, parent: Option<&str>) -> Result<()> {
        let note_type = match marker {
            "" | "informal" => NoteType::Informal,
            "formal" => NoteType::Formal,
            other => {
                return Err(CgmlError::InvalidNoteType {
                    node: node.id.clone(),
                    value: other.to_string(),
                })
            }
        };

        let mut note = Note {
            note_type,
            parent: parent.map(str::to_string),
            ..Note::default()
        };
        for entry in &node.data {
            self.check_key(KeyScope::Node, entry)?;
            match DataKey::from_key(&entry.key) {
                Some(DataKey::Note) => {}
                Some(DataKey::Name) => {
                    if note.name.is_some() {
                        return Err(CgmlError::DuplicateNoteName(node.id.clone()));
                    }
                    note.name = Some(entry.content.clone());
                }
                Some(DataKey::Data) => note.text = entry.content.clone(),
                Some(DataKey::Geometry) => note.position = point_of(entry, &node.id)?,
                key => passthrough(key, entry, &node.id, &mut note.unsupported_data_nodes)?,
            }
        }

        match note_type {
            NoteType::Informal => {
                self.machine.notes.insert(node.id.clone(), note);
                Ok(())
            }
            NoteType::Formal => {
                let name = note.name.clone().unwrap_or_default();
                match name.as_str() {
                    COMPONENT_NOTE_NAME => self.import_component(node, note),
                    META_NOTE_NAME => self.import_meta(node, &note),
                    _ => Err(CgmlError::UnknownFormalNote {
                        node: node.id.clone(),
                        name,
                    }),
                }
            }
        }
    }

    fn import_component(&mut self, node: &Node, note: Note) -> Result<()> {
        let mut parameters = parse_parameters(&note.text)?;
        let missing = |field| CgmlError::MissingComponentField {
            node: node.id.clone(),
            field,
        };
        let id = parameters.remove("id").ok_or_else(|| missing("id"))?;
        let component_type = parameters.remove("type").ok_or_else(|| missing("type"))?;

        if self.machine.components.contains_key(&node.id) {
            return Err(CgmlError::DuplicateComponent(node.id.clone()));
        }
        if !self.component_ids.insert(id.clone()) {
            return Err(CgmlError::DuplicateComponent(id));
        }

        let component = Component {
            id,
            component_type,
            parameters,
            order: self.component_order,
            unsupported_data_nodes: note.unsupported_data_nodes,
        };
        self.component_order += 1;
        self.machine.components.insert(node.id.clone(), component);
        Ok(())
    }

    fn import_meta(&mut self, node: &Node, note: &Note) -> Result<()> {
        if self.meta_seen {
            return Err(CgmlError::DuplicateMeta {
                state_machine: self.id.to_string(),
                node: node.id.clone(),
            });
        }
        self.meta_seen = true;
        self.machine.meta = Meta {
            id: node.id.clone(),
            values: parse_parameters(&note.text)?,
        };
        Ok(())
    }

    fn import_edge(&mut self, edge: &Edge) -> Result<()> {
        let id = edge
            .id
            .clone()
            .unwrap_or_else(|| format!("{}-{}-{}", edge.source, edge.target, self.edge_count));
        self.edge_count += 1;

        let mode = self.options.mode;
        let mut transition = Transition::new(id.clone(), &edge.source, &edge.target, mode);
        for entry in &edge.data {
            self.check_key(KeyScope::Edge, entry)?;
            match DataKey::from_key(&entry.key) {
                Some(DataKey::Data) => {
                    transition.actions = match mode {
                        Mode::Text => Actions::Text(entry.content.clone()),
                        Mode::Structured => {
                            Actions::Structured(parse_transition_actions(&entry.content, &id)?)
                        }
                    }
                }
                Some(DataKey::Color) => transition.color = Some(entry.content.clone()),
                Some(DataKey::Geometry) => transition.position = Some(point_of(entry, &id)?),
                Some(DataKey::LabelGeometry) => match entry.shape {
                    Some(Shape::Point(point)) => transition.label_position = Some(point),
                    _ => return Err(missing_coordinate(&id)),
                },
                Some(DataKey::Pivot) => transition.pivot = Some(entry.content.clone()),
                key => passthrough(key, entry, &id, &mut transition.unsupported_data_nodes)?,
            }
        }

        if self.machine.transitions.contains_key(&id) {
            tracing::warn!(transition = %id, "duplicate edge id, keeping the last one");
        }
        self.machine.transitions.insert(id, transition);
        Ok(())
    }

    fn check_key(&self, scope: KeyScope, entry: &DataEntry) -> Result<()> {
        if self.options.strict_keys {
            self.schema.check(scope, &entry.key)?;
        }
        Ok(())
    }

    fn finish(mut self) -> StateMachine {
        if self.meta_seen {
            let meta_id = self.machine.meta.id.clone();
            self.machine
                .transitions
                .retain(|_, transition| transition.source != meta_id);
        }

        let values = &mut self.machine.meta.values;
        self.machine.platform = values.remove(PLATFORM_KEY);
        self.machine.standard_version = values.remove(STANDARD_VERSION_KEY);
        self.machine
    }
}

/// Keep an entry the entity does not interpret, unless its key can never appear here.
fn passthrough(
    key: Option<DataKey>,
    entry: &DataEntry,
    element: &str,
    sink: &mut Vec<DataEntry>,
) -> Result<()> {
    if let Some(misplaced @ (DataKey::Format | DataKey::StateMachine)) = key {
        return Err(CgmlError::MisplacedKey {
            key: misplaced.as_str().to_string(),
            element: element.to_string(),
        });
    }
    tracing::trace!(element, key = %entry.key, "passthrough");
    sink.push(entry.clone());
    Ok(())
}

fn rectangle_of(entry: &DataEntry, element: &str) -> Result<Rectangle> {
    match entry.shape {
        Some(Shape::Rect(rect)) => Ok(rect),
        Some(Shape::Point(point)) => Ok(Rectangle::from_point(point)),
        None => Err(missing_coordinate(element)),
    }
}

fn point_of(entry: &DataEntry, element: &str) -> Result<Point> {
    match entry.shape {
        Some(Shape::Point(point)) => Ok(point),
        Some(Shape::Rect(rect)) => Ok(rect.origin()),
        None => Err(missing_coordinate(element)),
    }
}

fn missing_coordinate(element: &str) -> CgmlError {
    CgmlError::MissingCoordinate {
        element: element.to_string(),
        coordinate: "x and y",
    }
}
