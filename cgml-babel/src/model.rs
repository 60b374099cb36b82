//! Document model
//!
//! Typed entities decoded from a CGML document. Nesting is expressed only
//! through `parent` links: every state, vertex and note of a state machine
//! lives in the machine's flat containers regardless of its depth.

use crate::schema::default_keys;
pub use crate::tree::{DataEntry, KeyNode, Point, Rectangle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Format tag written into new documents.
pub const CGML_FORMAT: &str = "Cyberiada-GraphML-1.0";
/// Format tags accepted on import.
pub const KNOWN_FORMATS: &[&str] = &["Cyberiada-GraphML-1.0", "Cyberiada-GraphML"];

/// How action payloads are represented in the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Trigger/action records parsed into [`Action`] and [`TransitionAction`]
    #[default]
    Structured,
    /// Raw payload text, untouched
    Text,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Structured => "structured",
            Mode::Text => "text",
        }
    }
}

/// Action payload of a state or transition, shaped by [`Mode`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Actions<T> {
    Text(String),
    Structured(Vec<T>),
}

impl<T> Actions<T> {
    pub fn empty(mode: Mode) -> Self {
        match mode {
            Mode::Structured => Actions::Structured(Vec::new()),
            Mode::Text => Actions::Text(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Actions::Text(text) => text.is_empty(),
            Actions::Structured(actions) => actions.is_empty(),
        }
    }

    pub fn matches(&self, mode: Mode) -> bool {
        matches!(
            (self, mode),
            (Actions::Text(_), Mode::Text) | (Actions::Structured(_), Mode::Structured)
        )
    }
}

/// `event[condition] postfix`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postfix: Option<String>,
}

impl Trigger {
    pub fn event(event: impl Into<String>) -> Self {
        Trigger {
            event: Some(event.into()),
            ..Trigger::default()
        }
    }
}

/// One handler of a state (`entry`, `exit` or a custom event)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub trigger: Trigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// One record of a transition payload; the trigger may be absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub bounds: Rectangle,
    pub actions: Actions<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub unsupported_data_nodes: Vec<DataEntry>,
}

impl State {
    pub fn new(name: impl Into<String>, mode: Mode) -> Self {
        State {
            name: name.into(),
            bounds: Rectangle::default(),
            actions: Actions::empty(mode),
            color: None,
            parent: None,
            unsupported_data_nodes: Vec::new(),
        }
    }
}

/// Pseudo-state kinds. Unknown markers keep their raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VertexType {
    Initial,
    Final,
    Choice,
    Terminate,
    Unknown(String),
}

impl VertexType {
    pub fn as_str(&self) -> &str {
        match self {
            VertexType::Initial => "initial",
            VertexType::Final => "final",
            VertexType::Choice => "choice",
            VertexType::Terminate => "terminate",
            VertexType::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for VertexType {
    fn from(marker: &str) -> Self {
        match marker {
            "initial" => VertexType::Initial,
            "final" => VertexType::Final,
            "choice" => VertexType::Choice,
            "terminate" => VertexType::Terminate,
            other => VertexType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for VertexType {
    fn from(marker: String) -> Self {
        VertexType::from(marker.as_str())
    }
}

impl From<VertexType> for String {
    fn from(vertex_type: VertexType) -> Self {
        vertex_type.as_str().to_string()
    }
}

impl fmt::Display for VertexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pseudo-state. `position` has width/height -1 when only a point was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(rename = "type")]
    pub vertex_type: VertexType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Rectangle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub unsupported_data_nodes: Vec<DataEntry>,
}

impl Vertex {
    pub fn new(vertex_type: VertexType) -> Self {
        Vertex {
            vertex_type,
            data: None,
            position: None,
            parent: None,
            unsupported_data_nodes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub source: String,
    pub target: String,
    pub actions: Actions<TransitionAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<String>,
    #[serde(default)]
    pub unsupported_data_nodes: Vec<DataEntry>,
}

impl Transition {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        mode: Mode,
    ) -> Self {
        Transition {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            actions: Actions::empty(mode),
            color: None,
            position: None,
            label_position: None,
            pivot: None,
            unsupported_data_nodes: Vec::new(),
        }
    }
}

/// A typed, parameterized unit used by the state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub parameters: BTreeMap<String, String>,
    /// Declaration position inside its state machine
    pub order: usize,
    #[serde(default)]
    pub unsupported_data_nodes: Vec<DataEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Formal,
    #[default]
    Informal,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Formal => "formal",
            NoteType::Informal => "informal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub position: Point,
    pub text: String,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub unsupported_data_nodes: Vec<DataEntry>,
}

impl Default for Note {
    fn default() -> Self {
        Note {
            name: None,
            position: Point::new(0.0, 0.0),
            text: String::new(),
            note_type: NoteType::Informal,
            parent: None,
            unsupported_data_nodes: Vec::new(),
        }
    }
}

/// State-machine metadata carried by the CGML_META note
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Id of the note node that carried the metadata
    pub id: String,
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Rectangle>,
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_version: Option<String>,
    pub states: BTreeMap<String, State>,
    pub transitions: BTreeMap<String, Transition>,
    pub components: BTreeMap<String, Component>,
    pub notes: BTreeMap<String, Note>,
    pub initial_states: BTreeMap<String, Vertex>,
    pub finals: BTreeMap<String, Vertex>,
    pub choices: BTreeMap<String, Vertex>,
    pub terminates: BTreeMap<String, Vertex>,
    pub unknown_vertexes: BTreeMap<String, Vertex>,
    #[serde(default)]
    pub unsupported_data_nodes: Vec<DataEntry>,
}

impl StateMachine {
    /// Container a vertex of the given type is filed under.
    pub fn vertex_container_mut(
        &mut self,
        vertex_type: &VertexType,
    ) -> &mut BTreeMap<String, Vertex> {
        match vertex_type {
            VertexType::Initial => &mut self.initial_states,
            VertexType::Final => &mut self.finals,
            VertexType::Choice => &mut self.choices,
            VertexType::Terminate => &mut self.terminates,
            VertexType::Unknown(_) => &mut self.unknown_vertexes,
        }
    }

    /// All vertices: initial, choice, final, terminate, unknown.
    pub fn vertices(&self) -> impl Iterator<Item = (&String, &Vertex)> {
        self.initial_states
            .iter()
            .chain(self.choices.iter())
            .chain(self.finals.iter())
            .chain(self.terminates.iter())
            .chain(self.unknown_vertexes.iter())
    }

    /// Whether a meta note has to be written for this machine.
    pub fn has_meta(&self) -> bool {
        !self.meta.id.is_empty()
            || !self.meta.values.is_empty()
            || self.platform.is_some()
            || self.standard_version.is_some()
    }

    /// Components sorted by declaration order, ties kept in id order.
    pub fn ordered_components(&self) -> Vec<(&String, &Component)> {
        let mut components: Vec<_> = self.components.iter().collect();
        components.sort_by_key(|(_, component)| component.order);
        components
    }
}

/// A whole CGML document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub format: String,
    pub keys: Vec<KeyNode>,
    pub state_machines: BTreeMap<String, StateMachine>,
}

impl Document {
    /// Empty document with the default header.
    pub fn new() -> Self {
        Document {
            format: CGML_FORMAT.to_string(),
            keys: default_keys(),
            state_machines: BTreeMap::new(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
