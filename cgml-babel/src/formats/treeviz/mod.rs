//! Treeviz formatter for CGML documents
//!
//! Treeviz is a visual representation of the document model, one line per
//! entity. Nesting follows the `parent` links, so a state's substates, notes
//! and pseudo-states show up below it even though the model stores them flat.
//!
//! So the format is :
//! <prefix><connector> <icon> <id> <label> (label truncated to 30 characters)
//!
//! Example:
//!
//! ⧉ Document Cyberiada-GraphML-1.0 (1 state machines)
//! └─ ⚙ G Blinker
//!   ├─ ◈ coreMeta platform=ArduinoUno
//!   ├─ ▢ n0 On
//!   │ └─ ▢ n0::n1 Blinking
//!   ├─ ⊡ c0 timer: Timer
//!   ├─ ● init initial
//!   └─ → e0 init → n0
//!
//! Icons
//!     Document: ⧉
//!     StateMachine: ⚙
//!     Meta: ◈
//!     State: ▢
//!     Action: ⚡
//!     Component: ⊡
//!     Note: ✎
//!     Vertex: ●
//!     Transition: →

use crate::common::actions::{serialize_actions, serialize_transition_actions};
use crate::common::flat_to_nested::DEFAULT_META_ID;
use crate::error::CgmlError;
use crate::format::Format;
use crate::model::{Actions, Document, StateMachine};
use std::collections::HashMap;

const LABEL_WIDTH: usize = 30;

fn get_icon(kind: &str) -> &'static str {
    match kind {
        "Document" => "⧉",
        "StateMachine" => "⚙",
        "Meta" => "◈",
        "State" => "▢",
        "Action" => "⚡",
        "Component" => "⊡",
        "Note" => "✎",
        "Vertex" => "●",
        "Transition" => "→",
        _ => "?",
    }
}

/// One rendered line and the lines nested below it
struct Item {
    icon: &'static str,
    label: String,
    children: Vec<Item>,
}

impl Item {
    fn new(kind: &str, id: &str, label: &str) -> Self {
        let label = truncate(label);
        Item {
            icon: get_icon(kind),
            label: if label.is_empty() {
                id.to_string()
            } else {
                format!("{id} {label}")
            },
            children: Vec::new(),
        }
    }
}

fn truncate(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > LABEL_WIDTH || text.lines().nth(1).is_some() {
        let head: String = line.chars().take(LABEL_WIDTH - 1).collect();
        format!("{head}…")
    } else {
        line.to_string()
    }
}

fn format_item(item: &Item, prefix: &str, is_last: bool, output: &mut String) {
    let connector = if is_last { "└─" } else { "├─" };
    output.push_str(&format!("{prefix}{connector} {} {}\n", item.icon, item.label));

    let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    format_children(&item.children, &child_prefix, output);
}

fn format_children(children: &[Item], prefix: &str, output: &mut String) {
    let count = children.len();
    for (i, child) in children.iter().enumerate() {
        format_item(child, prefix, i == count - 1, output);
    }
}

/// States, notes and vertices whose parent is `parent`, each with its own subtree.
fn nested_items(machine: &StateMachine, parent: Option<&str>, show_actions: bool) -> Vec<Item> {
    let mut items = Vec::new();

    for (id, state) in &machine.states {
        if state.parent.as_deref() != parent {
            continue;
        }
        let mut item = Item::new("State", id, &state.name);
        if show_actions {
            item.children
                .extend(action_items(&state.actions, serialize_actions));
        }
        item.children.extend(nested_items(machine, Some(id), show_actions));
        items.push(item);
    }

    for (id, note) in &machine.notes {
        if note.parent.as_deref() == parent {
            let mut item = Item::new("Note", id, &note.text);
            item.children.extend(nested_items(machine, Some(id), show_actions));
            items.push(item);
        }
    }

    for (id, vertex) in machine.vertices() {
        if vertex.parent.as_deref() == parent {
            let mut item = Item::new("Vertex", id, vertex.vertex_type.as_str());
            item.children.extend(nested_items(machine, Some(id), show_actions));
            items.push(item);
        }
    }

    items
}

/// One item per action record, rendered the way the payload is written.
fn action_items<T>(actions: &Actions<T>, serialize: impl Fn(&[T]) -> String) -> Vec<Item> {
    let text = match actions {
        Actions::Text(text) => text.clone(),
        Actions::Structured(actions) => serialize(actions),
    };
    text.split("\n\n")
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .map(|record| {
            let (phrase, body) = record.split_once('/').unwrap_or((record, ""));
            let body = body.trim().replace('\n', "; ");
            Item::new("Action", &format!("{phrase}/"), &body)
        })
        .collect()
}

fn machine_item(id: &str, machine: &StateMachine, show_actions: bool) -> Item {
    let mut item = Item::new("StateMachine", id, machine.name.as_deref().unwrap_or_default());

    if machine.has_meta() {
        let mut values: Vec<String> = Vec::new();
        if let Some(platform) = &machine.platform {
            values.push(format!("platform={platform}"));
        }
        if let Some(version) = &machine.standard_version {
            values.push(format!("standardVersion={version}"));
        }
        values.extend(machine.meta.values.iter().map(|(k, v)| format!("{k}={v}")));
        let meta_id = if machine.meta.id.is_empty() {
            DEFAULT_META_ID
        } else {
            machine.meta.id.as_str()
        };
        item.children
            .push(Item::new("Meta", meta_id, &values.join(", ")));
    }

    let nested = nested_items(machine, None, show_actions);
    let (states, rest): (Vec<Item>, Vec<Item>) = nested
        .into_iter()
        .partition(|child| child.icon == get_icon("State"));
    item.children.extend(states);

    for (node_id, component) in machine.ordered_components() {
        let label = format!("{}: {}", component.id, component.component_type);
        item.children.push(Item::new("Component", node_id, &label));
    }
    item.children.extend(rest);

    for (transition_id, transition) in &machine.transitions {
        let label = format!("{} → {}", transition.source, transition.target);
        let mut child = Item::new("Transition", transition_id, &label);
        if show_actions {
            child.children.extend(action_items(
                &transition.actions,
                serialize_transition_actions,
            ));
        }
        item.children.push(child);
    }

    item
}

pub fn to_treeviz_str(doc: &Document) -> String {
    to_treeviz_str_with_params(doc, &HashMap::new())
}

/// Convert a document to treeviz string with optional parameters
///
/// # Parameters
///
/// - `"actions"`: When set to `"true"`, lists the action records of every
///   state and transition below it.
pub fn to_treeviz_str_with_params(doc: &Document, params: &HashMap<String, String>) -> String {
    let show_actions = params
        .get("actions")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);

    let mut output = format!(
        "{} Document {} ({} state machines)\n",
        get_icon("Document"),
        doc.format,
        doc.state_machines.len()
    );

    let machines: Vec<Item> = doc
        .state_machines
        .iter()
        .map(|(id, machine)| machine_item(id, machine, show_actions))
        .collect();
    format_children(&machines, "", &mut output);
    output
}

/// Format implementation for treeviz format
pub struct TreevizFormat;

impl Format for TreevizFormat {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn description(&self) -> &str {
        "Visual tree of state machines with Unicode icons"
    }

    fn file_extensions(&self) -> &[&str] {
        &["tree", "treeviz"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, doc: &Document) -> Result<String, CgmlError> {
        Ok(to_treeviz_str(doc))
    }

    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<String, CgmlError> {
        Ok(to_treeviz_str_with_params(doc, options))
    }
}
