//! Key vocabulary and key-schema registry
//!
//! The dialect assigns meaning to a closed set of data keys ([`DataKey`]).
//! The document header additionally declares which keys are legal for which
//! element kind; [`KeySchema`] records those declarations so the importer can
//! validate data entries when strict key checking is requested.

use crate::error::{CgmlError, Result};
use crate::tree::KeyNode;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Data keys the dialect interprets. Everything else is passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKey {
    Format,
    Name,
    Data,
    Geometry,
    Color,
    Note,
    Vertex,
    Pivot,
    LabelGeometry,
    StateMachine,
}

impl DataKey {
    pub const ALL: [DataKey; 10] = [
        DataKey::Format,
        DataKey::Name,
        DataKey::Data,
        DataKey::Geometry,
        DataKey::Color,
        DataKey::Note,
        DataKey::Vertex,
        DataKey::Pivot,
        DataKey::LabelGeometry,
        DataKey::StateMachine,
    ];

    /// Look up a key string in the closed vocabulary.
    pub fn from_key(key: &str) -> Option<DataKey> {
        DataKey::ALL.into_iter().find(|k| k.as_str() == key)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataKey::Format => "gFormat",
            DataKey::Name => "dName",
            DataKey::Data => "dData",
            DataKey::Geometry => "dGeometry",
            DataKey::Color => "dColor",
            DataKey::Note => "dNote",
            DataKey::Vertex => "dVertex",
            DataKey::Pivot => "dPivot",
            DataKey::LabelGeometry => "dLabelGeometry",
            DataKey::StateMachine => "dStateMachine",
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element kinds a key can be declared for (`<key for="...">`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScope {
    Graphml,
    Graph,
    Node,
    Edge,
}

impl KeyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyScope::Graphml => "graphml",
            KeyScope::Graph => "graph",
            KeyScope::Node => "node",
            KeyScope::Edge => "edge",
        }
    }
}

/// Declared (scope, key) pairs of one document.
#[derive(Debug, Clone, Default)]
pub struct KeySchema {
    declared: HashMap<String, HashSet<String>>,
}

impl KeySchema {
    /// Build the registry from the header declarations.
    ///
    /// Declaring the same key twice for the same scope is an error.
    pub fn from_keys(keys: &[KeyNode]) -> Result<Self> {
        let mut declared: HashMap<String, HashSet<String>> = HashMap::new();
        for key in keys {
            let ids = declared.entry(key.scope.clone()).or_default();
            if !ids.insert(key.id.clone()) {
                return Err(CgmlError::DuplicateKey {
                    id: key.id.clone(),
                    scope: key.scope.clone(),
                });
            }
        }
        Ok(KeySchema { declared })
    }

    /// Whether the key belongs to the dialect's vocabulary at all.
    pub fn is_known(key: &str) -> bool {
        DataKey::from_key(key).is_some()
    }

    /// Whether the header declares `key` for `scope` (directly or via `all`).
    pub fn is_declared(&self, scope: KeyScope, key: &str) -> bool {
        [scope.as_str(), "all"].iter().any(|s| {
            self.declared
                .get(*s)
                .is_some_and(|ids| ids.contains(key))
        })
    }

    /// Error unless `key` is declared for `scope`.
    pub fn check(&self, scope: KeyScope, key: &str) -> Result<()> {
        if self.is_declared(scope, key) {
            Ok(())
        } else {
            Err(CgmlError::UndeclaredKey {
                key: key.to_string(),
                scope: scope.as_str().to_string(),
            })
        }
    }
}

/// Key declarations written into documents created from scratch.
pub fn default_keys() -> Vec<KeyNode> {
    vec![
        KeyNode::new("gFormat", "graphml").with_attr("format", "string"),
        KeyNode::new("dName", "graph").with_attr("name", "string"),
        KeyNode::new("dName", "node").with_attr("name", "string"),
        KeyNode::new("dStateMachine", "graph").with_attr("stateMachine", "string"),
        KeyNode::new("dGeometry", "graph"),
        KeyNode::new("dGeometry", "node"),
        KeyNode::new("dGeometry", "edge"),
        KeyNode::new("dData", "node").with_attr("data", "string"),
        KeyNode::new("dData", "edge").with_attr("data", "string"),
        KeyNode::new("dNote", "node").with_attr("note", "string"),
        KeyNode::new("dVertex", "node").with_attr("vertex", "string"),
        KeyNode::new("dColor", "node").with_attr("color", "string"),
        KeyNode::new("dColor", "edge").with_attr("color", "string"),
        KeyNode::new("dPivot", "edge").with_attr("pivot", "string"),
        KeyNode::new("dLabelGeometry", "edge"),
    ]
}
