//! Generic attributed tree
//!
//!     The boundary format between XML text and the document model. The reader
//!     (./reader.rs) produces it from XML, the writer (./writer.rs) turns it back
//!     into XML. The importer and exporter only ever see this tree, never XML.
//!
//!     Normalization rule: every repeatable child (`data`, `key`, `graph`,
//!     `node`, `edge`) is a `Vec`, even when the XML holds exactly one element.
//!     A data entry carries at most one shape, the first `<rect>` or `<point>`
//!     child. Text content is trimmed of surrounding whitespace.

use serde::{Deserialize, Serialize};

mod reader;
mod writer;

pub use reader::read_document;
pub use writer::{write_document, WriterOptions};

/// A point shape inside a data entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// A rectangle shape inside a data entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }

    /// Position-only rectangle, width and height set to -1.
    pub fn from_point(point: Point) -> Self {
        Rectangle::new(point.x, point.y, -1.0, -1.0)
    }

    /// False for rectangles built from a bare point.
    pub fn has_size(&self) -> bool {
        !(self.width < 0.0 && self.height < 0.0)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl Default for Rectangle {
    fn default() -> Self {
        Rectangle::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// Structured child of a data entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Rect(Rectangle),
    Point(Point),
}

/// A `<data>` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
    pub key: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
}

impl DataEntry {
    pub fn text(key: impl Into<String>, content: impl Into<String>) -> Self {
        DataEntry {
            key: key.into(),
            content: content.into(),
            shape: None,
        }
    }

    pub fn with_shape(key: impl Into<String>, shape: Shape) -> Self {
        DataEntry {
            key: key.into(),
            content: String::new(),
            shape: Some(shape),
        }
    }
}

/// A `<key>` declaration from the document header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyNode {
    pub id: String,
    #[serde(rename = "for")]
    pub scope: String,
    #[serde(rename = "attr.name", default, skip_serializing_if = "Option::is_none")]
    pub attr_name: Option<String>,
    #[serde(rename = "attr.type", default, skip_serializing_if = "Option::is_none")]
    pub attr_type: Option<String>,
}

impl KeyNode {
    pub fn new(id: impl Into<String>, scope: impl Into<String>) -> Self {
        KeyNode {
            id: id.into(),
            scope: scope.into(),
            attr_name: None,
            attr_type: None,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.attr_name = Some(name.into());
        self.attr_type = Some(kind.into());
        self
    }
}

/// A `<node>` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub data: Vec<DataEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<Graph>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Node {
            id: id.into(),
            data: Vec::new(),
            graph: None,
        }
    }

    /// First data entry with the given key
    pub fn find_data(&self, key: &str) -> Option<&DataEntry> {
        self.data.iter().find(|entry| entry.key == key)
    }
}

/// An `<edge>` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    pub data: Vec<DataEntry>,
}

/// A `<graph>` element, top-level or nested in a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_default: Option<String>,
    pub data: Vec<DataEntry>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// The whole `<graphml>` document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub data: Vec<DataEntry>,
    pub keys: Vec<KeyNode>,
    pub graphs: Vec<Graph>,
}
