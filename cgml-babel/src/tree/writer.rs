use super::{DataEntry, Edge, Graph, KeyNode, Node, RawDocument, Shape};
use crate::error::{CgmlError, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub const GRAPHML_NAMESPACE: &str = "http://graphml.graphdrawing.org/xmlns";

/// Knobs for XML output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Spaces per nesting level, 0 writes everything on one line
    pub indent: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions { indent: 2 }
    }
}

/// Write the attributed tree as GraphML text.
pub fn write_document(document: &RawDocument, options: WriterOptions) -> Result<String> {
    let mut writer = if options.indent == 0 {
        Writer::new(Vec::new())
    } else {
        Writer::new_with_indent(Vec::new(), b' ', options.indent)
    };

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let mut root = BytesStart::new("graphml");
    root.push_attribute(("xmlns", GRAPHML_NAMESPACE));
    emit(&mut writer, Event::Start(root))?;

    for entry in &document.data {
        write_data(&mut writer, entry)?;
    }
    for key in &document.keys {
        write_key(&mut writer, key)?;
    }
    for graph in &document.graphs {
        write_graph(&mut writer, graph)?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("graphml")))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| CgmlError::Serialization(e.to_string()))
}

fn write_key(writer: &mut Writer<Vec<u8>>, key: &KeyNode) -> Result<()> {
    let mut start = BytesStart::new("key");
    push_attribute(&mut start, "id", &key.id);
    push_attribute(&mut start, "for", &key.scope);
    if let Some(name) = &key.attr_name {
        push_attribute(&mut start, "attr.name", name);
    }
    if let Some(kind) = &key.attr_type {
        push_attribute(&mut start, "attr.type", kind);
    }
    emit(writer, Event::Empty(start))
}

fn write_graph(writer: &mut Writer<Vec<u8>>, graph: &Graph) -> Result<()> {
    let mut start = BytesStart::new("graph");
    if let Some(id) = &graph.id {
        push_attribute(&mut start, "id", id);
    }
    if let Some(edge_default) = &graph.edge_default {
        push_attribute(&mut start, "edgedefault", edge_default);
    }

    if graph.data.is_empty() && graph.nodes.is_empty() && graph.edges.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for entry in &graph.data {
        write_data(writer, entry)?;
    }
    for node in &graph.nodes {
        write_node(writer, node)?;
    }
    for edge in &graph.edges {
        write_edge(writer, edge)?;
    }
    emit(writer, Event::End(BytesEnd::new("graph")))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    let mut start = BytesStart::new("node");
    push_attribute(&mut start, "id", &node.id);

    if node.data.is_empty() && node.graph.is_none() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for entry in &node.data {
        write_data(writer, entry)?;
    }
    if let Some(graph) = &node.graph {
        write_graph(writer, graph)?;
    }
    emit(writer, Event::End(BytesEnd::new("node")))
}

fn write_edge(writer: &mut Writer<Vec<u8>>, edge: &Edge) -> Result<()> {
    let mut start = BytesStart::new("edge");
    if let Some(id) = &edge.id {
        push_attribute(&mut start, "id", id);
    }
    push_attribute(&mut start, "source", &edge.source);
    push_attribute(&mut start, "target", &edge.target);

    if edge.data.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for entry in &edge.data {
        write_data(writer, entry)?;
    }
    emit(writer, Event::End(BytesEnd::new("edge")))
}

fn write_data(writer: &mut Writer<Vec<u8>>, entry: &DataEntry) -> Result<()> {
    let mut start = BytesStart::new("data");
    push_attribute(&mut start, "key", &entry.key);

    if entry.content.is_empty() && entry.shape.is_none() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if !entry.content.is_empty() {
        let escaped = escape_text(&entry.content);
        emit(writer, Event::Text(BytesText::from_escaped(escaped.as_str())))?;
    }
    if let Some(shape) = &entry.shape {
        write_shape(writer, shape)?;
    }
    emit(writer, Event::End(BytesEnd::new("data")))
}

fn write_shape(writer: &mut Writer<Vec<u8>>, shape: &Shape) -> Result<()> {
    let element = match shape {
        Shape::Rect(rect) => {
            let mut start = BytesStart::new("rect");
            start.push_attribute(("x", rect.x.to_string().as_str()));
            start.push_attribute(("y", rect.y.to_string().as_str()));
            start.push_attribute(("width", rect.width.to_string().as_str()));
            start.push_attribute(("height", rect.height.to_string().as_str()));
            start
        }
        Shape::Point(point) => {
            let mut start = BytesStart::new("point");
            start.push_attribute(("x", point.x.to_string().as_str()));
            start.push_attribute(("y", point.y.to_string().as_str()));
            start
        }
    };
    emit(writer, Event::Empty(element))
}

/// Character references for `\r` survive a re-read; a raw one is normalized
/// to `\n` by the XML parser.
fn escape_text(value: &str) -> String {
    escape(value).replace('\r', "&#13;")
}

/// Attribute values are also whitespace normalized on read, so `\n` and `\t`
/// are written as references too.
fn escape_attribute(value: &str) -> String {
    escape_text(value)
        .replace('\n', "&#10;")
        .replace('\t', "&#9;")
}

fn push_attribute(start: &mut BytesStart<'_>, key: &str, value: &str) {
    let escaped = escape_attribute(value);
    start.push_attribute((key.as_bytes(), escaped.as_bytes()));
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| CgmlError::Serialization(e.to_string()))
}
