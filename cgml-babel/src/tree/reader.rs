use super::{DataEntry, Edge, Graph, KeyNode, Node, Point, RawDocument, Rectangle, Shape};
use crate::error::{CgmlError, Result};
use roxmltree::Node as XmlNode;

/// Read GraphML text into the attributed tree.
pub fn read_document(source: &str) -> Result<RawDocument> {
    let doc = roxmltree::Document::parse(source).map_err(|e| CgmlError::Xml(e.to_string()))?;

    let root = doc.root_element();
    if root.tag_name().name() != "graphml" {
        return Err(CgmlError::UnexpectedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let mut document = RawDocument::default();
    for child in root.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "data" => document.data.push(read_data(child)?),
            "key" => document.keys.push(read_key(child)?),
            "graph" => document.graphs.push(read_graph(child)?),
            _ => {
                // Skip unknown
            }
        }
    }

    Ok(document)
}

fn read_key(node: XmlNode) -> Result<KeyNode> {
    Ok(KeyNode {
        id: required_attribute(node, "key", "id")?,
        scope: required_attribute(node, "key", "for")?,
        attr_name: node.attribute("attr.name").map(str::to_string),
        attr_type: node.attribute("attr.type").map(str::to_string),
    })
}

fn read_graph(node: XmlNode) -> Result<Graph> {
    let mut graph = Graph {
        id: node.attribute("id").map(str::to_string),
        edge_default: node.attribute("edgedefault").map(str::to_string),
        ..Graph::default()
    };

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "data" => graph.data.push(read_data(child)?),
            "node" => graph.nodes.push(read_node(child)?),
            "edge" => graph.edges.push(read_edge(child)?),
            _ => {}
        }
    }

    Ok(graph)
}

fn read_node(node: XmlNode) -> Result<Node> {
    let mut result = Node::new(required_attribute(node, "node", "id")?);

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "data" => result.data.push(read_data(child)?),
            // A node holds at most one nested graph; later ones are ignored.
            "graph" if result.graph.is_none() => result.graph = Some(read_graph(child)?),
            _ => {}
        }
    }

    Ok(result)
}

fn read_edge(node: XmlNode) -> Result<Edge> {
    let mut edge = Edge {
        id: node.attribute("id").map(str::to_string),
        source: required_attribute(node, "edge", "source")?,
        target: required_attribute(node, "edge", "target")?,
        data: Vec::new(),
    };

    for child in node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "data")
    {
        edge.data.push(read_data(child)?);
    }

    Ok(edge)
}

fn read_data(node: XmlNode) -> Result<DataEntry> {
    let key = required_attribute(node, "data", "key")?;

    let content: String = node
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();

    let shape = match node
        .children()
        .find(|n| n.is_element() && matches!(n.tag_name().name(), "rect" | "point"))
    {
        Some(child) if child.tag_name().name() == "rect" => Some(read_rect(child, &key)?),
        Some(child) => Some(read_point(child, &key)?),
        None => read_legacy_shape(node, &key)?,
    };

    Ok(DataEntry {
        key,
        content: content.trim().to_string(),
        shape,
    })
}

fn read_rect(node: XmlNode, key: &str) -> Result<Shape> {
    let (x, y) = read_coordinates(node, key)?;
    let width = number_attribute(node, "width")?.ok_or_else(|| missing(key, "width"))?;
    let height = number_attribute(node, "height")?.ok_or_else(|| missing(key, "height"))?;
    Ok(Shape::Rect(Rectangle::new(x, y, width, height)))
}

fn read_point(node: XmlNode, key: &str) -> Result<Shape> {
    let (x, y) = read_coordinates(node, key)?;
    Ok(Shape::Point(Point::new(x, y)))
}

/// Older documents put the coordinates straight on `<data>`.
fn read_legacy_shape(node: XmlNode, key: &str) -> Result<Option<Shape>> {
    if node.attribute("x").is_none() && node.attribute("y").is_none() {
        return Ok(None);
    }
    let (x, y) = read_coordinates(node, key)?;
    match (
        number_attribute(node, "width")?,
        number_attribute(node, "height")?,
    ) {
        (Some(width), Some(height)) => Ok(Some(Shape::Rect(Rectangle::new(x, y, width, height)))),
        _ => Ok(Some(Shape::Point(Point::new(x, y)))),
    }
}

fn read_coordinates(node: XmlNode, key: &str) -> Result<(f64, f64)> {
    match (number_attribute(node, "x")?, number_attribute(node, "y")?) {
        (Some(x), Some(y)) => Ok((x, y)),
        (None, None) => Err(missing(key, "x and y")),
        (None, _) => Err(missing(key, "x")),
        (_, None) => Err(missing(key, "y")),
    }
}

fn number_attribute(node: XmlNode, name: &str) -> Result<Option<f64>> {
    node.attribute(name)
        .map(|value| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .ok_or_else(|| CgmlError::InvalidNumber {
                    attribute: name.to_string(),
                    value: value.to_string(),
                })
        })
        .transpose()
}

fn required_attribute(
    node: XmlNode,
    element: &'static str,
    attribute: &'static str,
) -> Result<String> {
    node.attribute(attribute)
        .map(str::to_string)
        .ok_or(CgmlError::MissingAttribute { element, attribute })
}

fn missing(key: &str, coordinate: &'static str) -> CgmlError {
    CgmlError::MissingCoordinate {
        element: key.to_string(),
        coordinate,
    }
}
