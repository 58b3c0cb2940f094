use std::collections::BTreeMap;

use roxmltree::{Document, Node, NodeType, ParsingOptions};
use wb_core::{BindError, SourceLocation, SourceSpan};

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElementNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElementNode),
    Text(XmlTextNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElementNode {
    /// Local name, prefix removed.
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: BTreeMap<String, String>,
    /// Namespaces in scope at this element, keyed by prefix ("" for the default).
    pub namespaces: BTreeMap<String, String>,
    pub children: Vec<XmlNode>,
    pub location: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlTextNode {
    pub value: String,
    pub location: SourceSpan,
}

impl XmlElementNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn element_children(&self) -> impl Iterator<Item = &XmlElementNode> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElementNode> + 'a {
        self.element_children().filter(move |child| child.name == name)
    }

    pub fn first_child(&self, name: &str) -> Option<&XmlElementNode> {
        self.element_children().find(|child| child.name == name)
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(&text.value),
                XmlNode::Element(element) => out.push_str(&element.text_content()),
            }
        }
        out
    }
}

pub fn parse_xml_document(location: &str, bytes: &[u8]) -> Result<XmlDocument, BindError> {
    let source = std::str::from_utf8(bytes)
        .map_err(|error| BindError::parse(location, format!("invalid UTF-8: {}", error)))?;
    let source = source.trim_start_matches('\u{feff}');

    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(source, options)
        .map_err(|error| BindError::parse(location, error.to_string()))?;

    let Some(root) = document.root().children().find(|node| node.is_element()) else {
        return Err(BindError::parse(
            location,
            "XML document must contain a root element.",
        ));
    };

    Ok(XmlDocument {
        root: parse_element(&document, root, &BTreeMap::new()),
    })
}

fn parse_element(
    document: &Document<'_>,
    node: Node<'_, '_>,
    inherited: &BTreeMap<String, String>,
) -> XmlElementNode {
    let mut namespaces = inherited.clone();
    for namespace in node.namespaces() {
        namespaces.insert(
            namespace.name().unwrap_or_default().to_string(),
            namespace.uri().to_string(),
        );
    }

    let mut attributes = BTreeMap::new();
    for attribute in node.attributes() {
        attributes.insert(attribute.name().to_string(), attribute.value().to_string());
    }

    let mut children = Vec::new();
    for child in node.children() {
        match child.node_type() {
            NodeType::Element => children.push(XmlNode::Element(parse_element(
                document,
                child,
                &namespaces,
            ))),
            NodeType::Text => {
                let value = child.text().unwrap_or_default().to_string();
                if value.trim().is_empty() {
                    continue;
                }
                children.push(XmlNode::Text(XmlTextNode {
                    value,
                    location: node_span(document, child.range().start, child.range().end),
                }));
            }
            _ => {}
        }
    }

    XmlElementNode {
        name: node.tag_name().name().to_string(),
        namespace: node.tag_name().namespace().map(str::to_string),
        attributes,
        namespaces,
        children,
        location: node_span(document, node.range().start, node.range().end),
    }
}

fn node_span(document: &Document<'_>, start: usize, end: usize) -> SourceSpan {
    let start_pos = document.text_pos_at(start);
    let end_pos = document.text_pos_at(end);
    SourceSpan {
        start: SourceLocation {
            line: start_pos.row as usize,
            column: start_pos.col as usize,
        },
        end: SourceLocation {
            line: end_pos.row as usize,
            column: end_pos.col as usize,
        },
    }
}
