use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub target_namespace: String,
    /// prefix -> namespace URI; the default namespace is stored under "".
    pub namespaces: BTreeMap<String, String>,
    pub simple_types: Vec<SimpleType>,
    pub complex_types: Vec<ComplexType>,
    pub elements: Vec<ElementDecl>,
    pub imports: Vec<SchemaImport>,
    pub includes: Vec<SchemaInclude>,
}

impl Schema {
    pub fn has_externals(&self) -> bool {
        !self.imports.is_empty() || !self.includes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaImport {
    pub namespace: Option<String>,
    pub schema_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInclude {
    pub schema_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleType {
    pub name: Option<String>,
    pub base: Option<String>,
    pub list_item_type: Option<String>,
    pub enumeration: Vec<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexType {
    pub name: Option<String>,
    pub base: Option<String>,
    pub elements: Vec<ElementDecl>,
    pub attributes: Vec<AttributeDecl>,
    pub mixed: bool,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    pub fn is_repeated(&self) -> bool {
        match self {
            Self::Bounded(count) => *count > 1,
            Self::Unbounded => true,
        }
    }
}

impl Default for MaxOccurs {
    fn default() -> Self {
        Self::Bounded(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDecl {
    pub name: String,
    pub type_ref: Option<String>,
    pub element_ref: Option<String>,
    pub nillable: bool,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub complex_type: Option<Box<ComplexType>>,
    pub simple_type: Option<SimpleType>,
    pub documentation: Option<String>,
}

impl Default for ElementDecl {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_ref: None,
            element_ref: None,
            nillable: false,
            min_occurs: 1,
            max_occurs: MaxOccurs::default(),
            complex_type: None,
            simple_type: None,
            documentation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDecl {
    pub name: String,
    pub type_ref: Option<String>,
    pub required: bool,
}

/// A parsed WSDL 1.1 `definitions` document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definitions {
    pub name: Option<String>,
    pub target_namespace: String,
    pub namespaces: BTreeMap<String, String>,
    pub schemas: Vec<Schema>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub name: String,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    pub name: String,
    pub type_ref: Option<String>,
    pub element_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortType {
    pub name: String,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    pub input: Option<String>,
    pub output: Option<String>,
    pub faults: Vec<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub name: String,
    pub port_type: String,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingOperation {
    pub name: String,
    pub soap_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub name: String,
    pub binding: String,
    pub address: Option<String>,
}

/// The root of a generation run: either a full WSDL or a bare schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootDocument {
    Wsdl(Definitions),
    Schema(Schema),
}

impl RootDocument {
    pub fn target_namespace(&self) -> &str {
        match self {
            Self::Wsdl(definitions) => &definitions.target_namespace,
            Self::Schema(schema) => &schema.target_namespace,
        }
    }
}

/// Splits `prefix:local` into its parts; unprefixed names yield `None`.
pub fn split_qualified_name(raw: &str) -> (Option<&str>, &str) {
    match raw.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, raw),
    }
}

/// Drops the namespace prefix of a qualified reference.
pub fn strip_prefix(raw: &str) -> &str {
    split_qualified_name(raw).1
}
