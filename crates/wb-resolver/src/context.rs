use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;
use wb_core::{BindError, ElementDecl, XSD_NAMESPACE};

use crate::naming::{
    is_basic_type, primitive_type, remove_package, synthesize_type_name, PRIMITIVE_TYPES,
};
use crate::registry::{qualified_reference, ElementTarget, GlobalRegistry, NamespaceSymbolTable};
use crate::settings::UnresolvedPolicy;

struct Resolved {
    name: String,
    primitive: bool,
}

impl Resolved {
    fn primitive(name: &str) -> Self {
        Self {
            name: name.to_string(),
            primitive: true,
        }
    }

    fn declared(name: String) -> Self {
        Self {
            name,
            primitive: false,
        }
    }
}

/// Name queries as seen from one namespace. Types of the context's own
/// namespace come back unqualified; everything else carries its package.
#[derive(Debug, Clone)]
pub struct TypeContext<'a> {
    registry: &'a GlobalRegistry,
    table: &'a NamespaceSymbolTable,
    prefixes: BTreeMap<String, String>,
}

impl<'a> TypeContext<'a> {
    pub(crate) fn new(
        registry: &'a GlobalRegistry,
        table: &'a NamespaceSymbolTable,
        prefixes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            registry,
            table,
            prefixes,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.table.namespace
    }

    pub fn package(&self) -> &str {
        &self.table.package.identifier
    }

    pub fn package_path(&self) -> &str {
        &self.table.package.full_path
    }

    pub fn table(&self) -> &'a NamespaceSymbolTable {
        self.table
    }

    /// Full package paths of every other registered namespace this context
    /// declares a prefix for.
    pub fn imports(&self) -> BTreeSet<String> {
        self.prefixes
            .values()
            .filter(|uri| uri.as_str() != self.namespace())
            .filter_map(|uri| self.registry.table(uri))
            .filter(|table| !table.package.is_native())
            .map(|table| table.package.full_path.clone())
            .filter(|path| !path.is_empty())
            .collect()
    }

    /// Rendered name for a type reference such as `tns:Order`. Primitive
    /// types are never qualified and never pointer-wrapped.
    pub fn resolve_type(&self, reference: &str, nillable: bool) -> Result<String, BindError> {
        let resolved = match self.lookup(reference) {
            Some(resolved) => resolved,
            None => self.unresolved(reference)?,
        };
        Ok(wrap(resolved, nillable))
    }

    /// Like `resolve_type` without the pointer decoration, but never
    /// synthesizes: a miss is an error.
    pub fn lookup_type(&self, reference: &str) -> Result<String, BindError> {
        self.lookup(reference)
            .map(|resolved| resolved.name)
            .ok_or_else(|| self.miss(reference))
    }

    /// The type name without its package qualifier.
    pub fn type_name(&self, reference: &str) -> Result<String, BindError> {
        self.resolve_type(reference, false)
            .map(|name| remove_package(&name))
    }

    /// Rendered payload type of a global element reference.
    pub fn resolve_element(&self, reference: &str) -> Result<String, BindError> {
        let (namespace, local) = self.qualify_reference(reference);
        let table = self.table_for(&namespace).ok_or_else(|| BindError::UnresolvedNamespace {
            namespace: namespace.clone(),
            reference: reference.to_string(),
        })?;

        match table.element(&local) {
            Some(ElementTarget::Type { name }) => Ok(self.render(table, name)),
            Some(ElementTarget::Alias { namespace, local }) => self
                .lookup_in(namespace, local)
                .map(|resolved| resolved.name)
                .ok_or_else(|| BindError::UnresolvedType {
                    namespace: namespace.clone(),
                    name: local.clone(),
                }),
            None => table
                .lookup(&local)
                .map(|name| self.render(table, name))
                .ok_or(BindError::UnresolvedType {
                    namespace,
                    name: local,
                }),
        }
    }

    /// Field type for `element` declared inside the type named `owner`.
    /// Repeated elements become slices; nillable and self-referencing
    /// single elements become pointers.
    pub fn resolve_field_type(&self, owner: &str, element: &ElementDecl) -> Result<String, BindError> {
        let resolved = if let Some(complex) = &element.complex_type {
            match complex.name.as_deref() {
                Some(name) => self.resolve_local(name)?,
                None => Resolved::declared(format!(
                    "{}{}",
                    owner,
                    synthesize_type_name(&element.name, self.registry.settings().export_policy)
                )),
            }
        } else if let Some(simple) = &element.simple_type {
            match (simple.base.as_deref(), simple.list_item_type.as_deref()) {
                (_, Some(item)) => {
                    let item = self.lookup(item).map(|resolved| resolved.name);
                    Resolved::primitive(&format!("[]{}", item.as_deref().unwrap_or("string")))
                }
                (Some(base), None) => match self.lookup(base) {
                    Some(resolved) => resolved,
                    None => self.unresolved(base)?,
                },
                (None, None) => Resolved::primitive("string"),
            }
        } else if let Some(reference) = element.type_ref.as_deref() {
            match self.lookup(reference) {
                Some(resolved) => resolved,
                None => self.unresolved(reference)?,
            }
        } else if let Some(reference) = element.element_ref.as_deref() {
            let name = self.resolve_element(reference)?;
            let primitive = is_basic_type(&name) || primitive_target(&name);
            Resolved { name, primitive }
        } else {
            Resolved::primitive("AnyType")
        };

        if element.max_occurs.is_repeated() {
            return Ok(format!("[]{}", resolved.name));
        }
        let self_reference = !resolved.primitive && resolved.name == owner;
        Ok(wrap(resolved, element.nillable || self_reference))
    }

    fn resolve_local(&self, local: &str) -> Result<Resolved, BindError> {
        match self.table.lookup(local) {
            Some(name) => Ok(Resolved::declared(name.to_string())),
            None => self.unresolved(local),
        }
    }

    fn lookup(&self, reference: &str) -> Option<Resolved> {
        let (namespace, local) = self.qualify_reference(reference);
        self.lookup_in(&namespace, &local)
    }

    fn lookup_in(&self, namespace: &str, local: &str) -> Option<Resolved> {
        if namespace == XSD_NAMESPACE || namespace == self.namespace() || namespace.is_empty() {
            if let Some(primitive) = primitive_type(local) {
                return Some(Resolved::primitive(primitive));
            }
        }
        let table = self.table_for(namespace)?;
        if table.primitive {
            return None;
        }
        table
            .lookup(local)
            .map(|name| Resolved::declared(self.render(table, name)))
    }

    fn table_for(&self, namespace: &str) -> Option<&'a NamespaceSymbolTable> {
        if namespace.is_empty() || namespace == self.namespace() {
            return Some(self.table);
        }
        self.registry.table(namespace)
    }

    fn render(&self, table: &NamespaceSymbolTable, name: &str) -> String {
        if std::ptr::eq(table, self.table) {
            name.to_string()
        } else {
            table.qualify(name)
        }
    }

    fn qualify_reference(&self, reference: &str) -> (String, String) {
        let (namespace, local) = qualified_reference(&self.prefixes, self.namespace(), reference);
        if namespace.is_empty() {
            return (self.namespace().to_string(), local);
        }
        (namespace, local)
    }

    fn miss(&self, reference: &str) -> BindError {
        let (namespace, local) = self.qualify_reference(reference);
        match self.table_for(&namespace) {
            Some(_) => BindError::UnresolvedType {
                namespace,
                name: local,
            },
            None => BindError::UnresolvedNamespace {
                namespace,
                reference: reference.to_string(),
            },
        }
    }

    fn unresolved(&self, reference: &str) -> Result<Resolved, BindError> {
        let settings = self.registry.settings();
        if settings.unresolved_policy == UnresolvedPolicy::Error {
            return Err(self.miss(reference));
        }

        let (namespace, local) = self.qualify_reference(reference);
        if namespace == XSD_NAMESPACE {
            warn!(reference, "unknown XML Schema type, using string");
            return Ok(Resolved::primitive("string"));
        }

        let name = synthesize_type_name(&local, settings.export_policy);
        let rendered = match self.table_for(&namespace) {
            Some(table) => self.render(table, &name),
            None => {
                let package = self.registry.derived_package_identifier(&namespace);
                if package.is_empty() {
                    name
                } else {
                    format!("{}.{}", package, name)
                }
            }
        };
        warn!(
            reference,
            namespace = %namespace,
            synthesized = %rendered,
            "unresolved type reference"
        );
        Ok(Resolved::declared(rendered))
    }
}

fn primitive_target(name: &str) -> bool {
    PRIMITIVE_TYPES
        .iter()
        .any(|(_, target)| *target == name)
}

fn wrap(resolved: Resolved, pointer: bool) -> String {
    if pointer && !resolved.primitive && !is_basic_type(&resolved.name) {
        format!("*{}", resolved.name)
    } else {
        resolved.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{SchemaGraph, SchemaOrigin};
    use crate::registry::register_types;
    use crate::settings::{ExportPolicy, ResolverSettings};
    use wb_parser::parse_schema_document;

    const SHOP: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    xmlns:tns="urn:shop" xmlns:b="urn:b" targetNamespace="urn:shop">
  <xs:complexType name="Node">
    <xs:sequence>
      <xs:element name="next" type="tns:Node"/>
      <xs:element name="children" type="tns:Node" maxOccurs="unbounded"/>
      <xs:element name="label" type="xs:string" nillable="true"/>
      <xs:element name="widget" type="b:Widget" nillable="true"/>
      <xs:element name="when" type="xs:dateTime" nillable="true"/>
      <xs:element name="extra">
        <xs:complexType><xs:sequence><xs:element name="x" type="xs:int"/></xs:sequence></xs:complexType>
      </xs:element>
      <xs:element name="tags"><xs:simpleType><xs:list itemType="xs:string"/></xs:simpleType></xs:element>
      <xs:element name="anything"/>
      <xs:element ref="tns:cart"/>
      <xs:element name="foreignNode" type="b:Node"/>
    </xs:sequence>
  </xs:complexType>
  <xs:element name="cart">
    <xs:complexType><xs:sequence><xs:element name="item" type="b:Widget"/></xs:sequence></xs:complexType>
  </xs:element>
  <xs:element name="widgetRef" type="b:Widget"/>
  <xs:element name="count" type="xs:int"/>
</xs:schema>"#;

    const WIDGETS: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:b">
  <xs:complexType name="Widget"/>
  <xs:complexType name="Node"/>
</xs:schema>"#;

    fn registry_with(settings: &ResolverSettings) -> GlobalRegistry {
        let mut graph = SchemaGraph::default();
        for (key, source) in [("b.xsd", WIDGETS), ("shop.xsd", SHOP)] {
            let schema = parse_schema_document(key, source.as_bytes()).expect("schema should parse");
            graph.push(key.to_string(), SchemaOrigin::Import, schema);
        }
        register_types(&graph, settings)
    }

    fn node_field(context: &TypeContext<'_>, name: &str) -> String {
        let graph_schema = parse_schema_document("shop.xsd", SHOP.as_bytes()).expect("schema");
        let node = graph_schema
            .complex_types
            .iter()
            .find(|complex| complex.name.as_deref() == Some("Node"))
            .expect("Node type");
        let element = node
            .elements
            .iter()
            .find(|element| element.name == name)
            .expect("field should exist");
        context
            .resolve_field_type("Node", element)
            .expect("field should resolve")
    }

    #[test]
    fn resolve_type_qualifies_foreign_namespaces() {
        let registry = registry_with(&ResolverSettings::default());
        let context = registry.context("urn:shop").expect("shop context");
        assert_eq!(context.resolve_type("b:Widget", false).expect("widget"), "b.Widget");
        assert_eq!(context.resolve_type("b:Widget", true).expect("widget"), "*b.Widget");
        assert_eq!(context.resolve_type("tns:Node", false).expect("node"), "Node");
        assert_eq!(context.resolve_type("Node", false).expect("node"), "Node");
        assert_eq!(context.type_name("b:Widget").expect("widget"), "Widget");
    }

    #[test]
    fn primitives_are_unqualified_and_never_wrapped() {
        let registry = registry_with(&ResolverSettings::default());
        let context = registry.context("urn:shop").expect("shop context");
        for (reference, expected) in [
            ("xs:string", "string"),
            ("xs:STRING", "string"),
            ("xs:dateTime", "XSDDateTime"),
            ("xs:base64Binary", "[]byte"),
            ("int", "int32"),
        ] {
            assert_eq!(context.resolve_type(reference, true).expect("primitive"), expected);
            assert_eq!(context.resolve_type(reference, false).expect("primitive"), expected);
        }
    }

    #[test]
    fn resolve_type_is_deterministic() {
        let registry = registry_with(&ResolverSettings::default());
        let context = registry.context("urn:shop").expect("shop context");
        for reference in ["b:Widget", "tns:Node", "tns:Missing", "zz:Ghost"] {
            assert_eq!(
                context.resolve_type(reference, true).expect("first"),
                context.resolve_type(reference, true).expect("second")
            );
        }
    }

    #[test]
    fn unresolved_references_are_synthesized_by_default() {
        let registry = registry_with(&ResolverSettings::default());
        let mut prefixes = registry.context("urn:shop").expect("shop").table().prefixes.clone();
        prefixes.insert("inv".to_string(), "http://acme.com/inventory".to_string());
        let context = registry
            .context_with_prefixes("urn:shop", &prefixes)
            .expect("shop context");
        assert_eq!(
            context.resolve_type("inv:stock-level", false).expect("synthesized"),
            "inventory.StockLevel"
        );
        assert_eq!(context.resolve_type("tns:Missing", true).expect("local"), "*Missing");
        assert_eq!(context.resolve_type("zz:Ghost", false).expect("unknown prefix"), "Ghost");
        assert_eq!(context.resolve_type("xs:gYear", false).expect("xsd"), "string");
    }

    #[test]
    fn unresolved_references_fail_when_synthesis_is_disabled() {
        let settings = ResolverSettings {
            unresolved_policy: UnresolvedPolicy::Error,
            ..ResolverSettings::default()
        };
        let registry = registry_with(&settings);
        let mut prefixes = registry.context("urn:shop").expect("shop").table().prefixes.clone();
        prefixes.insert("inv".to_string(), "http://acme.com/inventory".to_string());
        let context = registry
            .context_with_prefixes("urn:shop", &prefixes)
            .expect("shop context");
        assert_eq!(
            context.resolve_type("inv:Stock", false).expect_err("no table"),
            BindError::UnresolvedNamespace {
                namespace: "http://acme.com/inventory".to_string(),
                reference: "inv:Stock".to_string(),
            }
        );
        assert_eq!(
            context.resolve_type("tns:Missing", false).expect_err("no type"),
            BindError::UnresolvedType {
                namespace: "urn:shop".to_string(),
                name: "Missing".to_string(),
            }
        );
    }

    #[test]
    fn resolve_element_follows_element_declarations() {
        let registry = registry_with(&ResolverSettings::default());
        let context = registry.context("urn:shop").expect("shop context");
        assert_eq!(context.resolve_element("tns:cart").expect("cart"), "Cart");
        assert_eq!(context.resolve_element("tns:widgetRef").expect("alias"), "b.Widget");
        assert_eq!(context.resolve_element("tns:count").expect("primitive"), "int32");
        assert_eq!(context.resolve_element("b:Widget").expect("type fallback"), "b.Widget");
        assert_eq!(
            context.resolve_element("tns:nothing").expect_err("missing").code(),
            "UNRESOLVED_TYPE"
        );
    }

    #[test]
    fn field_types_follow_occurrence_and_nillability() {
        let registry = registry_with(&ResolverSettings::default());
        let context = registry.context("urn:shop").expect("shop context");
        assert_eq!(node_field(&context, "next"), "*Node");
        assert_eq!(node_field(&context, "children"), "[]Node");
        assert_eq!(node_field(&context, "label"), "string");
        assert_eq!(node_field(&context, "widget"), "*b.Widget");
        assert_eq!(node_field(&context, "when"), "XSDDateTime");
        assert_eq!(node_field(&context, "extra"), "NodeExtra");
        assert_eq!(node_field(&context, "tags"), "[]string");
        assert_eq!(node_field(&context, "anything"), "AnyType");
        assert_eq!(node_field(&context, "cart"), "Cart");
        assert_eq!(node_field(&context, "foreignNode"), "b.Node");
    }

    #[test]
    fn imports_list_registered_foreign_packages() {
        let settings = ResolverSettings {
            package_base: "github.com/acme/gen".to_string(),
            ..ResolverSettings::default()
        };
        let registry = registry_with(&settings);
        let context = registry.context("urn:shop").expect("shop context");
        assert_eq!(context.package(), "shop");
        assert_eq!(context.package_path(), "github.com/acme/gen/shop");
        assert_eq!(
            context.imports().into_iter().collect::<Vec<_>>(),
            vec!["github.com/acme/gen/b".to_string()]
        );
    }

    #[test]
    fn preserve_case_keeps_declared_spelling() {
        let settings = ResolverSettings {
            export_policy: ExportPolicy::PreserveCase,
            ..ResolverSettings::default()
        };
        let registry = registry_with(&settings);
        let context = registry.context("urn:shop").expect("shop context");
        assert_eq!(context.resolve_element("tns:cart").expect("cart"), "cart");
    }
}
