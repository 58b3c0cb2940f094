use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};
use wb_core::{split_qualified_name, BindError, ElementDecl, Schema, XSD_NAMESPACE};

use crate::assembler::SchemaGraph;
use crate::context::TypeContext;
use crate::naming::{
    namespace_to_file_name, namespace_to_package_path, package_identifier, synthesize_type_name,
    PRIMITIVE_TYPES,
};
use crate::settings::{ExportPolicy, ResolverSettings};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    /// Name other packages qualify this package's types with; empty for
    /// types that never carry a qualifier.
    pub identifier: String,
    pub relative_path: String,
    pub full_path: String,
    pub file_name: String,
}

impl PackageInfo {
    pub fn native() -> Self {
        Self::default()
    }

    pub fn is_native(&self) -> bool {
        self.identifier.is_empty()
    }
}

/// What a global element declaration stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementTarget {
    /// A type registered in the element's own namespace.
    Type { name: String },
    /// The element is declared with `type=`; points at that type.
    Alias { namespace: String, local: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSymbolTable {
    pub namespace: String,
    pub package: PackageInfo,
    pub prefixes: BTreeMap<String, String>,
    pub types: BTreeMap<String, String>,
    pub elements: BTreeMap<String, ElementTarget>,
    pub primitive: bool,
}

impl NamespaceSymbolTable {
    fn new(namespace: &str, package: PackageInfo) -> Self {
        Self {
            namespace: namespace.to_string(),
            package,
            prefixes: BTreeMap::new(),
            types: BTreeMap::new(),
            elements: BTreeMap::new(),
            primitive: false,
        }
    }

    fn primitives() -> Self {
        let mut table = Self::new(XSD_NAMESPACE, PackageInfo::native());
        table.primitive = true;
        table.types = PRIMITIVE_TYPES
            .iter()
            .map(|(name, target)| (name.to_string(), target.to_string()))
            .collect();
        table
    }

    /// Synthesized name for a local type name. Primitive lookups ignore case.
    pub fn lookup(&self, local: &str) -> Option<&str> {
        if self.primitive {
            return self.types.get(&local.to_ascii_lowercase()).map(String::as_str);
        }
        self.types.get(local).map(String::as_str)
    }

    pub fn element(&self, local: &str) -> Option<&ElementTarget> {
        self.elements.get(local)
    }

    /// Renders `name` as seen from outside this namespace.
    pub fn qualify(&self, name: &str) -> String {
        if self.package.is_native() {
            name.to_string()
        } else {
            format!("{}.{}", self.package.identifier, name)
        }
    }

    fn register(&mut self, local: &str, synthesized: String) -> &str {
        if let Some(existing) = self.types.get(local) {
            if *existing != synthesized {
                debug!(
                    namespace = %self.namespace,
                    name = local,
                    kept = %existing,
                    "type already registered"
                );
            }
        }
        self.types
            .entry(local.to_string())
            .or_insert(synthesized)
            .as_str()
    }
}

/// Symbol tables for every namespace of one run.
#[derive(Debug, Clone)]
pub struct GlobalRegistry {
    settings: ResolverSettings,
    tables: BTreeMap<String, NamespaceSymbolTable>,
    package_owners: BTreeMap<String, String>,
    path_owners: BTreeSet<String>,
}

impl GlobalRegistry {
    pub fn new(settings: &ResolverSettings) -> Self {
        let mut tables = BTreeMap::new();
        tables.insert(XSD_NAMESPACE.to_string(), NamespaceSymbolTable::primitives());
        Self {
            settings: settings.clone(),
            tables,
            package_owners: BTreeMap::new(),
            path_owners: BTreeSet::new(),
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn table(&self, namespace: &str) -> Option<&NamespaceSymbolTable> {
        self.tables.get(namespace)
    }

    pub fn tables(&self) -> impl Iterator<Item = &NamespaceSymbolTable> {
        self.tables.values()
    }

    pub fn namespaces(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Makes sure a namespace that declares no types of its own, such as a
    /// WSDL target namespace, still has a table and a package.
    pub fn register_root_namespace(&mut self, namespace: &str, prefixes: &BTreeMap<String, String>) {
        self.ensure_table(namespace, prefixes);
    }

    pub fn context(&self, namespace: &str) -> Result<TypeContext<'_>, BindError> {
        let table = self.require(namespace)?;
        Ok(TypeContext::new(self, table, table.prefixes.clone()))
    }

    /// A context whose prefixes come from the referencing document rather
    /// than from the namespace's own schemas.
    pub fn context_with_prefixes(
        &self,
        namespace: &str,
        prefixes: &BTreeMap<String, String>,
    ) -> Result<TypeContext<'_>, BindError> {
        let table = self.require(namespace)?;
        Ok(TypeContext::new(self, table, prefixes.clone()))
    }

    /// Package identifier for a namespace that may not have a table.
    pub fn derived_package_identifier(&self, namespace: &str) -> String {
        match self.tables.get(namespace) {
            Some(table) => table.package.identifier.clone(),
            None => package_identifier(&namespace_to_package_path(
                namespace,
                &self.settings.package_replacements,
            )),
        }
    }

    fn require(&self, namespace: &str) -> Result<&NamespaceSymbolTable, BindError> {
        self.tables
            .get(namespace)
            .ok_or_else(|| BindError::UnknownNamespace {
                namespace: namespace.to_string(),
            })
    }

    fn ensure_table(
        &mut self,
        namespace: &str,
        prefixes: &BTreeMap<String, String>,
    ) -> &mut NamespaceSymbolTable {
        let package = if self.tables.contains_key(namespace) {
            None
        } else {
            let package = self.allocate_package(namespace);
            info!(
                namespace,
                package = %package.identifier,
                path = %package.full_path,
                "registered namespace"
            );
            Some(package)
        };
        let table = self
            .tables
            .entry(namespace.to_string())
            .or_insert_with(|| NamespaceSymbolTable::new(namespace, package.unwrap_or_default()));
        for (prefix, uri) in prefixes {
            table
                .prefixes
                .entry(prefix.clone())
                .or_insert_with(|| uri.clone());
        }
        table
    }

    fn allocate_package(&mut self, namespace: &str) -> PackageInfo {
        if namespace.is_empty() {
            return PackageInfo::native();
        }

        let base_path = namespace_to_package_path(namespace, &self.settings.package_replacements);
        let base_identifier = package_identifier(&base_path);
        let mut identifier = base_identifier.clone();
        let mut relative_path = base_path.clone();
        let mut counter = 1;
        while self.package_owners.contains_key(&identifier) || self.path_owners.contains(&relative_path) {
            counter += 1;
            identifier = format!("{}{}", base_identifier, counter);
            if self.path_owners.contains(&base_path) {
                relative_path = format!("{}{}", base_path, counter);
            }
        }
        if counter > 1 {
            let owner = self
                .package_owners
                .get(&base_identifier)
                .cloned()
                .unwrap_or_default();
            warn!(
                namespace,
                wanted = %base_identifier,
                assigned = %identifier,
                owner = %owner,
                "package identifier collision"
            );
        }

        self.package_owners
            .insert(identifier.clone(), namespace.to_string());
        self.path_owners.insert(relative_path.clone());
        let full_path = join_package_path(&self.settings.package_base, &relative_path);
        PackageInfo {
            identifier,
            relative_path,
            full_path,
            file_name: namespace_to_file_name(namespace),
        }
    }

    fn register_named_types(&mut self, schema: &Schema) {
        let policy = self.settings.export_policy;
        let table = self.ensure_table(&schema.target_namespace, &schema.namespaces);
        let names = schema
            .simple_types
            .iter()
            .filter_map(|simple| simple.name.as_deref())
            .chain(
                schema
                    .complex_types
                    .iter()
                    .filter_map(|complex| complex.name.as_deref()),
            );
        for name in names {
            table.register(name, synthesize_type_name(name, policy));
        }
    }

    fn register_elements(&mut self, schema: &Schema) {
        let policy = self.settings.export_policy;
        let table = self.ensure_table(&schema.target_namespace, &schema.namespaces);
        for element in &schema.elements {
            let Some(target) = element_target(schema, element, table, policy) else {
                continue;
            };
            if table.elements.contains_key(&element.name) {
                debug!(
                    namespace = %schema.target_namespace,
                    element = %element.name,
                    "element already registered"
                );
                continue;
            }
            table.elements.insert(element.name.clone(), target);
        }
    }
}

fn element_target(
    schema: &Schema,
    element: &ElementDecl,
    table: &mut NamespaceSymbolTable,
    policy: ExportPolicy,
) -> Option<ElementTarget> {
    if let Some(complex) = &element.complex_type {
        let name = match complex.name.as_deref() {
            Some(type_name) => {
                let name = table
                    .register(type_name, synthesize_type_name(type_name, policy))
                    .to_string();
                // The element name stands for the same type.
                table.register(&element.name, name.clone());
                name
            }
            None => {
                let virtual_name = synthesize_type_name(&element.name, policy);
                if table.lookup(&element.name).is_some_and(|existing| existing != virtual_name) {
                    warn!(
                        namespace = %schema.target_namespace,
                        element = %element.name,
                        "element type shadows a named type"
                    );
                }
                table.register(&element.name, virtual_name).to_string()
            }
        };
        return Some(ElementTarget::Type { name });
    }

    if let Some(simple) = &element.simple_type {
        let base = simple.base.as_deref().or(simple.list_item_type.as_deref());
        let (namespace, local) = match base {
            Some(reference) => qualified_reference(&schema.namespaces, &schema.target_namespace, reference),
            None => (XSD_NAMESPACE.to_string(), "string".to_string()),
        };
        return Some(ElementTarget::Alias { namespace, local });
    }

    let reference = element.type_ref.as_deref()?;
    let (namespace, local) = qualified_reference(&schema.namespaces, &schema.target_namespace, reference);
    Some(ElementTarget::Alias { namespace, local })
}

/// Maps a `prefix:local` reference to its namespace URI. Unprefixed names
/// belong to `target_namespace` unless the default namespace is XML Schema.
/// Unknown prefixes map to the empty namespace.
pub(crate) fn qualified_reference(
    prefixes: &BTreeMap<String, String>,
    target_namespace: &str,
    reference: &str,
) -> (String, String) {
    let (prefix, local) = split_qualified_name(reference);
    let namespace = match prefix {
        Some(prefix) => match prefixes.get(prefix) {
            Some(uri) => uri.clone(),
            None => {
                warn!(prefix, reference, "undeclared namespace prefix");
                String::new()
            }
        },
        None if prefixes.get("").map(String::as_str) == Some(XSD_NAMESPACE) => {
            XSD_NAMESPACE.to_string()
        }
        None => target_namespace.to_string(),
    };
    (namespace, local.to_string())
}

fn join_package_path(base: &str, relative: &str) -> String {
    let base = base.trim_end_matches('/');
    match (base.is_empty(), relative.is_empty()) {
        (true, _) => relative.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, relative),
    }
}

/// Builds every namespace table from the assembled graph. Named types are
/// registered for all schemas before any element is, so forward and
/// cross-schema references see complete tables.
pub fn register_types(graph: &SchemaGraph, settings: &ResolverSettings) -> GlobalRegistry {
    let mut registry = GlobalRegistry::new(settings);
    for schema in graph.schemas() {
        registry.register_named_types(schema);
    }
    for schema in graph.schemas() {
        registry.register_elements(schema);
    }
    info!(namespaces = registry.len(), "types registered");
    registry
}
