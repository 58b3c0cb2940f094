use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::info;
use wb_core::{BindError, Location, RootDocument};
use wb_parser::parse_root_document;

use crate::assembler::{assemble, SchemaGraph, SchemaOrigin};
use crate::binder::{bind_messages, BoundMessages};
use crate::context::TypeContext;
use crate::fetch::Fetcher;
use crate::operations::{bind_operations, bind_ports, BoundOperation, BoundPort};
use crate::registry::{register_types, GlobalRegistry};
use crate::settings::ResolverSettings;

/// Everything one run produces, ready for an emitter.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub root_location: Location,
    pub root: RootDocument,
    pub graph: SchemaGraph,
    pub registry: GlobalRegistry,
    pub messages: BoundMessages,
    pub operations: Vec<BoundOperation>,
    pub ports: Vec<BoundPort>,
}

impl Resolution {
    pub fn context(&self, namespace: &str) -> Result<TypeContext<'_>, BindError> {
        self.registry.context(namespace)
    }

    /// Context of the root document's own namespace, seeing the root's
    /// prefix declarations.
    pub fn root_context(&self) -> Result<TypeContext<'_>, BindError> {
        match &self.root {
            RootDocument::Wsdl(definitions) => self
                .registry
                .context_with_prefixes(&definitions.target_namespace, &definitions.namespaces),
            RootDocument::Schema(schema) => self
                .registry
                .context_with_prefixes(&schema.target_namespace, &schema.namespaces),
        }
    }

    pub fn summary(&self) -> Result<ResolvedService, BindError> {
        let schemas = self
            .graph
            .entries()
            .iter()
            .map(|entry| SchemaSummary {
                key: entry.key.clone(),
                origin: entry.origin,
                target_namespace: entry.schema.target_namespace.clone(),
            })
            .collect();

        let mut namespaces = Vec::new();
        for table in self.registry.tables().filter(|table| !table.primitive) {
            let context = self.registry.context(&table.namespace)?;
            namespaces.push(NamespaceSummary {
                namespace: table.namespace.clone(),
                package: table.package.identifier.clone(),
                package_path: table.package.full_path.clone(),
                file_name: table.package.file_name.clone(),
                imports: context.imports(),
                types: table.types.clone(),
            });
        }

        Ok(ResolvedService {
            root: self.root_location.key(),
            target_namespace: self.root.target_namespace().to_string(),
            package_base: self.registry.settings().package_base.clone(),
            schemas,
            namespaces,
            messages: self.messages.clone(),
            operations: self.operations.clone(),
            ports: self.ports.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    pub key: String,
    pub origin: SchemaOrigin,
    pub target_namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSummary {
    pub namespace: String,
    pub package: String,
    pub package_path: String,
    pub file_name: String,
    pub imports: BTreeSet<String>,
    pub types: BTreeMap<String, String>,
}

/// Serializable view of a `Resolution`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedService {
    pub root: String,
    pub target_namespace: String,
    pub package_base: String,
    pub schemas: Vec<SchemaSummary>,
    pub namespaces: Vec<NamespaceSummary>,
    pub messages: BoundMessages,
    pub operations: Vec<BoundOperation>,
    pub ports: Vec<BoundPort>,
}

pub fn resolve_location(
    raw: &str,
    fetcher: &dyn Fetcher,
    settings: &ResolverSettings,
) -> Result<Resolution, BindError> {
    settings.validate()?;
    let location = Location::parse(raw)?;
    let bytes = fetcher.fetch(&location)?;
    resolve_document(location, &bytes, fetcher, settings)
}

pub fn resolve_document(
    location: Location,
    bytes: &[u8],
    fetcher: &dyn Fetcher,
    settings: &ResolverSettings,
) -> Result<Resolution, BindError> {
    settings.validate()?;
    let root = parse_root_document(&location.key(), bytes)?;
    let graph = assemble(&root, &location, fetcher, settings)?;
    let mut registry = register_types(&graph, settings);

    let (messages, operations, ports) = match &root {
        RootDocument::Wsdl(definitions) => {
            registry.register_root_namespace(&definitions.target_namespace, &definitions.namespaces);
            let context = registry
                .context_with_prefixes(&definitions.target_namespace, &definitions.namespaces)?;
            let messages = bind_messages(&context, &definitions.messages)?;
            let operations = bind_operations(definitions, &messages);
            let ports = bind_ports(definitions);
            (messages, operations, ports)
        }
        RootDocument::Schema(_) => (BoundMessages::default(), Vec::new(), Vec::new()),
    };

    info!(
        root = %location,
        schemas = graph.len(),
        namespaces = registry.len(),
        messages = messages.bound.len(),
        skipped = messages.skipped.len(),
        "resolution complete"
    );

    Ok(Resolution {
        root_location: location,
        root,
        graph,
        registry,
        messages,
        operations,
        ports,
    })
}
