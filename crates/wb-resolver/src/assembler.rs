use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};
use wb_core::{BindError, Location, RootDocument, Schema};
use wb_parser::parse_schema_document;

use crate::fetch::Fetcher;
use crate::settings::{DepthLimitPolicy, ResolverSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaOrigin {
    Root,
    Inline,
    Import,
    Include,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub key: String,
    pub origin: SchemaOrigin,
    pub schema: Schema,
}

/// Every schema reachable from the root, at most once per location key.
/// Externals precede the schema that referenced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaGraph {
    entries: Vec<SchemaEntry>,
    visited: BTreeSet<String>,
}

impl SchemaGraph {
    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.entries.iter().map(|entry| &entry.schema)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.key.as_str()).collect()
    }

    pub(crate) fn push(&mut self, key: String, origin: SchemaOrigin, schema: Schema) {
        self.entries.push(SchemaEntry {
            key,
            origin,
            schema,
        });
    }
}

pub struct SchemaGraphAssembler<'a> {
    fetcher: &'a dyn Fetcher,
    settings: &'a ResolverSettings,
    graph: SchemaGraph,
}

impl<'a> SchemaGraphAssembler<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, settings: &'a ResolverSettings) -> Self {
        Self {
            fetcher,
            settings,
            graph: SchemaGraph::default(),
        }
    }

    pub fn assemble(
        mut self,
        root: &RootDocument,
        root_location: &Location,
    ) -> Result<SchemaGraph, BindError> {
        let root_key = root_location.key();
        self.graph.visited.insert(root_key.clone());

        match root {
            RootDocument::Schema(schema) => {
                self.expand(schema, root_location, 0)?;
                self.graph.push(root_key, SchemaOrigin::Root, schema.clone());
            }
            RootDocument::Wsdl(definitions) => {
                for (index, schema) in definitions.schemas.iter().enumerate() {
                    self.expand(schema, root_location, 0)?;
                    self.graph.push(
                        format!("{}#schema{}", root_key, index),
                        SchemaOrigin::Inline,
                        schema.clone(),
                    );
                }
            }
        }

        info!(
            root = %root_location,
            schemas = self.graph.len(),
            "schema graph assembled"
        );
        Ok(self.graph)
    }

    fn expand(&mut self, schema: &Schema, location: &Location, depth: usize) -> Result<(), BindError> {
        for import in &schema.imports {
            let Some(hint) = import.schema_location.as_deref() else {
                debug!(
                    namespace = import.namespace.as_deref().unwrap_or_default(),
                    "skipping import without schemaLocation"
                );
                continue;
            };
            self.discover(schema, location, hint, SchemaOrigin::Import, depth)?;
        }

        for include in &schema.includes {
            let Some(hint) = include.schema_location.as_deref() else {
                warn!(parent = %location, "skipping include without schemaLocation");
                continue;
            };
            self.discover(schema, location, hint, SchemaOrigin::Include, depth)?;
        }

        Ok(())
    }

    fn discover(
        &mut self,
        parent: &Schema,
        parent_location: &Location,
        hint: &str,
        origin: SchemaOrigin,
        depth: usize,
    ) -> Result<(), BindError> {
        let location = parent_location.join(hint)?;
        let key = location.key();
        if !self.graph.visited.insert(key.clone()) {
            debug!(location = %key, "schema already merged");
            return Ok(());
        }

        let bytes = self.fetcher.fetch(&location)?;
        let mut schema = parse_schema_document(&key, &bytes)?;
        if origin == SchemaOrigin::Include {
            adopt_parent_namespace(&mut schema, parent);
        }

        if schema.has_externals() {
            if depth + 1 < self.settings.max_depth {
                self.expand(&schema, &location, depth + 1)?;
            } else if self.has_pending_externals(&schema, &location) {
                match self.settings.depth_limit_policy {
                    DepthLimitPolicy::Fail => {
                        return Err(BindError::DepthExceeded {
                            location: key,
                            limit: self.settings.max_depth,
                        });
                    }
                    DepthLimitPolicy::Truncate => {
                        warn!(
                            location = %key,
                            limit = self.settings.max_depth,
                            "schema discovery depth reached, not descending further"
                        );
                    }
                }
            }
        }

        self.graph.push(key, origin, schema);
        Ok(())
    }

    fn has_pending_externals(&self, schema: &Schema, location: &Location) -> bool {
        schema
            .imports
            .iter()
            .filter_map(|import| import.schema_location.as_deref())
            .chain(
                schema
                    .includes
                    .iter()
                    .filter_map(|include| include.schema_location.as_deref()),
            )
            .any(|hint| match location.join(hint) {
                Ok(target) => !self.graph.visited.contains(&target.key()),
                Err(_) => true,
            })
    }
}

/// An included schema without a target namespace takes on its includer's.
fn adopt_parent_namespace(schema: &mut Schema, parent: &Schema) {
    if !schema.target_namespace.is_empty() {
        return;
    }
    schema.target_namespace = parent.target_namespace.clone();
    for (prefix, uri) in &parent.namespaces {
        schema
            .namespaces
            .entry(prefix.clone())
            .or_insert_with(|| uri.clone());
    }
}

pub fn assemble(
    root: &RootDocument,
    root_location: &Location,
    fetcher: &dyn Fetcher,
    settings: &ResolverSettings,
) -> Result<SchemaGraph, BindError> {
    SchemaGraphAssembler::new(fetcher, settings).assemble(root, root_location)
}
