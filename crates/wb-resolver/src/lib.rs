mod assembler;
mod binder;
mod context;
mod fetch;
pub mod naming;
mod operations;
mod pipeline;
mod registry;
mod settings;

pub use assembler::{assemble, SchemaEntry, SchemaGraph, SchemaGraphAssembler, SchemaOrigin};
pub use binder::{bind_message, bind_messages, BoundMessages, MessageBinding, SkippedMessage};
pub use context::TypeContext;
pub use fetch::{Fetcher, LocalFetcher, MemoryFetcher, RemoteResponse, RemoteTransport};
pub use operations::{
    bind_operations, bind_ports, find_service_address, find_soap_action, BoundOperation, BoundPort,
};
pub use pipeline::{
    resolve_document, resolve_location, NamespaceSummary, Resolution, ResolvedService,
    SchemaSummary,
};
pub use registry::{register_types, ElementTarget, GlobalRegistry, NamespaceSymbolTable, PackageInfo};
pub use settings::{
    DepthLimitPolicy, ExportPolicy, ResolverSettings, TransportSettings, UnresolvedPolicy,
    DEFAULT_DIAL_TIMEOUT_SECS, DEFAULT_MAX_DEPTH,
};
