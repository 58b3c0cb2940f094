use serde::Serialize;
use tracing::debug;
use wb_core::{strip_prefix, Definitions};

use crate::binder::BoundMessages;
use crate::naming::synthesize_type_name;
use crate::settings::ExportPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundOperation {
    pub port_type: String,
    pub name: String,
    pub method_name: String,
    pub soap_action: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub faults: Vec<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundPort {
    pub service: String,
    pub port: String,
    pub binding: String,
    pub port_type: Option<String>,
    pub address: Option<String>,
}

/// Operations of every port type with their message payload types filled
/// in. Messages that were skipped leave the matching slot empty.
pub fn bind_operations(definitions: &Definitions, messages: &BoundMessages) -> Vec<BoundOperation> {
    let payload = |reference: Option<&str>| {
        reference
            .and_then(|name| messages.get(name))
            .map(|binding| binding.type_name.clone())
    };

    let mut operations = Vec::new();
    for port_type in &definitions.port_types {
        for operation in &port_type.operations {
            let bound = BoundOperation {
                port_type: port_type.name.clone(),
                name: operation.name.clone(),
                method_name: synthesize_type_name(&operation.name, ExportPolicy::ExportAll),
                soap_action: find_soap_action(definitions, &operation.name, &port_type.name),
                input: payload(operation.input.as_deref()),
                output: payload(operation.output.as_deref()),
                faults: operation
                    .faults
                    .iter()
                    .filter_map(|fault| payload(Some(fault.as_str())))
                    .collect(),
                documentation: operation.documentation.clone(),
            };
            debug!(
                port_type = %port_type.name,
                operation = %operation.name,
                "bound operation"
            );
            operations.push(bound);
        }
    }
    operations
}

/// SOAP action of `operation` in the first binding for `port_type`.
/// Binding types are compared without prefix and ignoring case.
pub fn find_soap_action(definitions: &Definitions, operation: &str, port_type: &str) -> Option<String> {
    definitions
        .bindings
        .iter()
        .filter(|binding| strip_prefix(&binding.port_type).eq_ignore_ascii_case(port_type))
        .flat_map(|binding| binding.operations.iter())
        .find(|candidate| candidate.name == operation)
        .and_then(|candidate| candidate.soap_action.clone())
}

/// Address of the first service port whose binding implements `port_type`,
/// compared ignoring case.
pub fn find_service_address(definitions: &Definitions, port_type: &str) -> Option<String> {
    definitions
        .services
        .iter()
        .flat_map(|service| service.ports.iter())
        .filter(|port| {
            binding_port_type(definitions, &port.binding)
                .is_some_and(|name| name.eq_ignore_ascii_case(port_type))
        })
        .find_map(|port| port.address.clone())
}

pub fn bind_ports(definitions: &Definitions) -> Vec<BoundPort> {
    definitions
        .services
        .iter()
        .flat_map(|service| {
            service.ports.iter().map(move |port| BoundPort {
                service: service.name.clone(),
                port: port.name.clone(),
                binding: strip_prefix(&port.binding).to_string(),
                port_type: binding_port_type(definitions, &port.binding).map(str::to_string),
                address: port.address.clone(),
            })
        })
        .collect()
}

fn binding_port_type<'a>(definitions: &'a Definitions, binding: &str) -> Option<&'a str> {
    let binding = strip_prefix(binding);
    definitions
        .bindings
        .iter()
        .find(|candidate| candidate.name == binding)
        .map(|candidate| strip_prefix(&candidate.port_type))
}
