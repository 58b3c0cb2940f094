use wb_core::{
    BindError, Binding, BindingOperation, Definitions, Message, MessagePart, Operation, Port,
    PortType, Service,
};

use crate::schema::parse_schema_element;
use crate::xml::XmlElementNode;

pub fn parse_definitions_element(
    location: &str,
    node: &XmlElementNode,
) -> Result<Definitions, BindError> {
    let mut definitions = Definitions {
        name: node.attr("name").map(str::to_string),
        target_namespace: node.attr("targetNamespace").unwrap_or_default().to_string(),
        namespaces: node
            .namespaces
            .iter()
            .filter(|(prefix, _)| prefix.as_str() != "xml")
            .map(|(prefix, uri)| (prefix.clone(), uri.clone()))
            .collect(),
        ..Definitions::default()
    };

    for child in node.element_children() {
        match child.name.as_str() {
            "types" => {
                for schema in child.children_named("schema") {
                    definitions
                        .schemas
                        .push(parse_schema_element(location, schema)?);
                }
            }
            "message" => definitions.messages.push(parse_message(location, child)?),
            "portType" => definitions.port_types.push(parse_port_type(location, child)?),
            "binding" => definitions.bindings.push(parse_binding(location, child)?),
            "service" => definitions.services.push(parse_service(location, child)?),
            _ => {}
        }
    }

    Ok(definitions)
}

fn required_attr(location: &str, node: &XmlElementNode, name: &str) -> Result<String, BindError> {
    node.attr(name).map(str::to_string).ok_or_else(|| {
        BindError::parse(
            location,
            format!(
                "Attribute \"{}\" is required on <{}> at line {}.",
                name, node.name, node.location.start.line
            ),
        )
    })
}

fn parse_message(location: &str, node: &XmlElementNode) -> Result<Message, BindError> {
    let parts = node
        .children_named("part")
        .map(|part| {
            Ok(MessagePart {
                name: required_attr(location, part, "name")?,
                type_ref: part.attr("type").map(str::to_string),
                element_ref: part.attr("element").map(str::to_string),
            })
        })
        .collect::<Result<Vec<_>, BindError>>()?;

    Ok(Message {
        name: required_attr(location, node, "name")?,
        parts,
    })
}

fn parse_port_type(location: &str, node: &XmlElementNode) -> Result<PortType, BindError> {
    let mut operations = Vec::new();
    for operation in node.children_named("operation") {
        let documentation = operation
            .first_child("documentation")
            .map(|doc| doc.text_content().trim().to_string())
            .filter(|text| !text.is_empty());
        operations.push(Operation {
            name: required_attr(location, operation, "name")?,
            input: operation
                .first_child("input")
                .and_then(|input| input.attr("message"))
                .map(str::to_string),
            output: operation
                .first_child("output")
                .and_then(|output| output.attr("message"))
                .map(str::to_string),
            faults: operation
                .children_named("fault")
                .filter_map(|fault| fault.attr("message"))
                .map(str::to_string)
                .collect(),
            documentation,
        });
    }

    Ok(PortType {
        name: required_attr(location, node, "name")?,
        operations,
    })
}

fn parse_binding(location: &str, node: &XmlElementNode) -> Result<Binding, BindError> {
    let mut operations = Vec::new();
    for operation in node.children_named("operation") {
        // soap:operation and soap12:operation share the local name.
        let soap_action = operation
            .children_named("operation")
            .find_map(|soap| soap.attr("soapAction"))
            .map(str::to_string);
        operations.push(BindingOperation {
            name: required_attr(location, operation, "name")?,
            soap_action,
        });
    }

    Ok(Binding {
        name: required_attr(location, node, "name")?,
        port_type: required_attr(location, node, "type")?,
        operations,
    })
}

fn parse_service(location: &str, node: &XmlElementNode) -> Result<Service, BindError> {
    let mut ports = Vec::new();
    for port in node.children_named("port") {
        ports.push(Port {
            name: required_attr(location, port, "name")?,
            binding: required_attr(location, port, "binding")?,
            address: port
                .children_named("address")
                .find_map(|address| address.attr("location"))
                .map(str::to_string),
        });
    }

    Ok(Service {
        name: required_attr(location, node, "name")?,
        ports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_xml_document;

    const STOCK_QUOTE: &str = r#"<?xml version="1.0"?>
<definitions name="StockQuote"
    targetNamespace="http://example.com/stockquote.wsdl"
    xmlns:tns="http://example.com/stockquote.wsdl"
    xmlns:xsd1="http://example.com/stockquote.xsd"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns="http://schemas.xmlsoap.org/wsdl/">
  <types>
    <schema targetNamespace="http://example.com/stockquote.xsd"
            xmlns="http://www.w3.org/2001/XMLSchema">
      <element name="TradePriceRequest">
        <complexType><all><element name="tickerSymbol" type="string"/></all></complexType>
      </element>
    </schema>
  </types>
  <message name="GetLastTradePriceInput">
    <part name="body" element="xsd1:TradePriceRequest"/>
  </message>
  <message name="Empty"/>
  <portType name="StockQuotePortType">
    <operation name="GetLastTradePrice">
      <documentation>Latest trade price.</documentation>
      <input message="tns:GetLastTradePriceInput"/>
      <output message="tns:GetLastTradePriceOutput"/>
      <fault name="oops" message="tns:Fault"/>
    </operation>
  </portType>
  <binding name="StockQuoteSoapBinding" type="tns:StockQuotePortType">
    <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
    <operation name="GetLastTradePrice">
      <soap:operation soapAction="http://example.com/GetLastTradePrice"/>
    </operation>
  </binding>
  <service name="StockQuoteService">
    <port name="StockQuotePort" binding="tns:StockQuoteSoapBinding">
      <soap:address location="http://example.com/stockquote"/>
    </port>
  </service>
</definitions>"#;

    fn parse(source: &str) -> Result<Definitions, BindError> {
        let document = parse_xml_document("stock.wsdl", source.as_bytes())?;
        parse_definitions_element("stock.wsdl", &document.root)
    }

    #[test]
    fn parse_definitions_reads_every_section() {
        let definitions = parse(STOCK_QUOTE).expect("wsdl should parse");
        assert_eq!(definitions.name.as_deref(), Some("StockQuote"));
        assert_eq!(
            definitions.target_namespace,
            "http://example.com/stockquote.wsdl"
        );
        assert_eq!(definitions.schemas.len(), 1);
        assert_eq!(definitions.messages.len(), 2);
        assert!(definitions.messages[1].parts.is_empty());
        assert_eq!(
            definitions.messages[0].parts[0].element_ref.as_deref(),
            Some("xsd1:TradePriceRequest")
        );

        let operation = &definitions.port_types[0].operations[0];
        assert_eq!(operation.input.as_deref(), Some("tns:GetLastTradePriceInput"));
        assert_eq!(operation.faults, vec!["tns:Fault".to_string()]);
        assert_eq!(operation.documentation.as_deref(), Some("Latest trade price."));

        assert_eq!(
            definitions.bindings[0].operations[0].soap_action.as_deref(),
            Some("http://example.com/GetLastTradePrice")
        );
        assert_eq!(
            definitions.services[0].ports[0].address.as_deref(),
            Some("http://example.com/stockquote")
        );
    }

    #[test]
    fn inline_schemas_inherit_definition_prefixes() {
        let definitions = parse(STOCK_QUOTE).expect("wsdl should parse");
        let schema = &definitions.schemas[0];
        assert_eq!(
            schema.namespaces.get("xsd1").map(String::as_str),
            Some("http://example.com/stockquote.xsd")
        );
        assert_eq!(
            schema.namespaces.get("").map(String::as_str),
            Some("http://www.w3.org/2001/XMLSchema")
        );
    }

    #[test]
    fn parse_definitions_requires_message_names() {
        let error = parse(r#"<definitions><message><part name="p"/></message></definitions>"#)
            .expect_err("nameless message should fail");
        assert_eq!(error.code(), "PARSE_ERROR");
        assert!(error.to_string().contains("\"name\""));
    }
}
