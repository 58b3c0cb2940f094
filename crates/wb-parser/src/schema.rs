use tracing::debug;
use wb_core::{
    strip_prefix, AttributeDecl, BindError, ComplexType, ElementDecl, MaxOccurs, Schema,
    SchemaImport, SchemaInclude, SimpleType,
};

use crate::xml::{parse_xml_document, XmlElementNode};

pub fn parse_schema_document(location: &str, bytes: &[u8]) -> Result<Schema, BindError> {
    let document = parse_xml_document(location, bytes)?;
    if document.root.name != "schema" {
        return Err(BindError::parse(
            location,
            format!("Expected <schema> root, got <{}>.", document.root.name),
        ));
    }
    parse_schema_element(location, &document.root)
}

pub fn parse_schema_element(location: &str, node: &XmlElementNode) -> Result<Schema, BindError> {
    let mut schema = Schema {
        target_namespace: node.attr("targetNamespace").unwrap_or_default().to_string(),
        namespaces: node
            .namespaces
            .iter()
            .filter(|(prefix, _)| prefix.as_str() != "xml")
            .map(|(prefix, uri)| (prefix.clone(), uri.clone()))
            .collect(),
        ..Schema::default()
    };

    for child in node.element_children() {
        match child.name.as_str() {
            "import" => schema.imports.push(SchemaImport {
                namespace: child.attr("namespace").map(str::to_string),
                schema_location: child.attr("schemaLocation").map(str::to_string),
            }),
            "include" | "redefine" => schema.includes.push(SchemaInclude {
                schema_location: child.attr("schemaLocation").map(str::to_string),
            }),
            "simpleType" => {
                let simple_type = parse_simple_type(child);
                if simple_type.name.is_none() {
                    return Err(unnamed_top_level(location, child));
                }
                schema.simple_types.push(simple_type);
            }
            "complexType" => {
                let complex_type = parse_complex_type(location, child)?;
                if complex_type.name.is_none() {
                    return Err(unnamed_top_level(location, child));
                }
                schema.complex_types.push(complex_type);
            }
            "element" => schema.elements.push(parse_element_decl(location, child)?),
            "annotation" | "attribute" | "attributeGroup" | "group" | "notation" => {}
            other => debug!(location, element = other, "ignoring schema child"),
        }
    }

    Ok(schema)
}

fn unnamed_top_level(location: &str, node: &XmlElementNode) -> BindError {
    BindError::parse(
        location,
        format!(
            "Top-level <{}> at line {} must declare a name.",
            node.name, node.location.start.line
        ),
    )
}

fn parse_element_decl(location: &str, node: &XmlElementNode) -> Result<ElementDecl, BindError> {
    let element_ref = node.attr("ref").map(str::to_string);
    let name = match (node.attr("name"), element_ref.as_deref()) {
        (Some(name), _) => name.to_string(),
        (None, Some(reference)) => strip_prefix(reference).to_string(),
        (None, None) => {
            return Err(BindError::parse(
                location,
                format!(
                    "<element> at line {} declares neither name nor ref.",
                    node.location.start.line
                ),
            ))
        }
    };

    let complex_type = match node.first_child("complexType") {
        Some(child) => Some(Box::new(parse_complex_type(location, child)?)),
        None => None,
    };

    Ok(ElementDecl {
        name,
        type_ref: node.attr("type").map(str::to_string),
        element_ref,
        nillable: parse_bool(node.attr("nillable")),
        min_occurs: parse_min_occurs(location, node)?,
        max_occurs: parse_max_occurs(location, node)?,
        complex_type,
        simple_type: node.first_child("simpleType").map(parse_simple_type),
        documentation: documentation(node),
    })
}

fn parse_complex_type(location: &str, node: &XmlElementNode) -> Result<ComplexType, BindError> {
    let mut complex_type = ComplexType {
        name: node.attr("name").map(str::to_string),
        mixed: parse_bool(node.attr("mixed")),
        documentation: documentation(node),
        ..ComplexType::default()
    };
    collect_content(location, node, &mut complex_type)?;
    Ok(complex_type)
}

fn collect_content(
    location: &str,
    node: &XmlElementNode,
    target: &mut ComplexType,
) -> Result<(), BindError> {
    for child in node.element_children() {
        match child.name.as_str() {
            "sequence" | "all" | "choice" => collect_particles(location, child, target)?,
            "complexContent" | "simpleContent" => {
                if parse_bool(child.attr("mixed")) {
                    target.mixed = true;
                }
                for derivation in child.element_children() {
                    if !matches!(derivation.name.as_str(), "extension" | "restriction") {
                        continue;
                    }
                    target.base = derivation.attr("base").map(str::to_string);
                    collect_content(location, derivation, target)?;
                }
            }
            "attribute" => target.attributes.push(parse_attribute(child)),
            _ => {}
        }
    }
    Ok(())
}

/// Flattens nested model groups into declaration order.
fn collect_particles(
    location: &str,
    node: &XmlElementNode,
    target: &mut ComplexType,
) -> Result<(), BindError> {
    for child in node.element_children() {
        match child.name.as_str() {
            "element" => target.elements.push(parse_element_decl(location, child)?),
            "sequence" | "all" | "choice" => collect_particles(location, child, target)?,
            _ => {}
        }
    }
    Ok(())
}

fn parse_attribute(node: &XmlElementNode) -> AttributeDecl {
    let name = node
        .attr("name")
        .or_else(|| node.attr("ref").map(strip_prefix))
        .unwrap_or_default()
        .to_string();
    AttributeDecl {
        name,
        type_ref: node.attr("type").map(str::to_string),
        required: node.attr("use") == Some("required"),
    }
}

fn parse_simple_type(node: &XmlElementNode) -> SimpleType {
    let mut simple_type = SimpleType {
        name: node.attr("name").map(str::to_string),
        documentation: documentation(node),
        ..SimpleType::default()
    };

    if let Some(restriction) = node.first_child("restriction") {
        simple_type.base = restriction.attr("base").map(str::to_string);
        simple_type.enumeration = restriction
            .children_named("enumeration")
            .filter_map(|value| value.attributes.get("value").cloned())
            .collect();
    }
    if let Some(list) = node.first_child("list") {
        simple_type.list_item_type = list.attr("itemType").map(str::to_string);
    }

    simple_type
}

fn documentation(node: &XmlElementNode) -> Option<String> {
    let annotation = node.first_child("annotation")?;
    let text = annotation
        .children_named("documentation")
        .map(|doc| doc.text_content().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn parse_bool(raw: Option<&str>) -> bool {
    matches!(raw, Some("true") | Some("1"))
}

fn parse_min_occurs(location: &str, node: &XmlElementNode) -> Result<u32, BindError> {
    match node.attr("minOccurs") {
        None => Ok(1),
        Some(raw) => raw.parse::<u32>().map_err(|_| invalid_occurs(location, node, raw)),
    }
}

fn parse_max_occurs(location: &str, node: &XmlElementNode) -> Result<MaxOccurs, BindError> {
    match node.attr("maxOccurs") {
        None => Ok(MaxOccurs::default()),
        Some("unbounded") => Ok(MaxOccurs::Unbounded),
        Some(raw) => raw
            .parse::<u32>()
            .map(MaxOccurs::Bounded)
            .map_err(|_| invalid_occurs(location, node, raw)),
    }
}

fn invalid_occurs(location: &str, node: &XmlElementNode, raw: &str) -> BindError {
    BindError::parse(
        location,
        format!(
            "Invalid occurrence bound \"{}\" on <{}> at line {}.",
            raw, node.name, node.location.start.line
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGETS: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:tns="urn:widgets"
           xmlns:c="urn:common"
           targetNamespace="urn:widgets">
  <xs:import namespace="urn:common" schemaLocation="common.xsd"/>
  <xs:import namespace="urn:nohint"/>
  <xs:include schemaLocation="more.xsd"/>
  <xs:simpleType name="Color">
    <xs:annotation><xs:documentation>Paint color.</xs:documentation></xs:annotation>
    <xs:restriction base="xs:string">
      <xs:enumeration value="red"/>
      <xs:enumeration value="blue"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:complexType name="Widget">
    <xs:complexContent>
      <xs:extension base="c:Base">
        <xs:sequence>
          <xs:element name="id" type="xs:int"/>
          <xs:choice>
            <xs:element name="color" type="tns:Color" minOccurs="0"/>
            <xs:element name="tags" type="xs:string" maxOccurs="unbounded"/>
          </xs:choice>
          <xs:element name="parent" type="tns:Widget" nillable="true"/>
        </xs:sequence>
        <xs:attribute name="version" type="xs:int" use="required"/>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:element name="GetWidget">
    <xs:complexType>
      <xs:sequence><xs:element ref="tns:WidgetId"/></xs:sequence>
    </xs:complexType>
  </xs:element>
  <xs:element name="WidgetId" type="xs:long"/>
</xs:schema>"#;

    #[test]
    fn parse_schema_collects_declarations() {
        let schema = parse_schema_document("widgets.xsd", WIDGETS.as_bytes())
            .expect("schema should parse");
        assert_eq!(schema.target_namespace, "urn:widgets");
        assert_eq!(
            schema.namespaces.get("c").map(String::as_str),
            Some("urn:common")
        );
        assert_eq!(schema.imports.len(), 2);
        assert_eq!(schema.imports[1].schema_location, None);
        assert_eq!(
            schema.includes[0].schema_location.as_deref(),
            Some("more.xsd")
        );
        assert!(schema.has_externals());

        let color = &schema.simple_types[0];
        assert_eq!(color.base.as_deref(), Some("xs:string"));
        assert_eq!(color.enumeration, vec!["red".to_string(), "blue".to_string()]);
        assert_eq!(color.documentation.as_deref(), Some("Paint color."));
    }

    #[test]
    fn parse_complex_type_flattens_particles_and_derivation() {
        let schema = parse_schema_document("widgets.xsd", WIDGETS.as_bytes())
            .expect("schema should parse");
        let widget = &schema.complex_types[0];
        assert_eq!(widget.name.as_deref(), Some("Widget"));
        assert_eq!(widget.base.as_deref(), Some("c:Base"));
        let names = widget
            .elements
            .iter()
            .map(|element| element.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["id", "color", "tags", "parent"]);
        assert_eq!(widget.elements[1].min_occurs, 0);
        assert_eq!(widget.elements[2].max_occurs, MaxOccurs::Unbounded);
        assert!(widget.elements[3].nillable);
        assert!(widget.attributes[0].required);
    }

    #[test]
    fn parse_element_keeps_inline_types_and_refs() {
        let schema = parse_schema_document("widgets.xsd", WIDGETS.as_bytes())
            .expect("schema should parse");
        let get_widget = &schema.elements[0];
        let inline = get_widget
            .complex_type
            .as_ref()
            .expect("inline complex type");
        assert!(inline.name.is_none());
        assert_eq!(inline.elements[0].name, "WidgetId");
        assert_eq!(
            inline.elements[0].element_ref.as_deref(),
            Some("tns:WidgetId")
        );
        assert_eq!(schema.elements[1].type_ref.as_deref(), Some("xs:long"));
    }

    #[test]
    fn parse_schema_rejects_unnamed_top_level_types() {
        let source = r#"<schema xmlns="http://www.w3.org/2001/XMLSchema"><complexType/></schema>"#;
        let error = parse_schema_document("bad.xsd", source.as_bytes())
            .expect_err("unnamed type should fail");
        assert_eq!(error.code(), "PARSE_ERROR");
    }

    #[test]
    fn parse_schema_rejects_invalid_occurrence_bounds() {
        let source = r#"<schema xmlns="http://www.w3.org/2001/XMLSchema">
  <element name="x" type="string" maxOccurs="many"/>
</schema>"#;
        let error = parse_schema_document("bad.xsd", source.as_bytes())
            .expect_err("invalid maxOccurs should fail");
        assert!(error.to_string().contains("many"));
    }

    #[test]
    fn parse_schema_document_requires_schema_root() {
        let error = parse_schema_document("x.xsd", b"<definitions/>")
            .expect_err("wrong root should fail");
        assert_eq!(error.code(), "PARSE_ERROR");
    }
}
