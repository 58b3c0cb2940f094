mod schema;
mod wsdl;
mod xml;

pub use schema::{parse_schema_document, parse_schema_element};
pub use wsdl::parse_definitions_element;
pub use xml::{parse_xml_document, XmlDocument, XmlElementNode, XmlNode, XmlTextNode};

use wb_core::{BindError, RootDocument};

/// Parses the root of a run: a WSDL `definitions` document or a bare schema.
pub fn parse_root_document(location: &str, bytes: &[u8]) -> Result<RootDocument, BindError> {
    let document = parse_xml_document(location, bytes)?;
    match document.root.name.as_str() {
        "definitions" => Ok(RootDocument::Wsdl(parse_definitions_element(
            location,
            &document.root,
        )?)),
        "schema" => Ok(RootDocument::Schema(parse_schema_element(
            location,
            &document.root,
        )?)),
        other => Err(BindError::parse(
            location,
            format!(
                "Expected <definitions> or <schema> root, got <{}> at line {}.",
                other, document.root.location.start.line
            ),
        )),
    }
}
