use serde::Serialize;
use tracing::{debug, warn};
use wb_core::{strip_prefix, BindError, Message};

use crate::context::TypeContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBinding {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedMessage {
    pub name: String,
    pub code: String,
    pub reason: String,
}

/// Bound messages in declaration order, plus the ones left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundMessages {
    pub bound: Vec<MessageBinding>,
    pub skipped: Vec<SkippedMessage>,
}

impl BoundMessages {
    /// Looks a message up by local name; `tns:Foo` and `Foo` are the same.
    pub fn get(&self, name: &str) -> Option<&MessageBinding> {
        let local = strip_prefix(name);
        self.bound.iter().find(|binding| binding.name == local)
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        let local = strip_prefix(name);
        self.skipped.iter().any(|skipped| skipped.name == local)
    }
}

/// Binds a wrapped document/literal message: exactly one part whose type
/// or element resolves in `context`.
pub fn bind_message(context: &TypeContext<'_>, message: &Message) -> Result<MessageBinding, BindError> {
    let [part] = message.parts.as_slice() else {
        return Err(BindError::UnsupportedMessageShape {
            message: message.name.clone(),
            parts: message.parts.len(),
        });
    };

    let type_name = match (part.type_ref.as_deref(), part.element_ref.as_deref()) {
        (Some(type_ref), _) => context.lookup_type(type_ref)?,
        (None, Some(element_ref)) => context.resolve_element(element_ref)?,
        (None, None) => {
            return Err(BindError::UnresolvedType {
                namespace: context.namespace().to_string(),
                name: format!("{}.{}", message.name, part.name),
            })
        }
    };

    debug!(message = %message.name, type_name = %type_name, "bound message");
    Ok(MessageBinding {
        name: message.name.clone(),
        type_name,
    })
}

/// Binds every message. Shape and resolution problems skip the message
/// with a warning; anything else aborts.
pub fn bind_messages(
    context: &TypeContext<'_>,
    messages: &[Message],
) -> Result<BoundMessages, BindError> {
    let mut result = BoundMessages::default();
    for message in messages {
        match bind_message(context, message) {
            Ok(binding) => result.bound.push(binding),
            Err(error) if !error.is_fatal() => {
                warn!(
                    message = %message.name,
                    code = error.code(),
                    reason = %error,
                    "skipping message"
                );
                result.skipped.push(SkippedMessage {
                    name: message.name.clone(),
                    code: error.code().to_string(),
                    reason: error.to_string(),
                });
            }
            Err(error) => return Err(error),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{SchemaGraph, SchemaOrigin};
    use crate::registry::{register_types, GlobalRegistry};
    use crate::settings::ResolverSettings;
    use std::collections::BTreeMap;
    use wb_core::MessagePart;
    use wb_parser::parse_schema_document;

    const QUOTES: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    xmlns:q="urn:quotes" targetNamespace="urn:quotes">
  <xs:element name="getQuote">
    <xs:complexType><xs:sequence><xs:element name="symbol" type="xs:string"/></xs:sequence></xs:complexType>
  </xs:element>
  <xs:element name="quote" type="q:Quote"/>
  <xs:complexType name="Quote"><xs:sequence><xs:element name="price" type="xs:double"/></xs:sequence></xs:complexType>
</xs:schema>"#;

    fn registry() -> GlobalRegistry {
        let mut graph = SchemaGraph::default();
        let schema = parse_schema_document("quotes.xsd", QUOTES.as_bytes()).expect("schema");
        graph.push("quotes.xsd".to_string(), SchemaOrigin::Inline, schema);
        let mut registry = register_types(&graph, &ResolverSettings::default());
        registry.register_root_namespace("urn:svc", &BTreeMap::new());
        registry
    }

    fn prefixes() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("q".to_string(), "urn:quotes".to_string()),
            ("xsd".to_string(), "http://www.w3.org/2001/XMLSchema".to_string()),
        ])
    }

    fn element_message(name: &str, element: &str) -> Message {
        Message {
            name: name.to_string(),
            parts: vec![MessagePart {
                name: "parameters".to_string(),
                type_ref: None,
                element_ref: Some(element.to_string()),
            }],
        }
    }

    #[test]
    fn bind_message_resolves_element_parts() {
        let registry = registry();
        let context = registry
            .context_with_prefixes("urn:svc", &prefixes())
            .expect("svc context");
        let binding =
            bind_message(&context, &element_message("GetQuoteIn", "q:getQuote")).expect("bound");
        assert_eq!(binding.type_name, "quotes.GetQuote");

        let binding = bind_message(&context, &element_message("QuoteOut", "q:quote")).expect("bound");
        assert_eq!(binding.type_name, "quotes.Quote");
    }

    #[test]
    fn bind_message_prefers_the_type_reference() {
        let registry = registry();
        let context = registry
            .context_with_prefixes("urn:svc", &prefixes())
            .expect("svc context");
        let message = Message {
            name: "Price".to_string(),
            parts: vec![MessagePart {
                name: "value".to_string(),
                type_ref: Some("xsd:double".to_string()),
                element_ref: Some("q:quote".to_string()),
            }],
        };
        assert_eq!(
            bind_message(&context, &message).expect("bound").type_name,
            "float64"
        );
    }

    #[test]
    fn bind_message_rejects_other_shapes() {
        let registry = registry();
        let context = registry
            .context_with_prefixes("urn:svc", &prefixes())
            .expect("svc context");
        let empty = Message {
            name: "Ping".to_string(),
            parts: Vec::new(),
        };
        assert_eq!(
            bind_message(&context, &empty).expect_err("zero parts"),
            BindError::UnsupportedMessageShape {
                message: "Ping".to_string(),
                parts: 0,
            }
        );

        let mut two = element_message("Two", "q:quote");
        two.parts.push(two.parts[0].clone());
        assert_eq!(
            bind_message(&context, &two).expect_err("two parts").code(),
            "UNSUPPORTED_MESSAGE_SHAPE"
        );
    }

    #[test]
    fn bind_messages_skips_and_continues() {
        let registry = registry();
        let context = registry
            .context_with_prefixes("urn:svc", &prefixes())
            .expect("svc context");
        let messages = vec![
            Message {
                name: "Ping".to_string(),
                parts: Vec::new(),
            },
            element_message("Lost", "q:nothing"),
            element_message("Elsewhere", "zz:thing"),
            element_message("GetQuoteIn", "q:getQuote"),
        ];
        let bound = bind_messages(&context, &messages).expect("non-fatal problems only");
        assert_eq!(bound.bound.len(), 1);
        assert_eq!(
            bound.get("tns:GetQuoteIn").map(|binding| binding.type_name.as_str()),
            Some("quotes.GetQuote")
        );
        assert!(bound.get("Ping").is_none());
        assert!(bound.is_skipped("Ping"));
        assert_eq!(
            bound
                .skipped
                .iter()
                .map(|skipped| skipped.code.as_str())
                .collect::<Vec<_>>(),
            vec!["UNSUPPORTED_MESSAGE_SHAPE", "UNRESOLVED_TYPE", "UNRESOLVED_TYPE"]
        );
    }
}
