use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::settings::ExportPolicy;

/// XML Schema built-ins keyed by lower-cased local name.
pub const PRIMITIVE_TYPES: &[(&str, &str)] = &[
    ("string", "string"),
    ("token", "string"),
    ("normalizedstring", "string"),
    ("language", "string"),
    ("name", "string"),
    ("id", "string"),
    ("idref", "string"),
    ("entity", "string"),
    ("anysimpletype", "string"),
    ("float", "float32"),
    ("double", "float64"),
    ("decimal", "float64"),
    ("integer", "int32"),
    ("int", "int32"),
    ("short", "int16"),
    ("byte", "int8"),
    ("long", "int64"),
    ("positiveinteger", "int64"),
    ("negativeinteger", "int64"),
    ("nonnegativeinteger", "int64"),
    ("nonpositiveinteger", "int64"),
    ("boolean", "bool"),
    ("datetime", "XSDDateTime"),
    ("date", "XSDDate"),
    ("time", "XSDTime"),
    ("duration", "XSDDuration"),
    ("base64binary", "[]byte"),
    ("hexbinary", "[]byte"),
    ("unsignedint", "uint32"),
    ("unsignedshort", "uint16"),
    ("unsignedbyte", "byte"),
    ("unsignedlong", "uint64"),
    ("anytype", "AnyType"),
    ("ncname", "NCName"),
    ("anyuri", "AnyURI"),
    ("qname", "QName"),
];

const BASIC_TYPES: &[&str] = &[
    "string",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "bool",
    "[]byte",
    "byte",
    "rune",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "interface{}",
];

const RESERVED_WORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

pub fn primitive_type(local_name: &str) -> Option<&'static str> {
    let key = local_name.to_ascii_lowercase();
    PRIMITIVE_TYPES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, target)| *target)
}

/// Value types of the target language; these are never pointer-wrapped.
pub fn is_basic_type(identifier: &str) -> bool {
    BASIC_TYPES.contains(&identifier)
}

pub fn is_reserved_word(identifier: &str) -> bool {
    RESERVED_WORDS.contains(&identifier)
}

/// Keeps letters, digits and `_`; `.` becomes `_`.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter_map(|ch| match ch {
            '.' => Some('_'),
            ch if ch.is_alphanumeric() || ch == '_' => Some(ch),
            _ => None,
        })
        .collect()
}

pub fn replace_reserved_words(identifier: &str) -> String {
    if is_reserved_word(identifier) {
        return format!("{}_", identifier);
    }
    normalize(identifier)
}

pub fn make_public(identifier: &str) -> String {
    if is_basic_type(identifier) {
        return identifier.to_string();
    }
    let mut chars = identifier.chars();
    match chars.next() {
        None => "EmptyString".to_string(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Upper-cases the first letter of every `_`, `-`, `.` or space separated
/// word and drops the separators. Inner casing is kept.
pub fn to_pascal_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut capitalize_next = true;
    for ch in value.chars() {
        if matches!(ch, '_' | '-' | '.' | ' ') {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}

pub fn synthesize_type_name(name: &str, policy: ExportPolicy) -> String {
    let cased = match policy {
        ExportPolicy::ExportAll => make_public(&to_pascal_case(name)),
        ExportPolicy::PreserveCase => name.to_string(),
    };
    let mut identifier = replace_reserved_words(&cased);
    if identifier.is_empty() {
        return "EmptyString".to_string();
    }
    if identifier.starts_with(|ch: char| ch.is_ascii_digit()) {
        identifier.insert(0, 'X');
    }
    identifier
}

/// Derives the relative package path for a namespace URI, e.g.
/// `http://example.com/stock-quote/` -> `example.com/stockquote`.
pub fn namespace_to_package_path(namespace: &str, replacements: &BTreeMap<String, String>) -> String {
    let lowered = namespace.trim().to_lowercase();
    let without_scheme = scheme_regex().replace(&lowered, "");
    let mut path = without_scheme
        .strip_prefix("urn:")
        .unwrap_or(&without_scheme)
        .replace(':', "/");
    for (from, to) in replacements {
        if !from.is_empty() {
            path = path.replace(from.as_str(), to);
        }
    }
    slash_run_regex()
        .replace_all(&path, "/")
        .trim()
        .trim_matches('/')
        .to_string()
}

/// The identifier a package is referenced by: its last path segment made
/// identifier-safe.
pub fn package_identifier(package_path: &str) -> String {
    let segment = package_path
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or_default()
        .to_lowercase();
    let mut identifier: String = segment
        .chars()
        .filter_map(|ch| match ch {
            '.' | '-' => Some('_'),
            ch if ch.is_ascii_alphanumeric() || ch == '_' => Some(ch),
            _ => None,
        })
        .collect();
    if identifier.is_empty() || identifier.starts_with(|ch: char| ch.is_ascii_digit()) {
        identifier.insert_str(0, "ns");
    }
    replace_reserved_words(&identifier)
}

/// File stem an emitter uses for a namespace's generated source.
pub fn namespace_to_file_name(namespace: &str) -> String {
    let lowered = namespace.trim().to_lowercase();
    let without_scheme = scheme_regex().replace(&lowered, "");
    let last = without_scheme
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or_default();
    last.chars()
        .map(|ch| match ch {
            '-' | '.' | ':' => '_',
            other => other,
        })
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect()
}

/// Removes a `package.` qualifier, keeping any pointer or slice decoration.
pub fn remove_package(type_name: &str) -> String {
    let decoration_len = type_name.len() - type_name.trim_start_matches(['*', '[', ']']).len();
    let (decoration, bare) = type_name.split_at(decoration_len);
    match bare.rsplit_once('.') {
        Some((_, local)) => format!("{}{}", decoration, local),
        None => type_name.to_string(),
    }
}

fn scheme_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[a-z][a-z0-9+.\-]*://").expect("scheme regex must compile"))
}

fn slash_run_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"/{2,}").expect("slash regex must compile"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid_identifier(value: &str) -> bool {
        Regex::new(r"^[\p{L}_][\p{L}\p{N}_]*$")
            .expect("identifier regex must compile")
            .is_match(value)
    }

    fn default_replacements() -> BTreeMap<String, String> {
        BTreeMap::from([("-".to_string(), String::new())])
    }

    #[test]
    fn primitive_lookup_is_case_insensitive() {
        assert_eq!(primitive_type("string"), Some("string"));
        assert_eq!(primitive_type("dateTime"), Some("XSDDateTime"));
        assert_eq!(primitive_type("BASE64BINARY"), Some("[]byte"));
        assert_eq!(primitive_type("Widget"), None);
    }

    #[test]
    fn synthesize_type_name_applies_export_policy() {
        assert_eq!(
            synthesize_type_name("get-widget_response", ExportPolicy::ExportAll),
            "GetWidgetResponse"
        );
        assert_eq!(
            synthesize_type_name("getWidget", ExportPolicy::ExportAll),
            "GetWidget"
        );
        assert_eq!(
            synthesize_type_name("getWidget", ExportPolicy::PreserveCase),
            "getWidget"
        );
    }

    #[test]
    fn synthesize_type_name_disambiguates_keywords_and_bad_starts() {
        assert_eq!(synthesize_type_name("type", ExportPolicy::PreserveCase), "type_");
        assert_eq!(synthesize_type_name("type", ExportPolicy::ExportAll), "Type");
        assert_eq!(synthesize_type_name("3dModel", ExportPolicy::ExportAll), "X3dModel");
        assert_eq!(synthesize_type_name("", ExportPolicy::PreserveCase), "EmptyString");
        assert_eq!(synthesize_type_name("a.b", ExportPolicy::PreserveCase), "a_b");
    }

    #[test]
    fn synthesized_names_are_identifiers() {
        for raw in ["x-y", "über", "with space", "ns.v1.Thing", "1st", "__"] {
            for policy in [ExportPolicy::ExportAll, ExportPolicy::PreserveCase] {
                let name = synthesize_type_name(raw, policy);
                assert!(is_valid_identifier(&name), "{raw} -> {name}");
            }
        }
    }

    #[test]
    fn namespace_to_package_path_strips_scheme_and_separators() {
        let replacements = default_replacements();
        assert_eq!(namespace_to_package_path("urn:b", &replacements), "b");
        assert_eq!(
            namespace_to_package_path("http://Example.com/stock-quote/", &replacements),
            "example.com/stockquote"
        );
        assert_eq!(
            namespace_to_package_path("urn:acme:billing:v2", &replacements),
            "acme/billing/v2"
        );
    }

    #[test]
    fn namespace_to_package_path_applies_configured_replacements() {
        let replacements = BTreeMap::from([
            ("-".to_string(), String::new()),
            ("webservice".to_string(), String::new()),
        ]);
        assert_eq!(
            namespace_to_package_path("https://acme.com/webservice/orders", &replacements),
            "acme.com/orders"
        );
    }

    #[test]
    fn package_identifier_uses_last_segment() {
        assert_eq!(package_identifier("example.com/stockquote"), "stockquote");
        assert_eq!(package_identifier("example.com/stockquote.xsd"), "stockquote_xsd");
        assert_eq!(package_identifier("acme/v2"), "v2");
        assert_eq!(package_identifier("acme/2024"), "ns2024");
        assert_eq!(package_identifier(""), "ns");
        assert_eq!(package_identifier("acme/type"), "type_");
    }

    #[test]
    fn namespace_to_file_name_is_snake_case() {
        assert_eq!(
            namespace_to_file_name("http://example.com/stock-quote.xsd"),
            "stock_quote_xsd"
        );
        assert_eq!(namespace_to_file_name("urn:b"), "urn_b");
    }

    #[test]
    fn remove_package_keeps_decoration() {
        assert_eq!(remove_package("b.Widget"), "Widget");
        assert_eq!(remove_package("*b.Widget"), "*Widget");
        assert_eq!(remove_package("[]b.Widget"), "[]Widget");
        assert_eq!(remove_package("Widget"), "Widget");
    }

    #[test]
    fn basic_types_are_never_wrapped_candidates() {
        assert!(is_basic_type("int32"));
        assert!(is_basic_type("[]byte"));
        assert!(!is_basic_type("XSDDateTime"));
    }
}
