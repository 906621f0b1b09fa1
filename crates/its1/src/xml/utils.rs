//! Helpers for qualified names and namespace declarations.

/// Builds a qualified element name from an optional prefix.
pub fn qualified_name(prefix: Option<&str>, local_name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local_name),
        _ => local_name.to_string(),
    }
}

/// Attribute name that declares `prefix` (the empty prefix is the default namespace).
pub fn xmlns_attribute(prefix: &str) -> String {
    if prefix.is_empty() {
        "xmlns".to_string()
    } else {
        format!("xmlns:{}", prefix)
    }
}

/// Checks if an attribute name is a namespace declaration.
pub fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}
