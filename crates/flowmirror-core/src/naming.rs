//! # Naming
//!
//! Identifier checks and case conversion shared by the declaration
//! validator and the schema generator.

/// Returns true if `s` is a usable model, field, or enum identifier:
/// an ASCII letter or underscore followed by ASCII alphanumerics or underscores.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Upper-case the first character: `sourceNodeId` → `SourceNodeId`.
///
/// Underscore-separated words are joined and each capitalised, so
/// `refresh_token` → `RefreshToken`.
pub fn pascal_case(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
