//! Centralized identifier handling utilities for T-SQL parsing.
//!
//! # Examples
//!
//! ```ignore
//! use crate::parser::identifier_utils::*;
//!
//! assert_eq!(normalize_identifier("[MyTable]"), "MyTable");
//! assert_eq!(quote_identifier("odd]name"), "[odd]]name]");
//! assert_eq!(comparison_key("[dbo].[Foo]"), "dbo.foo");
//! ```

use crate::model::name::split_identifier_parts;

/// Strips brackets `[]` and double quotes `""` from a single-part identifier.
///
/// ```ignore
/// assert_eq!(normalize_identifier("[MyTable]"), "MyTable");
/// assert_eq!(normalize_identifier("\"MyColumn\""), "MyColumn");
/// assert_eq!(normalize_identifier("  [Trimmed]  "), "Trimmed");
/// ```
pub fn normalize_identifier(ident: &str) -> String {
    let trimmed = ident.trim();
    if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        inner.replace("]]", "]")
    } else {
        trimmed.trim_matches('"').to_string()
    }
}

/// Wraps an identifier in brackets, escaping any embedded `]`.
pub fn quote_identifier(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

/// Lowercased, unquoted, dot-joined form of a possibly multi-part identifier.
pub fn comparison_key(ident: &str) -> String {
    split_identifier_parts(ident)
        .iter()
        .map(|p| p.to_lowercase())
        .collect::<Vec<_>>()
        .join(".")
}

/// Whether an identifier names a variable or temp object (`@x`, `#t`).
pub fn is_local_identifier(ident: &str) -> bool {
    ident.starts_with('@') || ident.starts_with('#')
}
