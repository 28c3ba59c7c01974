//! Shared utility helpers.

/// Quote a value as a T-SQL string literal, doubling embedded quotes.
pub fn quote_string(value: &str, unicode: bool) -> String {
    let escaped = value.replace('\'', "''");
    if unicode {
        format!("N'{}'", escaped)
    } else {
        format!("'{}'", escaped)
    }
}
