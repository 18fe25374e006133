//! Shell value quoting utilities
//!
//! Values printed by `set`, `export -p`, `readonly -p` and `set -x` must be
//! re-readable as shell input.

/// Check if a string contains only safe characters that don't need quoting.
/// Safe chars: alphanumerics, underscore, slash, dot, colon, hyphen, at, percent, plus, comma, equals
fn is_safe_value(value: &str) -> bool {
    value.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || matches!(c, '_' | '/' | '.' | ':' | '-' | '@' | '%' | '+' | ',' | '=')
    })
}

/// Quote a value for shell output
/// - No quotes for simple values
/// - Single quotes otherwise, embedded single quotes written as '\''
pub fn quote_value(value: &str) -> String {
    if !value.is_empty() && is_safe_value(value) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\\''"))
}
