//! Filter value escaping.
//!
//! Values interpolated into a filter must not be able to alter the filter
//! structure. The characters reserved by the LDAP filter grammar are
//! hex-encoded as `\XX` escape sequences before a value reaches a node.

/// Escapes the characters reserved by the LDAP filter grammar.
///
/// Encodes backslash, `*`, `(`, `)`, and NUL as hex escape sequences.
/// All other characters pass through unchanged.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\5c"),
            '*' => out.push_str("\\2a"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '\0' => out.push_str("\\00"),
            _ => out.push(c),
        }
    }
    out
}
