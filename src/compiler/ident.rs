//! Identifier escaping

use std::sync::OnceLock;

use regex::Regex;

static PLAIN: OnceLock<Option<Regex>> = OnceLock::new();

fn is_plain(name: &str) -> bool {
    PLAIN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}

/// Renders a field or table name, bracket-escaping anything not plain
pub fn escape_ident(name: &str) -> String {
    if is_plain(name) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 8);
    out.push('⟨');
    for c in name.chars() {
        if c == '⟩' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('⟩');
    out
}

/// Renders a field path with an optional tunnel role dereference
pub fn escape_path(path: &str, tunnel: Option<&str>) -> String {
    match tunnel {
        Some(role) => format!("{}.{}", escape_ident(path), escape_ident(role)),
        None => escape_ident(path),
    }
}
