//! Identifier helpers for generated code.

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

// Keywords that cannot be raw identifiers.
const RUST_RESERVED: &[&str] = &["crate", "self", "Self", "super", "_"];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Field name as a Rust identifier.
pub(crate) fn rust_ident(name: &str) -> String {
    if RUST_RESERVED.contains(&name) {
        format!("{name}_")
    } else if RUST_KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Field name as a Python attribute.
pub(crate) fn python_ident(name: &str) -> String {
    if PYTHON_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Double-quoted literal valid in Python and TypeScript.
pub(crate) fn quoted(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

/// Double-quoted Rust string literal.
pub(crate) fn rust_quoted(text: &str) -> String {
    format!("{text:?}")
}

/// `geometry_msgs/Point` to `geometry_msgs`, `Point`.
pub(crate) fn split_type_name(type_name: &str) -> (Option<&str>, &str) {
    match type_name.rsplit_once('/') {
        Some((package, name)) => (Some(package), name),
        None => (None, type_name),
    }
}
