//! Identifier validation for declared and exported names.

/// Words that can never name a local binding. `default` is still a valid
/// *export* name; it is only reserved on the declaring side.
const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with",
];

/// Check if a character can start an identifier.
fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_ascii_alphabetic() || (ch as u32 > 0x7F && unicode_xid::UnicodeXID::is_xid_start(ch))
}

/// Check if a character can be part of an identifier.
fn is_identifier_part(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_ascii_alphanumeric() || (ch as u32 > 0x7F && unicode_xid::UnicodeXID::is_xid_continue(ch))
}

/// Whether `text` is syntactically an identifier name.
pub fn is_identifier_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_part),
        _ => false,
    }
}

/// Whether `text` is a reserved word.
pub fn is_reserved_word(text: &str) -> bool {
    RESERVED_WORDS.contains(&text)
}

/// Whether `text` may name a local binding: an identifier name that is not
/// a reserved word.
pub fn is_binding_identifier(text: &str) -> bool {
    is_identifier_name(text) && !is_reserved_word(text)
}
