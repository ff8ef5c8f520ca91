//! Identifier facts: keyword tables, verbatim (`@`) identifiers, unicode
//! escapes, and replacement-name validity.

/// All reserved C# keyword spellings.
///
/// This is deliberately the full language list, independent of the subset the
/// parser understands: rename must re-escape a replacement like `@while` even
/// though the grammar never parses a `while` statement header from it.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class",
    "const", "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event",
    "explicit", "extern", "false", "finally", "fixed", "float", "for", "foreach", "goto", "if",
    "implicit", "in", "int", "interface", "internal", "is", "lock", "long", "namespace", "new",
    "null", "object", "operator", "out", "override", "params", "private", "protected", "public",
    "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static",
    "string", "struct", "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong",
    "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile", "while",
];

/// Contextual keywords that are never valid rename targets, mirroring the
/// compiler's deny-list for replacement names.
const INVALID_REPLACEMENTS: &[&str] = &["var", "dynamic", "unmanaged", "notnull"];

pub fn is_reserved_keyword(text: &str) -> bool {
    RESERVED_KEYWORDS.binary_search(&text).is_ok()
}

pub fn is_verbatim(text: &str) -> bool {
    text.starts_with('@')
}

/// The canonical value of an identifier spelling: the `@` marker is stripped
/// and `\uXXXX` escapes are decoded. `\u0076ar` and `@var` both have the
/// value `var`.
pub fn value_text(text: &str) -> String {
    let text = text.strip_prefix('@').unwrap_or(text);
    if !text.contains('\\') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c == '\\' && text[idx + 1..].starts_with('u') {
            let hex = &text[idx + 2..];
            let digits: String = hex.chars().take(4).take_while(|c| c.is_ascii_hexdigit()).collect();
            if digits.len() == 4 {
                if let Some(decoded) =
                    u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
                {
                    out.push(decoded);
                    // Skip `u` plus the four hex digits.
                    for _ in 0..5 {
                        chars.next();
                    }
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Lexical identifier check on the *value* text (escapes already decoded, no
/// `@` marker).
pub fn is_identifier_value(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if first != '_' && !unicode_ident::is_xid_start(first) {
        return false;
    }
    chars.all(|c| c == '_' || unicode_ident::is_xid_continue(c))
}

/// Whether `text` (escaped or not) is acceptable as a replacement name.
///
/// The engine itself assumes a valid replacement; callers run this before
/// constructing a rename session.
pub fn is_valid_replacement(text: &str) -> bool {
    if INVALID_REPLACEMENTS.contains(&text) {
        return false;
    }
    is_identifier_value(&value_text(text))
}

/// Escape an identifier with the verbatim marker when its value collides with
/// a reserved keyword spelling; otherwise return it unchanged.
pub fn escape_if_needed(text: &str) -> String {
    if is_verbatim(text) {
        return text.to_string();
    }
    if is_reserved_keyword(text) {
        format!("@{text}")
    } else {
        text.to_string()
    }
}

/// Drop a needless verbatim marker (`@foo` -> `foo`); keeps it when the value
/// is a keyword spelling.
pub fn unescape_if_possible(text: &str) -> String {
    match text.strip_prefix('@') {
        Some(rest) if !is_reserved_keyword(rest) => rest.to_string(),
        _ => text.to_string(),
    }
}

/// Strip the conventional `Attribute` suffix, if present and non-degenerate.
pub fn without_attribute_suffix(text: &str) -> Option<&str> {
    let stripped = text.strip_suffix("Attribute")?;
    (!stripped.is_empty()).then_some(stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_is_sorted() {
        let mut sorted = RESERVED_KEYWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_KEYWORDS);
    }

    #[test]
    fn value_text_decodes_escapes() {
        assert_eq!(value_text("@class"), "class");
        assert_eq!(value_text(r"\u0076ar"), "var");
        assert_eq!(value_text("plain"), "plain");
    }

    #[test]
    fn replacement_validity() {
        assert!(is_valid_replacement("Foo"));
        assert!(is_valid_replacement("@while"));
        assert!(is_valid_replacement("_x1"));
        assert!(!is_valid_replacement("var"));
        assert!(!is_valid_replacement("dynamic"));
        assert!(!is_valid_replacement("1abc"));
        assert!(!is_valid_replacement(""));
        assert!(!is_valid_replacement("a b"));
    }

    #[test]
    fn escaping_round_trip() {
        assert_eq!(escape_if_needed("while"), "@while");
        assert_eq!(escape_if_needed("Foo"), "Foo");
        assert_eq!(unescape_if_possible("@Foo"), "Foo");
        assert_eq!(unescape_if_possible("@while"), "@while");
    }

    #[test]
    fn attribute_suffix() {
        assert_eq!(without_attribute_suffix("ObsoleteAttribute"), Some("Obsolete"));
        assert_eq!(without_attribute_suffix("Attribute"), None);
        assert_eq!(without_attribute_suffix("Obsolete"), None);
    }
}
