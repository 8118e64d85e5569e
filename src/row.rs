use std::sync::OnceLock;

use regex::Regex;

fn escape_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\t\n\r]").unwrap())
}

/// Encodes one record as a tab-delimited line terminated by a single
/// newline. Tab, newline and carriage-return characters inside a field are
/// each replaced with a space and the field is trimmed, so naive
/// tab-splitting is always valid on read-back; no quoting is needed.
/// A field that is absent, or empty after trimming, serializes as the empty
/// string.
pub fn encode(fields: &[Option<String>]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push('\t');
        }
        if let Some(value) = field {
            let escaped = escape_chars().replace_all(value, " ");
            line.push_str(escaped.trim());
        }
    }
    line.push('\n');
    line
}

/// Cleans a single field the same way `encode` does, returning `None` when
/// nothing survives trimming.
pub fn clean_field(value: &str) -> Option<String> {
    let escaped = escape_chars().replace_all(value, " ");
    let trimmed = escaped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_control_characters_with_spaces() {
        let fields = vec![Some("a\tb\nc\rd".to_string())];
        assert_eq!(encode(&fields), "a b c d\n");
    }

    #[test]
    fn absent_fields_serialize_empty() {
        let fields = vec![
            Some("x".to_string()),
            None,
            Some("  ".to_string()),
            Some("y".to_string()),
        ];
        assert_eq!(encode(&fields), "x\t\t\ty\n");
    }

    #[test]
    fn single_line_output() {
        let fields = vec![Some("first\nsecond".to_string()), Some("third".to_string())];
        let line = encode(&fields);
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn clean_field_drops_whitespace_only_values() {
        assert_eq!(clean_field(" \t "), None);
        assert_eq!(clean_field(" ok "), Some("ok".to_string()));
    }
}
