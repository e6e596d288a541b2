//! Balanced-brace JSON extraction (§9 design note): LLM responses often
//! wrap the JSON payload in prose or markdown fences. This walks the raw
//! text tracking brace depth while ignoring braces inside string literals,
//! and returns the first balanced `{...}` or `[...]` span it finds.

pub fn extract_json(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut start = None;
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut open: u8 = b'{';
    let mut close: u8 = b'}';

    for (i, &b) in bytes.iter().enumerate() {
        if start.is_none() {
            if b == b'{' || b == b'[' {
                start = Some(i);
                open = b;
                close = if b == b'{' { b'}' } else { b']' };
                depth = 1;
            }
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    let s = start.unwrap();
                    return std::str::from_utf8(&bytes[s..=i]).ok();
                }
            }
            _ => {}
        }
    }
    None
}

/// Extracts and parses a JSON value, returning `None` on malformed JSON
/// rather than erroring — callers fall back to documented defaults per
/// §4.B / §7 (upstream-malformed is never a hard failure).
pub fn extract_json_value(text: &str) -> Option<serde_json::Value> {
    extract_json(text).and_then(|s| serde_json::from_str(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let text = "Sure, here you go:\n```json\n{\"a\": 1, \"b\": [1,2,3]}\n```\nHope that helps!";
        let extracted = extract_json(text).unwrap();
        assert_eq!(extracted, r#"{"a": 1, "b": [1,2,3]}"#);
    }

    #[test]
    fn ignores_braces_inside_string_literals() {
        let text = r#"{"note": "contains a { brace } inside a string", "n": 2}"#;
        let value = extract_json_value(text).unwrap();
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn extracts_top_level_array() {
        let text = "result: [\"a\", \"b\"]";
        let value = extract_json_value(text).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn returns_none_for_malformed_json() {
        let text = "not json at all, no braces here";
        assert!(extract_json_value(text).is_none());
    }
}
