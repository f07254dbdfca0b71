//! List Codec
//!
//! Canonical list string form: elements separated by single spaces, each
//! element quoted just enough to parse back to the same string. This is
//! the round-trip law the rest of the engine leans on: formatting a list
//! and re-parsing it yields element-wise equal strings.

use crate::value::value::Value;

/// Characters that force an element to be quoted in canonical form.
fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s.starts_with('#')
        || s.chars().any(|c| {
            matches!(
                c,
                ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c' | '{' | '}' | '"' | '$' | '[' | ']'
                    | ';' | '\\'
            )
        })
}

/// True when every open brace in `s` has a matching close and no brace is
/// escaped, so `{s}` parses back to exactly `s`.
fn braces_balanced(s: &str) -> bool {
    let mut depth: i32 = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    // trailing backslash would merge with the closing brace
                    return false;
                }
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && !s.ends_with('\\')
}

/// Quote a single element for inclusion in a canonical list string.
pub fn quote_element(s: &str) -> String {
    if !needs_quoting(s) {
        return s.to_string();
    }
    if braces_balanced(s) && !s.contains('\\') {
        return format!("{{{}}}", s);
    }
    // Backslash form: escape everything significant.
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            ' ' | '\t' | '{' | '}' | '"' | '$' | '[' | ']' | ';' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0b' => out.push_str("\\v"),
            '\x0c' => out.push_str("\\f"),
            _ => out.push(c),
        }
    }
    if out.is_empty() {
        out.push_str("{}");
    }
    out
}

/// Format values as a canonical list string.
pub fn format_list(items: &[Value]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&quote_element(&item.as_str()));
    }
    out
}

/// Parse a list string into its elements.
///
/// Follows the standard rules: elements separated by whitespace, `{…}`
/// groups nest and are stripped, `"…"` groups are stripped, backslash
/// escapes are substituted in bare and quoted elements but kept literal
/// inside braces.
pub fn parse_list(s: &str) -> Result<Vec<Value>, String> {
    let chars: Vec<char> = s.chars().collect();
    let mut items = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        // Skip inter-element whitespace
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        match chars[i] {
            '{' => {
                let start = i + 1;
                let mut depth = 1;
                i += 1;
                while i < chars.len() && depth > 0 {
                    match chars[i] {
                        '\\' => {
                            i += 1;
                        }
                        '{' => depth += 1,
                        '}' => depth -= 1,
                        _ => {}
                    }
                    i += 1;
                }
                if depth > 0 {
                    return Err("unmatched open brace in list".to_string());
                }
                let element: String = chars[start..i - 1].iter().collect();
                if i < chars.len() && !chars[i].is_whitespace() {
                    return Err(format!(
                        "list element in braces followed by \"{}\" instead of space",
                        chars[i]
                    ));
                }
                items.push(Value::str(element));
            }
            '"' => {
                let mut element = String::new();
                i += 1;
                let mut closed = false;
                while i < chars.len() {
                    match chars[i] {
                        '\\' if i + 1 < chars.len() => {
                            element.push(backslash_subst(chars[i + 1]));
                            i += 2;
                        }
                        '"' => {
                            i += 1;
                            closed = true;
                            break;
                        }
                        c => {
                            element.push(c);
                            i += 1;
                        }
                    }
                }
                if !closed {
                    return Err("unmatched open quote in list".to_string());
                }
                if i < chars.len() && !chars[i].is_whitespace() {
                    return Err(format!(
                        "list element in quotes followed by \"{}\" instead of space",
                        chars[i]
                    ));
                }
                items.push(Value::str(element));
            }
            _ => {
                let mut element = String::new();
                while i < chars.len() && !chars[i].is_whitespace() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        element.push(backslash_subst(chars[i + 1]));
                        i += 2;
                    } else {
                        element.push(chars[i]);
                        i += 1;
                    }
                }
                items.push(Value::str(element));
            }
        }
    }

    Ok(items)
}

/// Single-character backslash substitutions used by the list parser.
fn backslash_subst(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'v' => '\x0b',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[Value]) -> Vec<String> {
        items.iter().map(|v| v.as_str()).collect()
    }

    #[test]
    fn test_parse_simple() {
        let items = parse_list("a b c").unwrap();
        assert_eq!(strs(&items), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_braced() {
        let items = parse_list("a {b c} {d {e f}}").unwrap();
        assert_eq!(strs(&items), vec!["a", "b c", "d {e f}"]);
    }

    #[test]
    fn test_parse_quoted() {
        let items = parse_list("\"a b\" c").unwrap();
        assert_eq!(strs(&items), vec!["a b", "c"]);
    }

    #[test]
    fn test_parse_escapes() {
        let items = parse_list("a\\ b c").unwrap();
        assert_eq!(strs(&items), vec!["a b", "c"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_list("").unwrap().is_empty());
        assert!(parse_list("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_list("{a b").is_err());
        assert!(parse_list("\"a b").is_err());
        assert!(parse_list("{a}b").is_err());
    }

    #[test]
    fn test_quote_element() {
        assert_eq!(quote_element("abc"), "abc");
        assert_eq!(quote_element("a b"), "{a b}");
        assert_eq!(quote_element(""), "{}");
        assert_eq!(quote_element("a{b"), "a\\{b");
    }

    #[test]
    fn test_round_trip() {
        let originals = vec![
            Value::str("plain"),
            Value::str("two words"),
            Value::str(""),
            Value::str("brace { alone"),
            Value::str("tab\there"),
            Value::str("semi;colon"),
        ];
        let formatted = format_list(&originals);
        let reparsed = parse_list(&formatted).unwrap();
        assert_eq!(strs(&originals), strs(&reparsed));
    }

    #[test]
    fn test_nested_round_trip() {
        let inner = Value::list(vec![Value::str("x y"), Value::str("z")]);
        let outer = Value::list(vec![inner.clone(), Value::str("w")]);
        let reparsed = parse_list(&outer.as_str()).unwrap();
        assert_eq!(reparsed[0].as_str(), inner.as_str());
        assert_eq!(reparsed[1].as_str(), "w");
    }
}
