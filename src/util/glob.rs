//! Glob Pattern Matching
//!
//! Backs `string match`, `switch -glob`, namespace export/import
//! patterns and the pattern arguments of `info`. Patterns support `*`,
//! `?`, `[…]` character classes (with ranges and `^` negation) and
//! backslash escapes. Matching converts the glob to an anchored regex.

use regex_lite::Regex;

fn is_regex_special(c: char) -> bool {
    matches!(
        c,
        '.' | '+' | '(' | ')' | '{' | '}' | '^' | '$' | '|' | '\\' | '*' | '?' | '['
    )
}

/// Convert a glob pattern to an anchored regex string.
pub fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut regex = String::from("^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                regex.push_str(".*");
                i += 1;
            }
            '?' => {
                regex.push('.');
                i += 1;
            }
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                if is_regex_special(next) {
                    regex.push('\\');
                }
                regex.push(next);
                i += 2;
            }
            '[' => {
                // Copy the class through, translating leading ! to ^.
                let mut class = String::from("[");
                let mut j = i + 1;
                if matches!(chars.get(j), Some('!') | Some('^')) {
                    class.push('^');
                    j += 1;
                }
                // A ] directly after the opening is literal.
                if chars.get(j) == Some(&']') {
                    class.push_str("\\]");
                    j += 1;
                }
                let mut closed = false;
                while j < chars.len() {
                    let c = chars[j];
                    if c == ']' {
                        closed = true;
                        j += 1;
                        break;
                    }
                    if c == '\\' || c == '[' {
                        class.push('\\');
                    }
                    class.push(c);
                    j += 1;
                }
                if closed {
                    class.push(']');
                    regex.push_str(&class);
                    i = j;
                } else {
                    // Unterminated class: treat the bracket literally.
                    regex.push_str("\\[");
                    i += 1;
                }
            }
            c => {
                if is_regex_special(c) {
                    regex.push('\\');
                }
                regex.push(c);
                i += 1;
            }
        }
    }

    regex.push('$');
    regex
}

/// Glob match with exact case.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    match Regex::new(&glob_to_regex(pattern)) {
        Ok(re) => re.is_match(text),
        Err(_) => pattern == text,
    }
}

/// Case-insensitive glob match.
pub fn glob_match_nocase(pattern: &str, text: &str) -> bool {
    match Regex::new(&format!("(?i){}", glob_to_regex(pattern))) {
        Ok(re) => re.is_match(text),
        Err(_) => pattern.to_lowercase() == text.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal() {
        assert!(glob_match("abc", "abc"));
        assert!(!glob_match("abc", "abd"));
        assert!(!glob_match("abc", "abcd"));
    }

    #[test]
    fn test_star() {
        assert!(glob_match("a*", "abc"));
        assert!(glob_match("*", ""));
        assert!(glob_match("*c", "abc"));
        assert!(glob_match("a*c", "abbbc"));
        assert!(!glob_match("a*c", "abd"));
    }

    #[test]
    fn test_question() {
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "ac"));
    }

    #[test]
    fn test_class() {
        assert!(glob_match("a[bc]d", "abd"));
        assert!(glob_match("a[bc]d", "acd"));
        assert!(!glob_match("a[bc]d", "aed"));
        assert!(glob_match("a[0-9]z", "a5z"));
        assert!(glob_match("a[^0-9]z", "axz"));
        assert!(glob_match("a[!0-9]z", "axz"));
    }

    #[test]
    fn test_escape() {
        assert!(glob_match("a\\*b", "a*b"));
        assert!(!glob_match("a\\*b", "axb"));
    }

    #[test]
    fn test_regex_metachars_are_literal() {
        assert!(glob_match("a.b", "a.b"));
        assert!(!glob_match("a.b", "axb"));
        assert!(glob_match("a(b)c", "a(b)c"));
    }

    #[test]
    fn test_nocase() {
        assert!(glob_match_nocase("A*", "abc"));
        assert!(!glob_match("A*", "abc"));
    }
}
