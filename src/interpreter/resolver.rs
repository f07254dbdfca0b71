//! Name Resolver
//!
//! `::`-qualified name handling shared by variables, commands and
//! namespaces. A name is qualified iff it contains `::` anywhere; it
//! splits at the last separator into (qualifier, tail). Absolute names
//! have a qualifier starting with `::`; relative qualifiers resolve
//! against the current namespace.

/// A name split into its namespace qualifier and tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualName {
    /// None for unqualified names. `Some("::")` for a bare `::tail`.
    pub qualifier: Option<String>,
    pub tail: String,
}

/// True when the name contains a `::` separator anywhere.
pub fn is_qualified(name: &str) -> bool {
    name.contains("::")
}

/// Split a name at its last `::` separator. Runs of more than two colons
/// collapse into a single separator.
pub fn split_qualified(name: &str) -> QualName {
    let bytes = name.as_bytes();
    // Find the start of the last "::" run.
    let mut last: Option<(usize, usize)> = None; // (start, end) of separator run
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b':' && bytes[i + 1] == b':' {
            let start = i;
            let mut end = i + 2;
            while end < bytes.len() && bytes[end] == b':' {
                end += 1;
            }
            last = Some((start, end));
            i = end;
        } else {
            i += 1;
        }
    }

    match last {
        None => QualName {
            qualifier: None,
            tail: name.to_string(),
        },
        Some((start, end)) => {
            let qualifier = if start == 0 {
                "::".to_string()
            } else {
                name[..start].to_string()
            };
            QualName {
                qualifier: Some(qualifier),
                tail: name[end..].to_string(),
            }
        }
    }
}

/// Resolve a (possibly relative) namespace qualifier against the current
/// namespace, producing an absolute `::`-path.
pub fn resolve_ns(current: &str, qualifier: &str) -> String {
    if qualifier.starts_with("::") {
        normalize_path(qualifier)
    } else if qualifier.is_empty() {
        current.to_string()
    } else if current == "::" {
        normalize_path(&format!("::{}", qualifier))
    } else {
        normalize_path(&format!("{}::{}", current, qualifier))
    }
}

/// Join an absolute namespace path and a tail name into a fully
/// qualified name.
pub fn join_ns(ns: &str, tail: &str) -> String {
    if ns == "::" {
        format!("::{}", tail)
    } else {
        format!("{}::{}", ns, tail)
    }
}

/// Collapse colon runs and drop a trailing separator: `::a:::b::` → `::a::b`.
fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let chars: Vec<char> = path.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ':' && chars.get(i + 1) == Some(&':') {
            out.push_str("::");
            while chars.get(i) == Some(&':') {
                i += 1;
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    if out.len() > 2 && out.ends_with("::") {
        out.truncate(out.len() - 2);
    }
    out
}

/// Parent of an absolute namespace path; None for the root.
pub fn parent_ns(path: &str) -> Option<String> {
    if path == "::" {
        return None;
    }
    let q = split_qualified(path);
    Some(q.qualifier.unwrap_or_else(|| "::".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unqualified() {
        let q = split_qualified("foo");
        assert_eq!(q.qualifier, None);
        assert_eq!(q.tail, "foo");
    }

    #[test]
    fn test_absolute() {
        let q = split_qualified("::foo");
        assert_eq!(q.qualifier.as_deref(), Some("::"));
        assert_eq!(q.tail, "foo");
    }

    #[test]
    fn test_nested() {
        let q = split_qualified("::a::b::c");
        assert_eq!(q.qualifier.as_deref(), Some("::a::b"));
        assert_eq!(q.tail, "c");
    }

    #[test]
    fn test_relative_qualified() {
        let q = split_qualified("a::b");
        assert_eq!(q.qualifier.as_deref(), Some("a"));
        assert_eq!(q.tail, "b");
    }

    #[test]
    fn test_colon_runs_collapse() {
        let q = split_qualified("::a:::b");
        assert_eq!(q.qualifier.as_deref(), Some("::a"));
        assert_eq!(q.tail, "b");
    }

    #[test]
    fn test_resolve_ns() {
        assert_eq!(resolve_ns("::", "a"), "::a");
        assert_eq!(resolve_ns("::x", "a"), "::x::a");
        assert_eq!(resolve_ns("::x", "::a"), "::a");
        assert_eq!(resolve_ns("::x", ""), "::x");
    }

    #[test]
    fn test_join_ns() {
        assert_eq!(join_ns("::", "cmd"), "::cmd");
        assert_eq!(join_ns("::a", "cmd"), "::a::cmd");
    }

    #[test]
    fn test_parent_ns() {
        assert_eq!(parent_ns("::"), None);
        assert_eq!(parent_ns("::a").as_deref(), Some("::"));
        assert_eq!(parent_ns("::a::b").as_deref(), Some("::a"));
    }
}
