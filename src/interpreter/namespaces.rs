//! Namespace Registry
//!
//! A flat registry of namespaces keyed by absolute `::`-path. Each node
//! carries its variable map, command map and export patterns. Nodes are
//! created lazily by `namespace eval`, qualified `proc` definitions and
//! `variable`; only `namespace delete` removes them, and the root is
//! immortal.

use indexmap::IndexMap;

use crate::interpreter::interp::Interp;
use crate::interpreter::resolver::parent_ns;
use crate::interpreter::types::{Code, CommandDef};
use crate::util::glob::glob_match;
use crate::value::Value;

/// One namespace node.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub vars: IndexMap<String, Value>,
    pub commands: IndexMap<String, CommandDef>,
    pub exports: Vec<String>,
}

impl Interp {
    /// Create `path` (and any missing ancestors). `path` must be absolute.
    pub fn ensure_namespace(&mut self, path: &str) {
        if self.namespaces.contains_key(path) {
            return;
        }
        if let Some(parent) = parent_ns(path) {
            self.ensure_namespace(&parent);
        }
        self.namespaces.insert(path.to_string(), Namespace::default());
    }

    pub fn namespace_exists(&self, path: &str) -> bool {
        self.namespaces.contains_key(path)
    }

    /// Delete a namespace and everything beneath it. The root is immortal.
    pub fn delete_namespace(&mut self, path: &str) -> Result<(), String> {
        if path == "::" {
            return Err("cannot delete namespace \"::\"".to_string());
        }
        if !self.namespaces.contains_key(path) {
            return Err(format!(
                "unknown namespace \"{}\" in namespace delete command",
                path
            ));
        }
        let child_prefix = format!("{}::", path);
        self.namespaces
            .retain(|key, _| key != path && !key.starts_with(&child_prefix));
        Ok(())
    }

    /// Direct children of a namespace, in creation order.
    pub fn namespace_children(&self, path: &str) -> Vec<String> {
        let prefix = if path == "::" {
            "::".to_string()
        } else {
            format!("{}::", path)
        };
        self.namespaces
            .keys()
            .filter(|key| {
                key.starts_with(&prefix)
                    && key.len() > prefix.len()
                    && !key[prefix.len()..].contains("::")
            })
            .cloned()
            .collect()
    }

    /// Set or extend a namespace's export pattern list.
    pub fn namespace_export(&mut self, path: &str, clear: bool, patterns: &[String]) {
        self.ensure_namespace(path);
        let ns = self.namespaces.get_mut(path).expect("namespace just ensured");
        if clear {
            ns.exports.clear();
        }
        ns.exports.extend(patterns.iter().cloned());
    }

    /// Import commands matching `pattern` from `source_path` into
    /// `target_path`. The pattern must match an export pattern of the
    /// source; non-wildcard patterns that match nothing are errors.
    pub fn namespace_import(
        &mut self,
        target_path: &str,
        source_path: &str,
        pattern: &str,
        force: bool,
    ) -> Result<(), String> {
        let source = self
            .namespaces
            .get(source_path)
            .ok_or_else(|| format!("unknown namespace in import pattern \"{}\"", pattern))?;

        let mut matched: Vec<(String, CommandDef)> = Vec::new();
        for (name, def) in source.commands.iter() {
            if !glob_match(pattern, name) {
                continue;
            }
            if source.exports.iter().any(|p| glob_match(p, name)) {
                matched.push((name.clone(), def.clone()));
            }
        }

        if matched.is_empty() && !pattern.contains(['*', '?', '[']) {
            return Err(format!(
                "can't import command \"{}\": not exported from namespace",
                pattern
            ));
        }

        self.ensure_namespace(target_path);
        for (name, def) in matched {
            let target = self
                .namespaces
                .get(target_path)
                .expect("namespace just ensured");
            if target.commands.contains_key(&name) && !force {
                return Err(format!(
                    "can't import command \"{}\": already exists",
                    name
                ));
            }
            let target = self
                .namespaces
                .get_mut(target_path)
                .expect("namespace just ensured");
            target.commands.insert(name, def);
        }
        Ok(())
    }

    /// Evaluate a script with the active frame temporarily bound to
    /// `path`; a fresh non-proc frame is pushed so unqualified variables
    /// inside resolve to the namespace.
    pub fn namespace_eval(&mut self, path: &str, script: &Value) -> Code {
        self.ensure_namespace(path);
        self.push_ns_frame(path);
        let code = self.eval_value(script, crate::interpreter::types::EvalScope::Local);
        self.pop_frame();
        code
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::interp::Interp;

    #[test]
    fn test_ensure_creates_ancestors() {
        let mut interp = Interp::new();
        interp.ensure_namespace("::a::b::c");
        assert!(interp.namespace_exists("::a"));
        assert!(interp.namespace_exists("::a::b"));
        assert!(interp.namespace_exists("::a::b::c"));
    }

    #[test]
    fn test_delete_removes_children() {
        let mut interp = Interp::new();
        interp.ensure_namespace("::a::b::c");
        interp.ensure_namespace("::ab");
        interp.delete_namespace("::a").unwrap();
        assert!(!interp.namespace_exists("::a"));
        assert!(!interp.namespace_exists("::a::b::c"));
        // Sibling with a shared name prefix survives.
        assert!(interp.namespace_exists("::ab"));
    }

    #[test]
    fn test_delete_root_forbidden() {
        let mut interp = Interp::new();
        let err = interp.delete_namespace("::").unwrap_err();
        assert!(err.contains("cannot delete namespace"));
    }

    #[test]
    fn test_children() {
        let mut interp = Interp::new();
        interp.ensure_namespace("::a::x");
        interp.ensure_namespace("::a::y::deep");
        let children = interp.namespace_children("::a");
        assert_eq!(children, vec!["::a::x".to_string(), "::a::y".to_string()]);
    }

    #[test]
    fn test_export_clear() {
        let mut interp = Interp::new();
        interp.namespace_export("::a", false, &["one*".to_string()]);
        interp.namespace_export("::a", false, &["two*".to_string()]);
        assert_eq!(interp.namespaces.get("::a").unwrap().exports.len(), 2);
        interp.namespace_export("::a", true, &["three*".to_string()]);
        assert_eq!(interp.namespaces.get("::a").unwrap().exports, vec!["three*"]);
    }
}
