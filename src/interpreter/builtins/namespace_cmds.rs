//! Namespace Commands
//!
//! The `namespace` ensemble: eval, current, delete, exists, export,
//! import, children, parent, qualifiers and tail.

use crate::interpreter::interp::Interp;
use crate::interpreter::resolver::{parent_ns, resolve_ns, split_qualified};
use crate::interpreter::types::Code;
use crate::value::Value;

pub fn cmd_namespace(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("namespace subcommand ?arg ...?");
    }
    let sub = argv[1].as_str();
    match sub.as_str() {
        "current" => {
            let ns = interp.active_frame().namespace.clone();
            interp.ok(Value::str(ns))
        }
        "eval" => {
            if argv.len() < 4 {
                return interp.wrong_num_args("namespace eval name arg ?arg...?");
            }
            let path = resolve_ns(&interp.active_frame().namespace, &argv[2].as_str());
            let script = if argv.len() == 4 {
                argv[3].clone()
            } else {
                Value::str(
                    argv[3..]
                        .iter()
                        .map(|v| v.as_str())
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            };
            interp.namespace_eval(&path, &script)
        }
        "delete" => {
            for arg in &argv[2..] {
                let path = resolve_ns(&interp.active_frame().namespace, &arg.as_str());
                if let Err(e) = interp.delete_namespace(&path) {
                    return interp.error(e);
                }
            }
            interp.ok(Value::empty())
        }
        "exists" => {
            if argv.len() != 3 {
                return interp.wrong_num_args("namespace exists name");
            }
            let path = resolve_ns(&interp.active_frame().namespace, &argv[2].as_str());
            let exists = interp.namespace_exists(&path);
            interp.ok(Value::from(exists))
        }
        "export" => {
            let mut clear = false;
            let mut i = 2;
            if argv.get(2).map(|v| v.as_str()) == Some("-clear".to_string()) {
                clear = true;
                i = 3;
            }
            let ns = interp.active_frame().namespace.clone();
            if argv.len() == i && !clear {
                let patterns = interp
                    .namespaces
                    .get(&ns)
                    .map(|node| node.exports.clone())
                    .unwrap_or_default();
                let items: Vec<Value> = patterns.into_iter().map(Value::str).collect();
                return interp.ok(Value::list(items));
            }
            let patterns: Vec<String> = argv[i..].iter().map(|v| v.as_str()).collect();
            interp.namespace_export(&ns, clear, &patterns);
            interp.ok(Value::empty())
        }
        "import" => {
            let mut force = false;
            let mut i = 2;
            if argv.get(2).map(|v| v.as_str()) == Some("-force".to_string()) {
                force = true;
                i = 3;
            }
            let target = interp.active_frame().namespace.clone();
            for arg in &argv[i..] {
                let pattern = arg.as_str();
                let q = split_qualified(&pattern);
                let Some(qualifier) = q.qualifier else {
                    return interp.error(format!(
                        "unknown namespace in import pattern \"{}\"",
                        pattern
                    ));
                };
                let source = resolve_ns(&target, &qualifier);
                if let Err(e) = interp.namespace_import(&target, &source, &q.tail, force) {
                    return interp.error(e);
                }
            }
            interp.ok(Value::empty())
        }
        "children" => {
            let path = match argv.get(2) {
                Some(arg) => resolve_ns(&interp.active_frame().namespace, &arg.as_str()),
                None => interp.active_frame().namespace.clone(),
            };
            let children: Vec<Value> = interp
                .namespace_children(&path)
                .into_iter()
                .map(Value::str)
                .collect();
            interp.ok(Value::list(children))
        }
        "parent" => {
            let path = match argv.get(2) {
                Some(arg) => resolve_ns(&interp.active_frame().namespace, &arg.as_str()),
                None => interp.active_frame().namespace.clone(),
            };
            interp.ok(Value::str(parent_ns(&path).unwrap_or_default()))
        }
        "qualifiers" => {
            if argv.len() != 3 {
                return interp.wrong_num_args("namespace qualifiers string");
            }
            let q = split_qualified(&argv[2].as_str());
            interp.ok(Value::str(q.qualifier.unwrap_or_default()))
        }
        "tail" => {
            if argv.len() != 3 {
                return interp.wrong_num_args("namespace tail string");
            }
            let q = split_qualified(&argv[2].as_str());
            interp.ok(Value::str(q.tail))
        }
        other => interp.error(format!(
            "unknown or ambiguous subcommand \"{}\": must be children, current, delete, eval, exists, export, import, parent, qualifiers, or tail",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::EvalScope;

    fn run(interp: &mut Interp, script: &str) -> (Code, String) {
        let code = interp.eval_script(script, EvalScope::Local);
        (code, interp.result().as_str())
    }

    #[test]
    fn test_namespace_eval_and_current() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "namespace eval ::a { namespace current }"),
            (Code::Ok, "::a".to_string())
        );
        assert_eq!(
            run(&mut interp, "namespace current"),
            (Code::Ok, "::".to_string())
        );
    }

    #[test]
    fn test_namespace_vars_live_in_namespace() {
        let mut interp = Interp::new();
        run(&mut interp, "namespace eval ::a { set inside 1 }");
        assert_eq!(interp.lookup_var("::a::inside").unwrap().as_str(), "1");
        assert!(!interp.exists_var("inside"));
    }

    #[test]
    fn test_namespace_exists_delete() {
        let mut interp = Interp::new();
        run(&mut interp, "namespace eval ::gone {}");
        assert_eq!(
            run(&mut interp, "namespace exists ::gone"),
            (Code::Ok, "1".to_string())
        );
        run(&mut interp, "namespace delete ::gone");
        assert_eq!(
            run(&mut interp, "namespace exists ::gone"),
            (Code::Ok, "0".to_string())
        );
    }

    #[test]
    fn test_namespace_delete_root_is_error() {
        let mut interp = Interp::new();
        let (code, msg) = run(&mut interp, "namespace delete ::");
        assert_eq!(code, Code::Error);
        assert!(msg.contains("cannot delete namespace"));
    }

    #[test]
    fn test_namespace_export_import() {
        let mut interp = Interp::new();
        run(
            &mut interp,
            "namespace eval ::lib {\n\
             namespace export pub*\n\
             proc public1 {} { return one }\n\
             proc hidden {} { return no }\n\
             }",
        );
        assert_eq!(
            run(&mut interp, "namespace import ::lib::pub*"),
            (Code::Ok, "".to_string())
        );
        assert_eq!(run(&mut interp, "public1"), (Code::Ok, "one".to_string()));

        // Non-exported explicit name errors.
        let (code, msg) = run(&mut interp, "namespace import ::lib::hidden");
        assert_eq!(code, Code::Error);
        assert!(msg.contains("not exported"));
    }

    #[test]
    fn test_namespace_import_conflict_needs_force() {
        let mut interp = Interp::new();
        run(
            &mut interp,
            "namespace eval ::lib { namespace export f; proc f {} { return lib } }\n\
             proc f {} { return original }",
        );
        let (code, msg) = run(&mut interp, "namespace import ::lib::f");
        assert_eq!(code, Code::Error);
        assert!(msg.contains("already exists"));
        assert_eq!(
            run(&mut interp, "namespace import -force ::lib::f"),
            (Code::Ok, "".to_string())
        );
        assert_eq!(run(&mut interp, "f"), (Code::Ok, "lib".to_string()));
    }

    #[test]
    fn test_namespace_qualifiers_tail() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "namespace qualifiers ::a::b::c"),
            (Code::Ok, "::a::b".to_string())
        );
        assert_eq!(
            run(&mut interp, "namespace tail ::a::b::c"),
            (Code::Ok, "c".to_string())
        );
        assert_eq!(
            run(&mut interp, "namespace qualifiers plain"),
            (Code::Ok, "".to_string())
        );
    }

    #[test]
    fn test_namespace_children_parent() {
        let mut interp = Interp::new();
        run(&mut interp, "namespace eval ::top::sub {}");
        let (_, children) = run(&mut interp, "namespace children ::top");
        assert_eq!(children, "::top::sub");
        assert_eq!(
            run(&mut interp, "namespace parent ::top::sub"),
            (Code::Ok, "::top".to_string())
        );
    }
}
