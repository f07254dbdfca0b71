//! Introspection Commands
//!
//! The `info` ensemble: variables, commands, procs, frames and the
//! interpreter version.

use crate::interpreter::interp::Interp;
use crate::interpreter::types::{Code, CommandDef};
use crate::util::glob::glob_match;
use crate::value::Value;

pub fn cmd_info(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("info subcommand ?arg ...?");
    }
    let sub = argv[1].as_str();
    match sub.as_str() {
        "exists" => {
            if argv.len() != 3 {
                return interp.wrong_num_args("info exists varName");
            }
            let exists = interp.exists_var(&argv[2].as_str());
            interp.ok(Value::from(exists))
        }
        "commands" => {
            let pattern = argv.get(2).map(|v| v.as_str());
            let names = visible_commands(interp, |_| true);
            interp.ok(filtered(names, pattern.as_deref()))
        }
        "procs" => {
            let pattern = argv.get(2).map(|v| v.as_str());
            let ns = interp.active_frame().namespace.clone();
            let names: Vec<String> = interp
                .namespaces
                .get(&ns)
                .map(|node| {
                    node.commands
                        .iter()
                        .filter(|(_, def)| matches!(def, CommandDef::Proc(_)))
                        .map(|(name, _)| name.clone())
                        .collect()
                })
                .unwrap_or_default();
            interp.ok(filtered(names, pattern.as_deref()))
        }
        "vars" => {
            let pattern = argv.get(2).map(|v| v.as_str());
            let frame = interp.active_frame();
            let names: Vec<String> = if frame.is_proc {
                frame.locals.keys().cloned().collect()
            } else {
                interp
                    .namespaces
                    .get(&frame.namespace)
                    .map(|node| node.vars.keys().cloned().collect())
                    .unwrap_or_default()
            };
            interp.ok(filtered(names, pattern.as_deref()))
        }
        "body" => {
            if argv.len() != 3 {
                return interp.wrong_num_args("info body procname");
            }
            let name = argv[2].as_str();
            match interp.resolve_command(&name) {
                Some((_, CommandDef::Proc(def))) => interp.ok(def.body.clone()),
                _ => interp.error(format!("\"{}\" isn't a procedure", name)),
            }
        }
        "args" => {
            if argv.len() != 3 {
                return interp.wrong_num_args("info args procname");
            }
            let name = argv[2].as_str();
            match interp.resolve_command(&name) {
                Some((_, CommandDef::Proc(def))) => {
                    let mut names: Vec<Value> = def
                        .params
                        .iter()
                        .map(|p| Value::str(p.name.clone()))
                        .collect();
                    if def.variadic {
                        names.push(Value::str("args"));
                    }
                    interp.ok(Value::list(names))
                }
                _ => interp.error(format!("\"{}\" isn't a procedure", name)),
            }
        }
        "level" => match argv.get(2) {
            None => {
                let level = interp.active_level() as i64;
                interp.ok(Value::int(level))
            }
            Some(arg) => {
                let n = match arg.as_int() {
                    Ok(n) => n,
                    Err(e) => return interp.error(e),
                };
                let target = if n > 0 {
                    n
                } else {
                    interp.active_level() as i64 + n
                };
                if target < 0 || target as usize >= interp.frame_depth() || target == 0 {
                    return interp.error(format!("bad level \"{}\"", arg.as_str()));
                }
                let frame = &interp.frames[target as usize];
                let mut words = vec![Value::str(frame.command.clone())];
                words.extend(frame.args.iter().cloned());
                interp.ok(Value::list(words))
            }
        },
        "patchlevel" => {
            let v = interp
                .lookup_var("::tcl_patchLevel")
                .unwrap_or_else(Value::empty);
            interp.ok(v)
        }
        "script" => interp.ok(Value::empty()),
        other => interp.error(format!(
            "unknown or ambiguous subcommand \"{}\": must be args, body, commands, exists, level, patchlevel, procs, script, or vars",
            other
        )),
    }
}

/// Commands visible from the current namespace: its own plus the global
/// ones, in registration order, deduplicated.
fn visible_commands(interp: &Interp, keep: impl Fn(&CommandDef) -> bool) -> Vec<String> {
    let ns = interp.active_frame().namespace.clone();
    let mut names: Vec<String> = Vec::new();
    if let Some(node) = interp.namespaces.get(&ns) {
        for (name, def) in node.commands.iter() {
            if keep(def) {
                names.push(name.clone());
            }
        }
    }
    if ns != "::" {
        if let Some(root) = interp.namespaces.get("::") {
            for (name, def) in root.commands.iter() {
                if keep(def) && !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
    }
    names
}

fn filtered(names: Vec<String>, pattern: Option<&str>) -> Value {
    let items: Vec<Value> = names
        .into_iter()
        .filter(|name| pattern.map_or(true, |p| glob_match(p, name)))
        .map(Value::str)
        .collect();
    Value::list(items)
}
