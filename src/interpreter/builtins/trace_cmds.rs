//! Trace Commands
//!
//! `trace add`, `trace remove` and `trace info` for the three trace
//! kinds. Command and execution targets must name existing commands and
//! are keyed by their resolved fully qualified name.

use crate::interpreter::interp::Interp;
use crate::interpreter::trace::TraceKind;
use crate::interpreter::types::Code;
use crate::value::Value;

const VAR_OPS: &[&str] = &["array", "read", "unset", "write"];
const CMD_OPS: &[&str] = &["delete", "rename"];
const EXEC_OPS: &[&str] = &["enter", "leave", "enterstep", "leavestep"];

fn parse_kind(word: &str) -> Option<(TraceKind, &'static [&'static str])> {
    match word {
        "variable" => Some((TraceKind::Variable, VAR_OPS)),
        "command" => Some((TraceKind::Command, CMD_OPS)),
        "execution" => Some((TraceKind::Execution, EXEC_OPS)),
        _ => None,
    }
}

fn parse_ops(interp: &mut Interp, list: &Value, valid: &[&str]) -> Result<Vec<String>, Code> {
    let items = match list.as_list() {
        Ok(items) => items,
        Err(e) => return Err(interp.error(e)),
    };
    if items.is_empty() {
        let msg = format!(
            "bad operation list \"\": must be one or more of {}",
            valid.join(", ")
        );
        return Err(interp.error(msg));
    }
    let mut ops = Vec::new();
    for item in items.iter() {
        let op = item.as_str();
        if !valid.contains(&op.as_str()) {
            let msg = format!(
                "bad operation \"{}\": must be one or more of {}",
                op,
                valid.join(", ")
            );
            return Err(interp.error(msg));
        }
        ops.push(op);
    }
    Ok(ops)
}

/// Resolve the registry key for a trace target: variables key by their
/// written (or absolute) name, commands and executions by the resolved
/// fully qualified command name.
fn trace_key(interp: &mut Interp, kind: TraceKind, name: &str) -> Result<String, Code> {
    match kind {
        TraceKind::Variable => Ok(interp.var_trace_key(name)),
        TraceKind::Command | TraceKind::Execution => match interp.resolve_command(name) {
            Some((fqn, _)) => Ok(fqn),
            None => Err(interp.error(format!("unknown command \"{}\"", name))),
        },
    }
}

pub fn cmd_trace(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("trace option ?arg ...?");
    }
    let option = argv[1].as_str();
    match option.as_str() {
        "add" | "remove" => {
            if argv.len() != 6 {
                return interp.wrong_num_args(&format!(
                    "trace {} type name opList command",
                    option
                ));
            }
            let Some((kind, valid)) = parse_kind(&argv[2].as_str()) else {
                return interp.error(format!(
                    "bad type \"{}\": must be command, execution, or variable",
                    argv[2].as_str()
                ));
            };
            let ops = match parse_ops(interp, &argv[4], valid) {
                Ok(ops) => ops,
                Err(code) => return code,
            };
            let key = match trace_key(interp, kind, &argv[3].as_str()) {
                Ok(key) => key,
                Err(code) => return code,
            };
            let script = argv[5].as_str();
            if option == "add" {
                interp.traces.add(kind, &key, ops, script);
            } else {
                interp.traces.remove(kind, &key, &ops, &script);
            }
            interp.ok(Value::empty())
        }
        "info" => {
            if argv.len() != 4 {
                return interp.wrong_num_args("trace info type name");
            }
            let Some((kind, _)) = parse_kind(&argv[2].as_str()) else {
                return interp.error(format!(
                    "bad type \"{}\": must be command, execution, or variable",
                    argv[2].as_str()
                ));
            };
            let key = match kind {
                TraceKind::Variable => interp.var_trace_key(&argv[3].as_str()),
                _ => match interp.resolve_command(&argv[3].as_str()) {
                    Some((fqn, _)) => fqn,
                    None => argv[3].as_str(),
                },
            };
            let entries = interp.traces.info(kind, &key);
            interp.ok(Value::list(entries))
        }
        other => interp.error(format!(
            "bad option \"{}\": must be add, info, or remove",
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
    fn test_write_trace_fires_after_write() {
        let mut interp = Interp::new();
        run(&mut interp, "set log {}");
        run(
            &mut interp,
            "trace add variable x write {apply {{name idx op} { lappend ::log \"$op:$name\" }}}",
        );
        run(&mut interp, "set x 1; set x 2");
        assert_eq!(
            interp.lookup_var("log").unwrap().as_str(),
            "write:x write:x"
        );
    }

    #[test]
    fn test_read_trace_error_blocks_read() {
        let mut interp = Interp::new();
        run(&mut interp, "set x secret");
        run(
            &mut interp,
            "trace add variable x read {apply {{name idx op} { error denied }}}",
        );
        let (code, msg) = run(&mut interp, "set x");
        assert_eq!(code, Code::Error);
        assert_eq!(msg, "denied");
    }

    #[test]
    fn test_unset_trace_errors_swallowed() {
        let mut interp = Interp::new();
        run(&mut interp, "set x 1; set fired 0");
        run(
            &mut interp,
            "trace add variable x unset {apply {{name idx op} { set ::fired 1; error ignored }}}",
        );
        assert_eq!(run(&mut interp, "unset x"), (Code::Ok, "".to_string()));
        assert_eq!(interp.lookup_var("fired").unwrap().as_str(), "1");
    }

    #[test]
    fn test_trace_self_disables_during_fire() {
        let mut interp = Interp::new();
        run(&mut interp, "set counter 0");
        run(
            &mut interp,
            "trace add variable counter write {apply {{name idx op} { incr ::counter }}}",
        );
        // The trace writes the traced variable; self-disabling keeps it
        // from recursing.
        run(&mut interp, "set counter 5");
        assert_eq!(run(&mut interp, "set counter"), (Code::Ok, "6".to_string()));
    }

    #[test]
    fn test_unset_purges_traces() {
        let mut interp = Interp::new();
        run(&mut interp, "set x 1");
        run(
            &mut interp,
            "trace add variable x write {apply {{n i o} { lappend ::log hit }}}",
        );
        run(&mut interp, "unset x");
        run(&mut interp, "set log {}; set x again");
        assert_eq!(interp.lookup_var("log").unwrap().as_str(), "");
    }

    #[test]
    fn test_trace_remove_silent_when_absent() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "trace remove variable nothing write cb"),
            (Code::Ok, "".to_string())
        );
    }

    #[test]
    fn test_trace_info_shape() {
        let mut interp = Interp::new();
        run(&mut interp, "trace add variable v {read write} notify");
        assert_eq!(
            run(&mut interp, "trace info variable v"),
            (Code::Ok, "{{read write} notify}".to_string())
        );
    }

    #[test]
    fn test_execution_trace_requires_command() {
        let mut interp = Interp::new();
        let (code, msg) = run(
            &mut interp,
            "trace add execution missing enter cb",
        );
        assert_eq!(code, Code::Error);
        assert_eq!(msg, "unknown command \"missing\"");
    }

    #[test]
    fn test_execution_enter_leave() {
        let mut interp = Interp::new();
        run(&mut interp, "set log {}");
        run(&mut interp, "proc f {x} { return [expr {$x + 1}] }");
        run(
            &mut interp,
            "trace add execution f {enter leave} {apply {{args} { lappend ::log $args }}}",
        );
        run(&mut interp, "f 4");
        let log = interp.lookup_var("log").unwrap().as_str();
        assert!(log.contains("enter"));
        assert!(log.contains("leave"));
        assert!(log.contains("{f 4}"));
    }

    #[test]
    fn test_command_rename_trace() {
        let mut interp = Interp::new();
        run(&mut interp, "set log {}");
        run(&mut interp, "proc f {} {}");
        run(
            &mut interp,
            "trace add command f rename {apply {{old new op} { lappend ::log \"$op $old -> $new\" }}}",
        );
        run(&mut interp, "rename f g");
        let log = interp.lookup_var("log").unwrap().as_str();
        assert!(log.contains("rename"));
        assert!(log.contains("::g"));
    }

    #[test]
    fn test_command_delete_trace() {
        let mut interp = Interp::new();
        run(&mut interp, "set log {}");
        run(&mut interp, "proc f {} {}");
        run(
            &mut interp,
            "trace add command f delete {apply {{old new op} { lappend ::log $op }}}",
        );
        run(&mut interp, "rename f {}");
        assert_eq!(interp.lookup_var("log").unwrap().as_str(), "delete");
    }

    #[test]
    fn test_bad_operation_message() {
        let mut interp = Interp::new();
        let (code, msg) = run(&mut interp, "trace add variable v banana cb");
        assert_eq!(code, Code::Error);
        assert!(msg.starts_with("bad operation \"banana\""));
    }
}
