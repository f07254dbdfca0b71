//! Procedure & Evaluation Commands
//!
//! `proc`, `apply`, `rename`, `eval`, `expr` and `subst`.

use std::rc::Rc;

use crate::interpreter::expr::eval_expr;
use crate::interpreter::interp::Interp;
use crate::interpreter::proc::{invoke_lambda, parse_params};
use crate::interpreter::resolver::{is_qualified, join_ns, resolve_ns, split_qualified};
use crate::interpreter::types::{Code, CommandDef, EvalScope, ProcDef};
use crate::parser::Parser;
use crate::value::Value;

/// Fully qualify a command name against the active frame's namespace.
fn qualify(interp: &Interp, name: &str) -> String {
    if is_qualified(name) {
        let q = split_qualified(name);
        let qualifier = q.qualifier.unwrap_or_else(|| "::".to_string());
        let ns = if qualifier.starts_with("::") {
            resolve_ns("::", &qualifier)
        } else {
            resolve_ns(&interp.active_frame().namespace, &qualifier)
        };
        join_ns(&ns, &q.tail)
    } else {
        join_ns(&interp.active_frame().namespace, name)
    }
}

pub fn cmd_proc(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 4 {
        return interp.wrong_num_args("proc name args body");
    }
    let (params, variadic) = match parse_params(&argv[2]) {
        Ok(parsed) => parsed,
        Err(e) => return interp.error(e),
    };
    let fqn = qualify(interp, &argv[1].as_str());
    interp.create_command(
        &fqn,
        CommandDef::Proc(Rc::new(ProcDef {
            params,
            variadic,
            body: argv[3].clone(),
        })),
    );
    interp.ok(Value::empty())
}

pub fn cmd_apply(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("apply lambdaExpr ?arg ...?");
    }
    let lambda = argv[1].clone();
    invoke_lambda(interp, &lambda, &argv[2..])
}

pub fn cmd_rename(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 3 {
        return interp.wrong_num_args("rename oldName newName");
    }
    let old_name = argv[1].as_str();
    let old_fqn = match interp.resolve_command(&old_name) {
        Some((fqn, _)) => fqn,
        None => {
            return interp.error(format!(
                "can't rename \"{}\": command doesn't exist",
                old_name
            ))
        }
    };

    let new_name = argv[2].as_str();
    if new_name.is_empty() {
        interp.delete_command(&old_fqn);
        return interp.ok(Value::empty());
    }

    let new_fqn = qualify(interp, &new_name);
    match interp.rename_command(&old_fqn, &new_fqn) {
        Ok(()) => interp.ok(Value::empty()),
        Err(e) => interp.error(e),
    }
}

pub fn cmd_eval(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("eval arg ?arg ...?");
    }
    if argv.len() == 2 {
        return interp.eval_value(&argv[1], EvalScope::Local);
    }
    let script = argv[1..]
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    interp.eval_script(&script, EvalScope::Local)
}

pub fn cmd_expr(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("expr arg ?arg ...?");
    }
    let src = argv[1..]
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    match eval_expr(interp, &src) {
        Ok(v) => interp.ok(v),
        Err(code) => code,
    }
}

pub fn cmd_subst(interp: &mut Interp, argv: &[Value]) -> Code {
    let usage = "subst ?-nobackslashes? ?-nocommands? ?-novariables? string";
    let mut backslashes = true;
    let mut commands = true;
    let mut variables = true;
    let mut i = 1;
    while i < argv.len() - 1 {
        match argv[i].as_str().as_str() {
            "-nobackslashes" => backslashes = false,
            "-nocommands" => commands = false,
            "-novariables" => variables = false,
            other => {
                return interp.error(format!(
                    "bad option \"{}\": must be -nobackslashes, -nocommands, or -novariables",
                    other
                ))
            }
        }
        i += 1;
    }
    if argv.len() < 2 {
        return interp.wrong_num_args(usage);
    }

    let text = argv[argv.len() - 1].as_str();
    let parts = match Parser::new(&text).parse_subst_parts(backslashes, commands, variables) {
        Ok(parts) => parts,
        Err(e) => return interp.error(e.message),
    };
    match interp.subst_parts(&parts) {
        Ok(v) => interp.ok(v),
        Err(code) => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(interp: &mut Interp, script: &str) -> (Code, String) {
        let code = interp.eval_script(script, EvalScope::Local);
        (code, interp.result().as_str())
    }

    #[test]
    fn test_proc_define_and_call() {
        let mut interp = Interp::new();
        run(&mut interp, "proc double {x} { expr {$x * 2} }");
        assert_eq!(run(&mut interp, "double 21"), (Code::Ok, "42".to_string()));
    }

    #[test]
    fn test_proc_defaults_and_args() {
        let mut interp = Interp::new();
        run(
            &mut interp,
            "proc greet {name {greeting hello} args} { list $greeting $name $args }",
        );
        assert_eq!(
            run(&mut interp, "greet world"),
            (Code::Ok, "hello world {}".to_string())
        );
        assert_eq!(
            run(&mut interp, "greet world hey a b"),
            (Code::Ok, "hey world {a b}".to_string())
        );
    }

    #[test]
    fn test_proc_wrong_args_message() {
        let mut interp = Interp::new();
        run(&mut interp, "proc f {x} { set x }");
        let (code, msg) = run(&mut interp, "f");
        assert_eq!(code, Code::Error);
        assert_eq!(msg, "wrong # args: should be \"f x\"");
    }

    #[test]
    fn test_qualified_proc_creates_namespace() {
        let mut interp = Interp::new();
        run(&mut interp, "proc ::deep::nest::f {} { return ok }");
        assert!(interp.namespace_exists("::deep::nest"));
        assert_eq!(run(&mut interp, "::deep::nest::f"), (Code::Ok, "ok".to_string()));
    }

    #[test]
    fn test_apply_lambda() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "apply {{x y} { expr {$x + $y} }} 2 3"),
            (Code::Ok, "5".to_string())
        );
    }

    #[test]
    fn test_apply_lambda_with_namespace() {
        let mut interp = Interp::new();
        run(&mut interp, "namespace eval ::m { variable k 10 }");
        assert_eq!(
            run(&mut interp, "apply {{} { variable k; set k } ::m}"),
            (Code::Ok, "10".to_string())
        );
    }

    #[test]
    fn test_rename_and_delete() {
        let mut interp = Interp::new();
        run(&mut interp, "proc f {} { return 1 }");
        run(&mut interp, "rename f g");
        assert_eq!(run(&mut interp, "g"), (Code::Ok, "1".to_string()));
        let (code, _) = run(&mut interp, "f");
        assert_eq!(code, Code::Error);
        run(&mut interp, "rename g {}");
        let (code, _) = run(&mut interp, "g");
        assert_eq!(code, Code::Error);
    }

    #[test]
    fn test_eval_concat() {
        let mut interp = Interp::new();
        assert_eq!(run(&mut interp, "eval set x 5"), (Code::Ok, "5".to_string()));
        assert_eq!(
            run(&mut interp, "eval {set y 6}"),
            (Code::Ok, "6".to_string())
        );
    }

    #[test]
    fn test_eval_reparses_built_strings() {
        let mut interp = Interp::new();
        run(&mut interp, "set script {set z 7}");
        assert_eq!(run(&mut interp, "eval $script"), (Code::Ok, "7".to_string()));
    }

    #[test]
    fn test_subst() {
        let mut interp = Interp::new();
        run(&mut interp, "set name world");
        assert_eq!(
            run(&mut interp, "subst {hello $name}"),
            (Code::Ok, "hello world".to_string())
        );
        assert_eq!(
            run(&mut interp, "subst -novariables {hello $name}"),
            (Code::Ok, "hello $name".to_string())
        );
        assert_eq!(
            run(&mut interp, "subst {1 + 1 = [expr {1 + 1}]}"),
            (Code::Ok, "1 + 1 = 2".to_string())
        );
        assert_eq!(
            run(&mut interp, "subst -nocommands {x [set y]}"),
            (Code::Ok, "x [set y]".to_string())
        );
        assert_eq!(
            run(&mut interp, "subst {a\\tb}"),
            (Code::Ok, "a\tb".to_string())
        );
    }
}
