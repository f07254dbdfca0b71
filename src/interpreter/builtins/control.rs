//! Control-Flow Commands
//!
//! `if`, `while`, `for`, `foreach`, `lmap` and `switch`. Loop bodies
//! honor the break/continue completion codes; everything else
//! propagates unchanged.

use crate::interpreter::expr::eval_expr_bool;
use crate::interpreter::interp::Interp;
use crate::interpreter::types::{Code, EvalScope};
use crate::util::glob::glob_match;
use crate::value::Value;

pub fn cmd_if(interp: &mut Interp, argv: &[Value]) -> Code {
    let mut i = 1;
    loop {
        if i >= argv.len() {
            return interp.wrong_num_args("if expr ?then? body ?elseif expr ?then? body? ?else? ?body?");
        }
        let cond = argv[i].as_str();
        let truthy = match eval_expr_bool(interp, &cond) {
            Ok(b) => b,
            Err(code) => return code,
        };
        i += 1;
        if i < argv.len() && argv[i].as_str() == "then" {
            i += 1;
        }
        if i >= argv.len() {
            return interp.error(format!(
                "wrong # args: no script following \"{}\" argument",
                cond
            ));
        }
        if truthy {
            return interp.eval_value(&argv[i], EvalScope::Local);
        }
        i += 1;

        match argv.get(i).map(|w| w.as_str()) {
            None => return interp.ok(Value::empty()),
            Some(word) if word == "elseif" => {
                i += 1;
                continue;
            }
            Some(word) if word == "else" => {
                i += 1;
                if i >= argv.len() {
                    return interp
                        .error("wrong # args: no script following \"else\" argument");
                }
                return interp.eval_value(&argv[i], EvalScope::Local);
            }
            // Implicit else body.
            Some(_) => return interp.eval_value(&argv[i], EvalScope::Local),
        }
    }
}

pub fn cmd_while(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 3 {
        return interp.wrong_num_args("while test command");
    }
    let test = argv[1].as_str();
    loop {
        match eval_expr_bool(interp, &test) {
            Ok(true) => {}
            Ok(false) => break,
            Err(code) => return code,
        }
        match interp.eval_value(&argv[2], EvalScope::Local) {
            Code::Ok | Code::Continue => {}
            Code::Break => break,
            other => return other,
        }
    }
    interp.ok(Value::empty())
}

pub fn cmd_for(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 5 {
        return interp.wrong_num_args("for start test next command");
    }
    let start = &argv[1];
    let test = argv[2].as_str();
    let next = &argv[3];
    let body = &argv[4];

    let code = interp.eval_value(start, EvalScope::Local);
    if !code.is_ok() {
        return code;
    }
    loop {
        match eval_expr_bool(interp, &test) {
            Ok(true) => {}
            Ok(false) => break,
            Err(code) => return code,
        }
        match interp.eval_value(body, EvalScope::Local) {
            Code::Ok | Code::Continue => {}
            Code::Break => break,
            other => return other,
        }
        match interp.eval_value(next, EvalScope::Local) {
            Code::Ok => {}
            Code::Break => break,
            other => return other,
        }
    }
    interp.ok(Value::empty())
}

/// Shared driver for `foreach` and `lmap`: `collect` keeps body results.
fn foreach_driver(interp: &mut Interp, argv: &[Value], collect: bool) -> Code {
    let usage = if collect {
        "lmap varList list ?varList list ...? command"
    } else {
        "foreach varList list ?varList list ...? command"
    };
    if argv.len() < 4 || argv.len() % 2 != 0 {
        return interp.wrong_num_args(usage);
    }

    struct Group {
        vars: Vec<String>,
        items: Vec<Value>,
    }
    let mut groups = Vec::new();
    let mut i = 1;
    while i + 1 < argv.len() - 1 {
        let vars = match argv[i].as_list() {
            Ok(items) => items.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            Err(e) => return interp.error(e),
        };
        if vars.is_empty() {
            return interp.error("foreach varlist is empty");
        }
        let items = match argv[i + 1].as_list() {
            Ok(items) => items.as_ref().clone(),
            Err(e) => return interp.error(e),
        };
        groups.push(Group { vars, items });
        i += 2;
    }
    let body = &argv[argv.len() - 1];

    // Number of iterations: enough to consume every group's list.
    let rounds = groups
        .iter()
        .map(|g| (g.items.len() + g.vars.len() - 1) / g.vars.len())
        .max()
        .unwrap_or(0);

    let mut collected = Vec::new();
    for round in 0..rounds {
        for group in &groups {
            for (vi, var) in group.vars.iter().enumerate() {
                let idx = round * group.vars.len() + vi;
                let value = group.items.get(idx).cloned().unwrap_or_else(Value::empty);
                if let Err(code) = interp.set_var(var, value) {
                    return code;
                }
            }
        }
        match interp.eval_value(body, EvalScope::Local) {
            Code::Ok => {
                if collect {
                    collected.push(interp.result());
                }
            }
            Code::Continue => {}
            Code::Break => break,
            other => return other,
        }
    }

    if collect {
        interp.ok(Value::list(collected))
    } else {
        interp.ok(Value::empty())
    }
}

pub fn cmd_foreach(interp: &mut Interp, argv: &[Value]) -> Code {
    foreach_driver(interp, argv, false)
}

pub fn cmd_lmap(interp: &mut Interp, argv: &[Value]) -> Code {
    foreach_driver(interp, argv, true)
}

pub fn cmd_switch(interp: &mut Interp, argv: &[Value]) -> Code {
    let usage = "switch ?-exact? ?-glob? ?-nocase? ?--? string ?pattern body ...? ?{pattern body ...}?";
    let mut glob = false;
    let mut nocase = false;
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str().as_str() {
            "-exact" => {
                glob = false;
                i += 1;
            }
            "-glob" => {
                glob = true;
                i += 1;
            }
            "-nocase" => {
                nocase = true;
                i += 1;
            }
            "--" => {
                i += 1;
                break;
            }
            word if word.starts_with('-') => {
                return interp.error(format!(
                    "bad option \"{}\": must be -exact, -glob, -nocase, or --",
                    word
                ))
            }
            _ => break,
        }
    }
    if i >= argv.len() {
        return interp.wrong_num_args(usage);
    }
    let subject = argv[i].as_str();
    i += 1;

    // Either inline pattern/body pairs or one braced list of them.
    let pairs: Vec<Value> = if argv.len() - i == 1 {
        match argv[i].as_list() {
            Ok(items) => items.as_ref().clone(),
            Err(e) => return interp.error(e),
        }
    } else {
        argv[i..].to_vec()
    };
    if pairs.is_empty() || pairs.len() % 2 != 0 {
        return interp.error("extra switch pattern with no body");
    }

    let subject_cmp = if nocase {
        subject.to_lowercase()
    } else {
        subject.clone()
    };

    let mut chosen: Option<usize> = None;
    for (pi, chunk) in pairs.chunks(2).enumerate() {
        let pattern = chunk[0].as_str();
        let is_default = pattern == "default" && pi == pairs.len() / 2 - 1;
        let pattern_cmp = if nocase {
            pattern.to_lowercase()
        } else {
            pattern.clone()
        };
        let matched = is_default
            || if glob {
                glob_match(&pattern_cmp, &subject_cmp)
            } else {
                pattern_cmp == subject_cmp
            };
        if matched {
            chosen = Some(pi);
            break;
        }
    }

    let Some(mut pi) = chosen else {
        return interp.ok(Value::empty());
    };

    // `-` bodies fall through to the next pattern's body.
    while pi < pairs.len() / 2 {
        let body = &pairs[pi * 2 + 1];
        if body.as_str() == "-" {
            pi += 1;
            continue;
        }
        return interp.eval_value(body, EvalScope::Local);
    }
    interp.error("no body specified for pattern \"-\"")
}
