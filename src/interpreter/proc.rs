//! Procedure & Lambda Invoker
//!
//! Shared machinery for `proc` invocation and `apply`: formal-parameter
//! binding (required, defaulted, variadic `args`), frame setup from the
//! qualified name, body evaluation, `TCL_RETURN` level decrementation,
//! and the error-stack append that runs before every frame pop.
//!
//! Tailcalls are drained here by a trampoline: the frame of the proc
//! that called `tailcall` pops, and when the replacement command is
//! itself a proc the loop rebinds instead of recursing, so arbitrarily
//! long tailcall chains use constant native stack.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::interpreter::frames::{Frame, VarSlot};
use crate::interpreter::interp::Interp;
use crate::interpreter::resolver::{resolve_ns, split_qualified};
use crate::interpreter::types::{Code, CommandDef, EvalScope, Param, ProcDef, ReturnOptions};
use crate::value::{quote_element, Value};

/// Parse a formal parameter list into params and the variadic flag.
pub(crate) fn parse_params(v: &Value) -> Result<(Vec<Param>, bool), String> {
    let items = v.as_list()?;
    let mut params = Vec::new();
    let mut variadic = false;
    for (i, item) in items.iter().enumerate() {
        let fields = item.as_list()?;
        match fields.len() {
            0 => return Err("argument with no name".to_string()),
            1 => {
                let name = fields[0].as_str();
                if name == "args" && i == items.len() - 1 {
                    variadic = true;
                } else {
                    params.push(Param {
                        name,
                        default: None,
                    });
                }
            }
            2 => params.push(Param {
                name: fields[0].as_str(),
                default: Some(fields[1].clone()),
            }),
            _ => {
                return Err(format!(
                    "too many fields in argument specifier \"{}\"",
                    item.as_str()
                ))
            }
        }
    }
    Ok((params, variadic))
}

/// Minimum and maximum actual-argument counts. An optional parameter
/// followed by any later required one is effectively required (scanned
/// right to left).
fn arity_bounds(def: &ProcDef) -> (usize, Option<usize>) {
    let n = def.params.len();
    let mut required = vec![false; n];
    let mut seen_required = false;
    for i in (0..n).rev() {
        if def.params[i].default.is_none() {
            required[i] = true;
            seen_required = true;
        } else if seen_required {
            required[i] = true;
        }
    }
    let min = required.iter().filter(|r| **r).count();
    let max = if def.variadic { None } else { Some(n) };
    (min, max)
}

/// `wrong # args` usage display: `name a ?b? ?arg ...?`.
fn usage(name: &str, def: &ProcDef) -> String {
    let mut out = name.to_string();
    for p in &def.params {
        if p.default.is_some() {
            out.push_str(&format!(" ?{}?", p.name));
        } else {
            out.push_str(&format!(" {}", p.name));
        }
    }
    if def.variadic {
        out.push_str(" ?arg ...?");
    }
    out
}

fn bind_params(locals: &mut IndexMap<String, VarSlot>, def: &ProcDef, args: &[Value]) {
    let n = def.params.len();
    for (i, p) in def.params.iter().enumerate() {
        let v = if i < args.len() {
            args[i].clone()
        } else {
            p.default.clone().unwrap_or_else(Value::empty)
        };
        locals.insert(p.name.clone(), VarSlot::Value(v));
    }
    if def.variadic {
        let rest = if args.len() > n {
            args[n..].to_vec()
        } else {
            Vec::new()
        };
        locals.insert("args".to_string(), VarSlot::Value(Value::list(rest)));
    }
}

/// Invoke a registered proc. `fqn` is the fully qualified name it was
/// resolved to; the frame's namespace comes from its qualifier.
pub(crate) fn invoke_proc(interp: &mut Interp, fqn: &str, def: Rc<ProcDef>, argv: &[Value]) -> Code {
    let q = split_qualified(fqn);
    let ns = match q.qualifier {
        Some(qualifier) => resolve_ns("::", &qualifier),
        None => "::".to_string(),
    };
    run_callable(
        interp,
        argv[0].as_str(),
        ns,
        fqn.to_string(),
        def,
        None,
        argv[1..].to_vec(),
    )
}

/// Invoke a lambda `{params body ?namespace?}` from `apply`.
pub(crate) fn invoke_lambda(interp: &mut Interp, lambda: &Value, args: &[Value]) -> Code {
    let items = match lambda.as_list() {
        Ok(items) => items,
        Err(e) => return interp.error(e),
    };
    if items.len() != 2 && items.len() != 3 {
        return interp.error(format!(
            "can't interpret \"{}\" as a lambda expression",
            lambda.as_str()
        ));
    }
    let (params, variadic) = match parse_params(&items[0]) {
        Ok(parsed) => parsed,
        Err(e) => return interp.error(e),
    };
    let def = Rc::new(ProcDef {
        params,
        variadic,
        body: items[1].clone(),
    });
    let ns = match items.get(2) {
        Some(nsval) => resolve_ns("::", &nsval.as_str()),
        None => "::".to_string(),
    };
    interp.ensure_namespace(&ns);

    let display = format!("apply {}", quote_element(&lambda.as_str()));
    run_callable(
        interp,
        display,
        ns,
        String::new(),
        def,
        Some(lambda.clone()),
        args.to_vec(),
    )
}

/// The shared invocation loop. `step_key` is the fully qualified name
/// used for step-trace targeting (empty for lambdas).
fn run_callable(
    interp: &mut Interp,
    mut name: String,
    mut ns: String,
    mut step_key: String,
    mut def: Rc<ProcDef>,
    mut lambda: Option<Value>,
    mut args: Vec<Value>,
) -> Code {
    let caller_line = interp.active_frame().line;

    loop {
        let (min, max) = arity_bounds(&def);
        if args.len() < min || max.map_or(false, |m| args.len() > m) {
            return interp.wrong_num_args(&usage(&name, &def));
        }

        let mut locals = IndexMap::new();
        bind_params(&mut locals, &def, &args);
        interp.push_frame(Frame {
            command: name.clone(),
            args: args.clone(),
            namespace: ns.clone(),
            line: caller_line,
            lambda: lambda.take(),
            is_proc: true,
            locals,
        });

        let stepped = !step_key.is_empty() && interp.has_step_traces(&step_key);
        if stepped {
            interp.step_targets.push(step_key.clone());
        }

        let body = def.body.clone();
        let mut code = interp.eval_value(&body, EvalScope::Local);

        if let Some(tc) = interp.tailcall.take() {
            // Replace this invocation with the requested command.
            interp.take_return_options();
            if stepped {
                interp.step_targets.pop();
            }
            interp.pop_frame();

            let target = tc.argv[0].as_str();
            match interp.resolve_command_in(&tc.namespace, &target) {
                Some((fqn, CommandDef::Proc(next))) => {
                    name = target;
                    ns = {
                        let q = split_qualified(&fqn);
                        match q.qualifier {
                            Some(qualifier) => resolve_ns("::", &qualifier),
                            None => "::".to_string(),
                        }
                    };
                    step_key = fqn;
                    def = next;
                    args = tc.argv[1..].to_vec();
                    continue;
                }
                _ => {
                    code = interp.dispatch_in_ns(&tc.namespace, &tc.argv);
                    return unwind_return(interp, code);
                }
            }
        }

        if code == Code::Error {
            let line = interp.frames[interp.frames.len() - 1].line;
            interp.error_append_frame(&name, &args, line);
        }
        if stepped {
            interp.step_targets.pop();
        }
        interp.pop_frame();
        return unwind_return(interp, code);
    }
}

/// The proc-boundary `TCL_RETURN` rule: decrement `-level`; at zero the
/// `-code` becomes the actual completion code, otherwise the `RETURN`
/// keeps propagating with the updated options.
fn unwind_return(interp: &mut Interp, code: Code) -> Code {
    if code != Code::Return {
        return code;
    }
    let mut opts = interp
        .take_return_options()
        .unwrap_or_else(|| ReturnOptions::for_code(Code::Return));
    opts.level -= 1;
    if opts.level <= 0 {
        opts.level = 0;
        let actual = Code::from_i32(opts.code);
        interp.set_return_options(opts);
        actual
    } else {
        interp.set_return_options(opts);
        Code::Return
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def_of(params: &str, variadic_body: &str) -> ProcDef {
        let (params, variadic) = parse_params(&Value::str(params)).unwrap();
        ProcDef {
            params,
            variadic,
            body: Value::str(variadic_body),
        }
    }

    #[test]
    fn test_parse_params_simple() {
        let (params, variadic) = parse_params(&Value::str("a b c")).unwrap();
        assert_eq!(params.len(), 3);
        assert!(!variadic);
        assert!(params.iter().all(|p| p.default.is_none()));
    }

    #[test]
    fn test_parse_params_defaults_and_args() {
        let (params, variadic) = parse_params(&Value::str("a {b 5} args")).unwrap();
        assert_eq!(params.len(), 2);
        assert!(variadic);
        assert_eq!(params[1].default.as_ref().unwrap().as_str(), "5");
    }

    #[test]
    fn test_parse_params_args_not_last() {
        // "args" in the middle is an ordinary parameter name.
        let (params, variadic) = parse_params(&Value::str("args b")).unwrap();
        assert_eq!(params.len(), 2);
        assert!(!variadic);
    }

    #[test]
    fn test_parse_params_too_many_fields() {
        let err = parse_params(&Value::str("{a b c}")).unwrap_err();
        assert!(err.contains("too many fields"));
    }

    #[test]
    fn test_arity_bounds_plain() {
        let def = def_of("a b", "");
        assert_eq!(arity_bounds(&def), (2, Some(2)));
    }

    #[test]
    fn test_arity_bounds_optional_tail() {
        let def = def_of("a {b 1}", "");
        assert_eq!(arity_bounds(&def), (1, Some(2)));
    }

    #[test]
    fn test_arity_optional_before_required_is_required() {
        let def = def_of("{a 1} b", "");
        assert_eq!(arity_bounds(&def), (2, Some(2)));
    }

    #[test]
    fn test_arity_variadic() {
        let def = def_of("a args", "");
        assert_eq!(arity_bounds(&def), (1, None));
    }

    #[test]
    fn test_usage_display() {
        let def = def_of("x {y 1} args", "");
        assert_eq!(usage("f", &def), "f x ?y? ?arg ...?");
    }
}
