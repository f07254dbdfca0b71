//! Exception Controllers
//!
//! The policy layer of the completion-code model: `catch`,
//! `try/on/trap/finally`, `throw`, `error`, `return -options`,
//! `break`, `continue` and `tailcall`.

use crate::interpreter::interp::Interp;
use crate::interpreter::types::{Code, EvalScope, ReturnOptions, TailcallRequest};
use crate::value::Value;

pub fn cmd_catch(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 || argv.len() > 4 {
        return interp.wrong_num_args("catch script ?resultVarName? ?optionVarName?");
    }

    let mut code = interp.eval_value(&argv[1], EvalScope::Local);

    // Normalize a propagating RETURN: decrement its level, unwrapping to
    // the target code when it reaches zero.
    if code == Code::Return {
        let mut opts = interp
            .take_return_options()
            .unwrap_or_else(|| ReturnOptions::for_code(Code::Return));
        opts.level -= 1;
        if opts.level <= 0 {
            opts.level = 0;
            code = Code::from_i32(opts.code);
        }
        interp.set_return_options(opts);
    }

    if code == Code::Error {
        interp.error_finalize();
    }

    let result = interp.result();
    let opts = interp.get_return_options(code);

    if let Some(var) = argv.get(2) {
        if interp.set_var(&var.as_str(), result).is_err() {
            return interp.error(format!(
                "couldn't save command result in variable \"{}\"",
                var.as_str()
            ));
        }
    }
    if let Some(var) = argv.get(3) {
        let opts_value = opts.to_value();
        if interp.set_var(&var.as_str(), opts_value).is_err() {
            return interp.error(format!(
                "couldn't save return options in variable \"{}\"",
                var.as_str()
            ));
        }
    }

    interp.ok(Value::int(code.as_i32() as i64))
}

pub fn cmd_error(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 || argv.len() > 4 {
        return interp.wrong_num_args("error message ?errorInfo? ?errorCode?");
    }
    let message = argv[1].clone();
    let info = argv.get(2).cloned().filter(|v| !v.is_empty());
    let errorcode = argv.get(3).cloned();

    let mut opts = ReturnOptions::for_code(Code::Error);
    if let Some(info) = &info {
        opts.errorinfo = Some(info.clone());
        // A caller-supplied errorInfo seeds the accumulating trace, so
        // the unwinding appends continue from it.
        interp.error_trace.active = true;
        interp.error_trace.info = info.as_str();
        interp.error_trace.stack = vec![Value::str("INNER")];
        interp.error_trace.line = interp.active_frame().line as i64;
    }
    if let Some(ec) = errorcode {
        opts.errorcode = Some(ec);
    }
    interp.set_result(message);
    interp.set_return_options(opts);
    Code::Error
}

pub fn cmd_throw(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 3 {
        return interp.wrong_num_args("throw type message");
    }
    let ty = &argv[1];
    match ty.as_list() {
        Ok(items) if !items.is_empty() => {}
        Ok(_) => return interp.error("type must be non-empty list"),
        Err(e) => return interp.error(e),
    }
    let mut opts = ReturnOptions::for_code(Code::Error);
    opts.errorcode = Some(ty.clone());
    interp.set_result(argv[2].clone());
    interp.set_return_options(opts);
    Code::Error
}

/// Apply one `return` option pair onto the accumulating options.
/// `-options` recurses over a flat dict, so its entries behave exactly
/// like inline pairs.
fn apply_return_option(
    opts: &mut ReturnOptions,
    key: &str,
    value: Value,
) -> Result<(), String> {
    match key {
        "-code" => {
            opts.code = match value.as_int() {
                Ok(code) => code as i32,
                Err(_) => match Code::from_word(&value.as_str()) {
                    Some(code) => code.as_i32(),
                    None => {
                        return Err(format!(
                            "bad completion code \"{}\": must be ok, error, return, break, continue, or an integer",
                            value.as_str()
                        ))
                    }
                },
            };
        }
        "-level" => match value.as_int() {
            Ok(level) if level >= 0 => opts.level = level as i32,
            _ => {
                return Err(format!(
                    "bad -level value: expected non-negative integer but got \"{}\"",
                    value.as_str()
                ))
            }
        },
        "-errorcode" => opts.errorcode = Some(value),
        "-errorinfo" => opts.errorinfo = Some(value),
        "-errorstack" => opts.errorstack = Some(value),
        "-errorline" => opts.errorline = value.as_int().ok(),
        "-options" => {
            let dict = crate::value::parse_flat_dict(&value)?;
            for (k, v) in dict {
                apply_return_option(opts, &k, v)?;
            }
        }
        other => opts.extra.push((other.to_string(), value)),
    }
    Ok(())
}

pub fn cmd_return(interp: &mut Interp, argv: &[Value]) -> Code {
    let mut opts = ReturnOptions::default();
    opts.code = Code::Ok.as_i32();
    opts.level = 1;
    let mut result = Value::empty();

    let mut i = 1;
    while i < argv.len() {
        let word = argv[i].as_str();
        if !word.starts_with('-') || i + 1 >= argv.len() {
            break;
        }
        if let Err(e) = apply_return_option(&mut opts, &word, argv[i + 1].clone()) {
            return interp.error(e);
        }
        i += 2;
    }

    if i < argv.len() {
        if i != argv.len() - 1 {
            return interp.wrong_num_args("return ?-option value ...? ?result?");
        }
        result = argv[i].clone();
    }

    interp.set_result(result);
    if opts.level == 0 {
        // The code takes effect immediately.
        let code = Code::from_i32(opts.code);
        interp.set_return_options(opts);
        code
    } else {
        interp.set_return_options(opts);
        Code::Return
    }
}

pub fn cmd_break(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 1 {
        return interp.wrong_num_args("break");
    }
    interp.reset_result();
    Code::Break
}

pub fn cmd_continue(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 1 {
        return interp.wrong_num_args("continue");
    }
    interp.reset_result();
    Code::Continue
}

pub fn cmd_tailcall(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("tailcall command ?arg ...?");
    }
    if !interp.active_frame().is_proc {
        return interp.error("tailcall can only be called from a proc or lambda");
    }
    interp.tailcall = Some(TailcallRequest {
        namespace: interp.active_frame().namespace.clone(),
        argv: argv[1..].to_vec(),
    });
    let mut opts = ReturnOptions::for_code(Code::Ok);
    opts.level = 1;
    interp.set_return_options(opts);
    Code::Return
}

// ---- try ----

enum Handler {
    On {
        code: i32,
        vars: Vec<String>,
        script: Value,
    },
    Trap {
        pattern: Vec<String>,
        vars: Vec<String>,
        script: Value,
    },
}

impl Handler {
    fn vars(&self) -> &[String] {
        match self {
            Handler::On { vars, .. } => vars,
            Handler::Trap { vars, .. } => vars,
        }
    }

    fn script(&self) -> &Value {
        match self {
            Handler::On { script, .. } => script,
            Handler::Trap { script, .. } => script,
        }
    }

    fn matches(&self, code: Code, opts: &ReturnOptions) -> bool {
        match self {
            Handler::On { code: want, .. } => *want == code.as_i32(),
            Handler::Trap { pattern, .. } => {
                if code != Code::Error {
                    return false;
                }
                let errorcode = opts
                    .errorcode
                    .clone()
                    .unwrap_or_else(|| Value::str("NONE"));
                let items = match errorcode.as_list() {
                    Ok(items) => items,
                    Err(_) => return false,
                };
                if pattern.len() > items.len() {
                    return false;
                }
                pattern
                    .iter()
                    .zip(items.iter())
                    .all(|(want, have)| *want == have.as_str())
            }
        }
    }
}

pub fn cmd_try(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("try body ?handler ...? ?finally script?");
    }

    let mut handlers = Vec::new();
    let mut finally: Option<Value> = None;
    let mut i = 2;
    while i < argv.len() {
        match argv[i].as_str().as_str() {
            "on" => {
                if i + 3 >= argv.len() {
                    return interp.wrong_num_args("try body ?handler ...? ?finally script?");
                }
                let code_word = argv[i + 1].as_str();
                let code = match Code::from_word(&code_word) {
                    Some(code) => code.as_i32(),
                    None => match argv[i + 1].as_int() {
                        Ok(n) => n as i32,
                        Err(_) => {
                            return interp.error(format!(
                                "bad completion code \"{}\": must be ok, error, return, break, continue, or an integer",
                                code_word
                            ))
                        }
                    },
                };
                let vars = match argv[i + 2].as_list() {
                    Ok(items) => items.iter().map(|v| v.as_str()).collect(),
                    Err(e) => return interp.error(e),
                };
                handlers.push(Handler::On {
                    code,
                    vars,
                    script: argv[i + 3].clone(),
                });
                i += 4;
            }
            "trap" => {
                if i + 3 >= argv.len() {
                    return interp.wrong_num_args("try body ?handler ...? ?finally script?");
                }
                let pattern = match argv[i + 1].as_list() {
                    Ok(items) => items.iter().map(|v| v.as_str()).collect(),
                    Err(e) => return interp.error(e),
                };
                let vars = match argv[i + 2].as_list() {
                    Ok(items) => items.iter().map(|v| v.as_str()).collect(),
                    Err(e) => return interp.error(e),
                };
                handlers.push(Handler::Trap {
                    pattern,
                    vars,
                    script: argv[i + 3].clone(),
                });
                i += 4;
            }
            "finally" => {
                if i + 1 >= argv.len() || i + 2 != argv.len() {
                    return interp
                        .error("finally clause must be last and have a body");
                }
                finally = Some(argv[i + 1].clone());
                i += 2;
            }
            other => {
                return interp.error(format!(
                    "bad handler \"{}\": must be on, trap, or finally",
                    other
                ))
            }
        }
    }

    // Body.
    let mut code = interp.eval_value(&argv[1], EvalScope::Local);
    if code == Code::Error {
        interp.error_finalize();
    }
    let mut result = interp.result();
    let mut opts = interp.get_return_options(code);

    // At most one handler runs; `-` bodies fall through to the next
    // handler's script with the first match's variable bindings.
    if let Some(first) = handlers.iter().position(|h| h.matches(code, &opts)) {
        let vars: Vec<String> = handlers[first].vars().to_vec();
        let mut script = handlers[first].script().clone();
        let mut idx = first;
        while script.as_str() == "-" {
            idx += 1;
            match handlers.get(idx) {
                Some(next) => script = next.script().clone(),
                None => return interp.error("no body specified for handler"),
            }
        }

        if let Some(var) = vars.first() {
            if let Err(code) = interp.set_var(var, result.clone()) {
                return code;
            }
        }
        if let Some(var) = vars.get(1) {
            let opts_value = opts.to_value();
            if let Err(code) = interp.set_var(var, opts_value) {
                return code;
            }
        }

        code = interp.eval_value(&script, EvalScope::Local);
        if code == Code::Error {
            interp.error_finalize();
        }
        result = interp.result();
        opts = interp.get_return_options(code);
    }

    // `finally` runs unconditionally; its own error overrides, otherwise
    // the prior result and options are restored.
    if let Some(script) = finally {
        let fin_code = interp.eval_value(&script, EvalScope::Local);
        if !fin_code.is_ok() {
            return fin_code;
        }
    }

    interp.set_return_options(opts);
    interp.set_result(result);
    code
}
