//! Variable Commands
//!
//! `set`, `unset`, `append`, `lappend`, `incr` and the variable-linking
//! family `global`, `variable`, `upvar`, `uplevel`.

use crate::interpreter::interp::Interp;
use crate::interpreter::resolver::{resolve_ns, split_qualified};
use crate::interpreter::types::{Code, EvalScope};
use crate::value::Value;

pub fn cmd_set(interp: &mut Interp, argv: &[Value]) -> Code {
    match argv.len() {
        2 => {
            let name = argv[1].as_str();
            match interp.get_var(&name) {
                Ok(v) => interp.ok(v),
                Err(code) => code,
            }
        }
        3 => {
            let name = argv[1].as_str();
            match interp.set_var(&name, argv[2].clone()) {
                Ok(()) => interp.ok(argv[2].clone()),
                Err(code) => code,
            }
        }
        _ => interp.wrong_num_args("set varName ?newValue?"),
    }
}

pub fn cmd_unset(interp: &mut Interp, argv: &[Value]) -> Code {
    let mut nocomplain = false;
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str().as_str() {
            "-nocomplain" => {
                nocomplain = true;
                i += 1;
            }
            "--" => {
                i += 1;
                break;
            }
            _ => break,
        }
    }
    while i < argv.len() {
        let name = argv[i].as_str();
        if let Err(code) = interp.unset_var(&name) {
            if !nocomplain {
                return code;
            }
        }
        i += 1;
    }
    interp.ok(Value::empty())
}

pub fn cmd_append(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("append varName ?value ...?");
    }
    let name = argv[1].as_str();
    let mut out = if interp.exists_var(&name) {
        match interp.get_var(&name) {
            Ok(v) => v.as_str(),
            Err(code) => return code,
        }
    } else {
        String::new()
    };
    for v in &argv[2..] {
        out.push_str(&v.as_str());
    }
    let new = Value::str(out);
    match interp.set_var(&name, new.clone()) {
        Ok(()) => interp.ok(new),
        Err(code) => code,
    }
}

pub fn cmd_lappend(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("lappend varName ?value ...?");
    }
    let name = argv[1].as_str();
    let mut items = if interp.exists_var(&name) {
        let current = match interp.get_var(&name) {
            Ok(v) => v,
            Err(code) => return code,
        };
        match current.as_list() {
            Ok(items) => items.as_ref().clone(),
            Err(e) => return interp.error(e),
        }
    } else {
        Vec::new()
    };
    items.extend(argv[2..].iter().cloned());
    let new = Value::list(items);
    match interp.set_var(&name, new.clone()) {
        Ok(()) => interp.ok(new),
        Err(code) => code,
    }
}

pub fn cmd_incr(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 || argv.len() > 3 {
        return interp.wrong_num_args("incr varName ?increment?");
    }
    let name = argv[1].as_str();
    let increment = match argv.get(2) {
        Some(v) => match v.as_int() {
            Ok(i) => i,
            Err(e) => return interp.error(e),
        },
        None => 1,
    };
    let current = if interp.exists_var(&name) {
        let v = match interp.get_var(&name) {
            Ok(v) => v,
            Err(code) => return code,
        };
        match v.as_int() {
            Ok(i) => i,
            Err(e) => return interp.error(e),
        }
    } else {
        0
    };
    let new = Value::int(current.wrapping_add(increment));
    match interp.set_var(&name, new.clone()) {
        Ok(()) => interp.ok(new),
        Err(code) => code,
    }
}

pub fn cmd_global(interp: &mut Interp, argv: &[Value]) -> Code {
    // At the global frame this is a no-op.
    if !interp.active_frame().is_proc {
        return interp.ok(Value::empty());
    }
    for arg in &argv[1..] {
        let name = arg.as_str();
        let q = split_qualified(&name);
        let ns = match q.qualifier {
            Some(qualifier) => resolve_ns("::", &qualifier),
            None => "::".to_string(),
        };
        if let Err(e) = interp.link_ns(&q.tail, &ns, &q.tail) {
            return interp.error(e);
        }
    }
    interp.ok(Value::empty())
}

pub fn cmd_variable(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("variable ?name value...? name ?value?");
    }
    let mut i = 1;
    while i < argv.len() {
        let name = argv[i].as_str();
        let q = split_qualified(&name);
        let ns = match &q.qualifier {
            Some(qualifier) => resolve_ns(&interp.active_frame().namespace, qualifier),
            None => interp.active_frame().namespace.clone(),
        };
        interp.ensure_namespace(&ns);

        if interp.active_frame().is_proc {
            if let Err(e) = interp.link_ns(&q.tail, &ns, &q.tail) {
                return interp.error(e);
            }
        }
        if i + 1 < argv.len() {
            let full = crate::interpreter::resolver::join_ns(&ns, &q.tail);
            if let Err(code) = interp.set_var(&full, argv[i + 1].clone()) {
                return code;
            }
        }
        i += 2;
    }
    interp.ok(Value::empty())
}

/// First argument of `upvar`/`uplevel` is a level spec when it starts
/// with `#` or a digit.
fn looks_like_level(s: &str) -> bool {
    s.starts_with('#') || s.chars().next().map_or(false, |c| c.is_ascii_digit())
}

pub fn cmd_upvar(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 3 {
        return interp.wrong_num_args("upvar ?level? otherVar localVar ?otherVar localVar ...?");
    }
    let mut i = 1;
    let first = argv[1].as_str();
    let level_spec = if looks_like_level(&first) && argv.len() >= 4 {
        i = 2;
        first
    } else {
        "1".to_string()
    };
    let target_level = match interp.resolve_level(&level_spec) {
        Ok(level) => level,
        Err(e) => return interp.error(e),
    };
    if (argv.len() - i) % 2 != 0 || argv.len() - i == 0 {
        return interp.wrong_num_args("upvar ?level? otherVar localVar ?otherVar localVar ...?");
    }
    while i < argv.len() {
        let other = argv[i].as_str();
        let local = argv[i + 1].as_str();
        let link_result = if crate::interpreter::resolver::is_qualified(&other) {
            let q = split_qualified(&other);
            let ns = resolve_ns(
                &interp.frames[target_level].namespace.clone(),
                q.qualifier.as_deref().unwrap_or(""),
            );
            interp.link_ns(&local, &ns, &q.tail)
        } else {
            interp.link_upvar(&local, target_level, &other)
        };
        if let Err(e) = link_result {
            return interp.error(e);
        }
        i += 2;
    }
    interp.ok(Value::empty())
}

pub fn cmd_uplevel(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("uplevel ?level? command ?arg ...?");
    }
    let mut i = 1;
    let first = argv[1].as_str();
    let level_spec = if looks_like_level(&first) && argv.len() >= 3 {
        i = 2;
        first
    } else {
        "1".to_string()
    };
    let target_level = match interp.resolve_level(&level_spec) {
        Ok(level) => level,
        Err(e) => return interp.error(e),
    };

    let script = if argv.len() - i == 1 {
        argv[i].as_str()
    } else {
        argv[i..]
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };

    // Redirect the active frame for the evaluation; restored on every
    // exit path.
    let saved = interp.active_level();
    interp.set_active_level(target_level);
    let code = interp.eval_script(&script, EvalScope::Local);
    interp.set_active_level(saved.min(interp.frame_depth() - 1));
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(interp: &mut Interp, script: &str) -> (Code, String) {
        let code = interp.eval_script(script, EvalScope::Local);
        (code, interp.result().as_str())
    }

    #[test]
    fn test_set_get_unset() {
        let mut interp = Interp::new();
        assert_eq!(run(&mut interp, "set x 10"), (Code::Ok, "10".to_string()));
        assert_eq!(run(&mut interp, "set x"), (Code::Ok, "10".to_string()));
        assert_eq!(run(&mut interp, "unset x"), (Code::Ok, "".to_string()));
        let (code, msg) = run(&mut interp, "set x");
        assert_eq!(code, Code::Error);
        assert_eq!(msg, "can't read \"x\": no such variable");
    }

    #[test]
    fn test_unset_nocomplain() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "unset -nocomplain nothing"),
            (Code::Ok, "".to_string())
        );
    }

    #[test]
    fn test_append() {
        let mut interp = Interp::new();
        run(&mut interp, "append s foo bar");
        assert_eq!(interp.lookup_var("s").unwrap().as_str(), "foobar");
        run(&mut interp, "append s !");
        assert_eq!(interp.lookup_var("s").unwrap().as_str(), "foobar!");
    }

    #[test]
    fn test_lappend() {
        let mut interp = Interp::new();
        run(&mut interp, "lappend l a");
        run(&mut interp, "lappend l {b c} d");
        assert_eq!(interp.lookup_var("l").unwrap().as_str(), "a {b c} d");
    }

    #[test]
    fn test_incr() {
        let mut interp = Interp::new();
        assert_eq!(run(&mut interp, "incr n"), (Code::Ok, "1".to_string()));
        assert_eq!(run(&mut interp, "incr n 5"), (Code::Ok, "6".to_string()));
        assert_eq!(run(&mut interp, "incr n -2"), (Code::Ok, "4".to_string()));
        let (code, msg) = run(&mut interp, "set s text; incr s");
        assert_eq!(code, Code::Error);
        assert!(msg.contains("expected integer"));
    }

    #[test]
    fn test_upvar_through_proc() {
        let mut interp = Interp::new();
        run(
            &mut interp,
            "proc bump {varName} { upvar 1 $varName v; incr v }",
        );
        run(&mut interp, "set counter 7; bump counter");
        assert_eq!(interp.lookup_var("counter").unwrap().as_str(), "8");
    }

    #[test]
    fn test_upvar_absolute_level() {
        let mut interp = Interp::new();
        run(
            &mut interp,
            "proc outer {} { inner }\n\
             proc inner {} { upvar #0 g v; set v changed }",
        );
        run(&mut interp, "set g original; outer");
        assert_eq!(interp.lookup_var("g").unwrap().as_str(), "changed");
    }

    #[test]
    fn test_global() {
        let mut interp = Interp::new();
        run(&mut interp, "set g 1");
        run(&mut interp, "proc f {} { global g; incr g }; f");
        assert_eq!(interp.lookup_var("g").unwrap().as_str(), "2");
    }

    #[test]
    fn test_uplevel_runs_in_caller_scope() {
        let mut interp = Interp::new();
        run(
            &mut interp,
            "proc f {} { uplevel 1 {set made-here yes} }\nf",
        );
        assert_eq!(interp.lookup_var("made-here").unwrap().as_str(), "yes");
    }

    #[test]
    fn test_uplevel_restores_active_frame() {
        let mut interp = Interp::new();
        run(
            &mut interp,
            "proc f {} { uplevel 1 {definitely-missing}; set x local; set x }",
        );
        // The uplevel'd command errors, but a later call still resolves
        // locals in f's own frame.
        let (code, _) = run(&mut interp, "f");
        assert_eq!(code, Code::Error);
        run(&mut interp, "proc g {} { catch { uplevel 1 {missing-cmd} }; set y 5; set y }");
        assert_eq!(run(&mut interp, "g"), (Code::Ok, "5".to_string()));
        assert!(!interp.exists_var("y"));
    }

    #[test]
    fn test_variable_in_namespace_frame() {
        let mut interp = Interp::new();
        run(&mut interp, "namespace eval ::cfg { variable timeout 30 }");
        assert_eq!(interp.lookup_var("::cfg::timeout").unwrap().as_str(), "30");
    }
}
