//! List Commands
//!
//! `list`, `llength`, `lindex`, `lrange`, `linsert`, `lreplace`,
//! `lset`, `lrepeat`, `lreverse`, `concat`, `join` and `split`.
//! Indices accept `integer`, `end`, and `end±integer` forms.

use crate::interpreter::interp::Interp;
use crate::interpreter::types::Code;
use crate::value::Value;

/// Parse a list index against a list of length `len`. The result may be
/// out of range; callers clamp or reject as their command requires.
pub(crate) fn parse_index(text: &str, len: usize) -> Result<i64, String> {
    let bad = || {
        format!(
            "bad index \"{}\": must be integer?[+-]integer? or end?[+-]integer?",
            text
        )
    };
    let t = text.trim();
    if let Some(rest) = t.strip_prefix("end") {
        let end = len as i64 - 1;
        if rest.is_empty() {
            return Ok(end);
        }
        let (sign, digits) = match rest.as_bytes().first() {
            Some(b'-') => (-1, &rest[1..]),
            Some(b'+') => (1, &rest[1..]),
            _ => return Err(bad()),
        };
        let n: i64 = digits.parse().map_err(|_| bad())?;
        return Ok(end + sign * n);
    }
    t.parse::<i64>().map_err(|_| bad())
}

pub fn cmd_list(interp: &mut Interp, argv: &[Value]) -> Code {
    interp.ok(Value::list(argv[1..].to_vec()))
}

pub fn cmd_llength(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 2 {
        return interp.wrong_num_args("llength list");
    }
    match argv[1].as_list() {
        Ok(items) => interp.ok(Value::int(items.len() as i64)),
        Err(e) => interp.error(e),
    }
}

pub fn cmd_lindex(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("lindex list ?index ...?");
    }
    // Indices may come as separate arguments or as one index list.
    let mut indices: Vec<String> = Vec::new();
    for arg in &argv[2..] {
        match arg.as_list() {
            Ok(items) => indices.extend(items.iter().map(|v| v.as_str())),
            Err(e) => return interp.error(e),
        }
    }
    if indices.is_empty() {
        let value = argv[1].clone();
        return interp.ok(value);
    }

    let mut current = argv[1].clone();
    for index in indices {
        let items = match current.as_list() {
            Ok(items) => items,
            Err(e) => return interp.error(e),
        };
        let idx = match parse_index(&index, items.len()) {
            Ok(idx) => idx,
            Err(e) => return interp.error(e),
        };
        if idx < 0 || idx as usize >= items.len() {
            return interp.ok(Value::empty());
        }
        current = items[idx as usize].clone();
    }
    interp.ok(current)
}

pub fn cmd_lrange(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 4 {
        return interp.wrong_num_args("lrange list first last");
    }
    let items = match argv[1].as_list() {
        Ok(items) => items,
        Err(e) => return interp.error(e),
    };
    let first = match parse_index(&argv[2].as_str(), items.len()) {
        Ok(i) => i.max(0) as usize,
        Err(e) => return interp.error(e),
    };
    let last = match parse_index(&argv[3].as_str(), items.len()) {
        Ok(i) => i,
        Err(e) => return interp.error(e),
    };
    if last < first as i64 || first >= items.len() {
        return interp.ok(Value::list(Vec::new()));
    }
    let last = (last as usize).min(items.len() - 1);
    interp.ok(Value::list(items[first..=last].to_vec()))
}

pub fn cmd_linsert(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 3 {
        return interp.wrong_num_args("linsert list index ?element element ...?");
    }
    let items = match argv[1].as_list() {
        Ok(items) => items,
        Err(e) => return interp.error(e),
    };
    let idx = match parse_index(&argv[2].as_str(), items.len()) {
        Ok(i) => i.clamp(0, items.len() as i64) as usize,
        Err(e) => return interp.error(e),
    };
    let mut out = items.as_ref().clone();
    for (offset, elem) in argv[3..].iter().enumerate() {
        out.insert(idx + offset, elem.clone());
    }
    interp.ok(Value::list(out))
}

pub fn cmd_lreplace(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 4 {
        return interp.wrong_num_args("lreplace list first last ?element element ...?");
    }
    let items = match argv[1].as_list() {
        Ok(items) => items,
        Err(e) => return interp.error(e),
    };
    let first = match parse_index(&argv[2].as_str(), items.len()) {
        Ok(i) => i.max(0) as usize,
        Err(e) => return interp.error(e),
    };
    let last = match parse_index(&argv[3].as_str(), items.len()) {
        Ok(i) => i,
        Err(e) => return interp.error(e),
    };

    let mut out: Vec<Value> = Vec::new();
    let split = first.min(items.len());
    out.extend(items[..split].iter().cloned());
    out.extend(argv[4..].iter().cloned());
    // last < first inserts without deleting.
    let resume = if last < first as i64 {
        split
    } else {
        ((last as usize) + 1).min(items.len())
    };
    out.extend(items[resume..].iter().cloned());
    interp.ok(Value::list(out))
}

fn lset_nested(current: &Value, indices: &[String], value: &Value) -> Result<Value, String> {
    if indices.is_empty() {
        return Ok(value.clone());
    }
    let items = current.as_list()?;
    let idx = parse_index(&indices[0], items.len())?;
    if idx < 0 || idx as usize > items.len() {
        return Err("list index out of range".to_string());
    }
    let mut out = items.as_ref().clone();
    if idx as usize == items.len() {
        // Extending by exactly one element is allowed.
        if indices.len() > 1 {
            return Err("list index out of range".to_string());
        }
        out.push(value.clone());
    } else {
        let replacement = lset_nested(&out[idx as usize], &indices[1..], value)?;
        out[idx as usize] = replacement;
    }
    Ok(Value::list(out))
}

pub fn cmd_lset(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 3 {
        return interp.wrong_num_args("lset listVar ?index? ?index ...? value");
    }
    let name = argv[1].as_str();
    let current = match interp.get_var(&name) {
        Ok(v) => v,
        Err(code) => return code,
    };

    // Indices are everything between the variable and the final value;
    // a single argument may itself be an index list.
    let mut indices: Vec<String> = Vec::new();
    for arg in &argv[2..argv.len() - 1] {
        match arg.as_list() {
            Ok(items) => indices.extend(items.iter().map(|v| v.as_str())),
            Err(e) => return interp.error(e),
        }
    }
    let value = &argv[argv.len() - 1];

    let new = match lset_nested(&current, &indices, value) {
        Ok(v) => v,
        Err(e) => return interp.error(e),
    };
    match interp.set_var(&name, new.clone()) {
        Ok(()) => interp.ok(new),
        Err(code) => code,
    }
}

pub fn cmd_lrepeat(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("lrepeat count ?value ...?");
    }
    let count = match argv[1].as_int() {
        Ok(n) if n >= 0 => n as usize,
        _ => {
            return interp.error(format!(
                "bad count \"{}\": must be integer >= 0",
                argv[1].as_str()
            ))
        }
    };
    let mut out = Vec::with_capacity(count * (argv.len() - 2));
    for _ in 0..count {
        out.extend(argv[2..].iter().cloned());
    }
    interp.ok(Value::list(out))
}

pub fn cmd_lreverse(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 2 {
        return interp.wrong_num_args("lreverse list");
    }
    match argv[1].as_list() {
        Ok(items) => {
            let mut out = items.as_ref().clone();
            out.reverse();
            interp.ok(Value::list(out))
        }
        Err(e) => interp.error(e),
    }
}

pub fn cmd_concat(interp: &mut Interp, argv: &[Value]) -> Code {
    let joined = argv[1..]
        .iter()
        .map(|v| v.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    interp.ok(Value::str(joined))
}

pub fn cmd_join(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 || argv.len() > 3 {
        return interp.wrong_num_args("join list ?joinString?");
    }
    let sep = argv.get(2).map(|v| v.as_str()).unwrap_or_else(|| " ".to_string());
    match argv[1].as_list() {
        Ok(items) => {
            let joined = items
                .iter()
                .map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(&sep);
            interp.ok(Value::str(joined))
        }
        Err(e) => interp.error(e),
    }
}

pub fn cmd_split(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 || argv.len() > 3 {
        return interp.wrong_num_args("split string ?splitChars?");
    }
    let text = argv[1].as_str();
    if text.is_empty() {
        return interp.ok(Value::list(Vec::new()));
    }
    let seps: Vec<char> = match argv.get(2) {
        Some(v) => v.as_str().chars().collect(),
        None => vec![' ', '\t', '\n', '\r'],
    };

    if seps.is_empty() {
        // One element per rune.
        let items = text
            .chars()
            .map(|c| Value::str(c.to_string()))
            .collect::<Vec<_>>();
        return interp.ok(Value::list(items));
    }

    let mut items = Vec::new();
    let mut field = String::new();
    for c in text.chars() {
        if seps.contains(&c) {
            items.push(Value::str(std::mem::take(&mut field)));
        } else {
            field.push(c);
        }
    }
    items.push(Value::str(field));
    interp.ok(Value::list(items))
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
    fn test_list_quotes_elements() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "list a {b c} {}"),
            (Code::Ok, "a {b c} {}".to_string())
        );
    }

    #[test]
    fn test_llength() {
        let mut interp = Interp::new();
        assert_eq!(run(&mut interp, "llength {a {b c} d}"), (Code::Ok, "3".to_string()));
        assert_eq!(run(&mut interp, "llength {}"), (Code::Ok, "0".to_string()));
    }

    #[test]
    fn test_lindex() {
        let mut interp = Interp::new();
        assert_eq!(run(&mut interp, "lindex {a b c} 1"), (Code::Ok, "b".to_string()));
        assert_eq!(run(&mut interp, "lindex {a b c} end"), (Code::Ok, "c".to_string()));
        assert_eq!(
            run(&mut interp, "lindex {a b c} end-1"),
            (Code::Ok, "b".to_string())
        );
        // Out of range yields the empty string.
        assert_eq!(run(&mut interp, "lindex {a b c} 10"), (Code::Ok, "".to_string()));
        // Nested path.
        assert_eq!(
            run(&mut interp, "lindex {{a b} {c d}} 1 0"),
            (Code::Ok, "c".to_string())
        );
        // No index returns the list itself.
        assert_eq!(run(&mut interp, "lindex {a b}"), (Code::Ok, "a b".to_string()));
    }

    #[test]
    fn test_lindex_bad_index() {
        let mut interp = Interp::new();
        let (code, msg) = run(&mut interp, "lindex {a b} banana");
        assert_eq!(code, Code::Error);
        assert!(msg.starts_with("bad index \"banana\""));
    }

    #[test]
    fn test_lrange() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "lrange {a b c d e} 1 3"),
            (Code::Ok, "b c d".to_string())
        );
        assert_eq!(
            run(&mut interp, "lrange {a b c} 1 end"),
            (Code::Ok, "b c".to_string())
        );
        assert_eq!(run(&mut interp, "lrange {a b c} 2 1"), (Code::Ok, "".to_string()));
    }

    #[test]
    fn test_linsert() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "linsert {a c} 1 b"),
            (Code::Ok, "a b c".to_string())
        );
        assert_eq!(
            run(&mut interp, "linsert {a b} end x y"),
            (Code::Ok, "a x y b".to_string())
        );
    }

    #[test]
    fn test_lreplace() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "lreplace {a b c d} 1 2 X"),
            (Code::Ok, "a X d".to_string())
        );
        // last < first: pure insertion, nothing deleted.
        assert_eq!(
            run(&mut interp, "lreplace {a b c} 1 0 X"),
            (Code::Ok, "a X b c".to_string())
        );
        assert_eq!(
            run(&mut interp, "lreplace {a b c} 0 end"),
            (Code::Ok, "".to_string())
        );
    }

    #[test]
    fn test_lset() {
        let mut interp = Interp::new();
        run(&mut interp, "set l {a b c}");
        assert_eq!(run(&mut interp, "lset l 1 X"), (Code::Ok, "a X c".to_string()));
        run(&mut interp, "set m {{1 2} {3 4}}");
        assert_eq!(
            run(&mut interp, "lset m 1 0 X"),
            (Code::Ok, "{1 2} {X 4}".to_string())
        );
        // Whole-value replacement with no index.
        run(&mut interp, "set n old");
        assert_eq!(run(&mut interp, "lset n new"), (Code::Ok, "new".to_string()));
    }

    #[test]
    fn test_lset_out_of_range() {
        let mut interp = Interp::new();
        run(&mut interp, "set l {a b}");
        let (code, msg) = run(&mut interp, "lset l 5 X");
        assert_eq!(code, Code::Error);
        assert!(msg.contains("out of range"));
        // Appending at exactly len is allowed.
        assert_eq!(run(&mut interp, "lset l 2 c"), (Code::Ok, "a b c".to_string()));
    }

    #[test]
    fn test_lrepeat() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "lrepeat 3 a b"),
            (Code::Ok, "a b a b a b".to_string())
        );
        let (code, msg) = run(&mut interp, "lrepeat -1 a");
        assert_eq!(code, Code::Error);
        assert!(msg.starts_with("bad count"));
    }

    #[test]
    fn test_lreverse() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "lreverse {a b {c d}}"),
            (Code::Ok, "{c d} b a".to_string())
        );
    }

    #[test]
    fn test_concat() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "concat {a b} {} { c }"),
            (Code::Ok, "a b c".to_string())
        );
    }

    #[test]
    fn test_join() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "join {a b c} ,"),
            (Code::Ok, "a,b,c".to_string())
        );
        assert_eq!(run(&mut interp, "join {a b}"), (Code::Ok, "a b".to_string()));
    }

    #[test]
    fn test_split() {
        let mut interp = Interp::new();
        assert_eq!(
            run(&mut interp, "split a,b,c ,"),
            (Code::Ok, "a b c".to_string())
        );
        // Consecutive separators keep empty fields.
        assert_eq!(
            run(&mut interp, "split a,,b ,"),
            (Code::Ok, "a {} b".to_string())
        );
        // Empty string splits to the empty list.
        assert_eq!(run(&mut interp, "split {}"), (Code::Ok, "".to_string()));
        // Empty splitChars: one rune per element.
        assert_eq!(
            run(&mut interp, "split abc {}"),
            (Code::Ok, "a b c".to_string())
        );
    }
}
