//! String Commands
//!
//! The `string` ensemble and `format`. Pattern matching delegates to
//! the glob matcher; everything else works on rune projections.

use crate::interpreter::builtins::list_cmds::parse_index;
use crate::interpreter::interp::Interp;
use crate::interpreter::types::Code;
use crate::util::glob::{glob_match, glob_match_nocase};
use crate::value::{format_double, Value};

pub fn cmd_string(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("string subcommand ?arg ...?");
    }
    let sub = argv[1].as_str();
    match sub.as_str() {
        "length" => {
            if argv.len() != 3 {
                return interp.wrong_num_args("string length string");
            }
            interp.ok(Value::int(argv[2].rune_length() as i64))
        }
        "index" => {
            if argv.len() != 4 {
                return interp.wrong_num_args("string index string charIndex");
            }
            let len = argv[2].rune_length();
            let idx = match parse_index(&argv[3].as_str(), len) {
                Ok(i) => i,
                Err(e) => return interp.error(e),
            };
            if idx < 0 || idx as usize >= len {
                return interp.ok(Value::empty());
            }
            match argv[2].rune_at(idx as usize) {
                Some(c) => interp.ok(Value::str(c.to_string())),
                None => interp.ok(Value::empty()),
            }
        }
        "range" => {
            if argv.len() != 5 {
                return interp.wrong_num_args("string range string first last");
            }
            let len = argv[2].rune_length();
            let first = match parse_index(&argv[3].as_str(), len) {
                Ok(i) => i.max(0) as usize,
                Err(e) => return interp.error(e),
            };
            let last = match parse_index(&argv[4].as_str(), len) {
                Ok(i) => i,
                Err(e) => return interp.error(e),
            };
            if len == 0 || last < first as i64 || first >= len {
                return interp.ok(Value::empty());
            }
            let last = (last as usize).min(len - 1);
            interp.ok(Value::str(argv[2].rune_range(first, last)))
        }
        "match" => {
            let mut nocase = false;
            let mut i = 2;
            if argv.get(2).map(|v| v.as_str()) == Some("-nocase".to_string()) {
                nocase = true;
                i = 3;
            }
            if argv.len() - i != 2 {
                return interp.wrong_num_args("string match ?-nocase? pattern string");
            }
            let pattern = argv[i].as_str();
            let subject = argv[i + 1].as_str();
            let matched = if nocase {
                glob_match_nocase(&pattern, &subject)
            } else {
                glob_match(&pattern, &subject)
            };
            interp.ok(Value::from(matched))
        }
        "equal" => {
            let mut nocase = false;
            let mut i = 2;
            if argv.get(2).map(|v| v.as_str()) == Some("-nocase".to_string()) {
                nocase = true;
                i = 3;
            }
            if argv.len() - i != 2 {
                return interp.wrong_num_args("string equal ?-nocase? string1 string2");
            }
            let a = argv[i].as_str();
            let b = argv[i + 1].as_str();
            let eq = if nocase {
                a.to_lowercase() == b.to_lowercase()
            } else {
                a == b
            };
            interp.ok(Value::from(eq))
        }
        "compare" => {
            if argv.len() != 4 {
                return interp.wrong_num_args("string compare string1 string2");
            }
            let ord = argv[2].as_str().cmp(&argv[3].as_str());
            interp.ok(Value::int(ord as i64))
        }
        "tolower" => {
            if argv.len() != 3 {
                return interp.wrong_num_args("string tolower string");
            }
            interp.ok(Value::str(argv[2].as_str().to_lowercase()))
        }
        "toupper" => {
            if argv.len() != 3 {
                return interp.wrong_num_args("string toupper string");
            }
            interp.ok(Value::str(argv[2].as_str().to_uppercase()))
        }
        "trim" | "trimleft" | "trimright" => {
            if argv.len() < 3 || argv.len() > 4 {
                return interp.wrong_num_args("string trim string ?chars?");
            }
            let text = argv[2].as_str();
            let chars: Vec<char> = argv
                .get(3)
                .map(|v| v.as_str().chars().collect())
                .unwrap_or_else(|| vec![' ', '\t', '\n', '\r', '\x0b', '\x0c']);
            let pred = |c: char| chars.contains(&c);
            let out = match sub.as_str() {
                "trim" => text.trim_matches(|c| pred(c)).to_string(),
                "trimleft" => text.trim_start_matches(|c| pred(c)).to_string(),
                _ => text.trim_end_matches(|c| pred(c)).to_string(),
            };
            interp.ok(Value::str(out))
        }
        "repeat" => {
            if argv.len() != 4 {
                return interp.wrong_num_args("string repeat string count");
            }
            let count = match argv[3].as_int() {
                Ok(n) if n >= 0 => n as usize,
                Ok(_) => 0,
                Err(e) => return interp.error(e),
            };
            interp.ok(Value::str(argv[2].as_str().repeat(count)))
        }
        "first" => {
            if argv.len() != 4 {
                return interp.wrong_num_args("string first needleString haystackString");
            }
            let needle = argv[2].as_str();
            let hay = argv[3].as_str();
            let idx = hay
                .find(&needle)
                .map(|byte| hay[..byte].chars().count() as i64)
                .unwrap_or(-1);
            interp.ok(Value::int(idx))
        }
        "last" => {
            if argv.len() != 4 {
                return interp.wrong_num_args("string last needleString haystackString");
            }
            let needle = argv[2].as_str();
            let hay = argv[3].as_str();
            let idx = hay
                .rfind(&needle)
                .map(|byte| hay[..byte].chars().count() as i64)
                .unwrap_or(-1);
            interp.ok(Value::int(idx))
        }
        other => interp.error(format!(
            "unknown or ambiguous subcommand \"{}\": must be compare, equal, first, index, last, length, match, range, repeat, tolower, toupper, trim, trimleft, or trimright",
            other
        )),
    }
}

// ---- format ----

#[derive(Default)]
struct FormatSpec {
    minus: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

fn pad(spec: &FormatSpec, body: String) -> String {
    let Some(width) = spec.width else {
        return body;
    };
    if body.chars().count() >= width {
        return body;
    }
    let fill = width - body.chars().count();
    if spec.minus {
        format!("{}{}", body, " ".repeat(fill))
    } else if spec.zero && !body.starts_with(' ') {
        // Zero padding goes after any sign.
        let (sign, digits) = match body.strip_prefix('-') {
            Some(rest) => ("-", rest.to_string()),
            None => match body.strip_prefix('+') {
                Some(rest) => ("+", rest.to_string()),
                None => ("", body),
            },
        };
        format!("{}{}{}", sign, "0".repeat(fill), digits)
    } else {
        format!("{}{}", " ".repeat(fill), body)
    }
}

fn signed(spec: &FormatSpec, digits: String, negative: bool) -> String {
    if negative {
        format!("-{}", digits)
    } else if spec.plus {
        format!("+{}", digits)
    } else if spec.space {
        format!(" {}", digits)
    } else {
        digits
    }
}

pub fn cmd_format(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.wrong_num_args("format formatString ?arg ...?");
    }
    let template: Vec<char> = argv[1].as_str().chars().collect();
    let mut out = String::new();
    let mut arg_i = 2;
    let mut i = 0;

    macro_rules! next_arg {
        () => {
            match argv.get(arg_i) {
                Some(v) => {
                    arg_i += 1;
                    v
                }
                None => {
                    return interp.error("not enough arguments for all format specifiers")
                }
            }
        };
    }

    while i < template.len() {
        let c = template[i];
        if c != '%' {
            out.push(c);
            i += 1;
            continue;
        }
        i += 1;
        if template.get(i) == Some(&'%') {
            out.push('%');
            i += 1;
            continue;
        }

        let mut spec = FormatSpec::default();
        // flags
        while let Some(&f) = template.get(i) {
            match f {
                '-' => spec.minus = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                '#' => spec.alt = true,
                _ => break,
            }
            i += 1;
        }
        // width
        if template.get(i) == Some(&'*') {
            let w = next_arg!();
            match w.as_int() {
                Ok(n) if n >= 0 => spec.width = Some(n as usize),
                Ok(n) => {
                    spec.minus = true;
                    spec.width = Some((-n) as usize);
                }
                Err(e) => return interp.error(e),
            }
            i += 1;
        } else {
            let mut width = 0usize;
            let mut saw = false;
            while let Some(&d) = template.get(i) {
                if let Some(v) = d.to_digit(10) {
                    width = width * 10 + v as usize;
                    saw = true;
                    i += 1;
                } else {
                    break;
                }
            }
            if saw {
                spec.width = Some(width);
            }
        }
        // precision
        if template.get(i) == Some(&'.') {
            i += 1;
            let mut precision = 0usize;
            while let Some(&d) = template.get(i) {
                if let Some(v) = d.to_digit(10) {
                    precision = precision * 10 + v as usize;
                    i += 1;
                } else {
                    break;
                }
            }
            spec.precision = Some(precision);
        }

        let Some(&conv) = template.get(i) else {
            return interp.error("format string ended in middle of field specifier");
        };
        i += 1;

        let piece = match conv {
            'd' | 'i' => {
                let v = next_arg!();
                match v.as_int() {
                    Ok(n) => signed(&spec, n.unsigned_abs().to_string(), n < 0),
                    Err(e) => return interp.error(e),
                }
            }
            'u' => {
                let v = next_arg!();
                match v.as_int() {
                    Ok(n) => (n as u64).to_string(),
                    Err(e) => return interp.error(e),
                }
            }
            'x' => {
                let v = next_arg!();
                match v.as_int() {
                    Ok(n) => {
                        let body = format!("{:x}", n);
                        if spec.alt {
                            format!("0x{}", body)
                        } else {
                            body
                        }
                    }
                    Err(e) => return interp.error(e),
                }
            }
            'X' => {
                let v = next_arg!();
                match v.as_int() {
                    Ok(n) => {
                        let body = format!("{:X}", n);
                        if spec.alt {
                            format!("0X{}", body)
                        } else {
                            body
                        }
                    }
                    Err(e) => return interp.error(e),
                }
            }
            'o' => {
                let v = next_arg!();
                match v.as_int() {
                    Ok(n) => format!("{:o}", n),
                    Err(e) => return interp.error(e),
                }
            }
            'b' => {
                let v = next_arg!();
                match v.as_int() {
                    Ok(n) => format!("{:b}", n),
                    Err(e) => return interp.error(e),
                }
            }
            'c' => {
                let v = next_arg!();
                match v.as_int() {
                    Ok(n) => char::from_u32(n as u32)
                        .unwrap_or('\u{fffd}')
                        .to_string(),
                    Err(e) => return interp.error(e),
                }
            }
            's' => {
                let v = next_arg!();
                let mut s = v.as_str();
                if let Some(p) = spec.precision {
                    s = s.chars().take(p).collect();
                }
                s
            }
            'f' => {
                let v = next_arg!();
                match v.as_double() {
                    Ok(d) => {
                        let p = spec.precision.unwrap_or(6);
                        signed(&spec, format!("{:.*}", p, d.abs()), d.is_sign_negative())
                    }
                    Err(e) => return interp.error(e),
                }
            }
            'e' | 'E' => {
                let v = next_arg!();
                match v.as_double() {
                    Ok(d) => {
                        let p = spec.precision.unwrap_or(6);
                        let body = format!("{:.*e}", p, d);
                        if conv == 'E' {
                            body.to_uppercase()
                        } else {
                            body
                        }
                    }
                    Err(e) => return interp.error(e),
                }
            }
            'g' | 'G' => {
                let v = next_arg!();
                match v.as_double() {
                    Ok(d) => {
                        let body = format_double(d);
                        if conv == 'G' {
                            body.to_uppercase()
                        } else {
                            body
                        }
                    }
                    Err(e) => return interp.error(e),
                }
            }
            other => {
                return interp.error(format!("bad field specifier \"{}\"", other));
            }
        };

        out.push_str(&pad(&spec, piece));
    }

    interp.ok(Value::str(out))
}
