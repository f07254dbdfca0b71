//! Expression Evaluator
//!
//! Recursive-descent evaluator backing the `expr` command and the
//! conditions of `if`, `while` and `for`. Operands substitute inline:
//! `$var` reads through the variable engine, `[…]` evaluates a nested
//! script, `"…"` and `{…}` are string literals. Integer arithmetic is
//! 64-bit with checked overflow; mixing with a double promotes.

use crate::interpreter::interp::Interp;
use crate::interpreter::types::{Code, EvalScope};
use crate::value::{parse_double, parse_int, Value};

/// Evaluate an expression string to a value.
pub(crate) fn eval_expr(interp: &mut Interp, src: &str) -> Result<Value, Code> {
    let outcome = {
        let mut parser = ExprParser {
            chars: src.chars().collect(),
            pos: 0,
            interp: &mut *interp,
        };
        let result = parser.parse_ternary();
        match result {
            Ok(op) => {
                parser.skip_ws();
                if parser.pos < parser.chars.len() {
                    Err(ExprFail::Msg(
                        format!("syntax error in expression \"{}\"", src),
                        None,
                    ))
                } else {
                    Ok(op)
                }
            }
            Err(e) => Err(e),
        }
    };
    match outcome {
        Ok(op) => Ok(op.into_value()),
        Err(ExprFail::Raise(code)) => Err(code),
        Err(ExprFail::Msg(msg, errorcode)) => Err(match errorcode {
            Some(ec) => interp.error_with_code(msg, ec),
            None => interp.error(msg),
        }),
    }
}

/// Evaluate an expression and coerce it to a boolean; the shape every
/// control-flow condition uses.
pub(crate) fn eval_expr_bool(interp: &mut Interp, src: &str) -> Result<bool, Code> {
    let v = eval_expr(interp, src)?;
    v.as_bool().map_err(|msg| interp.error(msg))
}

enum ExprFail {
    /// Error already materialized on the interpreter.
    Raise(Code),
    /// Message plus optional `-errorcode`.
    Msg(String, Option<Value>),
}

fn arith_error(kind: &str, msg: &str) -> ExprFail {
    ExprFail::Msg(
        msg.to_string(),
        Some(Value::list(vec![Value::str("ARITH"), Value::str(kind)])),
    )
}

#[derive(Debug, Clone)]
enum Operand {
    Int(i64),
    Double(f64),
    Str(String),
}

impl Operand {
    fn from_value(v: &Value) -> Self {
        match v {
            Value::Int(i) => Operand::Int(*i),
            Value::Double(d) => Operand::Double(*d),
            other => Operand::from_str(&other.as_str()),
        }
    }

    fn from_str(s: &str) -> Self {
        if let Ok(i) = parse_int(s) {
            Operand::Int(i)
        } else if let Ok(d) = parse_double(s) {
            Operand::Double(d)
        } else {
            Operand::Str(s.to_string())
        }
    }

    fn into_value(self) -> Value {
        match self {
            Operand::Int(i) => Value::Int(i),
            Operand::Double(d) => Value::Double(d),
            Operand::Str(s) => Value::str(s),
        }
    }

    fn as_int(&self) -> Result<i64, ExprFail> {
        match self {
            Operand::Int(i) => Ok(*i),
            Operand::Double(_) | Operand::Str(_) => Err(ExprFail::Msg(
                format!("expected integer but got \"{}\"", self.display()),
                None,
            )),
        }
    }

    fn truthy(&self) -> Result<bool, ExprFail> {
        match self {
            Operand::Int(i) => Ok(*i != 0),
            Operand::Double(d) => Ok(*d != 0.0),
            Operand::Str(s) => Value::str(s.clone())
                .as_bool()
                .map_err(|m| ExprFail::Msg(m, None)),
        }
    }

    fn display(&self) -> String {
        self.clone().into_value().as_str()
    }
}

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

struct ExprParser<'a> {
    chars: Vec<char>,
    pos: usize,
    interp: &'a mut Interp,
}

impl<'a> ExprParser<'a> {
    fn skip_ws(&mut self) {
        while matches!(
            self.chars.get(self.pos),
            Some(' ') | Some('\t') | Some('\n') | Some('\r')
        ) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, off: usize) -> Option<char> {
        self.chars.get(self.pos + off).copied()
    }

    /// Consume `op` when it is next (longest operators first at call
    /// sites).
    fn eat(&mut self, op: &str) -> bool {
        self.skip_ws();
        let opc: Vec<char> = op.chars().collect();
        if self.chars.len().saturating_sub(self.pos) < opc.len() {
            return false;
        }
        for (i, c) in opc.iter().enumerate() {
            if self.chars[self.pos + i] != *c {
                return false;
            }
        }
        // Don't split "**", "<=", "==" and friends.
        if let Some(&next) = self.chars.get(self.pos + opc.len()) {
            let last = *opc.last().expect("non-empty operator");
            if matches!(last, '*' | '<' | '>' | '=' | '!' | '&' | '|')
                && matches!(next, '*' | '<' | '>' | '=' | '&' | '|')
            {
                return false;
            }
        }
        self.pos += opc.len();
        true
    }

    fn parse_ternary(&mut self) -> Result<Operand, ExprFail> {
        let cond = self.parse_or()?;
        self.skip_ws();
        if self.eat("?") {
            let yes = self.parse_ternary()?;
            self.skip_ws();
            if !self.eat(":") {
                return Err(ExprFail::Msg("missing \":\" in ternary".to_string(), None));
            }
            let no = self.parse_ternary()?;
            return Ok(if cond.truthy()? { yes } else { no });
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> Result<Operand, ExprFail> {
        let mut left = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.eat("||") {
                let lval = left.truthy()?;
                let right = self.parse_and()?;
                left = Operand::Int((lval || right.truthy()?) as i64);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_and(&mut self) -> Result<Operand, ExprFail> {
        let mut left = self.parse_bitor()?;
        loop {
            self.skip_ws();
            if self.peek() == Some('&') && self.peek_at(1) == Some('&') {
                self.pos += 2;
                let lval = left.truthy()?;
                let right = self.parse_bitor()?;
                left = Operand::Int((lval && right.truthy()?) as i64);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_bitor(&mut self) -> Result<Operand, ExprFail> {
        let mut left = self.parse_bitxor()?;
        loop {
            self.skip_ws();
            if self.peek() == Some('|') && self.peek_at(1) != Some('|') {
                self.pos += 1;
                let right = self.parse_bitxor()?;
                left = Operand::Int(left.as_int()? | right.as_int()?);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_bitxor(&mut self) -> Result<Operand, ExprFail> {
        let mut left = self.parse_bitand()?;
        loop {
            self.skip_ws();
            if self.peek() == Some('^') {
                self.pos += 1;
                let right = self.parse_bitand()?;
                left = Operand::Int(left.as_int()? ^ right.as_int()?);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_bitand(&mut self) -> Result<Operand, ExprFail> {
        let mut left = self.parse_equality()?;
        loop {
            self.skip_ws();
            if self.peek() == Some('&') && self.peek_at(1) != Some('&') {
                self.pos += 1;
                let right = self.parse_equality()?;
                left = Operand::Int(left.as_int()? & right.as_int()?);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_equality(&mut self) -> Result<Operand, ExprFail> {
        let mut left = self.parse_relational()?;
        loop {
            self.skip_ws();
            if self.eat("==") {
                let right = self.parse_relational()?;
                left = Operand::Int(compare(&left, &right).map(|o| o == 0)? as i64);
            } else if self.eat("!=") {
                let right = self.parse_relational()?;
                left = Operand::Int(compare(&left, &right).map(|o| o != 0)? as i64);
            } else if self.eat_word("eq") {
                let right = self.parse_relational()?;
                left = Operand::Int((left.display() == right.display()) as i64);
            } else if self.eat_word("ne") {
                let right = self.parse_relational()?;
                left = Operand::Int((left.display() != right.display()) as i64);
            } else if self.eat_word("in") {
                let right = self.parse_relational()?;
                left = Operand::Int(self.list_contains(&right, &left)? as i64);
            } else if self.eat_word("ni") {
                let right = self.parse_relational()?;
                left = Operand::Int(!self.list_contains(&right, &left)? as i64);
            } else {
                return Ok(left);
            }
        }
    }

    fn list_contains(&mut self, list: &Operand, needle: &Operand) -> Result<bool, ExprFail> {
        let items = Value::str(list.display())
            .as_list()
            .map_err(|m| ExprFail::Msg(m, None))?;
        let needle = needle.display();
        Ok(items.iter().any(|item| item.as_str() == needle))
    }

    fn parse_relational(&mut self) -> Result<Operand, ExprFail> {
        let mut left = self.parse_shift()?;
        loop {
            self.skip_ws();
            if self.eat("<=") {
                let right = self.parse_shift()?;
                left = Operand::Int(compare(&left, &right).map(|o| o <= 0)? as i64);
            } else if self.eat(">=") {
                let right = self.parse_shift()?;
                left = Operand::Int(compare(&left, &right).map(|o| o >= 0)? as i64);
            } else if self.peek() == Some('<') && self.peek_at(1) != Some('<') {
                self.pos += 1;
                let right = self.parse_shift()?;
                left = Operand::Int(compare(&left, &right).map(|o| o < 0)? as i64);
            } else if self.peek() == Some('>') && self.peek_at(1) != Some('>') {
                self.pos += 1;
                let right = self.parse_shift()?;
                left = Operand::Int(compare(&left, &right).map(|o| o > 0)? as i64);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_shift(&mut self) -> Result<Operand, ExprFail> {
        let mut left = self.parse_additive()?;
        loop {
            self.skip_ws();
            if self.eat("<<") {
                let right = self.parse_additive()?;
                left = Operand::Int(left.as_int()?.wrapping_shl(right.as_int()? as u32));
            } else if self.eat(">>") {
                let right = self.parse_additive()?;
                left = Operand::Int(left.as_int()?.wrapping_shr(right.as_int()? as u32));
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_additive(&mut self) -> Result<Operand, ExprFail> {
        let mut left = self.parse_multiplicative()?;
        loop {
            self.skip_ws();
            if self.peek() == Some('+') {
                self.pos += 1;
                let right = self.parse_multiplicative()?;
                left = numeric_binop(&left, &right, "+")?;
            } else if self.peek() == Some('-') {
                self.pos += 1;
                let right = self.parse_multiplicative()?;
                left = numeric_binop(&left, &right, "-")?;
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Operand, ExprFail> {
        let mut left = self.parse_power()?;
        loop {
            self.skip_ws();
            if self.peek() == Some('*') && self.peek_at(1) != Some('*') {
                self.pos += 1;
                let right = self.parse_power()?;
                left = numeric_binop(&left, &right, "*")?;
            } else if self.peek() == Some('/') {
                self.pos += 1;
                let right = self.parse_power()?;
                left = numeric_binop(&left, &right, "/")?;
            } else if self.peek() == Some('%') {
                self.pos += 1;
                let right = self.parse_power()?;
                left = numeric_binop(&left, &right, "%")?;
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_power(&mut self) -> Result<Operand, ExprFail> {
        let base = self.parse_unary()?;
        self.skip_ws();
        if self.eat("**") {
            // Right associative.
            let exp = self.parse_power()?;
            return numeric_binop(&base, &exp, "**");
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Operand, ExprFail> {
        self.skip_ws();
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                let op = self.parse_unary()?;
                match op {
                    Operand::Int(i) => i
                        .checked_neg()
                        .map(Operand::Int)
                        .ok_or_else(|| arith_error("IOVERFLOW", "integer value too large to represent")),
                    Operand::Double(d) => Ok(Operand::Double(-d)),
                    Operand::Str(s) => Err(ExprFail::Msg(
                        format!("can't use non-numeric string \"{}\" as operand of \"-\"", s),
                        None,
                    )),
                }
            }
            Some('+') => {
                self.pos += 1;
                self.parse_unary()
            }
            Some('!') => {
                self.pos += 1;
                let op = self.parse_unary()?;
                Ok(Operand::Int(!op.truthy()? as i64))
            }
            Some('~') => {
                self.pos += 1;
                let op = self.parse_unary()?;
                Ok(Operand::Int(!op.as_int()?))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Operand, ExprFail> {
        self.skip_ws();
        match self.peek() {
            None => Err(ExprFail::Msg("empty expression".to_string(), None)),
            Some('(') => {
                self.pos += 1;
                let inner = self.parse_ternary()?;
                self.skip_ws();
                if self.peek() != Some(')') {
                    return Err(ExprFail::Msg(
                        "missing close parenthesis in expression".to_string(),
                        None,
                    ));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some('$') => self.parse_variable(),
            Some('[') => self.parse_command(),
            Some('"') => self.parse_quoted(),
            Some('{') => self.parse_braced(),
            Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_word(),
            Some(c) => Err(ExprFail::Msg(
                format!("invalid character \"{}\" in expression", c),
                None,
            )),
        }
    }

    fn parse_number(&mut self) -> Result<Operand, ExprFail> {
        let start = self.pos;
        let mut seen_dot = false;
        let mut seen_exp = false;
        // Hex and friends: 0x / 0o / 0b prefix.
        if self.peek() == Some('0')
            && matches!(self.peek_at(1), Some('x') | Some('X') | Some('o') | Some('O') | Some('b') | Some('B'))
        {
            self.pos += 2;
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
                self.pos += 1;
            }
        } else {
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.pos += 1;
                } else if c == '.' && !seen_dot && !seen_exp {
                    seen_dot = true;
                    self.pos += 1;
                } else if (c == 'e' || c == 'E')
                    && !seen_exp
                    && self
                        .peek_at(1)
                        .map_or(false, |n| n.is_ascii_digit() || n == '+' || n == '-')
                {
                    seen_exp = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some('+') | Some('-')) {
                        self.pos += 1;
                    }
                } else {
                    break;
                }
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if let Ok(i) = parse_int(&text) {
            Ok(Operand::Int(i))
        } else if let Ok(d) = parse_double(&text) {
            Ok(Operand::Double(d))
        } else {
            Err(ExprFail::Msg(format!("invalid number \"{}\"", text), None))
        }
    }

    fn parse_variable(&mut self) -> Result<Operand, ExprFail> {
        self.pos += 1; // $
        let mut name = String::new();
        if self.peek() == Some('{') {
            self.pos += 1;
            while let Some(c) = self.peek() {
                if c == '}' {
                    break;
                }
                name.push(c);
                self.pos += 1;
            }
            if self.peek() != Some('}') {
                return Err(ExprFail::Msg(
                    "missing close-brace for variable name".to_string(),
                    None,
                ));
            }
            self.pos += 1;
        } else {
            while let Some(c) = self.peek() {
                if c.is_alphanumeric() || c == '_' {
                    name.push(c);
                    self.pos += 1;
                } else if c == ':' && self.peek_at(1) == Some(':') {
                    name.push_str("::");
                    self.pos += 2;
                } else {
                    break;
                }
            }
            if self.peek() == Some('(') {
                name.push('(');
                self.pos += 1;
                let mut depth = 1;
                while let Some(c) = self.peek() {
                    if c == '(' {
                        depth += 1;
                    } else if c == ')' {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    name.push(c);
                    self.pos += 1;
                }
                if self.peek() != Some(')') {
                    return Err(ExprFail::Msg("missing close-paren".to_string(), None));
                }
                name.push(')');
                self.pos += 1;
            }
        }
        match self.interp.get_var(&name) {
            Ok(v) => Ok(Operand::from_value(&v)),
            Err(code) => Err(ExprFail::Raise(code)),
        }
    }

    fn parse_command(&mut self) -> Result<Operand, ExprFail> {
        // Balanced-bracket scan matching the script parser's rules.
        self.pos += 1;
        let start = self.pos;
        let mut depth = 1;
        let mut brace_depth = 0;
        while let Some(c) = self.peek() {
            match c {
                '\\' => self.pos += 2,
                '{' => {
                    brace_depth += 1;
                    self.pos += 1;
                }
                '}' if brace_depth > 0 => {
                    brace_depth -= 1;
                    self.pos += 1;
                }
                '[' if brace_depth == 0 => {
                    depth += 1;
                    self.pos += 1;
                }
                ']' if brace_depth == 0 => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        if depth != 0 {
            return Err(ExprFail::Msg("missing close-bracket".to_string(), None));
        }
        let script: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        let code = self.interp.eval_script(&script, EvalScope::Local);
        if !code.is_ok() {
            return Err(ExprFail::Raise(code));
        }
        Ok(Operand::from_value(&self.interp.result()))
    }

    fn parse_quoted(&mut self) -> Result<Operand, ExprFail> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(ExprFail::Msg("missing close-quote".to_string(), None)),
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    let rest = &self.chars[self.pos + 1..];
                    match crate::parser::escapes::decode_escape(rest) {
                        Ok(res) => {
                            out.push_str(&res.text);
                            self.pos += 1 + res.consumed;
                        }
                        Err(e) => return Err(ExprFail::Msg(e.message, None)),
                    }
                }
                Some('$') => {
                    let v = self.parse_variable()?;
                    out.push_str(&v.display());
                }
                Some('[') => {
                    let v = self.parse_command()?;
                    out.push_str(&v.display());
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(Operand::Str(out))
    }

    fn parse_braced(&mut self) -> Result<Operand, ExprFail> {
        self.pos += 1;
        let start = self.pos;
        let mut depth = 1;
        while let Some(c) = self.peek() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        if depth != 0 {
            return Err(ExprFail::Msg("missing close-brace".to_string(), None));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(Operand::Str(text))
    }

    /// Bareword: boolean constants, math functions, or (for `eq`/`ne`
    /// style operators) handled by callers via `eat_word`.
    fn parse_word(&mut self) -> Result<Operand, ExprFail> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "true" | "yes" | "on" => return Ok(Operand::Int(1)),
            "false" | "no" | "off" => return Ok(Operand::Int(0)),
            _ => {}
        }
        self.skip_ws();
        if self.peek() == Some('(') {
            self.pos += 1;
            let mut args = vec![self.parse_ternary()?];
            self.skip_ws();
            while self.peek() == Some(',') {
                self.pos += 1;
                args.push(self.parse_ternary()?);
                self.skip_ws();
            }
            if self.peek() != Some(')') {
                return Err(ExprFail::Msg(
                    "missing close parenthesis in expression".to_string(),
                    None,
                ));
            }
            self.pos += 1;
            return apply_function(&word, &args);
        }
        Err(ExprFail::Msg(
            format!("invalid bareword \"{}\" in expression", word),
            None,
        ))
    }

    /// Consume an alphabetic operator (`eq`, `ne`, `in`, `ni`) when it is
    /// next and not part of a longer word.
    fn eat_word(&mut self, word: &str) -> bool {
        self.skip_ws();
        let wc: Vec<char> = word.chars().collect();
        if self.chars.len().saturating_sub(self.pos) < wc.len() {
            return false;
        }
        for (i, c) in wc.iter().enumerate() {
            if self.chars[self.pos + i] != *c {
                return false;
            }
        }
        if let Some(&next) = self.chars.get(self.pos + wc.len()) {
            if next.is_alphanumeric() || next == '_' {
                return false;
            }
        }
        self.pos += wc.len();
        true
    }
}

fn apply_function(name: &str, args: &[Operand]) -> Result<Operand, ExprFail> {
    let one = |args: &[Operand]| -> Result<Operand, ExprFail> {
        if args.len() != 1 {
            Err(ExprFail::Msg(
                format!("wrong # args for math function \"{}\"", name),
                None,
            ))
        } else {
            Ok(args[0].clone())
        }
    };
    match name {
        "abs" => match one(args)? {
            Operand::Int(i) => Ok(Operand::Int(i.abs())),
            Operand::Double(d) => Ok(Operand::Double(d.abs())),
            Operand::Str(s) => Err(non_numeric(&s, "abs")),
        },
        "int" => match one(args)? {
            Operand::Int(i) => Ok(Operand::Int(i)),
            Operand::Double(d) => Ok(Operand::Int(d.trunc() as i64)),
            Operand::Str(s) => Err(non_numeric(&s, "int")),
        },
        "double" => match one(args)? {
            Operand::Int(i) => Ok(Operand::Double(i as f64)),
            Operand::Double(d) => Ok(Operand::Double(d)),
            Operand::Str(s) => Err(non_numeric(&s, "double")),
        },
        "round" => match one(args)? {
            Operand::Int(i) => Ok(Operand::Int(i)),
            Operand::Double(d) => Ok(Operand::Int(d.round() as i64)),
            Operand::Str(s) => Err(non_numeric(&s, "round")),
        },
        _ => Err(ExprFail::Msg(
            format!("unknown math function \"{}\"", name),
            None,
        )),
    }
}

fn non_numeric(s: &str, op: &str) -> ExprFail {
    ExprFail::Msg(
        format!("can't use non-numeric string \"{}\" as operand of \"{}\"", s, op),
        None,
    )
}

/// Three-way comparison: numeric when both sides are numbers, string
/// otherwise.
fn compare(left: &Operand, right: &Operand) -> Result<i32, ExprFail> {
    match (left, right) {
        (Operand::Int(a), Operand::Int(b)) => Ok((a.cmp(b)) as i32),
        (Operand::Str(_), _) | (_, Operand::Str(_)) => {
            let l = left.display();
            let r = right.display();
            Ok(l.cmp(&r) as i32)
        }
        _ => {
            let a = to_double(left);
            let b = to_double(right);
            Ok(if a < b {
                -1
            } else if a > b {
                1
            } else {
                0
            })
        }
    }
}

fn to_double(op: &Operand) -> f64 {
    match op {
        Operand::Int(i) => *i as f64,
        Operand::Double(d) => *d,
        Operand::Str(_) => f64::NAN,
    }
}

fn numeric_binop(left: &Operand, right: &Operand, op: &str) -> Result<Operand, ExprFail> {
    match (left, right) {
        (Operand::Str(s), _) | (_, Operand::Str(s)) => Err(non_numeric(s, op)),
        (Operand::Int(a), Operand::Int(b)) => int_binop(*a, *b, op),
        _ => {
            let a = to_double(left);
            let b = to_double(right);
            double_binop(a, b, op)
        }
    }
}

fn int_binop(a: i64, b: i64, op: &str) -> Result<Operand, ExprFail> {
    let overflow = || arith_error("IOVERFLOW", "integer value too large to represent");
    match op {
        "+" => a.checked_add(b).map(Operand::Int).ok_or_else(overflow),
        "-" => a.checked_sub(b).map(Operand::Int).ok_or_else(overflow),
        "*" => a.checked_mul(b).map(Operand::Int).ok_or_else(overflow),
        "/" => {
            if b == 0 {
                Err(arith_error("DIVZERO", "divide by zero"))
            } else {
                Ok(Operand::Int(floor_div(a, b)))
            }
        }
        "%" => {
            if b == 0 {
                Err(arith_error("DIVZERO", "divide by zero"))
            } else {
                Ok(Operand::Int(floor_mod(a, b)))
            }
        }
        "**" => {
            if b < 0 {
                Ok(Operand::Double((a as f64).powf(b as f64)))
            } else {
                let exp = u32::try_from(b).map_err(|_| overflow())?;
                a.checked_pow(exp).map(Operand::Int).ok_or_else(overflow)
            }
        }
        _ => unreachable!("unhandled integer operator {}", op),
    }
}

fn double_binop(a: f64, b: f64, op: &str) -> Result<Operand, ExprFail> {
    match op {
        "+" => Ok(Operand::Double(a + b)),
        "-" => Ok(Operand::Double(a - b)),
        "*" => Ok(Operand::Double(a * b)),
        "/" => {
            if b == 0.0 {
                Err(arith_error("DIVZERO", "divide by zero"))
            } else {
                Ok(Operand::Double(a / b))
            }
        }
        "%" => Err(ExprFail::Msg(
            "can't use floating-point value as operand of \"%\"".to_string(),
            None,
        )),
        "**" => Ok(Operand::Double(a.powf(b))),
        _ => unreachable!("unhandled double operator {}", op),
    }
}
