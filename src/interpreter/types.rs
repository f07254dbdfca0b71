//! Interpreter Types
//!
//! Completion codes, return options, command definitions and execution
//! limits shared across the evaluator modules.

use std::rc::Rc;

use crate::interpreter::interp::Interp;
use crate::value::{parse_flat_dict, Value};

/// Completion code returned by every evaluation step. Codes at or above
/// 5 are user defined and flow through unchanged until observed by
/// `catch`/`try`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Ok,
    Error,
    Return,
    Break,
    Continue,
    Custom(i32),
}

impl Code {
    pub fn from_i32(i: i32) -> Self {
        match i {
            0 => Code::Ok,
            1 => Code::Error,
            2 => Code::Return,
            3 => Code::Break,
            4 => Code::Continue,
            other => Code::Custom(other),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Code::Ok => 0,
            Code::Error => 1,
            Code::Return => 2,
            Code::Break => 3,
            Code::Continue => 4,
            Code::Custom(i) => i,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Code::Ok
    }

    /// Symbolic name used by `return -code` and `try on` handlers.
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "ok" => Some(Code::Ok),
            "error" => Some(Code::Error),
            "return" => Some(Code::Return),
            "break" => Some(Code::Break),
            "continue" => Some(Code::Continue),
            _ => None,
        }
    }
}

/// Options carried alongside a completion code: at minimum `-code` and
/// `-level`, plus the error keys and any user-defined keys from
/// `return -options`.
#[derive(Debug, Clone)]
pub struct ReturnOptions {
    pub code: i32,
    pub level: i32,
    pub errorcode: Option<Value>,
    pub errorinfo: Option<Value>,
    pub errorstack: Option<Value>,
    pub errorline: Option<i64>,
    /// User-defined keys, kept in the order they were given.
    pub extra: Vec<(String, Value)>,
}

impl Default for ReturnOptions {
    fn default() -> Self {
        Self {
            code: 0,
            level: 0,
            errorcode: None,
            errorinfo: None,
            errorstack: None,
            errorline: None,
            extra: Vec::new(),
        }
    }
}

impl ReturnOptions {
    pub fn for_code(code: Code) -> Self {
        Self {
            code: code.as_i32(),
            ..Default::default()
        }
    }

    /// Project to the canonical flat key/value list.
    pub fn to_value(&self) -> Value {
        let mut items = vec![
            Value::str("-code"),
            Value::int(self.code as i64),
            Value::str("-level"),
            Value::int(self.level as i64),
        ];
        if let Some(ec) = &self.errorcode {
            items.push(Value::str("-errorcode"));
            items.push(ec.clone());
        }
        if let Some(ei) = &self.errorinfo {
            items.push(Value::str("-errorinfo"));
            items.push(ei.clone());
        }
        if let Some(es) = &self.errorstack {
            items.push(Value::str("-errorstack"));
            items.push(es.clone());
        }
        if let Some(el) = self.errorline {
            items.push(Value::str("-errorline"));
            items.push(Value::int(el));
        }
        for (k, v) in &self.extra {
            items.push(Value::str(k.clone()));
            items.push(v.clone());
        }
        Value::list(items)
    }

    /// Parse from a flat key/value list; unknown keys land in `extra`.
    pub fn from_value(v: &Value) -> Result<Self, String> {
        let map = parse_flat_dict(v)?;
        let mut opts = ReturnOptions::default();
        for (k, val) in map {
            match k.as_str() {
                "-code" => {
                    opts.code = match val.as_int() {
                        Ok(i) => i as i32,
                        Err(_) => match Code::from_word(&val.as_str()) {
                            Some(c) => c.as_i32(),
                            None => {
                                return Err(format!(
                                    "bad completion code \"{}\": must be ok, error, return, break, continue, or an integer",
                                    val.as_str()
                                ))
                            }
                        },
                    };
                }
                "-level" => {
                    let lvl = val
                        .as_int()
                        .map_err(|_| format!("bad -level value \"{}\"", val.as_str()))?;
                    if lvl < 0 {
                        return Err(format!("bad -level value \"{}\"", val.as_str()));
                    }
                    opts.level = lvl as i32;
                }
                "-errorcode" => opts.errorcode = Some(val),
                "-errorinfo" => opts.errorinfo = Some(val),
                "-errorstack" => opts.errorstack = Some(val),
                "-errorline" => opts.errorline = val.as_int().ok(),
                _ => opts.extra.push((k, val)),
            }
        }
        Ok(opts)
    }
}

/// Evaluation scope for the public entry points: current frame or the
/// global frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalScope {
    Local,
    Global,
}

/// A builtin command implementation.
pub type BuiltinFn = fn(&mut Interp, &[Value]) -> Code;

/// Host-registered command, the embedder side of the command seam.
pub trait HostCommand {
    fn invoke(&self, interp: &mut Interp, argv: &[Value]) -> Code;
}

/// One formal parameter of a proc or lambda.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub default: Option<Value>,
}

/// A scripted procedure: parameter list plus body.
#[derive(Debug, Clone)]
pub struct ProcDef {
    pub params: Vec<Param>,
    /// True when the final formal is the literal `args`.
    pub variadic: bool,
    pub body: Value,
}

/// A command registered in a namespace.
#[derive(Clone)]
pub enum CommandDef {
    Builtin(BuiltinFn),
    Proc(Rc<ProcDef>),
    Host(Rc<dyn HostCommand>),
}

impl std::fmt::Debug for CommandDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandDef::Builtin(_) => write!(f, "Builtin"),
            CommandDef::Proc(p) => write!(f, "Proc({} params)", p.params.len()),
            CommandDef::Host(_) => write!(f, "Host"),
        }
    }
}

/// A pending tailcall captured by the `tailcall` builtin and drained by
/// the proc invoker's trampoline.
#[derive(Debug, Clone)]
pub struct TailcallRequest {
    /// Namespace captured at the tailcall site, used for the one dispatch.
    pub namespace: String,
    pub argv: Vec<Value>,
}

/// Execution limits configuration.
#[derive(Debug, Clone)]
pub struct ExecutionLimits {
    /// Maximum nesting depth for recursive evaluation
    pub max_nesting_depth: usize,
    /// Maximum number of commands to execute per top-level evaluation
    pub max_commands: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_nesting_depth: 1000,
            max_commands: 10_000_000,
        }
    }
}

/// State accumulated while an error unwinds, finalized into return
/// options by `catch`/`try` or the top level.
#[derive(Debug, Clone, Default)]
pub struct ErrorTraceState {
    pub active: bool,
    pub info: String,
    pub stack: Vec<Value>,
    pub line: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for i in [0, 1, 2, 3, 4, 5, 42] {
            assert_eq!(Code::from_i32(i).as_i32(), i);
        }
    }

    #[test]
    fn test_code_words() {
        assert_eq!(Code::from_word("ok"), Some(Code::Ok));
        assert_eq!(Code::from_word("break"), Some(Code::Break));
        assert_eq!(Code::from_word("nope"), None);
    }

    #[test]
    fn test_return_options_round_trip() {
        let mut opts = ReturnOptions::default();
        opts.code = 2;
        opts.level = 1;
        opts.errorcode = Some(Value::str("MY ERR"));
        opts.extra.push(("-custom".to_string(), Value::str("v")));

        let v = opts.to_value();
        let back = ReturnOptions::from_value(&v).unwrap();
        assert_eq!(back.code, 2);
        assert_eq!(back.level, 1);
        assert_eq!(back.errorcode.unwrap().as_str(), "MY ERR");
        assert_eq!(back.extra.len(), 1);
        assert_eq!(back.extra[0].0, "-custom");
    }

    #[test]
    fn test_return_options_symbolic_code() {
        let opts = ReturnOptions::from_value(&Value::str("-code error -level 0")).unwrap();
        assert_eq!(opts.code, 1);
    }

    #[test]
    fn test_return_options_bad_code() {
        let err = ReturnOptions::from_value(&Value::str("-code banana -level 0")).unwrap_err();
        assert!(err.starts_with("bad completion code"));
    }
}
