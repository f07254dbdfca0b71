//! Interpreter State
//!
//! `Interp` owns everything a script execution touches: the frame stack,
//! the namespace registry, the result and return-options slots, the
//! error-trace state and the trace registry. There is no process-wide
//! singleton; embedders create as many independent interpreters as they
//! need.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::interpreter::frames::Frame;
use crate::interpreter::namespaces::Namespace;
use crate::interpreter::trace::TraceRegistry;
use crate::interpreter::types::{
    Code, ErrorTraceState, ExecutionLimits, HostCommand, ReturnOptions, TailcallRequest,
};
use crate::value::Value;

/// A single-threaded interpreter instance.
pub struct Interp {
    pub(crate) frames: Vec<Frame>,
    pub(crate) active_level: usize,
    pub(crate) namespaces: IndexMap<String, Namespace>,
    result: Value,
    return_options: Option<ReturnOptions>,
    pub(crate) error_trace: ErrorTraceState,
    pub(crate) traces: TraceRegistry,
    pub(crate) limits: ExecutionLimits,
    /// Current recursive-evaluation depth.
    pub(crate) nesting: usize,
    /// Commands executed since the current top-level evaluation began.
    pub(crate) command_count: u64,
    /// Step-trace targets active for the current call chain.
    pub(crate) step_targets: Vec<String>,
    /// Pending tailcall, drained by the proc invoker.
    pub(crate) tailcall: Option<TailcallRequest>,
    /// Embedder hook consulted when no `unknown` proc exists.
    pub(crate) unknown_handler: Option<Rc<dyn HostCommand>>,
}

impl Interp {
    pub fn new() -> Self {
        Self::with_limits(ExecutionLimits::default())
    }

    pub fn with_limits(limits: ExecutionLimits) -> Self {
        let mut interp = Self {
            frames: vec![Frame::global()],
            active_level: 0,
            namespaces: IndexMap::new(),
            result: Value::empty(),
            return_options: None,
            error_trace: ErrorTraceState::default(),
            traces: TraceRegistry::default(),
            limits,
            nesting: 0,
            command_count: 0,
            step_targets: Vec::new(),
            tailcall: None,
            unknown_handler: None,
        };
        interp.namespaces.insert("::".to_string(), Namespace::default());
        interp.ensure_namespace("::tcl");
        crate::interpreter::builtins::register_all(&mut interp);

        // Writable globals expected at startup.
        let root = interp.namespaces.get_mut("::").expect("root namespace");
        root.vars.insert("errorInfo".to_string(), Value::empty());
        root.vars.insert("errorCode".to_string(), Value::str("NONE"));
        root.vars.insert(
            "tcl_patchLevel".to_string(),
            Value::str(env!("CARGO_PKG_VERSION")),
        );
        interp
    }

    // ---- Result slot ----

    pub fn result(&self) -> Value {
        self.result.clone()
    }

    pub fn set_result(&mut self, v: Value) {
        self.result = v;
    }

    pub fn reset_result(&mut self) {
        self.result = Value::empty();
    }

    /// Set the result and return `Code::Ok`; the common builtin tail.
    pub fn ok(&mut self, v: Value) -> Code {
        self.result = v;
        Code::Ok
    }

    // ---- Return-options slot ----

    pub fn set_return_options(&mut self, opts: ReturnOptions) {
        self.return_options = Some(opts);
    }

    pub fn take_return_options(&mut self) -> Option<ReturnOptions> {
        self.return_options.take()
    }

    pub fn return_options_ref(&self) -> Option<&ReturnOptions> {
        self.return_options.as_ref()
    }

    /// The options for a completed evaluation, materializing the default
    /// `{-code C -level 0}` when none were set. Stored options describe
    /// the completion only when their `-code` agrees with it (or a
    /// `RETURN` is still propagating); anything else is a leftover from
    /// an earlier command.
    pub fn get_return_options(&self, code: Code) -> ReturnOptions {
        match &self.return_options {
            Some(opts) if opts.code == code.as_i32() || code == Code::Return => opts.clone(),
            _ => {
                let mut opts = ReturnOptions::default();
                opts.code = code.as_i32();
                opts
            }
        }
    }

    // ---- Error helpers ----

    /// Raise a script error: message becomes the result, options carry
    /// `-code 1 -level 0`.
    pub fn error(&mut self, msg: impl Into<String>) -> Code {
        self.result = Value::str(msg.into());
        let mut opts = ReturnOptions::default();
        opts.code = Code::Error.as_i32();
        self.return_options = Some(opts);
        Code::Error
    }

    /// Raise a script error with an explicit `-errorcode` list.
    pub fn error_with_code(&mut self, msg: impl Into<String>, errorcode: Value) -> Code {
        self.result = Value::str(msg.into());
        let mut opts = ReturnOptions::default();
        opts.code = Code::Error.as_i32();
        opts.errorcode = Some(errorcode);
        self.return_options = Some(opts);
        Code::Error
    }

    /// Arity error in the standard shape.
    pub fn wrong_num_args(&mut self, usage: &str) -> Code {
        let msg = format!("wrong # args: should be \"{}\"", usage);
        let code = Value::list(vec![Value::str("TCL"), Value::str("WRONGARGS")]);
        self.error_with_code(msg, code)
    }

    // ---- Embedder surface ----

    /// Register a builtin under a fully qualified name (typically `::name`).
    pub fn register_builtin(&mut self, name: &str, f: crate::interpreter::types::BuiltinFn) {
        self.create_command(name, crate::interpreter::types::CommandDef::Builtin(f));
    }

    /// Register a host command under a fully qualified name.
    pub fn register_host_command(&mut self, name: &str, cmd: Rc<dyn HostCommand>) {
        self.create_command(name, crate::interpreter::types::CommandDef::Host(cmd));
    }

    /// Install the hook consulted when command resolution and the
    /// `unknown` proc both miss.
    pub fn set_unknown_handler(&mut self, handler: Rc<dyn HostCommand>) {
        self.unknown_handler = Some(handler);
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    /// Reset per-evaluation accounting before a fresh top-level script.
    pub fn begin_toplevel(&mut self) {
        if self.nesting == 0 {
            self.command_count = 0;
        }
    }

    /// Write a value into a global (`::`) variable without trace firing;
    /// used for the mirrored error globals.
    pub(crate) fn set_global_raw(&mut self, name: &str, value: Value) {
        if let Some(root) = self.namespaces.get_mut("::") {
            root.vars.insert(name.to_string(), value);
        }
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_globals() {
        let interp = Interp::new();
        assert_eq!(interp.lookup_var("::errorCode").unwrap().as_str(), "NONE");
        assert_eq!(interp.lookup_var("::errorInfo").unwrap().as_str(), "");
        assert!(interp.lookup_var("::tcl_patchLevel").is_some());
        assert!(interp.namespace_exists("::tcl"));
    }

    #[test]
    fn test_error_sets_options() {
        let mut interp = Interp::new();
        let code = interp.error("boom");
        assert_eq!(code, Code::Error);
        assert_eq!(interp.result().as_str(), "boom");
        let opts = interp.get_return_options(code);
        assert_eq!(opts.code, 1);
        assert_eq!(opts.level, 0);
    }

    #[test]
    fn test_wrong_num_args_shape() {
        let mut interp = Interp::new();
        interp.wrong_num_args("set varName ?newValue?");
        assert_eq!(
            interp.result().as_str(),
            "wrong # args: should be \"set varName ?newValue?\""
        );
        let opts = interp.get_return_options(Code::Error);
        assert_eq!(opts.errorcode.unwrap().as_str(), "TCL WRONGARGS");
    }

    #[test]
    fn test_default_options_materialized() {
        let interp = Interp::new();
        let opts = interp.get_return_options(Code::Ok);
        assert_eq!(opts.code, 0);
        assert_eq!(opts.level, 0);
    }
}
