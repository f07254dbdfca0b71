//! Tcl Environment
//!
//! Main entry point for embedding the interpreter. Ties together the
//! parser, evaluator and the host-command seam, and applies the
//! top-level completion-code policy: loose break/continue/return codes
//! become errors, user-defined codes pass through.

use std::rc::Rc;

use crate::interpreter::types::{Code, EvalScope, ExecutionLimits, HostCommand};
use crate::interpreter::Interp;
use crate::value::Value;

/// Options for creating a Tcl environment.
#[derive(Default)]
pub struct TclOptions {
    /// Execution limits
    pub limits: Option<ExecutionLimits>,
    /// Global variables established before the first evaluation
    pub vars: Vec<(String, String)>,
}

/// Outcome of a top-level evaluation.
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    /// Completion code (0 = OK, 1 = error, user codes pass through).
    pub code: i32,
    /// Result value, or the error message when `code` is 1.
    pub result: String,
    /// Canonical flat return-options list.
    pub options: String,
}

impl EvalOutcome {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// The main Tcl scripting environment.
pub struct Tcl {
    interp: Interp,
}

impl Tcl {
    /// Create a new Tcl environment.
    pub fn new(options: TclOptions) -> Self {
        let limits = options.limits.unwrap_or_default();
        let mut interp = Interp::with_limits(limits);
        for (name, value) in options.vars {
            let qualified = format!("::{}", name);
            let _ = interp.set_var(&qualified, Value::str(value));
        }
        Self { interp }
    }

    /// Execute a script and apply the top-level code policy.
    pub fn eval(&mut self, script: &str) -> EvalOutcome {
        self.interp.begin_toplevel();
        let mut code = self.interp.eval_script(script, EvalScope::Local);

        match code {
            Code::Ok => {}
            Code::Error => self.interp.error_finalize(),
            Code::Break | Code::Continue | Code::Return => {
                let msg = match code {
                    Code::Break => "invoked \"break\" outside of a loop",
                    Code::Continue => "invoked \"continue\" outside of a loop",
                    _ => "invoked \"return\" outside of a proc",
                };
                code = self.interp.error(msg);
                self.interp.error_finalize();
            }
            Code::Custom(_) => {}
        }

        let opts = self.interp.get_return_options(code);
        EvalOutcome {
            code: code.as_i32(),
            result: self.interp.result().as_str(),
            options: opts.to_value().as_str(),
        }
    }

    /// Register a host command under a fully qualified name.
    pub fn register_command(&mut self, name: &str, cmd: Rc<dyn HostCommand>) {
        self.interp.register_host_command(name, cmd);
    }

    /// Install the handler consulted when command resolution misses.
    pub fn set_unknown_handler(&mut self, handler: Rc<dyn HostCommand>) {
        self.interp.set_unknown_handler(handler);
    }

    /// Read a global variable.
    pub fn get_var(&self, name: &str) -> Option<String> {
        self.interp.lookup_var(name).map(|v| v.as_str())
    }

    /// Write a global variable.
    pub fn set_var(&mut self, name: &str, value: &str) {
        let qualified = if name.starts_with("::") {
            name.to_string()
        } else {
            format!("::{}", name)
        };
        let _ = self.interp.set_var(&qualified, Value::str(value));
    }

    /// Direct access to the interpreter for embedders that need it.
    pub fn interp_mut(&mut self) -> &mut Interp {
        &mut self.interp
    }
}

impl Default for Tcl {
    fn default() -> Self {
        Self::new(TclOptions::default())
    }
}
