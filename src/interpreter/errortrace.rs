//! Error Trace Engine
//!
//! As an error unwinds, each proc boundary appends a frame entry to the
//! accumulating `-errorinfo` string and `-errorstack` list. A handler
//! (`catch`, `try`, or the top level) finalizes the accumulated state
//! into the return options and mirrors it into the `::errorInfo` and
//! `::errorCode` globals.

use crate::interpreter::interp::Interp;
use crate::interpreter::types::{Code, ReturnOptions};
use crate::value::Value;

/// Human display of a command for error traces; long commands truncate.
pub(crate) fn command_display(argv: &[Value]) -> String {
    let mut out = String::new();
    for (i, word) in argv.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&word.as_str());
        if out.len() > 150 {
            out.truncate(150);
            out.push_str("...");
            break;
        }
    }
    out
}

impl Interp {
    /// Begin accumulating on the first error observed while no error is
    /// already unwinding.
    pub(crate) fn error_init(&mut self, argv: &[Value]) {
        if self.error_trace.active {
            return;
        }
        let msg = self.result().as_str();
        let display = command_display(argv);
        self.error_trace.active = true;
        self.error_trace.info = format!("{}\n    while executing\n\"{}\"", msg, display);
        self.error_trace.stack = vec![Value::str("INNER"), Value::list(argv.to_vec())];
        self.error_trace.line = self.active_frame().line as i64;
    }

    /// Variant for errors with no command context (parse errors).
    pub(crate) fn error_init_message(&mut self, line: u32) {
        if self.error_trace.active {
            return;
        }
        let msg = self.result().as_str();
        self.error_trace.active = true;
        self.error_trace.info = msg;
        self.error_trace.stack = vec![Value::str("INNER")];
        self.error_trace.line = line as i64;
    }

    /// Called by the proc invoker on `TCL_ERROR`, before the frame pops.
    pub(crate) fn error_append_frame(&mut self, proc_name: &str, args: &[Value], line: u32) {
        if !self.error_trace.active {
            return;
        }
        let mut display = proc_name.to_string();
        for arg in args {
            display.push(' ');
            display.push_str(&arg.as_str());
        }
        if display.len() > 150 {
            display.truncate(150);
            display.push_str("...");
        }
        self.error_trace.info.push_str(&format!(
            "\n    (procedure \"{}\" line {})\n    invoked from within\n\"{}\"",
            proc_name, line, display
        ));
        let mut call = vec![Value::str(proc_name)];
        call.extend(args.iter().cloned());
        self.error_trace.stack.push(Value::str("CALL"));
        self.error_trace.stack.push(Value::list(call));
    }

    /// Finalize error state into the return options and the global
    /// mirror variables, then clear the accumulating state. Safe to call
    /// when no trace is active: the options' own `-errorcode` and
    /// `-errorinfo` still reach the globals.
    pub fn error_finalize(&mut self) {
        let mut opts = self
            .take_return_options()
            .unwrap_or_else(|| ReturnOptions::for_code(Code::Error));

        if self.error_trace.active {
            if opts.errorinfo.is_none() {
                opts.errorinfo = Some(Value::str(self.error_trace.info.clone()));
            }
            if opts.errorstack.is_none() {
                opts.errorstack = Some(Value::list(self.error_trace.stack.clone()));
            }
            if opts.errorline.is_none() {
                opts.errorline = Some(self.error_trace.line);
            }
        }
        if opts.errorcode.is_none() {
            opts.errorcode = Some(Value::str("NONE"));
        }

        if let Some(info) = &opts.errorinfo {
            self.set_global_raw("errorInfo", info.clone());
        }
        if let Some(code) = &opts.errorcode {
            self.set_global_raw("errorCode", code.clone());
        }

        self.error_trace.active = false;
        self.error_trace.info.clear();
        self.error_trace.stack.clear();
        self.set_return_options(opts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display_truncates() {
        let long = Value::str("x".repeat(400));
        let display = command_display(&[Value::str("cmd"), long]);
        assert!(display.len() < 200);
        assert!(display.ends_with("..."));
    }

    #[test]
    fn test_init_and_append() {
        let mut interp = Interp::new();
        interp.error("bad");
        interp.error_init(&[Value::str("f"), Value::str("1")]);
        assert!(interp.error_trace.active);
        assert!(interp.error_trace.info.starts_with("bad"));
        assert!(interp.error_trace.info.contains("while executing"));

        interp.error_append_frame("f", &[Value::str("1")], 1);
        assert!(interp.error_trace.info.contains("(procedure \"f\" line 1)"));
        assert!(interp.error_trace.info.contains("invoked from within"));
        // INNER {…} CALL {…}
        assert_eq!(interp.error_trace.stack[0].as_str(), "INNER");
        assert_eq!(interp.error_trace.stack[2].as_str(), "CALL");
    }

    #[test]
    fn test_finalize_mirrors_globals() {
        let mut interp = Interp::new();
        interp.error("bad");
        interp.error_init(&[Value::str("f")]);
        interp.error_finalize();

        assert!(!interp.error_trace.active);
        assert!(interp
            .lookup_var("::errorInfo")
            .unwrap()
            .as_str()
            .starts_with("bad"));
        assert_eq!(interp.lookup_var("::errorCode").unwrap().as_str(), "NONE");
        let opts = interp.get_return_options(Code::Error);
        assert!(opts.errorinfo.is_some());
        assert!(opts.errorstack.is_some());
    }

    #[test]
    fn test_second_error_does_not_reinit() {
        let mut interp = Interp::new();
        interp.error("first");
        interp.error_init(&[Value::str("a")]);
        let saved = interp.error_trace.info.clone();
        interp.error("second");
        interp.error_init(&[Value::str("b")]);
        assert_eq!(interp.error_trace.info, saved);
    }
}
