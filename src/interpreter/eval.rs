//! Evaluation Loop
//!
//! The core entry points: parse a script into commands, substitute each
//! command's words, dispatch, and thread the completion code. Any
//! non-OK code stops the sequence and propagates. The first error that
//! is not already unwinding initializes the error-trace state here.

use crate::interpreter::errortrace::command_display;
use crate::interpreter::interp::Interp;
use crate::interpreter::types::{Code, EvalScope};
use crate::parser::parse_script;
use crate::value::Value;

impl Interp {
    /// Evaluate a script string. `EvalScope::Global` evaluates in the
    /// global frame regardless of the current one.
    pub fn eval_script(&mut self, src: &str, scope: EvalScope) -> Code {
        if self.nesting >= self.limits.max_nesting_depth {
            return self.error("too many nested evaluations (infinite loop?)");
        }
        self.nesting += 1;

        let saved_active = self.active_level;
        if scope == EvalScope::Global {
            self.active_level = 0;
        }

        let code = self.eval_commands(src);

        // The active-frame pointer is restored on every exit path.
        self.active_level = saved_active.min(self.frames.len() - 1);
        self.nesting -= 1;
        code
    }

    /// Evaluate a value as a script via its string projection.
    pub fn eval_value(&mut self, script: &Value, scope: EvalScope) -> Code {
        let src = script.as_str();
        self.eval_script(&src, scope)
    }

    fn eval_commands(&mut self, src: &str) -> Code {
        let commands = match parse_script(src) {
            Ok(commands) => commands,
            Err(e) => {
                let line = e.line;
                let code = self.error(e.message);
                self.error_init_message(line);
                return code;
            }
        };

        self.reset_result();

        for cmd in &commands {
            self.command_count += 1;
            if self.command_count > self.limits.max_commands {
                return self.error(format!(
                    "maximum command count ({}) exceeded (possible infinite loop)",
                    self.limits.max_commands
                ));
            }

            self.active_frame_mut().line = cmd.line;

            let mut argv: Vec<Value> = Vec::with_capacity(cmd.words.len());
            let mut failed = None;
            for word in &cmd.words {
                match self.subst_word(word) {
                    Ok(v) => argv.push(v),
                    Err(code) => {
                        failed = Some(code);
                        break;
                    }
                }
            }
            if let Some(code) = failed {
                if code == Code::Error {
                    if argv.is_empty() {
                        self.error_init_message(cmd.line);
                    } else {
                        self.error_init(&argv);
                    }
                }
                return code;
            }

            if argv.is_empty() {
                continue;
            }

            let code = self.run_command(&argv);
            match code {
                Code::Ok => {}
                Code::Error => {
                    self.error_init(&argv);
                    return Code::Error;
                }
                other => return other,
            }
        }

        Code::Ok
    }

    /// Dispatch one substituted command, wrapped with step-trace firing
    /// when a step target is active on the call chain.
    fn run_command(&mut self, argv: &[Value]) -> Code {
        if self.step_targets.is_empty() {
            return self.dispatch(argv);
        }

        let display = command_display(argv);
        let code = self.fire_step_traces("enterstep", &display, &[]);
        if !code.is_ok() {
            return code;
        }

        let code = self.dispatch(argv);

        let result = self.result();
        let leave = self.fire_step_traces(
            "leavestep",
            &display,
            &[code.as_i32().to_string(), result.as_str()],
        );
        if !leave.is_ok() {
            return leave;
        }
        // The step scripts may have clobbered the command's result.
        self.set_result(result);
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_script_ok() {
        let mut interp = Interp::new();
        let code = interp.eval_script("", EvalScope::Local);
        assert_eq!(code, Code::Ok);
        assert_eq!(interp.result().as_str(), "");
    }

    #[test]
    fn test_set_and_read() {
        let mut interp = Interp::new();
        assert_eq!(interp.eval_script("set x v", EvalScope::Local), Code::Ok);
        assert_eq!(
            interp.eval_script("set x", EvalScope::Local),
            Code::Ok
        );
        assert_eq!(interp.result().as_str(), "v");
    }

    #[test]
    fn test_result_is_last_command() {
        let mut interp = Interp::new();
        interp.eval_script("set a 1; set b 2", EvalScope::Local);
        assert_eq!(interp.result().as_str(), "2");
    }

    #[test]
    fn test_command_substitution() {
        let mut interp = Interp::new();
        interp.eval_script("set x [set y 5]", EvalScope::Local);
        assert_eq!(interp.result().as_str(), "5");
        assert_eq!(interp.lookup_var("y").unwrap().as_str(), "5");
    }

    #[test]
    fn test_unknown_command_error() {
        let mut interp = Interp::new();
        let code = interp.eval_script("definitely-not-a-command", EvalScope::Local);
        assert_eq!(code, Code::Error);
        assert_eq!(
            interp.result().as_str(),
            "invalid command name \"definitely-not-a-command\""
        );
    }

    #[test]
    fn test_parse_error_reports_line() {
        let mut interp = Interp::new();
        let code = interp.eval_script("set a 1\nset b {oops", EvalScope::Local);
        assert_eq!(code, Code::Error);
        assert_eq!(interp.result().as_str(), "missing close-brace");
    }

    #[test]
    fn test_nesting_limit() {
        let mut interp = Interp::new();
        // A proc that recurses forever trips the nesting cap, not the
        // native stack.
        interp.eval_script("proc r {} { r }", EvalScope::Local);
        let code = interp.eval_script("r", EvalScope::Local);
        assert_eq!(code, Code::Error);
        assert!(interp
            .result()
            .as_str()
            .contains("too many nested evaluations"));
    }
}
