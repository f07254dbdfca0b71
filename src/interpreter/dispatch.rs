//! Command Dispatcher
//!
//! Resolves command names against the namespace registry (current
//! namespace first, then the global one), invokes builtins, procs and
//! host commands, and falls back to the `unknown` machinery on a miss.
//! Execution enter/leave traces fire around every resolved invocation.

use crate::interpreter::errortrace::command_display;
use crate::interpreter::interp::Interp;
use crate::interpreter::proc::invoke_proc;
use crate::interpreter::resolver::{is_qualified, join_ns, resolve_ns, split_qualified};
use crate::interpreter::types::{Code, CommandDef};
use crate::value::Value;

impl Interp {
    /// Execute one substituted command. Empty commands are no-ops.
    pub fn dispatch(&mut self, argv: &[Value]) -> Code {
        let ns = self.active_frame().namespace.clone();
        self.dispatch_in_ns(&ns, argv)
    }

    /// Dispatch with an explicit namespace as the resolution context;
    /// used by the tailcall trampoline.
    pub(crate) fn dispatch_in_ns(&mut self, ns: &str, argv: &[Value]) -> Code {
        if argv.is_empty() {
            return Code::Ok;
        }
        let name = argv[0].as_str();
        match self.resolve_command_in(ns, &name) {
            Some((fqn, def)) => self.invoke_command(&fqn, def, argv),
            None => self.dispatch_unknown(ns, &name, argv),
        }
    }

    /// Resolve a command name against the active frame's namespace.
    pub fn resolve_command(&self, name: &str) -> Option<(String, CommandDef)> {
        self.resolve_command_in(&self.active_frame().namespace, name)
    }

    /// Resolution order: already-qualified names resolve against the
    /// current namespace then the root; unqualified names try the current
    /// namespace's command map then the global one.
    pub(crate) fn resolve_command_in(
        &self,
        current_ns: &str,
        name: &str,
    ) -> Option<(String, CommandDef)> {
        if is_qualified(name) {
            let q = split_qualified(name);
            let qualifier = q.qualifier.unwrap_or_else(|| "::".to_string());
            if qualifier.starts_with("::") {
                let ns = resolve_ns("::", &qualifier);
                return self.lookup_in(&ns, &q.tail);
            }
            let relative = resolve_ns(current_ns, &qualifier);
            if let Some(hit) = self.lookup_in(&relative, &q.tail) {
                return Some(hit);
            }
            let rooted = resolve_ns("::", &qualifier);
            return self.lookup_in(&rooted, &q.tail);
        }

        if current_ns != "::" {
            if let Some(hit) = self.lookup_in(current_ns, name) {
                return Some(hit);
            }
        }
        self.lookup_in("::", name)
    }

    fn lookup_in(&self, ns: &str, tail: &str) -> Option<(String, CommandDef)> {
        self.namespaces
            .get(ns)
            .and_then(|node| node.commands.get(tail))
            .map(|def| (join_ns(ns, tail), def.clone()))
    }

    pub(crate) fn invoke_command(&mut self, fqn: &str, def: CommandDef, argv: &[Value]) -> Code {
        let traced = self.traces.exec.contains_key(fqn);
        let display = if traced {
            command_display(argv)
        } else {
            String::new()
        };

        if traced {
            let code = self.fire_exec_enter(fqn, &display);
            if !code.is_ok() {
                return code;
            }
        }

        let code = match def {
            CommandDef::Builtin(f) => f(self, argv),
            CommandDef::Proc(p) => invoke_proc(self, fqn, p, argv),
            CommandDef::Host(h) => h.invoke(self, argv),
        };

        if traced && self.traces.exec.contains_key(fqn) {
            let result = self.result();
            let leave = self.fire_exec_leave(fqn, &display, code, &result);
            if !leave.is_ok() {
                return leave;
            }
            self.set_result(result);
        }

        code
    }

    fn dispatch_unknown(&mut self, ns: &str, name: &str, argv: &[Value]) -> Code {
        if let Some((fqn, def)) = self.resolve_command_in(ns, "unknown") {
            let mut forwarded = Vec::with_capacity(argv.len() + 1);
            forwarded.push(Value::str("unknown"));
            forwarded.extend(argv.iter().cloned());
            return self.invoke_command(&fqn, def, &forwarded);
        }
        if let Some(handler) = self.unknown_handler.clone() {
            return handler.invoke(self, argv);
        }
        let msg = format!("invalid command name \"{}\"", name);
        let code = Value::list(vec![
            Value::str("TCL"),
            Value::str("LOOKUP"),
            Value::str("COMMAND"),
            Value::str(name),
        ]);
        self.error_with_code(msg, code)
    }

    // ---- Command registry mutation ----

    /// Register a command under a fully qualified name, creating the
    /// namespace when needed.
    pub fn create_command(&mut self, fqn: &str, def: CommandDef) {
        let q = split_qualified(fqn);
        let (ns, tail) = match q.qualifier {
            Some(qualifier) => (resolve_ns("::", &qualifier), q.tail),
            None => ("::".to_string(), q.tail),
        };
        self.ensure_namespace(&ns);
        self.namespaces
            .get_mut(&ns)
            .expect("namespace just ensured")
            .commands
            .insert(tail, def);
    }

    /// Delete a command; command delete traces fire while it still
    /// exists, then its traces are purged.
    pub fn delete_command(&mut self, fqn: &str) -> bool {
        if self.resolve_command_in("::", fqn).is_none() {
            return false;
        }
        let _ = self.fire_cmd_traces(fqn, fqn, "", "delete");

        let q = split_qualified(fqn);
        let ns = resolve_ns("::", &q.qualifier.unwrap_or_else(|| "::".to_string()));
        let removed = self
            .namespaces
            .get_mut(&ns)
            .map(|node| node.commands.shift_remove(&q.tail).is_some())
            .unwrap_or(false);

        self.traces.cmd.shift_remove(fqn);
        self.traces.exec.shift_remove(fqn);
        removed
    }

    /// Move a command to a new fully qualified name; rename traces fire
    /// first and registered traces follow the command to its new name.
    pub fn rename_command(&mut self, old_fqn: &str, new_fqn: &str) -> Result<(), String> {
        let (_, def) = self
            .resolve_command_in("::", old_fqn)
            .ok_or_else(|| format!("can't rename \"{}\": command doesn't exist", old_fqn))?;
        if self.resolve_command_in("::", new_fqn).is_some() {
            return Err(format!(
                "can't rename to \"{}\": command already exists",
                new_fqn
            ));
        }

        let _ = self.fire_cmd_traces(old_fqn, old_fqn, new_fqn, "rename");

        let q = split_qualified(old_fqn);
        let ns = resolve_ns("::", &q.qualifier.unwrap_or_else(|| "::".to_string()));
        if let Some(node) = self.namespaces.get_mut(&ns) {
            node.commands.shift_remove(&q.tail);
        }
        self.create_command(new_fqn, def);

        // Traces stay attached through a rename.
        if let Some(entries) = self.traces.cmd.shift_remove(old_fqn) {
            self.traces.cmd.insert(new_fqn.to_string(), entries);
        }
        if let Some(entries) = self.traces.exec.shift_remove(old_fqn) {
            self.traces.exec.insert(new_fqn.to_string(), entries);
        }
        Ok(())
    }
}
