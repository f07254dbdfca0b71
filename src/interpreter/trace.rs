//! Trace Subsystem
//!
//! Variable read/write/unset traces, command delete/rename traces, and
//! execution enter/leave/enterstep/leavestep traces. Entries are keyed
//! by resolved name; a firing entry disables itself for the duration of
//! its own script so trace recursion cannot loop.

use indexmap::IndexMap;

use crate::interpreter::interp::Interp;
use crate::interpreter::types::{Code, EvalScope};
use crate::value::{quote_element, Value};

/// One registered trace: the operations it fires on and its script.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub ops: Vec<String>,
    pub script: String,
    /// True while this entry's script is running.
    pub running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Variable,
    Command,
    Execution,
}

/// Per-kind dictionaries mapping resolved name to trace entries.
#[derive(Debug, Default)]
pub struct TraceRegistry {
    pub var: IndexMap<String, Vec<TraceEntry>>,
    pub cmd: IndexMap<String, Vec<TraceEntry>>,
    pub exec: IndexMap<String, Vec<TraceEntry>>,
}

impl TraceRegistry {
    pub fn entries_mut(&mut self, kind: TraceKind) -> &mut IndexMap<String, Vec<TraceEntry>> {
        match kind {
            TraceKind::Variable => &mut self.var,
            TraceKind::Command => &mut self.cmd,
            TraceKind::Execution => &mut self.exec,
        }
    }

    pub fn entries(&self, kind: TraceKind) -> &IndexMap<String, Vec<TraceEntry>> {
        match kind {
            TraceKind::Variable => &self.var,
            TraceKind::Command => &self.cmd,
            TraceKind::Execution => &self.exec,
        }
    }

    pub fn add(&mut self, kind: TraceKind, key: &str, ops: Vec<String>, script: String) {
        self.entries_mut(kind)
            .entry(key.to_string())
            .or_default()
            .push(TraceEntry {
                ops,
                script,
                running: false,
            });
    }

    /// Remove the first entry matching ops+script; silent when absent.
    pub fn remove(&mut self, kind: TraceKind, key: &str, ops: &[String], script: &str) {
        let map = self.entries_mut(kind);
        if let Some(entries) = map.get_mut(key) {
            if let Some(pos) = entries
                .iter()
                .position(|e| e.ops == ops && e.script == script)
            {
                entries.remove(pos);
            }
            if entries.is_empty() {
                map.shift_remove(key);
            }
        }
    }

    /// `{opList script}` pairs for `trace info`.
    pub fn info(&self, kind: TraceKind, key: &str) -> Vec<Value> {
        self.entries(kind)
            .get(key)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| {
                        Value::list(vec![
                            Value::list(e.ops.iter().map(|o| Value::str(o.clone())).collect()),
                            Value::str(e.script.clone()),
                        ])
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Interp {
    /// Fire matching traces under `key` for `op`; `tail` words are
    /// appended to the stored script, each quoted as a list element.
    /// The script runs in the caller's frame.
    fn fire_traces(&mut self, kind: TraceKind, key: &str, op: &str, tail: &[String]) -> Code {
        let count = self
            .traces
            .entries(kind)
            .get(key)
            .map(|e| e.len())
            .unwrap_or(0);
        if count == 0 {
            return Code::Ok;
        }

        for i in 0..count {
            let script = {
                let map = self.traces.entries_mut(kind);
                match map.get_mut(key) {
                    Some(entries) if i < entries.len() => {
                        let entry = &mut entries[i];
                        if entry.running || !entry.ops.iter().any(|o| o == op) {
                            continue;
                        }
                        entry.running = true;
                        entry.script.clone()
                    }
                    _ => break,
                }
            };

            let mut cmd = script;
            for word in tail {
                cmd.push(' ');
                cmd.push_str(&quote_element(word));
            }

            // The trace script must not disturb the traced command's
            // pending return options unless it raises itself.
            let saved_opts = self.take_return_options();
            let code = self.eval_script(&cmd, EvalScope::Local);

            if let Some(entries) = self.traces.entries_mut(kind).get_mut(key) {
                if i < entries.len() {
                    entries[i].running = false;
                }
            }

            if !code.is_ok() {
                return code;
            }
            if let Some(opts) = saved_opts {
                self.set_return_options(opts);
            }
        }
        Code::Ok
    }

    /// Variable traces: fired before reads, after writes, before unsets.
    /// The script sees `name {} op` (the empty word is the unused array
    /// index slot).
    pub(crate) fn fire_var_traces(&mut self, name: &str, op: &str) -> Code {
        let key = self.var_trace_key(name);
        if self.traces.var.get(&key).is_none() {
            return Code::Ok;
        }
        self.fire_traces(
            TraceKind::Variable,
            &key.clone(),
            op,
            &[name.to_string(), String::new(), op.to_string()],
        )
    }

    /// Command traces: `oldName newName op` for renames, empty newName
    /// for deletes.
    pub(crate) fn fire_cmd_traces(&mut self, key: &str, old: &str, new: &str, op: &str) -> Code {
        self.fire_traces(
            TraceKind::Command,
            key,
            op,
            &[old.to_string(), new.to_string(), op.to_string()],
        )
    }

    /// Execution enter traces: `{cmd words} enter`.
    pub(crate) fn fire_exec_enter(&mut self, key: &str, command: &str) -> Code {
        self.fire_traces(
            TraceKind::Execution,
            key,
            "enter",
            &[command.to_string(), "enter".to_string()],
        )
    }

    /// Execution leave traces: `{cmd words} code result leave`.
    pub(crate) fn fire_exec_leave(
        &mut self,
        key: &str,
        command: &str,
        code: Code,
        result: &Value,
    ) -> Code {
        self.fire_traces(
            TraceKind::Execution,
            key,
            "leave",
            &[
                command.to_string(),
                code.as_i32().to_string(),
                result.as_str(),
                "leave".to_string(),
            ],
        )
    }

    /// Step traces fire for every command executed while a target proc's
    /// body (or anything it calls) is running. The target identities are
    /// carried on an explicit per-interpreter stack.
    pub(crate) fn fire_step_traces(&mut self, op: &str, command: &str, tail: &[String]) -> Code {
        if self.step_targets.is_empty() {
            return Code::Ok;
        }
        let targets: Vec<String> = self.step_targets.clone();
        for target in targets {
            let mut words = vec![command.to_string()];
            words.extend(tail.iter().cloned());
            words.push(op.to_string());
            let code = self.fire_traces(TraceKind::Execution, &target, op, &words);
            if !code.is_ok() {
                return code;
            }
        }
        Code::Ok
    }

    /// True when the command has enterstep/leavestep traces registered.
    pub(crate) fn has_step_traces(&self, fqn: &str) -> bool {
        self.traces
            .exec
            .get(fqn)
            .map(|entries| {
                entries.iter().any(|e| {
                    e.ops
                        .iter()
                        .any(|o| o == "enterstep" || o == "leavestep")
                })
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_add_remove() {
        let mut reg = TraceRegistry::default();
        let ops = vec!["write".to_string()];
        reg.add(TraceKind::Variable, "x", ops.clone(), "cb".to_string());
        assert_eq!(reg.info(TraceKind::Variable, "x").len(), 1);

        // Removing with mismatched ops is silent.
        reg.remove(TraceKind::Variable, "x", &["read".to_string()], "cb");
        assert_eq!(reg.info(TraceKind::Variable, "x").len(), 1);

        reg.remove(TraceKind::Variable, "x", &ops, "cb");
        assert!(reg.info(TraceKind::Variable, "x").is_empty());
    }

    #[test]
    fn test_info_shape() {
        let mut reg = TraceRegistry::default();
        reg.add(
            TraceKind::Command,
            "::f",
            vec!["rename".to_string(), "delete".to_string()],
            "notify".to_string(),
        );
        let info = reg.info(TraceKind::Command, "::f");
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].as_str(), "{rename delete} notify");
    }
}
