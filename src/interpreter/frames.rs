//! Frame Stack & Variable Engine
//!
//! Call frames carry locals, the bound namespace, the current source
//! line and an optional lambda expression. Locals bind either a value
//! directly or a link: to a variable in another frame (`upvar`) or in a
//! namespace (`variable`/`global`). Scalar variables only; the emulated
//! array syntax `name(index)` is just a scalar whose name contains
//! parentheses.

use indexmap::IndexMap;

use crate::interpreter::interp::Interp;
use crate::interpreter::resolver::{is_qualified, resolve_ns, split_qualified};
use crate::interpreter::types::Code;
use crate::value::Value;

/// A local variable slot: a value or a link elsewhere.
#[derive(Debug, Clone)]
pub enum VarSlot {
    Value(Value),
    /// Alias to a variable in another frame (absolute frame index).
    UpvarLink { level: usize, name: String },
    /// Alias to a namespace variable.
    NsLink { ns: String, name: String },
}

/// One call frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Name of the command that created the frame.
    pub command: String,
    /// Arguments the command was invoked with.
    pub args: Vec<Value>,
    /// Absolute namespace path the frame is bound to.
    pub namespace: String,
    /// Current source line within the body being evaluated.
    pub line: u32,
    /// Lambda expression for `apply` frames.
    pub lambda: Option<Value>,
    /// True for proc/lambda frames: unqualified variables are locals.
    /// False for the global frame and `namespace eval` frames, where
    /// unqualified variables live in the bound namespace.
    pub is_proc: bool,
    pub locals: IndexMap<String, VarSlot>,
}

impl Frame {
    pub fn global() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            namespace: "::".to_string(),
            line: 1,
            lambda: None,
            is_proc: false,
            locals: IndexMap::new(),
        }
    }
}

/// Where a variable name resolves to.
enum VarTarget {
    Local(String),
    Ns(String, String),
}

const MAX_LINK_DEPTH: usize = 64;

impl Interp {
    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
        self.active_level = self.frames.len() - 1;
    }

    /// Frame for `namespace eval`: bound to the namespace, not a proc.
    pub fn push_ns_frame(&mut self, path: &str) {
        let line = self.active_frame().line;
        self.push_frame(Frame {
            command: "namespace eval".to_string(),
            args: Vec::new(),
            namespace: path.to_string(),
            line,
            lambda: None,
            is_proc: false,
            locals: IndexMap::new(),
        });
    }

    pub fn pop_frame(&mut self) {
        debug_assert!(self.frames.len() > 1, "global frame is never popped");
        self.frames.pop();
        self.active_level = self.frames.len() - 1;
    }

    /// The frame used for local-variable resolution (usually the top of
    /// the stack; `uplevel` moves it).
    pub fn active_frame(&self) -> &Frame {
        &self.frames[self.active_level]
    }

    pub fn active_frame_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.active_level]
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn active_level(&self) -> usize {
        self.active_level
    }

    pub fn set_active_level(&mut self, level: usize) {
        debug_assert!(level < self.frames.len());
        self.active_level = level;
    }

    /// Resolve an `uplevel`/`upvar` level spec (`N` relative, `#N`
    /// absolute) to an absolute frame index.
    pub fn resolve_level(&self, spec: &str) -> Result<usize, String> {
        let bad = || format!("bad level \"{}\"", spec);
        if let Some(abs) = spec.strip_prefix('#') {
            let n: usize = abs.parse().map_err(|_| bad())?;
            if n >= self.frames.len() {
                return Err(bad());
            }
            Ok(n)
        } else {
            let n: usize = spec.parse().map_err(|_| bad())?;
            if n > self.active_level {
                return Err(bad());
            }
            Ok(self.active_level - n)
        }
    }

    fn var_target(&self, name: &str) -> VarTarget {
        if is_qualified(name) {
            let q = split_qualified(name);
            let ns = resolve_ns(
                &self.active_frame().namespace,
                q.qualifier.as_deref().unwrap_or(""),
            );
            VarTarget::Ns(ns, q.tail)
        } else {
            VarTarget::Local(name.to_string())
        }
    }

    /// Trace-registry key for a variable name: proc locals key by their
    /// written name, everything else by its absolute namespace name, so
    /// `counter` and `::counter` at the global frame share one entry.
    pub(crate) fn var_trace_key(&self, name: &str) -> String {
        match self.var_target(name) {
            VarTarget::Local(n) => {
                let frame = self.active_frame();
                if frame.is_proc {
                    n
                } else {
                    crate::interpreter::resolver::join_ns(&frame.namespace, &n)
                }
            }
            VarTarget::Ns(ns, tail) => crate::interpreter::resolver::join_ns(&ns, &tail),
        }
    }

    /// Follow links from a frame-local slot to the storage cell.
    /// Returns the value, or None when the chain dangles.
    fn read_local(&self, level: usize, name: &str, depth: usize) -> Option<Value> {
        if depth > MAX_LINK_DEPTH {
            return None;
        }
        let frame = &self.frames[level];
        match frame.locals.get(name) {
            Some(VarSlot::Value(v)) => Some(v.clone()),
            Some(VarSlot::UpvarLink { level: l, name: n }) => {
                self.read_local(*l, &n.clone(), depth + 1)
            }
            Some(VarSlot::NsLink { ns, name: n }) => self
                .namespaces
                .get(ns.as_str())
                .and_then(|node| node.vars.get(n.as_str()).cloned()),
            None => {
                if frame.is_proc {
                    None
                } else {
                    self.namespaces
                        .get(frame.namespace.as_str())
                        .and_then(|node| node.vars.get(name).cloned())
                }
            }
        }
    }

    /// Follow links to the cell a write should land in. Returns either a
    /// frame slot or a namespace cell location.
    fn write_location(
        &self,
        level: usize,
        name: &str,
        depth: usize,
    ) -> Result<(Option<usize>, String, Option<String>), String> {
        // (frame level or None for ns, var name, ns path when frame is None)
        if depth > MAX_LINK_DEPTH {
            return Err(format!("too many levels of indirection for \"{}\"", name));
        }
        let frame = &self.frames[level];
        match frame.locals.get(name) {
            Some(VarSlot::UpvarLink { level: l, name: n }) => {
                self.write_location(*l, &n.clone(), depth + 1)
            }
            Some(VarSlot::NsLink { ns, name: n }) => Ok((None, n.clone(), Some(ns.clone()))),
            Some(VarSlot::Value(_)) => Ok((Some(level), name.to_string(), None)),
            None => {
                if frame.is_proc {
                    Ok((Some(level), name.to_string(), None))
                } else {
                    Ok((None, name.to_string(), Some(frame.namespace.clone())))
                }
            }
        }
    }

    /// Read a variable, firing read traces first. A read-trace error is
    /// returned without reading.
    pub fn get_var(&mut self, name: &str) -> Result<Value, Code> {
        let code = self.fire_var_traces(name, "read");
        if !code.is_ok() {
            return Err(code);
        }
        match self.lookup_var(name) {
            Some(v) => Ok(v),
            None => Err(self.var_error("read", name)),
        }
    }

    /// Resolution without traces; shared by `get_var` and `exists_var`.
    pub fn lookup_var(&self, name: &str) -> Option<Value> {
        match self.var_target(name) {
            VarTarget::Local(local) => self.read_local(self.active_level, &local, 0),
            VarTarget::Ns(ns, tail) => self
                .namespaces
                .get(ns.as_str())
                .and_then(|node| node.vars.get(tail.as_str()).cloned()),
        }
    }

    /// Write a variable, creating it when absent; fires write traces
    /// after the write lands.
    pub fn set_var(&mut self, name: &str, value: Value) -> Result<(), Code> {
        match self.var_target(name) {
            VarTarget::Local(local) => {
                let (frame_level, cell, ns) =
                    match self.write_location(self.active_level, &local, 0) {
                        Ok(loc) => loc,
                        Err(msg) => return Err(self.error(msg)),
                    };
                match frame_level {
                    Some(level) => {
                        self.frames[level]
                            .locals
                            .insert(cell, VarSlot::Value(value));
                    }
                    None => {
                        let path = ns.expect("namespace write location");
                        if !self.namespaces.contains_key(&path) {
                            let msg = format!(
                                "can't set \"{}\": parent namespace doesn't exist",
                                name
                            );
                            return Err(self.error(msg));
                        }
                        self.namespaces
                            .get_mut(&path)
                            .expect("namespace just checked")
                            .vars
                            .insert(cell, value);
                    }
                }
            }
            VarTarget::Ns(ns, tail) => {
                if !self.namespaces.contains_key(&ns) {
                    let msg = format!("can't set \"{}\": parent namespace doesn't exist", name);
                    return Err(self.error(msg));
                }
                self.namespaces
                    .get_mut(&ns)
                    .expect("namespace just checked")
                    .vars
                    .insert(tail, value);
            }
        }
        let code = self.fire_var_traces(name, "write");
        if !code.is_ok() {
            return Err(code);
        }
        Ok(())
    }

    /// Remove a variable. Unset traces fire first and their errors are
    /// swallowed; all traces on the name are purged afterwards. Unsetting
    /// a link removes the link, not its target.
    pub fn unset_var(&mut self, name: &str) -> Result<(), Code> {
        let _ = self.fire_var_traces(name, "unset");

        let removed = match self.var_target(name) {
            VarTarget::Local(local) => {
                let level = self.active_level;
                if self.frames[level].locals.shift_remove(&local).is_some() {
                    true
                } else if !self.frames[level].is_proc {
                    let path = self.frames[level].namespace.clone();
                    self.namespaces
                        .get_mut(&path)
                        .map(|node| node.vars.shift_remove(&local).is_some())
                        .unwrap_or(false)
                } else {
                    false
                }
            }
            VarTarget::Ns(ns, tail) => self
                .namespaces
                .get_mut(&ns)
                .map(|node| node.vars.shift_remove(&tail).is_some())
                .unwrap_or(false),
        };

        let key = self.var_trace_key(name);
        self.traces.var.shift_remove(&key);

        if removed {
            Ok(())
        } else {
            Err(self.var_error("unset", name))
        }
    }

    /// Existence check; never fires traces.
    pub fn exists_var(&self, name: &str) -> bool {
        self.lookup_var(name).is_some()
    }

    /// Install an upvar link in the active frame.
    pub fn link_upvar(
        &mut self,
        local: &str,
        target_level: usize,
        target_name: &str,
    ) -> Result<(), String> {
        let frame = self.active_frame_mut();
        if let Some(VarSlot::Value(_)) = frame.locals.get(local) {
            return Err(format!("variable \"{}\" already exists", local));
        }
        frame.locals.insert(
            local.to_string(),
            VarSlot::UpvarLink {
                level: target_level,
                name: target_name.to_string(),
            },
        );
        Ok(())
    }

    /// Install a namespace link in the active frame. Creates the link
    /// but does not initialize the target; reading a dangling link
    /// reports a missing variable.
    pub fn link_ns(&mut self, local: &str, ns: &str, target_name: &str) -> Result<(), String> {
        let frame = self.active_frame_mut();
        if let Some(VarSlot::Value(_)) = frame.locals.get(local) {
            return Err(format!("variable \"{}\" already exists", local));
        }
        frame.locals.insert(
            local.to_string(),
            VarSlot::NsLink {
                ns: ns.to_string(),
                name: target_name.to_string(),
            },
        );
        Ok(())
    }

    fn var_error(&mut self, op: &str, name: &str) -> Code {
        let msg = format!("can't {} \"{}\": no such variable", op, name);
        let code = Value::list(vec![
            Value::str("TCL"),
            Value::str("LOOKUP"),
            Value::str("VARNAME"),
            Value::str(name),
        ]);
        self.error_with_code(msg, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::interp::Interp;

    #[test]
    fn test_global_set_get() {
        let mut interp = Interp::new();
        interp.set_var("x", Value::str("hello")).unwrap();
        assert_eq!(interp.get_var("x").unwrap().as_str(), "hello");
        // At the global frame, unqualified and :: forms are the same cell.
        assert_eq!(interp.get_var("::x").unwrap().as_str(), "hello");
    }

    #[test]
    fn test_missing_var_message() {
        let mut interp = Interp::new();
        assert!(interp.get_var("nope").is_err());
        assert_eq!(
            interp.result().as_str(),
            "can't read \"nope\": no such variable"
        );
    }

    #[test]
    fn test_proc_frame_locals() {
        let mut interp = Interp::new();
        interp.set_var("x", Value::str("global")).unwrap();
        let mut frame = Frame::global();
        frame.is_proc = true;
        interp.push_frame(frame);
        interp.set_var("x", Value::str("local")).unwrap();
        assert_eq!(interp.get_var("x").unwrap().as_str(), "local");
        assert_eq!(interp.get_var("::x").unwrap().as_str(), "global");
        interp.pop_frame();
        assert_eq!(interp.get_var("x").unwrap().as_str(), "global");
    }

    #[test]
    fn test_upvar_link() {
        let mut interp = Interp::new();
        interp.set_var("x", Value::int(1)).unwrap();
        let mut frame = Frame::global();
        frame.is_proc = true;
        interp.push_frame(frame);
        interp.link_upvar("y", 0, "x").unwrap();
        assert_eq!(interp.get_var("y").unwrap().as_str(), "1");
        interp.set_var("y", Value::int(2)).unwrap();
        interp.pop_frame();
        assert_eq!(interp.get_var("x").unwrap().as_str(), "2");
    }

    #[test]
    fn test_ns_link_dangling() {
        let mut interp = Interp::new();
        interp.ensure_namespace("::c");
        let mut frame = Frame::global();
        frame.is_proc = true;
        interp.push_frame(frame);
        interp.link_ns("n", "::c", "n").unwrap();
        // Created but not initialized: reads report a missing variable.
        assert!(interp.get_var("n").is_err());
        interp.set_var("n", Value::int(5)).unwrap();
        interp.pop_frame();
        assert_eq!(interp.get_var("::c::n").unwrap().as_str(), "5");
    }

    #[test]
    fn test_unset_link_not_target() {
        let mut interp = Interp::new();
        interp.set_var("x", Value::int(1)).unwrap();
        let mut frame = Frame::global();
        frame.is_proc = true;
        interp.push_frame(frame);
        interp.link_upvar("y", 0, "x").unwrap();
        interp.unset_var("y").unwrap();
        assert!(!interp.exists_var("y"));
        interp.pop_frame();
        assert!(interp.exists_var("x"));
    }

    #[test]
    fn test_resolve_level() {
        let mut interp = Interp::new();
        let mut frame = Frame::global();
        frame.is_proc = true;
        interp.push_frame(frame);
        assert_eq!(interp.resolve_level("1").unwrap(), 0);
        assert_eq!(interp.resolve_level("#0").unwrap(), 0);
        assert_eq!(interp.resolve_level("#1").unwrap(), 1);
        assert!(interp.resolve_level("2").is_err());
        assert!(interp.resolve_level("#9").is_err());
        assert!(interp.resolve_level("x").is_err());
    }

    #[test]
    fn test_qualified_set_requires_namespace() {
        let mut interp = Interp::new();
        let err = interp.set_var("::missing::v", Value::int(1));
        assert!(err.is_err());
        assert!(interp
            .result()
            .as_str()
            .contains("parent namespace doesn't exist"));
    }
}
