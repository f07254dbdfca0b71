//! Interpreter module
//!
//! This module contains the evaluator: frames, namespaces, name
//! resolution, substitution, command dispatch, the proc invoker, the
//! error-trace engine and the trace subsystem.

pub mod builtins;
pub mod dispatch;
pub mod errortrace;
pub mod eval;
pub mod expr;
pub mod frames;
pub mod interp;
pub mod namespaces;
pub mod proc;
pub mod resolver;
pub mod substitution;
pub mod trace;
pub mod types;

pub use frames::{Frame, VarSlot};
pub use interp::Interp;
pub use namespaces::Namespace;
pub use types::{
    Code, CommandDef, EvalScope, ExecutionLimits, HostCommand, Param, ProcDef, ReturnOptions,
};
