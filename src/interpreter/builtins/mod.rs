//! Builtin Commands
//!
//! Every builtin is a plain function registered under its fully
//! qualified `::name` in the global namespace at interpreter startup.

pub mod control;
pub mod exceptions;
pub mod info_cmds;
pub mod list_cmds;
pub mod namespace_cmds;
pub mod proc_cmds;
pub mod string_cmds;
pub mod trace_cmds;
pub mod var_cmds;

use crate::interpreter::interp::Interp;
use crate::interpreter::types::BuiltinFn;

/// The builtin command table.
const BUILTINS: &[(&str, BuiltinFn)] = &[
    // variables & frames
    ("::set", var_cmds::cmd_set),
    ("::unset", var_cmds::cmd_unset),
    ("::append", var_cmds::cmd_append),
    ("::lappend", var_cmds::cmd_lappend),
    ("::incr", var_cmds::cmd_incr),
    ("::global", var_cmds::cmd_global),
    ("::variable", var_cmds::cmd_variable),
    ("::upvar", var_cmds::cmd_upvar),
    ("::uplevel", var_cmds::cmd_uplevel),
    // control flow
    ("::if", control::cmd_if),
    ("::while", control::cmd_while),
    ("::for", control::cmd_for),
    ("::foreach", control::cmd_foreach),
    ("::lmap", control::cmd_lmap),
    ("::switch", control::cmd_switch),
    // exceptions & completion codes
    ("::catch", exceptions::cmd_catch),
    ("::try", exceptions::cmd_try),
    ("::throw", exceptions::cmd_throw),
    ("::error", exceptions::cmd_error),
    ("::return", exceptions::cmd_return),
    ("::break", exceptions::cmd_break),
    ("::continue", exceptions::cmd_continue),
    ("::tailcall", exceptions::cmd_tailcall),
    // procs & evaluation
    ("::proc", proc_cmds::cmd_proc),
    ("::apply", proc_cmds::cmd_apply),
    ("::rename", proc_cmds::cmd_rename),
    ("::eval", proc_cmds::cmd_eval),
    ("::expr", proc_cmds::cmd_expr),
    ("::subst", proc_cmds::cmd_subst),
    // lists
    ("::list", list_cmds::cmd_list),
    ("::llength", list_cmds::cmd_llength),
    ("::lindex", list_cmds::cmd_lindex),
    ("::lrange", list_cmds::cmd_lrange),
    ("::linsert", list_cmds::cmd_linsert),
    ("::lreplace", list_cmds::cmd_lreplace),
    ("::lset", list_cmds::cmd_lset),
    ("::lrepeat", list_cmds::cmd_lrepeat),
    ("::lreverse", list_cmds::cmd_lreverse),
    ("::concat", list_cmds::cmd_concat),
    ("::join", list_cmds::cmd_join),
    ("::split", list_cmds::cmd_split),
    // strings
    ("::string", string_cmds::cmd_string),
    ("::format", string_cmds::cmd_format),
    // introspection & namespaces & traces
    ("::info", info_cmds::cmd_info),
    ("::namespace", namespace_cmds::cmd_namespace),
    ("::trace", trace_cmds::cmd_trace),
];

/// Register the whole builtin table into an interpreter.
pub fn register_all(interp: &mut Interp) {
    for (name, f) in BUILTINS {
        interp.register_builtin(name, *f);
    }
}
