//! Parser module
//!
//! The parser turns a script string into a sequence of commands, each a
//! list of structured words. Substitution of `$`, `[…]` and backslash
//! sequences happens later, at evaluation time, against the live frame.

pub mod escapes;
pub mod parser;
pub mod types;

pub use parser::{parse_script, Parser};
pub use types::{ParseException, ParsedCommand, Word, WordKind, WordPart};
