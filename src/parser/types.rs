//! Parser Types and Constants
//!
//! Shared types and limits used across parser modules.

use std::fmt;
use thiserror::Error;

// Parser limits to prevent hangs and resource exhaustion
pub const MAX_INPUT_SIZE: usize = 1_000_000; // 1MB max input
pub const MAX_WORDS_PER_COMMAND: usize = 100_000;

/// One piece of a word, substituted at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum WordPart {
    /// Literal text (backslash escapes already decoded).
    Literal(String),
    /// `$name` or `${name}` — a scalar variable reference.
    Var(String),
    /// `$name(index)` — the index is itself substituted, then appended in
    /// parentheses to form the literal variable name.
    VarIndexed(String, Vec<WordPart>),
    /// `[script]` — evaluated, result spliced in.
    Script(String),
}

/// How a word was delimited in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    /// Unquoted; ends at whitespace, `;` or newline.
    Bare,
    /// `"…"`; substitutions apply, whitespace does not end the word.
    Quoted,
    /// `{…}`; literal body, no substitutions.
    Braced,
}

/// A single word of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub parts: Vec<WordPart>,
    pub kind: WordKind,
}

impl Word {
    pub fn literal(text: impl Into<String>, kind: WordKind) -> Self {
        Self {
            parts: vec![WordPart::Literal(text.into())],
            kind,
        }
    }

    /// The literal text of the word when it has no substitutions.
    pub fn as_literal(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [] => Some(""),
            [WordPart::Literal(s)] => Some(s),
            _ => None,
        }
    }
}

/// One parsed command: its words and the 1-based line it started on.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub words: Vec<Word>,
    pub line: u32,
}

/// Error raised when a script cannot be parsed.
#[derive(Debug, Clone, Error)]
pub struct ParseException {
    pub message: String,
    pub line: u32,
}

impl fmt::Display for ParseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ParseException {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}
