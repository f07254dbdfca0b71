//! Script Parser
//!
//! Byte-oriented scanner producing per-command word lists. A script is a
//! sequence of commands separated by unescaped newlines or `;`. Lines
//! beginning with `#` in command position are comments. Words come in
//! three forms: brace words (literal, nesting), quoted words and bare
//! words. `$`, `[…]` and backslash sequences are recorded as structured
//! parts and substituted at evaluation time.

use crate::parser::escapes::decode_escape;
use crate::parser::types::{
    ParseException, ParsedCommand, Word, WordKind, WordPart, MAX_INPUT_SIZE,
    MAX_WORDS_PER_COMMAND,
};

/// Parse a full script into its commands.
pub fn parse_script(src: &str) -> Result<Vec<ParsedCommand>, ParseException> {
    Parser::new(src).parse_script()
}

/// Parser over a script string.
pub struct Parser {
    input: Vec<char>,
    pos: usize,
    line: u32,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    /// Parse the whole input into a command sequence.
    pub fn parse_script(mut self) -> Result<Vec<ParsedCommand>, ParseException> {
        if self.input.len() > MAX_INPUT_SIZE {
            return Err(ParseException::new("script too large", 1));
        }
        let mut commands = Vec::new();
        while let Some(cmd) = self.parse_command()? {
            if !cmd.words.is_empty() {
                commands.push(cmd);
            }
        }
        Ok(commands)
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if self.current() == Some('\n') {
            self.line += 1;
        }
        self.pos += 1;
    }

    /// Skip spaces, tabs, and `\<newline>` continuations between words.
    fn skip_blank(&mut self) {
        loop {
            match self.current() {
                Some(' ') | Some('\t') => self.pos += 1,
                Some('\\') if self.peek(1) == Some('\n') => {
                    self.pos += 2;
                    self.line += 1;
                    while matches!(self.current(), Some(' ') | Some('\t')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Skip command separators and comments. Returns false at end of input.
    fn skip_to_command(&mut self) -> bool {
        loop {
            match self.current() {
                Some(' ') | Some('\t') | Some(';') => self.pos += 1,
                Some('\n') => {
                    self.pos += 1;
                    self.line += 1;
                }
                Some('\\') if self.peek(1) == Some('\n') => {
                    self.pos += 2;
                    self.line += 1;
                }
                Some('#') => self.skip_comment(),
                Some(_) => return true,
                None => return false,
            }
        }
    }

    /// Comment runs to end of line; a trailing backslash continues it.
    fn skip_comment(&mut self) {
        loop {
            match self.current() {
                None => return,
                Some('\n') => return,
                Some('\\') if self.peek(1) == Some('\n') => {
                    self.pos += 2;
                    self.line += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Parse one command; None at end of input.
    pub fn parse_command(&mut self) -> Result<Option<ParsedCommand>, ParseException> {
        if !self.skip_to_command() {
            return Ok(None);
        }

        let line = self.line;
        let mut words = Vec::new();

        loop {
            self.skip_blank();
            match self.current() {
                None => break,
                Some('\n') => {
                    self.advance();
                    break;
                }
                Some(';') => {
                    self.pos += 1;
                    break;
                }
                Some('{') => words.push(self.read_brace_word()?),
                Some('"') => words.push(self.read_quoted_word()?),
                Some(_) => words.push(self.read_bare_word()?),
            }
            if words.len() > MAX_WORDS_PER_COMMAND {
                return Err(ParseException::new("too many words in command", self.line));
            }
        }

        Ok(Some(ParsedCommand { words, line }))
    }

    /// `{…}`: literal body, braces nest, `\<newline>` folds to a space.
    fn read_brace_word(&mut self) -> Result<Word, ParseException> {
        self.pos += 1; // opening brace
        let mut depth = 1;
        let mut body = String::new();

        loop {
            match self.current() {
                None => return Err(ParseException::new("missing close-brace", self.line)),
                Some('\\') => {
                    if self.peek(1) == Some('\n') {
                        self.pos += 2;
                        self.line += 1;
                        while matches!(self.current(), Some(' ') | Some('\t')) {
                            self.pos += 1;
                        }
                        body.push(' ');
                    } else {
                        // Backslash keeps the next char out of brace counting
                        // and stays in the body verbatim.
                        body.push('\\');
                        self.pos += 1;
                        if let Some(c) = self.current() {
                            body.push(c);
                            self.advance();
                        }
                    }
                }
                Some('{') => {
                    depth += 1;
                    body.push('{');
                    self.pos += 1;
                }
                Some('}') => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        break;
                    }
                    body.push('}');
                }
                Some(c) => {
                    body.push(c);
                    self.advance();
                }
            }
        }

        match self.current() {
            None | Some(' ') | Some('\t') | Some('\n') | Some(';') => {}
            Some('\\') if self.peek(1) == Some('\n') => {}
            Some(_) => {
                return Err(ParseException::new(
                    "extra characters after close-brace",
                    self.line,
                ))
            }
        }

        Ok(Word {
            parts: vec![WordPart::Literal(body)],
            kind: WordKind::Braced,
        })
    }

    /// `"…"`: substitutions apply; whitespace does not end the word.
    fn read_quoted_word(&mut self) -> Result<Word, ParseException> {
        self.pos += 1; // opening quote
        let mut parts = Vec::new();
        let mut literal = String::new();

        loop {
            match self.current() {
                None => return Err(ParseException::new("missing close-quote", self.line)),
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => self.read_escape_into(&mut literal, true)?,
                Some('$') => self.read_var_part(&mut parts, &mut literal)?,
                Some('[') => self.read_script_part(&mut parts, &mut literal)?,
                Some(c) => {
                    literal.push(c);
                    self.advance();
                }
            }
        }

        match self.current() {
            None | Some(' ') | Some('\t') | Some('\n') | Some(';') => {}
            Some('\\') if self.peek(1) == Some('\n') => {}
            Some(_) => {
                return Err(ParseException::new(
                    "extra characters after close-quote",
                    self.line,
                ))
            }
        }

        flush_literal(&mut parts, &mut literal);
        Ok(Word {
            parts,
            kind: WordKind::Quoted,
        })
    }

    /// Bare word: ends at unescaped whitespace, `;` or newline.
    fn read_bare_word(&mut self) -> Result<Word, ParseException> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        loop {
            match self.current() {
                None | Some(' ') | Some('\t') | Some('\n') | Some(';') => break,
                Some('\\') if self.peek(1) == Some('\n') => break,
                Some('\\') => self.read_escape_into(&mut literal, false)?,
                Some('$') => self.read_var_part(&mut parts, &mut literal)?,
                Some('[') => self.read_script_part(&mut parts, &mut literal)?,
                Some(c) => {
                    literal.push(c);
                    self.advance();
                }
            }
        }

        flush_literal(&mut parts, &mut literal);
        Ok(Word {
            parts,
            kind: WordKind::Bare,
        })
    }

    /// Decode a backslash escape into `literal`. In quoted context a
    /// `\<newline>` becomes a space; in bare context the caller breaks the
    /// word before we get here.
    fn read_escape_into(
        &mut self,
        literal: &mut String,
        quoted: bool,
    ) -> Result<(), ParseException> {
        debug_assert_eq!(self.current(), Some('\\'));
        if self.peek(1) == Some('\n') {
            self.pos += 2;
            self.line += 1;
            while matches!(self.current(), Some(' ') | Some('\t')) {
                self.pos += 1;
            }
            if quoted {
                literal.push(' ');
            }
            return Ok(());
        }
        let rest = &self.input[self.pos + 1..];
        match decode_escape(rest) {
            Ok(res) => {
                literal.push_str(&res.text);
                self.pos += 1 + res.consumed;
                Ok(())
            }
            Err(e) => Err(ParseException::new(e.message, self.line)),
        }
    }

    /// `$name`, `${name}` or `$name(index)`.
    fn read_var_part(
        &mut self,
        parts: &mut Vec<WordPart>,
        literal: &mut String,
    ) -> Result<(), ParseException> {
        debug_assert_eq!(self.current(), Some('$'));

        if self.peek(1) == Some('{') {
            self.pos += 2;
            let mut name = String::new();
            loop {
                match self.current() {
                    None => {
                        return Err(ParseException::new(
                            "missing close-brace for variable name",
                            self.line,
                        ))
                    }
                    Some('}') => {
                        self.pos += 1;
                        break;
                    }
                    Some(c) => {
                        name.push(c);
                        self.advance();
                    }
                }
            }
            flush_literal(parts, literal);
            parts.push(WordPart::Var(name));
            return Ok(());
        }

        // Scan identifier chars with embedded :: separators.
        let mut name = String::new();
        let mut i = self.pos + 1;
        loop {
            match self.input.get(i) {
                Some(&c) if c.is_alphanumeric() || c == '_' => {
                    name.push(c);
                    i += 1;
                }
                Some(&':') if self.input.get(i + 1) == Some(&':') => {
                    name.push(':');
                    name.push(':');
                    i += 2;
                    while self.input.get(i) == Some(&':') {
                        i += 1;
                    }
                }
                _ => break,
            }
        }

        if name.is_empty() {
            // A lone dollar sign is ordinary text.
            literal.push('$');
            self.pos += 1;
            return Ok(());
        }

        self.pos = i;

        if self.current() == Some('(') {
            self.pos += 1;
            let index_parts = self.read_index_parts()?;
            flush_literal(parts, literal);
            parts.push(WordPart::VarIndexed(name, index_parts));
        } else {
            flush_literal(parts, literal);
            parts.push(WordPart::Var(name));
        }
        Ok(())
    }

    /// Parse the `(…)` index of an emulated array reference; the index is
    /// itself subject to substitution.
    fn read_index_parts(&mut self) -> Result<Vec<WordPart>, ParseException> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut depth = 1;

        loop {
            match self.current() {
                None => return Err(ParseException::new("missing close-paren", self.line)),
                Some(')') => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        break;
                    }
                    literal.push(')');
                }
                Some('(') => {
                    depth += 1;
                    literal.push('(');
                    self.pos += 1;
                }
                Some('\\') => self.read_escape_into(&mut literal, true)?,
                Some('$') => self.read_var_part(&mut parts, &mut literal)?,
                Some('[') => self.read_script_part(&mut parts, &mut literal)?,
                Some(c) => {
                    literal.push(c);
                    self.advance();
                }
            }
        }

        flush_literal(&mut parts, &mut literal);
        Ok(parts)
    }

    /// `[script]`: record the bracketed text for later evaluation. The scan
    /// honors nested brackets, brace regions and quoted regions so a `]`
    /// inside them does not terminate the script.
    fn read_script_part(
        &mut self,
        parts: &mut Vec<WordPart>,
        literal: &mut String,
    ) -> Result<(), ParseException> {
        debug_assert_eq!(self.current(), Some('['));
        self.pos += 1;
        let start = self.pos;
        let mut depth = 1;
        let mut brace_depth = 0;
        let mut in_quote = false;

        loop {
            match self.current() {
                None => return Err(ParseException::new("missing close-bracket", self.line)),
                Some('\\') => {
                    if self.peek(1) == Some('\n') {
                        self.line += 1;
                    }
                    self.pos = (self.pos + 2).min(self.input.len());
                }
                Some('{') if !in_quote => {
                    brace_depth += 1;
                    self.pos += 1;
                }
                Some('}') if !in_quote && brace_depth > 0 => {
                    brace_depth -= 1;
                    self.pos += 1;
                }
                Some('"') if brace_depth == 0 => {
                    in_quote = !in_quote;
                    self.pos += 1;
                }
                Some('[') if brace_depth == 0 && !in_quote => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(']') if brace_depth == 0 && !in_quote => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    self.pos += 1;
                }
                Some(_) => self.advance(),
            }
        }

        let script: String = self.input[start..self.pos].iter().collect();
        self.pos += 1; // closing bracket
        flush_literal(parts, literal);
        parts.push(WordPart::Script(script));
        Ok(())
    }
}

impl Parser {
    /// Scan an entire string as substitutable text (the `subst` command):
    /// no word splitting, no terminators, each substitution class
    /// individually switchable.
    pub fn parse_subst_parts(
        mut self,
        backslashes: bool,
        commands: bool,
        variables: bool,
    ) -> Result<Vec<WordPart>, ParseException> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        loop {
            match self.current() {
                None => break,
                Some('\\') if backslashes => self.read_escape_into(&mut literal, true)?,
                Some('$') if variables => self.read_var_part(&mut parts, &mut literal)?,
                Some('[') if commands => self.read_script_part(&mut parts, &mut literal)?,
                Some(c) => {
                    literal.push(c);
                    self.advance();
                }
            }
        }
        flush_literal(&mut parts, &mut literal);
        Ok(parts)
    }
}

fn flush_literal(parts: &mut Vec<WordPart>, literal: &mut String) {
    if !literal.is_empty() {
        parts.push(WordPart::Literal(std::mem::take(literal)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(w: &Word) -> &str {
        w.as_literal().unwrap()
    }

    #[test]
    fn test_simple_command() {
        let cmds = parse_script("set x 1").unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].words.len(), 3);
        assert_eq!(lit(&cmds[0].words[0]), "set");
        assert_eq!(lit(&cmds[0].words[2]), "1");
    }

    #[test]
    fn test_semicolon_and_newline_separators() {
        let cmds = parse_script("set a 1; set b 2\nset c 3").unwrap();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[2].line, 2);
    }

    #[test]
    fn test_comment_in_command_position() {
        let cmds = parse_script("# a comment\nset x 1").unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].line, 2);
    }

    #[test]
    fn test_hash_not_comment_mid_command() {
        let cmds = parse_script("set x a#b").unwrap();
        assert_eq!(lit(&cmds[0].words[2]), "a#b");
    }

    #[test]
    fn test_brace_word() {
        let cmds = parse_script("set x {a $b [c]}").unwrap();
        let w = &cmds[0].words[2];
        assert_eq!(w.kind, WordKind::Braced);
        assert_eq!(lit(w), "a $b [c]");
    }

    #[test]
    fn test_brace_nesting() {
        let cmds = parse_script("set x {a {b c} d}").unwrap();
        assert_eq!(lit(&cmds[0].words[2]), "a {b c} d");
    }

    #[test]
    fn test_brace_continuation_folds_to_space() {
        let cmds = parse_script("set x {a \\\n   b}").unwrap();
        assert_eq!(lit(&cmds[0].words[2]), "a  b");
    }

    #[test]
    fn test_quoted_word_parts() {
        let cmds = parse_script("set x \"a $b c\"").unwrap();
        let w = &cmds[0].words[2];
        assert_eq!(w.kind, WordKind::Quoted);
        assert_eq!(
            w.parts,
            vec![
                WordPart::Literal("a ".to_string()),
                WordPart::Var("b".to_string()),
                WordPart::Literal(" c".to_string()),
            ]
        );
    }

    #[test]
    fn test_bare_word_with_var() {
        let cmds = parse_script("set x a$b").unwrap();
        let w = &cmds[0].words[2];
        assert_eq!(
            w.parts,
            vec![
                WordPart::Literal("a".to_string()),
                WordPart::Var("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_braced_var_name() {
        let cmds = parse_script("set x ${a b}").unwrap();
        assert_eq!(
            cmds[0].words[2].parts,
            vec![WordPart::Var("a b".to_string())]
        );
    }

    #[test]
    fn test_qualified_var_name() {
        let cmds = parse_script("set x $::ns::v").unwrap();
        assert_eq!(
            cmds[0].words[2].parts,
            vec![WordPart::Var("::ns::v".to_string())]
        );
    }

    #[test]
    fn test_indexed_var() {
        let cmds = parse_script("set x $a(i,$j)").unwrap();
        match &cmds[0].words[2].parts[0] {
            WordPart::VarIndexed(name, index) => {
                assert_eq!(name, "a");
                assert_eq!(
                    index,
                    &vec![
                        WordPart::Literal("i,".to_string()),
                        WordPart::Var("j".to_string()),
                    ]
                );
            }
            other => panic!("expected indexed var, got {:?}", other),
        }
    }

    #[test]
    fn test_command_substitution_part() {
        let cmds = parse_script("set x [list a b]").unwrap();
        assert_eq!(
            cmds[0].words[2].parts,
            vec![WordPart::Script("list a b".to_string())]
        );
    }

    #[test]
    fn test_nested_brackets() {
        let cmds = parse_script("set x [outer [inner]]").unwrap();
        assert_eq!(
            cmds[0].words[2].parts,
            vec![WordPart::Script("outer [inner]".to_string())]
        );
    }

    #[test]
    fn test_bracket_with_braced_bracket() {
        let cmds = parse_script("set x [a {]} b]").unwrap();
        assert_eq!(
            cmds[0].words[2].parts,
            vec![WordPart::Script("a {]} b".to_string())]
        );
    }

    #[test]
    fn test_line_continuation() {
        let cmds = parse_script("set x \\\n    1").unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].words.len(), 3);
        assert_eq!(lit(&cmds[0].words[2]), "1");
    }

    #[test]
    fn test_lone_dollar() {
        let cmds = parse_script("set x a$ b").unwrap();
        assert_eq!(lit(&cmds[0].words[2]), "a$");
    }

    #[test]
    fn test_escapes_in_bare_word() {
        let cmds = parse_script("set x a\\tb").unwrap();
        assert_eq!(lit(&cmds[0].words[2]), "a\tb");
    }

    #[test]
    fn test_error_missing_close_brace() {
        let err = parse_script("set x {a b").unwrap_err();
        assert_eq!(err.message, "missing close-brace");
    }

    #[test]
    fn test_error_missing_close_bracket() {
        let err = parse_script("set x [a b").unwrap_err();
        assert_eq!(err.message, "missing close-bracket");
    }

    #[test]
    fn test_error_missing_close_quote() {
        let err = parse_script("set x \"a b").unwrap_err();
        assert_eq!(err.message, "missing close-quote");
    }

    #[test]
    fn test_error_extra_after_close_brace() {
        let err = parse_script("set x {a}b").unwrap_err();
        assert_eq!(err.message, "extra characters after close-brace");
    }

    #[test]
    fn test_line_tracking_multiline() {
        let cmds = parse_script("set a 1\n\nset b {x\ny}\nset c 3").unwrap();
        assert_eq!(cmds[0].line, 1);
        assert_eq!(cmds[1].line, 3);
        assert_eq!(cmds[2].line, 5);
    }

    #[test]
    fn test_empty_script() {
        assert!(parse_script("").unwrap().is_empty());
        assert!(parse_script("  \n ; \n# only a comment\n").unwrap().is_empty());
    }
}
