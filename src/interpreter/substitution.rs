//! Word Substitution
//!
//! Turns parsed words into argument values against the live frame:
//! variable parts read through the variable engine (firing read traces),
//! script parts recursively evaluate, and literal parts pass through.
//! A word made of a single variable or script part keeps the value
//! handle intact, so lists flow through without a string round trip.

use crate::interpreter::interp::Interp;
use crate::interpreter::types::{Code, EvalScope};
use crate::parser::{Word, WordKind, WordPart};
use crate::value::Value;

impl Interp {
    /// Substitute one word into a value.
    pub fn subst_word(&mut self, word: &Word) -> Result<Value, Code> {
        if word.kind == WordKind::Braced {
            return Ok(match word.as_literal() {
                Some(text) => Value::str(text),
                None => Value::empty(),
            });
        }
        self.subst_parts(&word.parts)
    }

    /// Substitute a part sequence into a value.
    pub fn subst_parts(&mut self, parts: &[WordPart]) -> Result<Value, Code> {
        match parts {
            [] => Ok(Value::empty()),
            [single] => self.subst_part(single),
            many => {
                let mut out = String::new();
                for part in many {
                    out.push_str(&self.subst_part(part)?.as_str());
                }
                Ok(Value::str(out))
            }
        }
    }

    fn subst_part(&mut self, part: &WordPart) -> Result<Value, Code> {
        match part {
            WordPart::Literal(text) => Ok(Value::str(text.clone())),
            WordPart::Var(name) => self.get_var(name).map_err(|code| code),
            WordPart::VarIndexed(name, index_parts) => {
                let index = self.subst_parts(index_parts)?.as_str();
                let full = format!("{}({})", name, index);
                self.get_var(&full)
            }
            WordPart::Script(src) => {
                let code = self.eval_script(src, EvalScope::Local);
                match code {
                    Code::Ok => Ok(self.result()),
                    other => Err(other),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_script;

    fn word_of(src: &str) -> Word {
        // Words of "set x <src>" — the third word carries the test case.
        parse_script(&format!("set x {}", src)).unwrap()[0].words[2].clone()
    }

    #[test]
    fn test_literal_word() {
        let mut interp = Interp::new();
        let w = word_of("hello");
        assert_eq!(interp.subst_word(&w).unwrap().as_str(), "hello");
    }

    #[test]
    fn test_braced_word_no_substitution() {
        let mut interp = Interp::new();
        let w = word_of("{$x [y]}");
        assert_eq!(interp.subst_word(&w).unwrap().as_str(), "$x [y]");
    }

    #[test]
    fn test_var_substitution() {
        let mut interp = Interp::new();
        interp.set_var("name", Value::str("world")).unwrap();
        let w = word_of("\"hello $name\"");
        assert_eq!(interp.subst_word(&w).unwrap().as_str(), "hello world");
    }

    #[test]
    fn test_single_var_preserves_value() {
        let mut interp = Interp::new();
        interp
            .set_var("l", Value::list(vec![Value::str("a b"), Value::str("c")]))
            .unwrap();
        let w = word_of("$l");
        let v = interp.subst_word(&w).unwrap();
        assert!(matches!(v, Value::List(_)));
    }

    #[test]
    fn test_missing_var_errors() {
        let mut interp = Interp::new();
        let w = word_of("$missing");
        assert!(interp.subst_word(&w).is_err());
        assert!(interp.result().as_str().contains("no such variable"));
    }

    #[test]
    fn test_indexed_var() {
        let mut interp = Interp::new();
        interp.set_var("a(k)", Value::int(7)).unwrap();
        let w = word_of("$a(k)");
        assert_eq!(interp.subst_word(&w).unwrap().as_str(), "7");
    }
}
