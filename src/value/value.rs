//! Runtime Values
//!
//! Every datum the evaluator touches is a `Value`: a cheaply clonable
//! tagged sum with a string projection computed on demand. Scripts can
//! only observe the string projection, so two values are "the same" when
//! their projections are equal. Lists and dicts share their backing
//! storage through `Rc`; mutating list operations return a new handle.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::list::{format_list, parse_list};

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Str(Rc<str>),
    Int(i64),
    Double(f64),
    List(Rc<Vec<Value>>),
    Dict(Rc<IndexMap<String, Value>>),
}

impl Value {
    /// The empty string value.
    pub fn empty() -> Self {
        Value::Str(Rc::from(""))
    }

    pub fn str(s: impl Into<String>) -> Self {
        let s: String = s.into();
        Value::Str(Rc::from(s.as_str()))
    }

    pub fn int(i: i64) -> Self {
        Value::Int(i)
    }

    pub fn double(d: f64) -> Self {
        Value::Double(d)
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn dict(map: IndexMap<String, Value>) -> Self {
        Value::Dict(Rc::new(map))
    }

    /// Boolean projection used by conditions: accepts integers (0 = false),
    /// and the usual word forms.
    pub fn as_bool(&self) -> Result<bool, String> {
        if let Value::Int(i) = self {
            return Ok(*i != 0);
        }
        if let Value::Double(d) = self {
            return Ok(*d != 0.0);
        }
        let s = self.as_str();
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => {
                if let Ok(i) = parse_int(&s) {
                    Ok(i != 0)
                } else if let Ok(d) = parse_double(&s) {
                    Ok(d != 0.0)
                } else {
                    Err(format!("expected boolean value but got \"{}\"", s))
                }
            }
        }
    }

    /// Integer projection. `Int` passes through; everything else goes via
    /// the string form.
    pub fn as_int(&self) -> Result<i64, String> {
        match self {
            Value::Int(i) => Ok(*i),
            other => {
                let s = other.as_str();
                parse_int(&s).map_err(|_| format!("expected integer but got \"{}\"", s))
            }
        }
    }

    /// Double projection.
    pub fn as_double(&self) -> Result<f64, String> {
        match self {
            Value::Int(i) => Ok(*i as f64),
            Value::Double(d) => Ok(*d),
            other => {
                let s = other.as_str();
                parse_double(&s)
                    .map_err(|_| format!("expected floating-point number but got \"{}\"", s))
            }
        }
    }

    /// List projection. `List` shares its storage; every other variant is
    /// parsed from its string form.
    pub fn as_list(&self) -> Result<Rc<Vec<Value>>, String> {
        match self {
            Value::List(items) => Ok(items.clone()),
            other => {
                let parsed = parse_list(&other.as_str())?;
                Ok(Rc::new(parsed))
            }
        }
    }

    /// String projection.
    pub fn as_str(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Double(d) => format_double(*d),
            Value::List(items) => format_list(items),
            Value::Dict(map) => {
                let mut items = Vec::with_capacity(map.len() * 2);
                for (k, v) in map.iter() {
                    items.push(Value::str(k.clone()));
                    items.push(v.clone());
                }
                format_list(&items)
            }
        }
    }

    /// Number of Unicode runes in the string projection.
    pub fn rune_length(&self) -> usize {
        self.as_str().chars().count()
    }

    /// Rune at a 0-based index, or None when out of range.
    pub fn rune_at(&self, index: usize) -> Option<char> {
        self.as_str().chars().nth(index)
    }

    /// Substring by rune range (inclusive indices, clamped).
    pub fn rune_range(&self, first: usize, last: usize) -> String {
        if last < first {
            return String::new();
        }
        self.as_str()
            .chars()
            .skip(first)
            .take(last - first + 1)
            .collect()
    }

    /// Number of bytes in the string projection.
    pub fn byte_length(&self) -> usize {
        self.as_str().len()
    }

    /// Byte at a 0-based index, or None when out of range.
    pub fn byte_at(&self, index: usize) -> Option<u8> {
        self.as_str().as_bytes().get(index).copied()
    }

    /// True when the string projection is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Str(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => self.as_str().is_empty(),
        }
    }

    /// String-projection equality. The only observable identity.
    pub fn string_eq(&self, other: &Value) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::empty()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Int(if b { 1 } else { 0 })
    }
}

/// Parse an integer in decimal, hex (0x), octal (0o) or binary (0b) form.
pub fn parse_int(s: &str) -> Result<i64, ()> {
    let t = s.trim();
    if t.is_empty() {
        return Err(());
    }
    let (neg, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let parsed = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(oct) = body.strip_prefix("0o").or_else(|| body.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8)
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2)
    } else {
        body.parse::<i64>()
    };
    match parsed {
        Ok(v) => Ok(if neg { -v } else { v }),
        Err(_) => Err(()),
    }
}

/// Parse a double. Accepts anything Rust's f64 parser accepts except
/// the empty string.
pub fn parse_double(s: &str) -> Result<f64, ()> {
    let t = s.trim();
    if t.is_empty() {
        return Err(());
    }
    t.parse::<f64>().map_err(|_| ())
}

/// Format a double so it round-trips as a number: integral values keep a
/// trailing `.0` so they stay distinguishable from integers.
pub fn format_double(d: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    if d == d.trunc() && d.abs() < 1e16 {
        format!("{:.1}", d)
    } else {
        format!("{}", d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_projection() {
        assert_eq!(Value::str("abc").as_str(), "abc");
        assert_eq!(Value::int(42).as_str(), "42");
        assert_eq!(Value::double(2.5).as_str(), "2.5");
        assert_eq!(Value::double(4.0).as_str(), "4.0");
    }

    #[test]
    fn test_list_projection() {
        let v = Value::list(vec![Value::str("a"), Value::str("b c")]);
        assert_eq!(v.as_str(), "a {b c}");
        let parsed = Value::str("a {b c}").as_list().unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].as_str(), "b c");
    }

    #[test]
    fn test_as_int() {
        assert_eq!(Value::str("12").as_int().unwrap(), 12);
        assert_eq!(Value::str(" -3 ").as_int().unwrap(), -3);
        assert_eq!(Value::str("0x10").as_int().unwrap(), 16);
        assert!(Value::str("1.5").as_int().is_err());
        assert!(Value::str("abc").as_int().is_err());
    }

    #[test]
    fn test_as_int_error_shape() {
        let err = Value::str("pear").as_int().unwrap_err();
        assert_eq!(err, "expected integer but got \"pear\"");
    }

    #[test]
    fn test_as_double() {
        assert_eq!(Value::str("2.5").as_double().unwrap(), 2.5);
        assert_eq!(Value::int(2).as_double().unwrap(), 2.0);
        assert!(Value::str("x").as_double().is_err());
    }

    #[test]
    fn test_as_bool() {
        assert!(Value::str("true").as_bool().unwrap());
        assert!(Value::str("on").as_bool().unwrap());
        assert!(!Value::str("no").as_bool().unwrap());
        assert!(Value::int(7).as_bool().unwrap());
        assert!(!Value::int(0).as_bool().unwrap());
        assert!(Value::str("banana").as_bool().is_err());
    }

    #[test]
    fn test_rune_access() {
        let v = Value::str("héllo");
        assert_eq!(v.rune_length(), 5);
        assert_eq!(v.rune_at(1), Some('é'));
        assert_eq!(v.rune_range(1, 3), "éll");
        assert_eq!(v.rune_range(3, 1), "");
        assert!(v.byte_length() > 5);
    }

    #[test]
    fn test_string_eq() {
        assert!(Value::int(5).string_eq(&Value::str("5")));
        assert!(!Value::int(5).string_eq(&Value::str("05")));
    }

    #[test]
    fn test_format_double_large() {
        // Large integral doubles still format exactly.
        assert_eq!(format_double(2147483648.0), "2147483648.0");
    }
}
