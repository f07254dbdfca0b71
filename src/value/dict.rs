//! Flat-Dict Codec
//!
//! Return options and error options travel as flat lists of alternating
//! keys and values. These helpers convert between that canonical form and
//! an ordered map.

use indexmap::IndexMap;

use crate::value::value::Value;

/// Parse a flat key/value list into an ordered map. Later keys win.
pub fn parse_flat_dict(v: &Value) -> Result<IndexMap<String, Value>, String> {
    let items = v.as_list()?;
    if items.len() % 2 != 0 {
        return Err(format!(
            "missing value to go with key \"{}\"",
            items.last().map(|k| k.as_str()).unwrap_or_default()
        ));
    }
    let mut map = IndexMap::new();
    let mut i = 0;
    while i < items.len() {
        map.insert(items[i].as_str(), items[i + 1].clone());
        i += 2;
    }
    Ok(map)
}

/// Format an ordered map as a flat key/value list value.
pub fn flat_dict_value(map: &IndexMap<String, Value>) -> Value {
    let mut items = Vec::with_capacity(map.len() * 2);
    for (k, v) in map.iter() {
        items.push(Value::str(k.clone()));
        items.push(v.clone());
    }
    Value::list(items)
}

/// Look up a key in a flat key/value list.
pub fn flat_dict_get(v: &Value, key: &str) -> Result<Option<Value>, String> {
    let items = v.as_list()?;
    let mut i = 0;
    let mut found = None;
    while i + 1 < items.len() {
        if items[i].as_str() == key {
            found = Some(items[i + 1].clone());
        }
        i += 2;
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_dict() {
        let v = Value::str("-code 1 -level 0");
        let map = parse_flat_dict(&v).unwrap();
        assert_eq!(map.get("-code").unwrap().as_str(), "1");
        assert_eq!(map.get("-level").unwrap().as_str(), "0");
    }

    #[test]
    fn test_parse_flat_dict_odd() {
        let v = Value::str("-code 1 -level");
        let err = parse_flat_dict(&v).unwrap_err();
        assert!(err.contains("missing value to go with key"));
    }

    #[test]
    fn test_flat_dict_get() {
        let v = Value::str("-errorcode {MY ERR} -line 3");
        assert_eq!(
            flat_dict_get(&v, "-errorcode").unwrap().unwrap().as_str(),
            "MY ERR"
        );
        assert!(flat_dict_get(&v, "-missing").unwrap().is_none());
    }

    #[test]
    fn test_round_trip() {
        let mut map = IndexMap::new();
        map.insert("-code".to_string(), Value::int(2));
        map.insert("-level".to_string(), Value::int(1));
        let v = flat_dict_value(&map);
        let back = parse_flat_dict(&v).unwrap();
        assert_eq!(back.get("-code").unwrap().as_str(), "2");
        assert_eq!(back.get("-level").unwrap().as_str(), "1");
    }
}
