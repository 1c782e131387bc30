//! YAML front-matter lookup for markdown documents.

use serde_yaml::{Mapping, Value};

use crate::error::WaypointError;

const DELIMITER: &str = "---";

/// Extract the raw YAML between the leading `---` delimiters, if the document opens with one.
pub fn raw_block(content: &str) -> Option<&str> {
    let mut lines = content.split('\n');
    if lines.next().map(|l| l.trim_end()) != Some(DELIMITER) {
        return None;
    }
    let start = content.find('\n')? + 1;
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some(&content[start..offset]);
        }
        offset += line.len() + 1;
    }
    None
}

/// Parse the front-matter mapping. A document without front-matter yields an empty mapping.
pub fn parse(content: &str) -> Result<Mapping, WaypointError> {
    match raw_block(content) {
        Some(raw) if !raw.trim().is_empty() => match serde_yaml::from_str::<Value>(raw)? {
            Value::Mapping(map) => Ok(map),
            Value::Null => Ok(Mapping::new()),
            other => Err(WaypointError::Serialization(format!(
                "frontmatter is not a mapping: {other:?}"
            ))),
        },
        _ => Ok(Mapping::new()),
    }
}

/// Look up a single key, swallowing malformed front-matter as "absent".
pub fn lookup(content: &str, key: &str) -> Option<Value> {
    match parse(content) {
        Ok(map) => map.get(key).cloned(),
        Err(e) => {
            tracing::debug!("Ignoring unreadable frontmatter: {e}");
            None
        }
    }
}

/// Numeric interpretation of a metadata value. Accepts YAML numbers and numeric strings.
pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}
