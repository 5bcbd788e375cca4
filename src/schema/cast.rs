//! Value casts applied to query condition values
//!
//! Casts take and return JSON values. Record IDs are carried as normalised
//! `#cluster:position` strings.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

static RID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?(\d+):(\d+)$").expect("valid regex"));

static INTEGER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+$").expect("valid regex"));

/// A record ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    pub cluster: u32,
    pub position: u64,
}

impl Rid {
    pub fn new(cluster: u32, position: u64) -> Self {
        Self { cluster, position }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.cluster, self.position)
    }
}

impl FromStr for Rid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let caps = RID_PATTERN
            .captures(s)
            .ok_or_else(|| format!("not a valid RID: {}", s))?;
        let cluster = caps[1]
            .parse()
            .map_err(|_| format!("RID cluster out of range: {}", s))?;
        let position = caps[2]
            .parse()
            .map_err(|_| format!("RID position out of range: {}", s))?;
        Ok(Rid::new(cluster, position))
    }
}

/// Whether `s` has the shape of a record ID; `strict` requires the `#`
pub fn looks_like_rid(s: &str, strict: bool) -> bool {
    let s = s.trim();
    RID_PATTERN.is_match(s) && (!strict || s.starts_with('#'))
}

/// Named cast functions a property may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cast {
    /// Lowercase and trim
    String,
    NullableString,
    Rid,
    NullableLink,
    Integer,
    Boolean,
}

impl Cast {
    /// Apply the cast to one non-list value
    pub fn apply(&self, value: &Value) -> Result<Value, String> {
        match self {
            Cast::String => cast_string(value),
            Cast::NullableString => {
                if value.is_null() {
                    Ok(Value::Null)
                } else {
                    cast_string(value)
                }
            }
            Cast::Rid => cast_to_rid(value).map(|rid| Value::String(rid.to_string())),
            Cast::NullableLink => {
                if value.is_null() {
                    Ok(Value::Null)
                } else {
                    cast_to_rid(value).map(|rid| Value::String(rid.to_string()))
                }
            }
            Cast::Integer => cast_decimal_integer(value).map(Value::from),
            Cast::Boolean => cast_boolean(value).map(Value::Bool),
        }
    }
}

fn cast_string(value: &Value) -> Result<Value, String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(format!("expected a string but found {}", other)),
    };
    Ok(Value::String(text.trim().to_lowercase()))
}

/// Cast a string or `{"@rid": ...}` record to a record ID
pub fn cast_to_rid(value: &Value) -> Result<Rid, String> {
    match value {
        Value::String(s) => s.parse(),
        Value::Object(record) => match record.get("@rid") {
            Some(rid) => cast_to_rid(rid),
            None => Err("record has no @rid".to_string()),
        },
        other => Err(format!("not a valid RID: {}", other)),
    }
}

/// Cast a number or decimal string to an integer
pub fn cast_decimal_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("{} is not a valid decimal integer", n)),
        Value::String(s) if INTEGER_PATTERN.is_match(s.trim()) => s
            .trim()
            .parse()
            .map_err(|_| format!("{} is not a valid decimal integer", s)),
        other => Err(format!("{} is not a valid decimal integer", other)),
    }
}

/// Cast `t/true/1` and `f/false/0/null` to a boolean
pub fn cast_boolean(value: &Value) -> Result<bool, String> {
    let text = match value {
        Value::String(s) => s.to_lowercase(),
        Value::Null => "null".to_string(),
        other => other.to_string().to_lowercase(),
    };
    match text.as_str() {
        "t" | "true" | "1" => Ok(true),
        "f" | "false" | "0" | "null" => Ok(false),
        _ => Err(format!("Expected a boolean value but found {}", text)),
    }
}

/// Cast to an integer inside an inclusive range
pub fn cast_range_int(value: &Value, min: Option<i64>, max: Option<i64>) -> Result<i64, String> {
    let cast = cast_decimal_integer(value)?;
    if let Some(min) = min {
        if cast < min {
            return Err(format!(
                "value ({}) must be greater than or equal to {}",
                cast, min
            ));
        }
    }
    if let Some(max) = max {
        if cast > max {
            return Err(format!("value ({}) must be less than or equal to {}", cast, max));
        }
    }
    Ok(cast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rid_parse_and_display() {
        assert_eq!("#4:0".parse::<Rid>().unwrap(), Rid::new(4, 0));
        assert_eq!("44:3".parse::<Rid>().unwrap().to_string(), "#44:3");
        assert!("#4".parse::<Rid>().is_err());
        assert!("bob".parse::<Rid>().is_err());
    }

    #[test]
    fn test_looks_like_rid() {
        assert!(looks_like_rid("#12:0", true));
        assert!(looks_like_rid("12:0", false));
        assert!(!looks_like_rid("12:0", true));
        assert!(!looks_like_rid("alice", false));
    }

    #[test]
    fn test_cast_string() {
        assert_eq!(Cast::String.apply(&json!("  BOB ")).unwrap(), json!("bob"));
        assert_eq!(Cast::String.apply(&json!(12)).unwrap(), json!("12"));
        assert!(Cast::String.apply(&json!({"a": 1})).is_err());
        assert_eq!(Cast::NullableString.apply(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_cast_rid() {
        assert_eq!(Cast::Rid.apply(&json!("4:0")).unwrap(), json!("#4:0"));
        assert_eq!(Cast::Rid.apply(&json!({"@rid": "#5:1"})).unwrap(), json!("#5:1"));
        assert!(Cast::Rid.apply(&json!("abc")).is_err());
        assert!(Cast::Rid.apply(&Value::Null).is_err());
        assert_eq!(Cast::NullableLink.apply(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_cast_integer() {
        assert_eq!(Cast::Integer.apply(&json!("12")).unwrap(), json!(12));
        assert_eq!(Cast::Integer.apply(&json!(-3)).unwrap(), json!(-3));
        assert!(Cast::Integer.apply(&json!("1.5")).is_err());
        assert!(Cast::Integer.apply(&json!(1.5)).is_err());
        assert!(Cast::Integer.apply(&json!("x")).is_err());
    }

    #[test]
    fn test_cast_boolean() {
        assert!(cast_boolean(&json!("T")).unwrap());
        assert!(cast_boolean(&json!(true)).unwrap());
        assert!(cast_boolean(&json!(1)).unwrap());
        assert!(!cast_boolean(&json!("false")).unwrap());
        assert!(!cast_boolean(&Value::Null).unwrap());
        assert!(cast_boolean(&json!("maybe")).is_err());
    }

    #[test]
    fn test_cast_range_int() {
        assert_eq!(cast_range_int(&json!("3"), Some(0), Some(4)).unwrap(), 3);
        let err = cast_range_int(&json!(5), Some(0), Some(4)).unwrap_err();
        assert_eq!(err, "value (5) must be less than or equal to 4");
        let err = cast_range_int(&json!(-1), Some(0), None).unwrap_err();
        assert_eq!(err, "value (-1) must be greater than or equal to 0");
    }

    #[test]
    fn test_cast_serde_names() {
        let cast: Cast = serde_json::from_str("\"nullable-link\"").unwrap();
        assert_eq!(cast, Cast::NullableLink);
    }
}
