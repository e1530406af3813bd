//! Field values held by records.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A dynamically typed field value.
///
/// Records store their data as named `FieldValue`s. Values deserialize from
/// plain JSON (`null`, booleans, numbers, strings, arrays and objects), so a
/// store can be loaded directly from a JSON payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value.
    #[default]
    None,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
    /// Ordered list of values.
    List(Vec<FieldValue>),
    /// Nested object.
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Returns `true` if this is `FieldValue::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, FieldValue::None)
    }

    /// Returns `true` if this contains some data.
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Attempts to get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view of the value. Integers widen to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Int(n) => Some(*n as f64),
            FieldValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the value as a list.
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Attempts to get the value as a nested object.
    pub fn as_map(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Resolve a dotted path (`"resource.city"`) inside nested maps.
    pub fn path(&self, path: &str) -> Option<&FieldValue> {
        path.split('.').try_fold(self, |value, segment| value.as_map()?.get(segment))
    }

    /// Total ordering used by sorters, groupers and comparison filters.
    ///
    /// Values of different kinds order as
    /// `None < Bool < number < String < List < Map`. Integers and floats
    /// compare numerically; `NaN` compares equal to every number.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (a, b) if a.rank() == 2 && b.rank() == 2 => {
                let (a, b) = (a.as_number().unwrap_or_default(), b.as_number().unwrap_or_default());
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
            (FieldValue::List(a), FieldValue::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.compare(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// Loose equality: numbers compare by value regardless of representation.
    pub fn loosely_equals(&self, other: &FieldValue) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// A stable string form used to derive ids for group rows.
    pub fn id_fragment(&self) -> String {
        match self {
            FieldValue::None => "null".to_string(),
            FieldValue::String(s) => s.clone(),
            FieldValue::List(items) if items.is_empty() => "[]".to_string(),
            other => other.to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::None => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Int(_) | FieldValue::Float(_) => 2,
            FieldValue::String(_) => 3,
            FieldValue::List(_) => 4,
            FieldValue::Map(_) => 5,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::None => Ok(()),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Float(n) => write!(f, "{n}"),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            FieldValue::Map(_) => f.write_str("[object]"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Int(n as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Int(n as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Float(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::List(items)
    }
}

impl From<BTreeMap<String, FieldValue>> for FieldValue {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        FieldValue::Map(map)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_numeric_compare() {
        assert_eq!(FieldValue::Int(2).compare(&FieldValue::Float(2.5)), Ordering::Less);
        assert_eq!(FieldValue::Float(3.0).compare(&FieldValue::Int(3)), Ordering::Equal);
        assert!(FieldValue::Int(3).loosely_equals(&FieldValue::Float(3.0)));
    }

    #[test]
    fn test_cross_kind_order() {
        let mut values = vec![
            FieldValue::from("b"),
            FieldValue::Int(1),
            FieldValue::None,
            FieldValue::Bool(true),
        ];
        values.sort_by(FieldValue::compare);
        assert_eq!(
            values,
            vec![
                FieldValue::None,
                FieldValue::Bool(true),
                FieldValue::Int(1),
                FieldValue::from("b"),
            ]
        );
    }

    #[test]
    fn test_path() {
        let value: FieldValue = serde_json::from_str(r#"{"resource":{"city":"Oslo"}}"#).unwrap();
        assert_eq!(value.path("resource.city"), Some(&FieldValue::from("Oslo")));
        assert_eq!(value.path("resource.country"), None);
    }

    #[test]
    fn test_json_kinds() {
        let value: FieldValue = serde_json::from_str(r#"[null, 1, 1.5, "x", true]"#).unwrap();
        assert_eq!(
            value,
            FieldValue::List(vec![
                FieldValue::None,
                FieldValue::Int(1),
                FieldValue::Float(1.5),
                FieldValue::from("x"),
                FieldValue::Bool(true),
            ])
        );
        assert_eq!(value.to_string(), ",1,1.5,x,true");
    }
}
