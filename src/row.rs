//! Database-agnostic result types.
//!
//! This module contains:
//! - `Value` - A unified scalar value covering what the unified engine
//!   interface can carry across backends
//! - `Row` - A row of values from a query result
//! - `ColumnInfo` - Metadata about a column in a result set

use serde::{Deserialize, Serialize};

/// A unified scalar value.
///
/// The unified engine interface only carries scalars; richer
/// backend-specific types surface as [`Value::Other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (all integer widths widen to 64 bits)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
    /// Binary value
    Bytes(Vec<u8>),
    /// A backend-specific value that does not map to a scalar.
    Other {
        /// The database-specific type name
        type_name: String,
    },
}

impl Value {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert this value to a display string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => format!("\\x{}", hex::encode(b)),
            Value::Other { type_name } => format!("<{type_name}>"),
        }
    }

    /// Try to extract as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to extract as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as an f64 (integers widen).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract as a bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Metadata about a column in a query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Database-specific type name
    pub type_name: String,
    /// Column position (0-indexed)
    pub ordinal: usize,
}

impl ColumnInfo {
    /// Create a new column info.
    pub fn new(name: String, type_name: String, ordinal: usize) -> Self {
        Self {
            name,
            type_name,
            ordinal,
        }
    }
}

/// A row of values from a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Create a row from values.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get the number of values in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if this row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Iterate over values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_null_check() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());
        assert!(!Value::Text("hello".to_string()).is_null());
    }

    #[test]
    fn test_value_display_string() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(false).to_display_string(), "false");
        assert_eq!(Value::Int(-123).to_display_string(), "-123");
        assert_eq!(Value::Float(3.5).to_display_string(), "3.5");
        assert_eq!(Value::Text("hello".to_string()).to_display_string(), "hello");
        assert_eq!(
            Value::Bytes(vec![0xDE, 0xAD]).to_display_string(),
            "\\xdead"
        );
    }

    #[test]
    fn test_value_from_option() {
        let some_val: Value = Some(42i64).into();
        assert_eq!(some_val, Value::Int(42));

        let none_val: Value = Option::<i64>::None.into();
        assert_eq!(none_val, Value::Null);
    }

    #[test]
    fn test_row_access() {
        let row = Row::from_values(vec![
            Value::Int(1),
            Value::Text("hello".to_string()),
            Value::Bool(true),
        ]);

        assert_eq!(row.len(), 3);
        assert_eq!(row.get(0), Some(&Value::Int(1)));
        assert_eq!(row.get(1), Some(&Value::Text("hello".to_string())));
        assert_eq!(row.get(3), None);
    }

    #[test]
    fn test_row_serialization() {
        let row = Row::from_values(vec![Value::Int(7), Value::Null]);
        let json = serde_json::to_string(&row).unwrap();
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(row, back);
    }
}
