//! Typed cell values exchanged between the engine and column accessors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value read from or written to a cell.
///
/// Column accessors convert between domain fields and `CellValue`; the edit
/// session snapshots them and the fill handle extrapolates them. Serialized
/// untagged, so JSON `null`, booleans, numbers and strings map directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// No value.
    #[default]
    Empty,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Floating-point value.
    Number(f64),
    /// Text value.
    Text(String),
}

impl CellValue {
    /// Returns true for [`CellValue::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the value as a float if it is numeric.
    ///
    /// Text is not parsed; fill series detection only looks at typed numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an integer if it is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns true if the value is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Number(_))
    }

    /// Bitwise equality: `Number` values compare by bit pattern, so `NaN`
    /// equals itself and `0.0` differs from `-0.0`.
    pub fn same_bits(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(CellValue::from(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::from(2.5).as_f64(), Some(2.5));
        assert_eq!(CellValue::from("3").as_f64(), None);
        assert!(CellValue::Integer(1).is_numeric());
        assert!(!CellValue::Empty.is_numeric());
    }

    #[test]
    fn test_json_values_map_to_variants() {
        let values: Vec<CellValue> = serde_json::from_str(r#"[null, true, 7, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                CellValue::Empty,
                CellValue::Bool(true),
                CellValue::Integer(7),
                CellValue::Number(2.5),
                CellValue::Text("x".into()),
            ]
        );
        assert_eq!(serde_json::to_string(&CellValue::Integer(-3)).unwrap(), "-3");
    }

    #[test]
    fn test_same_bits() {
        let nan = CellValue::Number(f64::NAN);
        assert!(nan.same_bits(&nan.clone()));
        assert!(!CellValue::Number(0.0).same_bits(&CellValue::Number(-0.0)));
        assert!(CellValue::from("a").same_bits(&CellValue::from("a")));
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::from("Red").to_string(), "Red");
        assert_eq!(CellValue::Integer(7).to_string(), "7");
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::from(None::<i64>), CellValue::Empty);
    }
}
