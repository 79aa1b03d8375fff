use std::fmt;

use crate::common::{MinirelError, Result};

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Number,
    Text,
}

impl DataType {
    pub fn to_byte(self) -> u8 {
        match self {
            DataType::Number => 0,
            DataType::Text => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(DataType::Number),
            1 => Ok(DataType::Text),
            _ => Err(MinirelError::UnknownColumnType(byte.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Number => write!(f, "NUMBER"),
            DataType::Text => write!(f, "TEXT"),
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Number(u32),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value can be stored in a column of the given type.
    /// NULL is compatible with every type; nullability is checked elsewhere.
    pub fn matches_type(&self, data_type: DataType) -> bool {
        match self {
            Value::Null => true,
            Value::Number(_) => data_type == DataType::Number,
            Value::Text(_) => data_type == DataType::Text,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_byte_roundtrip() {
        assert_eq!(DataType::from_byte(DataType::Number.to_byte()).unwrap(), DataType::Number);
        assert_eq!(DataType::from_byte(DataType::Text.to_byte()).unwrap(), DataType::Text);
        assert!(DataType::from_byte(9).is_err());
    }

    #[test]
    fn test_value_type_compatibility() {
        assert!(Value::Number(1).matches_type(DataType::Number));
        assert!(!Value::Number(1).matches_type(DataType::Text));
        assert!(Value::Text("x".into()).matches_type(DataType::Text));
        assert!(Value::Null.matches_type(DataType::Number));
        assert!(Value::Null.matches_type(DataType::Text));
    }
}
