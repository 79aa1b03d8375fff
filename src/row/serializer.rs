use crate::common::{MinirelError, Result};

use super::schema::{read_u32, Schema};
use super::value::{DataType, Value};

/// Encodes one row against its schema.
///
/// Each column is a presence byte (0 = NULL, 1 = present) followed by the
/// value bytes when present: a big-endian u32 for numbers, a u32 length
/// prefix plus UTF-8 bytes for text. Values must already be positional and
/// type-checked; missing trailing values encode as NULL.
pub fn encode_row(schema: &Schema, values: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();

    for (i, column) in schema.columns().iter().enumerate() {
        let value = values.get(i).unwrap_or(&Value::Null);
        match value {
            Value::Null => out.push(0),
            Value::Number(n) => {
                out.push(1);
                out.extend_from_slice(&n.to_be_bytes());
            }
            Value::Text(s) => {
                out.push(1);
                out.extend_from_slice(&(s.len() as u32).to_be_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
    }

    out
}

/// Decodes one row against its schema.
pub fn decode_row(schema: &Schema, data: &[u8]) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(schema.len());
    let mut pos = 0;

    for column in schema.columns() {
        let present = *data.get(pos).ok_or(MinirelError::CorruptRow)?;
        pos += 1;

        if present == 0 {
            values.push(Value::Null);
            continue;
        }

        match column.data_type {
            DataType::Number => {
                values.push(Value::Number(read_u32(data, pos)?));
                pos += 4;
            }
            DataType::Text => {
                let len = read_u32(data, pos)? as usize;
                pos += 4;
                let bytes = data.get(pos..pos + len).ok_or(MinirelError::CorruptRow)?;
                let text =
                    String::from_utf8(bytes.to_vec()).map_err(|_| MinirelError::CorruptRow)?;
                values.push(Value::Text(text));
                pos += len;
            }
        }
    }

    Ok(values)
}
