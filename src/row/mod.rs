mod schema;
mod serializer;
mod value;

pub use schema::{Column, Schema};
pub use serializer::{decode_row, encode_row};
pub use value::{DataType, Value};
