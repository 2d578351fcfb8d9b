//! Decoded Avro values.

use base64::Engine;
use serde_json::{Map, Value};

use crate::generic::GenericRecord;

/// The erased sum of decoded Avro values.
///
/// Union branches are not wrapped: projecting a union yields the value of
/// whichever branch the writer emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Fixed-size byte array
    Fixed(Vec<u8>),
    /// Enum symbol: index into the reader's symbol list, plus the symbol
    Enum(i32, String),
    /// Array of values
    Array(Vec<AvroValue>),
    /// Map with string keys, in wire order
    Map(Vec<(String, AvroValue)>),
    /// Record with its schema attached
    Record(GenericRecord),
}

impl AvroValue {
    /// Render the value as JSON.
    ///
    /// Bytes and fixed values render as base64 strings; enums render as
    /// their symbol.
    pub fn to_json(&self) -> Value {
        match self {
            AvroValue::Null => Value::Null,
            AvroValue::Boolean(b) => Value::Bool(*b),
            AvroValue::Int(i) => Value::Number((*i).into()),
            AvroValue::Long(l) => Value::Number((*l).into()),
            AvroValue::Float(f) => serde_json::Number::from_f64(f64::from(*f))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            AvroValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            AvroValue::Bytes(b) | AvroValue::Fixed(b) => Value::String(
                base64::engine::general_purpose::STANDARD.encode(b),
            ),
            AvroValue::String(s) => Value::String(s.clone()),
            AvroValue::Enum(_, symbol) => Value::String(symbol.clone()),
            AvroValue::Array(items) => {
                Value::Array(items.iter().map(AvroValue::to_json).collect())
            }
            AvroValue::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.to_json());
                }
                Value::Object(map)
            }
            AvroValue::Record(record) => record.to_json(),
        }
    }
}
