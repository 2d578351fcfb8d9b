//! Materialisation of field defaults.
//!
//! Field defaults arrive from the parser as the JSON literals they were
//! declared with. The record projector coerces them into typed values once,
//! when the projector is built, so nothing is converted per read. Every
//! primitive and complex type is covered; a default that cannot be coerced
//! fails the build.

use std::sync::Arc;

use serde_json::Value;

use crate::error::SchemaError;
use crate::generic::GenericRecord;
use crate::schema::{AvroSchema, FixedSchema, SchemaContext};
use crate::value::AvroValue;

/// Coerce a JSON default literal into a value of the declared type.
///
/// `field` is the reader field the default belongs to, used in error
/// messages only.
pub fn materialise(
    field: &str,
    json: &Value,
    schema: &AvroSchema,
    names: &SchemaContext,
) -> Result<AvroValue, SchemaError> {
    let fail = |message: String| SchemaError::InvalidDefault {
        field: field.to_string(),
        message,
    };

    match (json, schema) {
        (Value::Null, AvroSchema::Null) => Ok(AvroValue::Null),

        (Value::Bool(b), AvroSchema::Boolean) => Ok(AvroValue::Boolean(*b)),

        (Value::Number(n), AvroSchema::Int) => {
            let v = json_integer(n)
                .ok_or_else(|| fail(format!("cannot coerce {} to int", n)))?;
            i32::try_from(v)
                .map(AvroValue::Int)
                .map_err(|_| fail(format!("{} out of range for int", v)))
        }
        (Value::Number(n), AvroSchema::Long) => json_integer(n)
            .map(AvroValue::Long)
            .ok_or_else(|| fail(format!("cannot coerce {} to long", n))),
        (Value::Number(n), AvroSchema::Float) => n
            .as_f64()
            .map(|v| AvroValue::Float(v as f32))
            .ok_or_else(|| fail(format!("cannot coerce {} to float", n))),
        (Value::Number(n), AvroSchema::Double) => n
            .as_f64()
            .map(AvroValue::Double)
            .ok_or_else(|| fail(format!("cannot coerce {} to double", n))),

        (Value::String(s), AvroSchema::String) => Ok(AvroValue::String(s.clone())),

        // Bytes and fixed defaults are JSON strings whose code points are
        // the byte values (ISO-8859-1)
        (Value::String(s), AvroSchema::Bytes) => {
            latin1_bytes(s).map(AvroValue::Bytes).map_err(fail)
        }
        (Value::String(s), AvroSchema::Fixed(fixed)) => {
            let bytes = latin1_bytes(s).map_err(fail)?;
            check_fixed_size(&bytes, fixed).map_err(fail)?;
            Ok(AvroValue::Fixed(bytes))
        }

        (Value::String(s), AvroSchema::Enum(e)) => {
            let index = e
                .symbol_index(s)
                .ok_or_else(|| fail(format!("'{}' is not a symbol of enum '{}'", s, e.name)))?;
            Ok(AvroValue::Enum(index as i32, s.clone()))
        }

        (Value::Array(items), AvroSchema::Array(item_schema)) => {
            let values = items
                .iter()
                .map(|item| materialise(field, item, item_schema, names))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AvroValue::Array(values))
        }

        (Value::Object(obj), AvroSchema::Map(value_schema)) => {
            let entries = obj
                .iter()
                .map(|(k, v)| Ok((k.clone(), materialise(field, v, value_schema, names)?)))
                .collect::<Result<Vec<_>, SchemaError>>()?;
            Ok(AvroValue::Map(entries))
        }

        (Value::Object(obj), AvroSchema::Record(record)) => {
            let mut result = GenericRecord::new(Arc::new(record.clone()));
            for f in &record.fields {
                let value = match obj.get(&f.name).or(f.default.as_ref()) {
                    Some(v) => materialise(field, v, &f.schema, names)?,
                    None => {
                        return Err(fail(format!(
                            "record default is missing field '{}'",
                            f.name
                        )))
                    }
                };
                result.set(f.name.clone(), value);
            }
            Ok(AvroValue::Record(result))
        }

        // A union default always belongs to the union's first branch
        (json, AvroSchema::Union(branches)) => match branches.first() {
            Some(first) => materialise(field, json, first, names),
            None => Err(fail("empty union".to_string())),
        },

        (json, AvroSchema::Named(name)) => {
            let resolved = names
                .get(name)
                .ok_or_else(|| SchemaError::UnknownType(name.clone()))?;
            materialise(field, json, resolved, names)
        }

        (json, schema) => Err(fail(format!(
            "cannot coerce {} to '{}'",
            json,
            schema.type_name()
        ))),
    }
}

/// JSON numbers may arrive as floating-point even for integral fields;
/// narrow when the value is exactly representable.
fn json_integer(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn latin1_bytes(s: &str) -> Result<Vec<u8>, String> {
    s.chars()
        .map(|c| {
            u8::try_from(c as u32)
                .map_err(|_| format!("code point {:?} does not fit in a byte", c))
        })
        .collect()
}

fn check_fixed_size(bytes: &[u8], fixed: &FixedSchema) -> Result<(), String> {
    if bytes.len() == fixed.size {
        Ok(())
    } else {
        Err(format!(
            "fixed '{}' default has {} bytes, expected {}",
            fixed.name,
            bytes.len(),
            fixed.size
        ))
    }
}
