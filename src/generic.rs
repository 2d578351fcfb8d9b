//! Generic record: a dynamic field-name to value container bound to its
//! record schema.
//!
//! This is the target the record projector materialises when the caller
//! asks for a generic result rather than a typed one. Fields are populated
//! in writer order, defaults are injected afterwards, and the record is not
//! mutated once projection returns it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::schema::RecordSchema;
use crate::value::AvroValue;

/// Mapping from field name to decoded value, carrying the record schema.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericRecord {
    schema: Arc<RecordSchema>,
    values: HashMap<String, AvroValue>,
}

impl GenericRecord {
    /// Create an empty record bound to `schema`.
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        let capacity = schema.fields.len();
        Self {
            schema,
            values: HashMap::with_capacity(capacity),
        }
    }

    /// The record schema this record conforms to.
    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Set a field value. An existing value under the same name is replaced.
    pub fn set(&mut self, name: impl Into<String>, value: AvroValue) {
        self.values.insert(name.into(), value);
    }

    /// Set several fields at once.
    pub fn set_all(&mut self, entries: impl IntoIterator<Item = (String, AvroValue)>) {
        for (name, value) in entries {
            self.values.insert(name, value);
        }
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&AvroValue> {
        self.values.get(name)
    }

    /// Number of populated fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no field has been populated.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over populated (name, value) pairs in schema field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AvroValue)> + '_ {
        self.schema
            .fields
            .iter()
            .filter_map(|f| self.values.get(&f.name).map(|v| (f.name.as_str(), v)))
    }

    /// Render the record as JSON, fields in schema order. Unpopulated
    /// fields render as null.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for field in &self.schema.fields {
            let value = self
                .values
                .get(&field.name)
                .map(AvroValue::to_json)
                .unwrap_or(Value::Null);
            map.insert(field.name.clone(), value);
        }
        Value::Object(map)
    }
}

impl fmt::Display for GenericRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
