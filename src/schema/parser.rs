//! JSON schema parser.
//!
//! Parses Avro schema JSON into the [`AvroSchema`] tree. The parser keeps a
//! registry of named types so that repeated references - including a record
//! referencing its own name recursively - resolve to [`AvroSchema::Named`]
//! instead of duplicating (or infinitely nesting) the definition.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::schema::{
    AvroSchema, EnumSchema, FieldSchema, FixedSchema, RecordSchema, SchemaContext,
};

const RESERVED_KEYS: &[&str] = &[
    "type",
    "name",
    "namespace",
    "doc",
    "aliases",
    "fields",
    "symbols",
    "size",
    "items",
    "values",
    "default",
    "order",
];

/// Parse an Avro schema from a JSON string.
///
/// # Example
/// ```
/// use avrolens::schema::parse_schema;
///
/// let schema = parse_schema(r#""string""#).unwrap();
/// ```
pub fn parse_schema(json: &str) -> Result<AvroSchema, SchemaError> {
    let mut parser = SchemaParser::new();
    parser.parse_str(json)
}

/// Parse an Avro schema, sharing a registry of named types.
///
/// Named types already present in `context` are available as references
/// while parsing, and types declared by this schema are registered back
/// into `context`. Use this to parse several schema documents that refer
/// to each other by name.
pub fn parse_schema_with_context(
    json: &str,
    context: &mut SchemaContext,
) -> Result<AvroSchema, SchemaError> {
    let mut parser = SchemaParser::seeded(context);
    let schema = parser.parse_str(json)?;
    parser.register_into(context);
    Ok(schema)
}

/// Schema parser with a named type registry.
#[derive(Debug, Default)]
pub struct SchemaParser {
    /// Declared named types by fully qualified name
    named_types: HashMap<String, AvroSchema>,
    /// Enclosing namespace for resolving unqualified names
    current_namespace: Option<String>,
}

impl SchemaParser {
    /// Create a new parser with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser whose registry is pre-populated from a context.
    pub fn seeded(context: &SchemaContext) -> Self {
        let mut parser = Self::new();
        for (name, schema) in context.iter() {
            parser.named_types.insert(name.to_string(), schema.clone());
        }
        parser
    }

    /// Parse a schema from JSON text.
    pub fn parse_str(&mut self, json: &str) -> Result<AvroSchema, SchemaError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| SchemaError::ParseError(format!("Invalid JSON: {}", e)))?;
        self.parse(&value)
    }

    /// Parse a schema from a JSON value.
    pub fn parse(&mut self, value: &Value) -> Result<AvroSchema, SchemaError> {
        match value {
            Value::String(s) => self.parse_name(s),
            Value::Object(obj) => self.parse_object(obj),
            Value::Array(arr) => self.parse_union(arr),
            _ => Err(SchemaError::InvalidSchema(format!(
                "Expected string, object, or array, found: {}",
                value
            ))),
        }
    }

    /// Build a [`SchemaContext`] holding every named type declared so far.
    pub fn context(&self) -> SchemaContext {
        let mut context = SchemaContext::new();
        self.register_into(&mut context);
        context
    }

    fn register_into(&self, context: &mut SchemaContext) {
        for (name, schema) in &self.named_types {
            context.register(name.clone(), schema.clone());
        }
    }

    /// Resolve a primitive keyword or a named type reference.
    fn parse_name(&self, s: &str) -> Result<AvroSchema, SchemaError> {
        match s {
            "null" => Ok(AvroSchema::Null),
            "boolean" => Ok(AvroSchema::Boolean),
            "int" => Ok(AvroSchema::Int),
            "long" => Ok(AvroSchema::Long),
            "float" => Ok(AvroSchema::Float),
            "double" => Ok(AvroSchema::Double),
            "bytes" => Ok(AvroSchema::Bytes),
            "string" => Ok(AvroSchema::String),
            name => {
                let fullname = self.qualify(name);
                if self.named_types.contains_key(&fullname) {
                    Ok(AvroSchema::Named(fullname))
                } else if self.named_types.contains_key(name) {
                    // Already fully qualified
                    Ok(AvroSchema::Named(name.to_string()))
                } else {
                    Err(SchemaError::UnknownType(name.to_string()))
                }
            }
        }
    }

    fn parse_object(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let type_value = obj
            .get("type")
            .ok_or_else(|| SchemaError::InvalidSchema("Missing 'type' attribute".to_string()))?;

        match type_value {
            // {"type": [...]} and {"type": {...}} nest a full schema
            Value::Array(arr) => return self.parse_union(arr),
            Value::Object(inner) => return self.parse_object(inner),
            Value::String(_) => {}
            other => {
                return Err(SchemaError::InvalidSchema(format!(
                    "Invalid 'type' attribute: {}",
                    other
                )))
            }
        }

        let type_name = type_value.as_str().unwrap_or_default();
        match type_name {
            "null" => Ok(AvroSchema::Null),
            "boolean" => Ok(AvroSchema::Boolean),
            "int" => Ok(AvroSchema::Int),
            "long" => Ok(AvroSchema::Long),
            "float" => Ok(AvroSchema::Float),
            "double" => Ok(AvroSchema::Double),
            "bytes" => Ok(AvroSchema::Bytes),
            "string" => Ok(AvroSchema::String),
            "array" => {
                let items = obj.get("items").ok_or_else(|| {
                    SchemaError::InvalidSchema("Array schema missing 'items'".to_string())
                })?;
                Ok(AvroSchema::Array(Box::new(self.parse(items)?)))
            }
            "map" => {
                let values = obj.get("values").ok_or_else(|| {
                    SchemaError::InvalidSchema("Map schema missing 'values'".to_string())
                })?;
                Ok(AvroSchema::Map(Box::new(self.parse(values)?)))
            }
            "enum" => self.parse_enum(obj),
            "fixed" => self.parse_fixed(obj),
            "record" | "error" => self.parse_record(obj),
            other => self.parse_name(other),
        }
    }

    /// Unions are JSON arrays. Two branches with the same type-and-name
    /// pair make the union invalid.
    fn parse_union(&mut self, arr: &[Value]) -> Result<AvroSchema, SchemaError> {
        let mut branches = Vec::with_capacity(arr.len());
        let mut seen = HashSet::new();
        for item in arr {
            let branch = self.parse(item)?;
            if matches!(branch, AvroSchema::Union(_)) {
                return Err(SchemaError::InvalidSchema(
                    "Unions may not immediately contain other unions".to_string(),
                ));
            }
            let key = match branch.fullname() {
                Some(name) => name,
                None => branch.type_name().to_string(),
            };
            if !seen.insert(key.clone()) {
                return Err(SchemaError::InvalidSchema(format!(
                    "Duplicate union branch: {}",
                    key
                )));
            }
            branches.push(branch);
        }
        Ok(AvroSchema::Union(branches))
    }

    fn parse_enum(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let name = required_string(obj, "name")?;
        let namespace = self.effective_namespace(obj);

        let symbols = obj
            .get("symbols")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::InvalidSchema("Enum schema missing 'symbols'".into()))?
            .iter()
            .map(|s| {
                s.as_str().map(str::to_string).ok_or_else(|| {
                    SchemaError::InvalidSchema(format!("Enum symbol is not a string: {}", s))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut schema = EnumSchema::new(name, symbols);
        schema.namespace = namespace;
        schema.doc = optional_string(obj, "doc");
        schema.aliases = string_list(obj, "aliases");
        schema.properties = custom_properties(obj);

        let schema = AvroSchema::Enum(schema);
        self.declare(&schema)
    }

    fn parse_fixed(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let name = required_string(obj, "name")?;
        let size = obj
            .get("size")
            .and_then(Value::as_u64)
            .ok_or_else(|| SchemaError::InvalidSchema("Fixed schema missing 'size'".into()))?;

        let mut schema = FixedSchema::new(name, size as usize);
        schema.namespace = self.effective_namespace(obj);
        schema.aliases = string_list(obj, "aliases");
        schema.properties = custom_properties(obj);

        let schema = AvroSchema::Fixed(schema);
        self.declare(&schema)
    }

    fn parse_record(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let name = required_string(obj, "name")?;
        let namespace = self.effective_namespace(obj);
        let fullname = match &namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.clone(),
        };

        // Pre-register the record's name so a field of the record's own
        // type parses to a Named back-reference instead of recursing.
        self.named_types
            .insert(fullname.clone(), AvroSchema::Named(fullname.clone()));

        let previous_namespace = self.current_namespace.clone();
        self.current_namespace = namespace.clone();

        let fields = obj
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::InvalidSchema("Record schema missing 'fields'".into()))?
            .iter()
            .map(|f| self.parse_field(f))
            .collect::<Result<Vec<_>, _>>();

        self.current_namespace = previous_namespace;
        let fields = fields?;

        let mut record = RecordSchema::new(name, fields);
        record.namespace = namespace;
        record.doc = optional_string(obj, "doc");
        record.aliases = string_list(obj, "aliases");
        record.properties = custom_properties(obj);

        let schema = AvroSchema::Record(record);
        // Replace the placeholder with the finished definition
        self.named_types.insert(fullname, schema.clone());
        Ok(schema)
    }

    fn parse_field(&mut self, value: &Value) -> Result<FieldSchema, SchemaError> {
        let obj = value.as_object().ok_or_else(|| {
            SchemaError::InvalidSchema(format!("Record field is not an object: {}", value))
        })?;
        let name = required_string(obj, "name")?;
        let type_value = obj.get("type").ok_or_else(|| {
            SchemaError::InvalidSchema(format!("Field '{}' missing 'type'", name))
        })?;

        let mut field = FieldSchema::new(name, self.parse(type_value)?);
        field.default = obj.get("default").cloned();
        field.doc = optional_string(obj, "doc");
        field.aliases = string_list(obj, "aliases");
        Ok(field)
    }

    /// Register a freshly declared named type. A second declaration under
    /// the same fullname resolves to the first, matching Avro's
    /// one-definition rule.
    fn declare(&mut self, schema: &AvroSchema) -> Result<AvroSchema, SchemaError> {
        let fullname = match schema.fullname() {
            Some(name) => name,
            None => return Ok(schema.clone()),
        };
        if let Some(existing) = self.named_types.get(&fullname) {
            if !matches!(existing, AvroSchema::Named(_)) {
                return Ok(existing.clone());
            }
        }
        self.named_types.insert(fullname, schema.clone());
        Ok(schema.clone())
    }

    fn effective_namespace(&self, obj: &Map<String, Value>) -> Option<String> {
        optional_string(obj, "namespace").or_else(|| self.current_namespace.clone())
    }

    fn qualify(&self, name: &str) -> String {
        if name.contains('.') {
            return name.to_string();
        }
        match &self.current_namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.to_string(),
        }
    }
}

fn required_string(obj: &Map<String, Value>, key: &str) -> Result<String, SchemaError> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SchemaError::InvalidSchema(format!("Missing '{}' attribute", key)))
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Custom string properties: non-reserved keys with string values.
fn custom_properties(obj: &Map<String, Value>) -> BTreeMap<String, String> {
    obj.iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}
