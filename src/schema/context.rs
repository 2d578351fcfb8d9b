//! Registry of named types used to resolve [`AvroSchema::Named`] references.
//!
//! Recursive schemas never form ownership cycles: a record owns its
//! definition once, and every further reference (including self-reference)
//! is a name looked up here.

use std::collections::HashMap;

use crate::schema::AvroSchema;

/// Mapping from fully qualified name to the owning schema definition.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    named_types: HashMap<String, AvroSchema>,
}

impl SchemaContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named type under its fully qualified name.
    pub fn register(&mut self, name: String, schema: AvroSchema) {
        self.named_types.insert(name, schema);
    }

    /// Get a named type from the context.
    pub fn get(&self, name: &str) -> Option<&AvroSchema> {
        self.named_types.get(name)
    }

    /// Check whether a named type exists in the context.
    pub fn contains(&self, name: &str) -> bool {
        self.named_types.contains_key(name)
    }

    /// Number of registered named types.
    pub fn len(&self) -> usize {
        self.named_types.len()
    }

    /// Whether the context holds no named types.
    pub fn is_empty(&self) -> bool {
        self.named_types.is_empty()
    }

    /// Iterate over registered (fullname, schema) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AvroSchema)> + '_ {
        self.named_types.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a context by collecting every named type declared in a schema.
    pub fn build_from_schema(schema: &AvroSchema) -> Self {
        let mut context = Self::new();
        context.collect(schema);
        context
    }

    fn collect(&mut self, schema: &AvroSchema) {
        match schema {
            AvroSchema::Record(record) => {
                self.named_types.insert(record.fullname(), schema.clone());
                for field in &record.fields {
                    self.collect(&field.schema);
                }
            }
            AvroSchema::Enum(e) => {
                self.named_types.insert(e.fullname(), schema.clone());
            }
            AvroSchema::Fixed(f) => {
                self.named_types.insert(f.fullname(), schema.clone());
            }
            AvroSchema::Array(items) => self.collect(items),
            AvroSchema::Map(values) => self.collect(values),
            AvroSchema::Union(branches) => {
                for branch in branches {
                    self.collect(branch);
                }
            }
            // Primitives and Named references declare nothing
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, RecordSchema};

    #[test]
    fn collects_nested_named_types() {
        let inner = AvroSchema::Record(RecordSchema::new(
            "Inner",
            vec![FieldSchema::new("x", AvroSchema::Int)],
        ));
        let outer = AvroSchema::Record(RecordSchema::new(
            "Outer",
            vec![FieldSchema::new("inner", inner)],
        ));

        let ctx = SchemaContext::build_from_schema(&outer);
        assert_eq!(ctx.len(), 2);
        assert!(ctx.contains("Outer"));
        assert!(ctx.contains("Inner"));
    }

    #[test]
    fn collects_through_unions_and_containers() {
        let node = AvroSchema::Record(
            RecordSchema::new(
                "Node",
                vec![FieldSchema::new(
                    "next",
                    AvroSchema::Union(vec![
                        AvroSchema::Null,
                        AvroSchema::Named("ns.Node".into()),
                    ]),
                )],
            )
            .with_namespace("ns"),
        );
        let schema = AvroSchema::Array(Box::new(node));

        let ctx = SchemaContext::build_from_schema(&schema);
        assert!(ctx.contains("ns.Node"));
        assert!(!ctx.contains("Node"));
    }
}
