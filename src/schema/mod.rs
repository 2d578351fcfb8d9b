//! Avro schema types and parsing.
//!
//! This module defines the schema algebra (primitives, complex types, and
//! named type references), the JSON schema parser, and the named type
//! context used to resolve recursive references.

mod context;
mod parser;
mod types;

pub use context::SchemaContext;
pub use parser::{parse_schema, parse_schema_with_context, SchemaParser};
pub use types::{AvroSchema, EnumSchema, FieldSchema, FixedSchema, RecordSchema};
