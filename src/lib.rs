//! Read-side Avro: schema resolution and datum projection.
//!
//! Given a *writer schema* (how a datum was encoded) and a *reader schema*
//! (how the consumer wants it), this library compiles a projector that
//! decodes the binary datum in writer order and materialises a value
//! conformant to the reader schema, applying the Avro resolution rules:
//! numeric promotion, union narrowing and widening, enum symbol remapping,
//! field renaming via aliases, default injection, and draining of
//! writer-only fields.
//!
//! ```
//! use avrolens::decoder::BinaryDecoder;
//! use avrolens::projector::DatumProjector;
//! use avrolens::schema::parse_schema;
//! use avrolens::value::AvroValue;
//!
//! let writer = parse_schema(r#""int""#).unwrap();
//! let reader = parse_schema(r#""long""#).unwrap();
//! let projector = DatumProjector::new(&reader, &writer).unwrap();
//!
//! let mut dec = BinaryDecoder::new(&[0x02]); // zigzag for 1
//! assert_eq!(projector.project(&mut dec).unwrap(), AvroValue::Long(1));
//! ```
//!
//! A Confluent-style schema registry client with id and fingerprint caches
//! lives in [`registry`].

pub mod decoder;
pub mod error;
pub mod generic;
pub mod projector;
pub mod registry;
pub mod schema;
pub mod value;

// Re-export main types
pub use decoder::{BinaryDecoder, Decoder};
pub use error::{DecodeError, ProjectError, RegistryError, SchemaError};
pub use generic::GenericRecord;
pub use projector::{make_projector, DatumProjector, ProjectionTarget, Projector};
pub use registry::{Fingerprint, RegistryClient, RegistryConfig};
pub use schema::{
    parse_schema, parse_schema_with_context, AvroSchema, EnumSchema, FieldSchema, FixedSchema,
    RecordSchema, SchemaContext, SchemaParser,
};
pub use value::AvroValue;
