//! Error types for schema handling, decoding, projection, and the registry client.

use std::io;
use thiserror::Error;

/// Errors that can occur while parsing or manipulating schemas
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema JSON is structurally invalid
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Schema text is not valid JSON
    #[error("Parse error: {0}")]
    ParseError(String),
    /// A named type reference could not be resolved
    #[error("Unknown type name: {0}")]
    UnknownType(String),
    /// A field default cannot be coerced to the field's declared type
    #[error("Invalid default for field '{field}': {message}")]
    InvalidDefault { field: String, message: String },
}

/// Errors that can occur while decoding binary tokens
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid Avro data
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Unexpected end of data
    #[error("Unexpected end of input")]
    UnexpectedEof,
    /// Invalid varint encoding
    #[error("Invalid varint encoding")]
    InvalidVarint,
    /// String is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Errors raised while building or running a projector
#[derive(Debug, Error)]
pub enum ProjectError {
    /// No resolution rule maps the writer schema onto the reader schema.
    /// Raised at construction time, before any byte is read.
    #[error("Incompatible schemas: {0}")]
    Incompatible(String),

    /// Decoder failure, propagated unchanged
    #[error("Decoder error: {0}")]
    Decode(#[from] DecodeError),

    /// Writer emitted a union branch index with no mapping in the variant table
    #[error("Union index {index} out of range (0..{len})")]
    UnionIndexOutOfRange { index: i64, len: usize },

    /// Writer symbol is not present in the reader enum
    #[error("Enum symbol '{symbol}' not present in reader enum '{reader}'")]
    EnumSymbolMissing { symbol: String, reader: String },

    /// The supplied target cannot be populated by the root projector
    #[error("Invalid projection target: {0}")]
    InvalidTarget(String),

    /// Schema-level failure (unresolved name, bad default)
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Errors from the schema registry client
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered with a non-success status
    #[error("Unexpected response from the schema registry: {status}: {message}")]
    UnexpectedResponse { status: u16, message: String },

    /// The registry returned a schema that does not parse
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// TLS material could not be read
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
