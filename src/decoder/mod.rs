//! Binary token decoder.
//!
//! The projector pulls primitive tokens through the [`Decoder`] trait in
//! writer-schema order; [`BinaryDecoder`] implements the trait over a byte
//! slice holding a datum in Avro binary encoding. Every operation surfaces
//! failures unchanged to the caller - nothing is retried or swallowed.

pub mod varint;

use crate::error::DecodeError;

pub use varint::{decode_varint, decode_zigzag, encode_varint, encode_zigzag};

/// Stream of primitive Avro tokens consumed by a projector.
///
/// Array and map headers are block-framed: `read_array_start` /
/// `array_next` yield the number of items in the next block, and a zero
/// count terminates the sequence (likewise for maps).
pub trait Decoder {
    /// Read a null value. Consumes nothing.
    fn read_null(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    /// Read a boolean.
    fn read_boolean(&mut self) -> Result<bool, DecodeError>;

    /// Read a 32-bit signed integer (zigzag varint).
    fn read_int(&mut self) -> Result<i32, DecodeError>;

    /// Read a 64-bit signed integer (zigzag varint).
    fn read_long(&mut self) -> Result<i64, DecodeError>;

    /// Read a 32-bit IEEE 754 float, little-endian.
    fn read_float(&mut self) -> Result<f32, DecodeError>;

    /// Read a 64-bit IEEE 754 double, little-endian.
    fn read_double(&mut self) -> Result<f64, DecodeError>;

    /// Read a length-prefixed byte block.
    fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError>;

    /// Read a length-prefixed UTF-8 string.
    fn read_string(&mut self) -> Result<String, DecodeError>;

    /// Read exactly `size` bytes.
    fn read_fixed(&mut self, size: usize) -> Result<Vec<u8>, DecodeError>;

    /// Read an enum symbol index.
    fn read_enum(&mut self) -> Result<i32, DecodeError>;

    /// Read the item count of the first array block.
    fn read_array_start(&mut self) -> Result<i64, DecodeError>;

    /// Read the item count of the next array block; zero ends the array.
    fn array_next(&mut self) -> Result<i64, DecodeError>;

    /// Read the entry count of the first map block.
    fn read_map_start(&mut self) -> Result<i64, DecodeError>;

    /// Read the entry count of the next map block; zero ends the map.
    fn map_next(&mut self) -> Result<i64, DecodeError>;

    /// Read a union branch index.
    fn read_union_index(&mut self) -> Result<i64, DecodeError>;
}

/// Decoder over an in-memory byte slice in Avro binary encoding.
#[derive(Debug)]
pub struct BinaryDecoder<'a> {
    input: &'a [u8],
}

impl<'a> BinaryDecoder<'a> {
    /// Create a decoder reading from the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.input.len() < n {
            return Err(DecodeError::UnexpectedEof);
        }
        let (head, tail) = self.input.split_at(n);
        self.input = tail;
        Ok(head)
    }

    /// Block counts for arrays and maps. A negative count means |count|
    /// items preceded by the block's byte size, which exists only to let
    /// readers skip whole blocks; it is read and discarded here.
    fn read_block_count(&mut self) -> Result<i64, DecodeError> {
        let count = decode_zigzag(&mut self.input)?;
        if count < 0 {
            let _byte_size = decode_zigzag(&mut self.input)?;
            Ok(-count)
        } else {
            Ok(count)
        }
    }
}

impl Decoder for BinaryDecoder<'_> {
    fn read_boolean(&mut self) -> Result<bool, DecodeError> {
        match self.take(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidData(format!(
                "Invalid boolean value: {}, expected 0 or 1",
                other
            ))),
        }
    }

    fn read_int(&mut self) -> Result<i32, DecodeError> {
        let long = self.read_long()?;
        i32::try_from(long).map_err(|_| {
            DecodeError::InvalidData(format!("Integer overflow: {} does not fit in i32", long))
        })
    }

    fn read_long(&mut self) -> Result<i64, DecodeError> {
        decode_zigzag(&mut self.input)
    }

    fn read_float(&mut self) -> Result<f32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_double(&mut self) -> Result<f64, DecodeError> {
        let bytes = self.take(8)?;
        Ok(f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_long()?;
        if len < 0 {
            return Err(DecodeError::InvalidData(format!(
                "Negative bytes length: {}",
                len
            )));
        }
        Ok(self.take(len as usize)?.to_vec())
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(DecodeError::from)
    }

    fn read_fixed(&mut self, size: usize) -> Result<Vec<u8>, DecodeError> {
        Ok(self.take(size)?.to_vec())
    }

    fn read_enum(&mut self) -> Result<i32, DecodeError> {
        self.read_int()
    }

    fn read_array_start(&mut self) -> Result<i64, DecodeError> {
        self.read_block_count()
    }

    fn array_next(&mut self) -> Result<i64, DecodeError> {
        self.read_block_count()
    }

    fn read_map_start(&mut self) -> Result<i64, DecodeError> {
        self.read_block_count()
    }

    fn map_next(&mut self) -> Result<i64, DecodeError> {
        self.read_block_count()
    }

    fn read_union_index(&mut self) -> Result<i64, DecodeError> {
        self.read_long()
    }
}
