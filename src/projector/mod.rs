//! Schema resolution compiled into projectors.
//!
//! A projector is built once for a (reader, writer) schema pair and can
//! then run any number of times. Its tree mirrors the writer schema,
//! because the wire format follows the writer; the reader schema decides
//! how each token is adapted: numeric promotion, union narrowing and
//! widening, enum symbol remapping, field renaming through aliases,
//! default injection, and draining of writer-only fields.
//!
//! Construction fails on any pair the Avro resolution rules do not permit,
//! before a single byte is read. Once built, a projector is immutable and
//! can be shared across concurrent reads as long as each read brings its
//! own decoder and target.

mod defaults;
mod record;

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::decoder::Decoder;
use crate::error::{DecodeError, ProjectError};
use crate::generic::GenericRecord;
use crate::schema::{AvroSchema, EnumSchema, SchemaContext};
use crate::value::AvroValue;

pub use record::RecordProjector;

/// A typed destination for record projection.
///
/// Implementors describe their field slots: `put_field` accepts a decoded
/// value for the named reader field and returns `false` when no such slot
/// exists, in which case the value is simply dropped.
pub trait ProjectionTarget {
    /// Offer a decoded field value to the target.
    fn put_field(&mut self, name: &str, value: AvroValue) -> bool;
}

impl ProjectionTarget for GenericRecord {
    fn put_field(&mut self, name: &str, value: AvroValue) -> bool {
        self.set(name, value);
        true
    }
}

/// Compiled reader for one (reader, writer) schema pair.
///
/// Variants track the writer's wire shape; the reader's view is baked into
/// the variant choice at construction time.
#[derive(Debug)]
pub enum Projector {
    /// null -> null
    Null,
    /// boolean -> boolean
    Boolean,
    /// int -> int
    Int,
    /// int -> long
    IntAsLong,
    /// int -> float
    IntAsFloat,
    /// int -> double
    IntAsDouble,
    /// long -> long
    Long,
    /// long -> float
    LongAsFloat,
    /// long -> double
    LongAsDouble,
    /// float -> float
    Float,
    /// float -> double
    FloatAsDouble,
    /// double -> double
    Double,
    /// bytes -> bytes
    Bytes,
    /// bytes -> string (UTF-8 interpretation)
    BytesAsString,
    /// string -> string
    String,
    /// string -> bytes (UTF-8 bytes)
    StringAsBytes,
    /// fixed -> fixed of the same name and size
    Fixed(usize),
    /// enum with writer-to-reader symbol remapping
    Enum(EnumProjector),
    /// array with an item projector
    Array(Box<Projector>),
    /// map with a value projector; keys are always strings
    Map(Box<Projector>),
    /// union dispatch by writer branch index
    Union(UnionProjector),
    /// record with field alignment and defaults
    Record(RecordProjector),
    /// recursive record reference; body built lazily on first use
    Recursive(RecursiveProjector),
}

impl Projector {
    /// Pull one value from the decoder, adapted to the reader schema.
    pub fn project(&self, dec: &mut dyn Decoder) -> Result<AvroValue, ProjectError> {
        match self {
            Projector::Null => {
                dec.read_null()?;
                Ok(AvroValue::Null)
            }
            Projector::Boolean => Ok(AvroValue::Boolean(dec.read_boolean()?)),
            Projector::Int => Ok(AvroValue::Int(dec.read_int()?)),
            Projector::IntAsLong => Ok(AvroValue::Long(i64::from(dec.read_int()?))),
            Projector::IntAsFloat => Ok(AvroValue::Float(dec.read_int()? as f32)),
            Projector::IntAsDouble => Ok(AvroValue::Double(f64::from(dec.read_int()?))),
            Projector::Long => Ok(AvroValue::Long(dec.read_long()?)),
            Projector::LongAsFloat => Ok(AvroValue::Float(dec.read_long()? as f32)),
            Projector::LongAsDouble => Ok(AvroValue::Double(dec.read_long()? as f64)),
            Projector::Float => Ok(AvroValue::Float(dec.read_float()?)),
            Projector::FloatAsDouble => Ok(AvroValue::Double(f64::from(dec.read_float()?))),
            Projector::Double => Ok(AvroValue::Double(dec.read_double()?)),
            Projector::Bytes => Ok(AvroValue::Bytes(dec.read_bytes()?)),
            Projector::BytesAsString => {
                let bytes = dec.read_bytes()?;
                let s = String::from_utf8(bytes).map_err(DecodeError::from)?;
                Ok(AvroValue::String(s))
            }
            Projector::String => Ok(AvroValue::String(dec.read_string()?)),
            Projector::StringAsBytes => Ok(AvroValue::Bytes(dec.read_string()?.into_bytes())),
            Projector::Fixed(size) => Ok(AvroValue::Fixed(dec.read_fixed(*size)?)),
            Projector::Enum(e) => e.project(dec),
            Projector::Array(items) => {
                let mut values = Vec::new();
                let mut count = dec.read_array_start()?;
                while count > 0 {
                    values.reserve(count as usize);
                    for _ in 0..count {
                        values.push(items.project(dec)?);
                    }
                    count = dec.array_next()?;
                }
                Ok(AvroValue::Array(values))
            }
            Projector::Map(values_projector) => {
                let mut entries = Vec::new();
                let mut count = dec.read_map_start()?;
                while count > 0 {
                    entries.reserve(count as usize);
                    for _ in 0..count {
                        let key = dec.read_string()?;
                        let value = values_projector.project(dec)?;
                        entries.push((key, value));
                    }
                    count = dec.map_next()?;
                }
                Ok(AvroValue::Map(entries))
            }
            Projector::Union(u) => u.project(dec),
            Projector::Record(r) => Ok(AvroValue::Record(r.project_generic(dec)?)),
            Projector::Recursive(r) => r.body()?.project(dec),
        }
    }
}

/// Enum projector with the symbol remapping precomputed.
#[derive(Debug)]
pub struct EnumProjector {
    reader_name: String,
    writer_symbols: Vec<String>,
    /// Writer symbol index to reader symbol index; `None` marks a writer
    /// symbol the reader enum does not contain.
    mapping: Vec<Option<i32>>,
}

impl EnumProjector {
    fn new(reader: &EnumSchema, writer: &EnumSchema) -> Self {
        let mapping = writer
            .symbols
            .iter()
            .map(|symbol| reader.symbol_index(symbol).map(|i| i as i32))
            .collect();
        Self {
            reader_name: reader.name.clone(),
            writer_symbols: writer.symbols.clone(),
            mapping,
        }
    }

    fn project(&self, dec: &mut dyn Decoder) -> Result<AvroValue, ProjectError> {
        let index = dec.read_enum()?;
        if index < 0 || index as usize >= self.writer_symbols.len() {
            return Err(DecodeError::InvalidData(format!(
                "Enum index {} out of range (0..{})",
                index,
                self.writer_symbols.len()
            ))
            .into());
        }
        let symbol = &self.writer_symbols[index as usize];
        match self.mapping[index as usize] {
            Some(reader_index) => Ok(AvroValue::Enum(reader_index, symbol.clone())),
            None => Err(ProjectError::EnumSymbolMissing {
                symbol: symbol.clone(),
                reader: self.reader_name.clone(),
            }),
        }
    }
}

/// Union projector: one slot per writer branch index.
///
/// When the reader narrowed the union to a single branch, every other slot
/// is empty and reading its index is a runtime error.
#[derive(Debug)]
pub struct UnionProjector {
    variants: Vec<Option<Box<Projector>>>,
}

impl UnionProjector {
    fn project(&self, dec: &mut dyn Decoder) -> Result<AvroValue, ProjectError> {
        let index = dec.read_union_index()?;
        let slot = if index < 0 {
            None
        } else {
            self.variants.get(index as usize)
        };
        match slot {
            Some(Some(projector)) => projector.project(dec),
            _ => Err(ProjectError::UnionIndexOutOfRange {
                index,
                len: self.variants.len(),
            }),
        }
    }
}

/// Deferred projector for a recursive record reference.
///
/// The body cannot be built eagerly - a record field of the record's own
/// type would recurse forever - so it is compiled on first use and cached.
pub struct RecursiveProjector {
    reader: String,
    writer: String,
    reader_names: Arc<SchemaContext>,
    writer_names: Arc<SchemaContext>,
    body: OnceLock<Box<Projector>>,
}

impl std::fmt::Debug for RecursiveProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveProjector")
            .field("reader", &self.reader)
            .field("writer", &self.writer)
            .field("built", &self.body.get().is_some())
            .finish()
    }
}

impl RecursiveProjector {
    fn body(&self) -> Result<&Projector, ProjectError> {
        if let Some(body) = self.body.get() {
            return Ok(body);
        }
        let reader = self
            .reader_names
            .get(&self.reader)
            .cloned()
            .ok_or_else(|| crate::error::SchemaError::UnknownType(self.reader.clone()))?;
        let writer = self
            .writer_names
            .get(&self.writer)
            .cloned()
            .ok_or_else(|| crate::error::SchemaError::UnknownType(self.writer.clone()))?;
        let compiler = Compiler::new(&self.reader_names, &self.writer_names);
        let built = compiler.compile(&reader, &writer)?;
        Ok(self.body.get_or_init(|| Box::new(built)))
    }
}

/// Builds projector trees by joint recursion over (reader, writer).
pub(crate) struct Compiler<'a> {
    reader_names: &'a Arc<SchemaContext>,
    writer_names: &'a Arc<SchemaContext>,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(
        reader_names: &'a Arc<SchemaContext>,
        writer_names: &'a Arc<SchemaContext>,
    ) -> Self {
        Self {
            reader_names,
            writer_names,
        }
    }

    pub(crate) fn reader_names(&self) -> &SchemaContext {
        self.reader_names
    }

    /// A compiler that reads the writer schema back as itself. Used for
    /// writer-only fields and for union branches the reader takes as-is,
    /// where names on the "reader" side must resolve against the writer's
    /// own declarations.
    pub(crate) fn writer_self(&self) -> Compiler<'a> {
        Compiler {
            reader_names: self.writer_names,
            writer_names: self.writer_names,
        }
    }

    pub(crate) fn compile(
        &self,
        reader: &AvroSchema,
        writer: &AvroSchema,
    ) -> Result<Projector, ProjectError> {
        // Unions are resolved before anything else.
        if let AvroSchema::Union(writer_branches) = writer {
            if matches!(reader, AvroSchema::Union(_)) {
                // Union to union: each writer branch is read as itself;
                // the reader union is realised implicitly.
                let identity = self.writer_self();
                let variants = writer_branches
                    .iter()
                    .map(|branch| identity.compile(branch, branch).map(|p| Some(Box::new(p))))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Projector::Union(UnionProjector { variants }));
            }

            // Union narrowed to a non-union reader: exactly one slot, at
            // the first writer branch matching the reader's type and name.
            for (index, branch) in writer_branches.iter().enumerate() {
                if self.branch_matches(reader, branch)? {
                    let mut variants: Vec<Option<Box<Projector>>> =
                        (0..writer_branches.len()).map(|_| None).collect();
                    variants[index] = Some(Box::new(self.compile(reader, branch)?));
                    return Ok(Projector::Union(UnionProjector { variants }));
                }
            }
            return Err(ProjectError::Incompatible(format!(
                "no writer union branch matches reader '{}'",
                reader.type_name()
            )));
        }

        if let AvroSchema::Union(reader_branches) = reader {
            // Non-union writer widened into a reader union: recurse with
            // the matching reader branch.
            for branch in reader_branches {
                if self.branch_matches(branch, writer)? {
                    return self.compile(branch, writer);
                }
            }
            return Err(ProjectError::Incompatible(format!(
                "no reader union branch matches writer '{}'",
                writer.type_name()
            )));
        }

        let recursive = matches!(reader, AvroSchema::Named(_))
            || matches!(writer, AvroSchema::Named(_));
        let r = resolve(reader, self.reader_names)?;
        let w = resolve(writer, self.writer_names)?;

        use AvroSchema as S;
        match (r, w) {
            (S::Null, S::Null) => Ok(Projector::Null),
            (S::Boolean, S::Boolean) => Ok(Projector::Boolean),

            (S::Int, S::Int) => Ok(Projector::Int),
            (S::Long, S::Long) => Ok(Projector::Long),
            (S::Long, S::Int) => Ok(Projector::IntAsLong),
            (S::Float, S::Float) => Ok(Projector::Float),
            (S::Float, S::Int) => Ok(Projector::IntAsFloat),
            (S::Float, S::Long) => Ok(Projector::LongAsFloat),
            (S::Double, S::Double) => Ok(Projector::Double),
            (S::Double, S::Int) => Ok(Projector::IntAsDouble),
            (S::Double, S::Long) => Ok(Projector::LongAsDouble),
            (S::Double, S::Float) => Ok(Projector::FloatAsDouble),

            (S::Bytes, S::Bytes) => Ok(Projector::Bytes),
            (S::Bytes, S::String) => Ok(Projector::StringAsBytes),
            (S::String, S::String) => Ok(Projector::String),
            (S::String, S::Bytes) => Ok(Projector::BytesAsString),

            (S::Fixed(rf), S::Fixed(wf)) => {
                // The Avro resolution rules require both name and size to
                // match for fixed types.
                if rf.size != wf.size || rf.fullname() != wf.fullname() {
                    return Err(ProjectError::Incompatible(format!(
                        "fixed '{}' (size {}) does not match fixed '{}' (size {})",
                        wf.fullname(),
                        wf.size,
                        rf.fullname(),
                        rf.size
                    )));
                }
                Ok(Projector::Fixed(wf.size))
            }

            (S::Enum(re), S::Enum(we)) => Ok(Projector::Enum(EnumProjector::new(re, we))),

            (S::Array(ri), S::Array(wi)) => {
                Ok(Projector::Array(Box::new(self.compile(ri, wi)?)))
            }
            (S::Map(rv), S::Map(wv)) => Ok(Projector::Map(Box::new(self.compile(rv, wv)?))),

            (S::Record(rr), S::Record(wr)) => {
                if recursive {
                    // A back-reference on either side: defer the body so
                    // construction terminates on cyclic schemas.
                    Ok(Projector::Recursive(RecursiveProjector {
                        reader: rr.fullname(),
                        writer: wr.fullname(),
                        reader_names: Arc::clone(self.reader_names),
                        writer_names: Arc::clone(self.writer_names),
                        body: OnceLock::new(),
                    }))
                } else {
                    Ok(Projector::Record(RecordProjector::compile(rr, wr, self)?))
                }
            }

            (r, w) => Err(ProjectError::Incompatible(format!(
                "cannot project writer '{}' into reader '{}'",
                w.type_name(),
                r.type_name()
            ))),
        }
    }

    /// Union branch matching: same type, and for named types the same
    /// fully qualified name.
    fn branch_matches(
        &self,
        reader: &AvroSchema,
        writer: &AvroSchema,
    ) -> Result<bool, ProjectError> {
        let r = resolve(reader, self.reader_names)?;
        let w = resolve(writer, self.writer_names)?;
        if std::mem::discriminant(r) != std::mem::discriminant(w) {
            return Ok(false);
        }
        Ok(match (r.fullname(), w.fullname()) {
            (Some(rn), Some(wn)) => rn == wn,
            _ => true,
        })
    }
}

fn resolve<'s>(
    schema: &'s AvroSchema,
    names: &'s SchemaContext,
) -> Result<&'s AvroSchema, ProjectError> {
    match schema {
        AvroSchema::Named(name) => names
            .get(name)
            .ok_or_else(|| crate::error::SchemaError::UnknownType(name.clone()).into()),
        other => Ok(other),
    }
}

/// A projector for a (reader, writer) schema pair, ready to run against a
/// decoder.
#[derive(Debug)]
pub struct DatumProjector {
    root: Projector,
}

impl DatumProjector {
    /// Compile a projector for the given pair. The named types declared in
    /// each schema form its resolution context.
    ///
    /// Fails with [`ProjectError::Incompatible`] when no resolution rule
    /// applies, before any data is read.
    pub fn new(reader: &AvroSchema, writer: &AvroSchema) -> Result<Self, ProjectError> {
        let reader_names = Arc::new(SchemaContext::build_from_schema(reader));
        let writer_names = Arc::new(SchemaContext::build_from_schema(writer));
        Self::with_contexts(reader, writer, reader_names, writer_names)
    }

    /// Compile with externally supplied named-type contexts, for schemas
    /// that reference types declared in other documents.
    pub fn with_contexts(
        reader: &AvroSchema,
        writer: &AvroSchema,
        reader_names: Arc<SchemaContext>,
        writer_names: Arc<SchemaContext>,
    ) -> Result<Self, ProjectError> {
        let compiler = Compiler::new(&reader_names, &writer_names);
        let root = compiler.compile(reader, writer)?;
        debug!(
            reader = reader.type_name(),
            writer = writer.type_name(),
            "compiled datum projector"
        );
        Ok(Self { root })
    }

    /// Read one datum, producing a generic value conformant to the reader
    /// schema.
    pub fn project(&self, dec: &mut dyn Decoder) -> Result<AvroValue, ProjectError> {
        self.root.project(dec)
    }

    /// Read one record datum into a typed target.
    ///
    /// Fails with [`ProjectError::InvalidTarget`] when the root schema
    /// pair is not a record, since only records have field slots.
    pub fn project_into(
        &self,
        target: &mut dyn ProjectionTarget,
        dec: &mut dyn Decoder,
    ) -> Result<(), ProjectError> {
        let record = match &self.root {
            Projector::Record(r) => r,
            Projector::Recursive(r) => match r.body()? {
                Projector::Record(rec) => rec,
                _ => {
                    return Err(ProjectError::InvalidTarget(
                        "root projector is not a record".to_string(),
                    ))
                }
            },
            _ => {
                return Err(ProjectError::InvalidTarget(
                    "root projector is not a record".to_string(),
                ))
            }
        };
        record.project_into(target, dec)
    }
}

/// Build a projector for a (reader, writer) schema pair.
pub fn make_projector(
    reader: &AvroSchema,
    writer: &AvroSchema,
) -> Result<DatumProjector, ProjectError> {
    DatumProjector::new(reader, writer)
}
