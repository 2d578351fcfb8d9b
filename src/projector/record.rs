//! Record projector.
//!
//! Writer fields are consumed strictly in wire order. Each writer field is
//! aligned with a reader field by name, then by reader-side alias; a writer
//! field with no counterpart is still decoded so the stream advances, but
//! the value is discarded. Reader fields the writer never wrote receive
//! their declared defaults, materialised once at build time.

use std::sync::Arc;

use crate::error::ProjectError;
use crate::generic::GenericRecord;
use crate::schema::RecordSchema;
use crate::value::AvroValue;

use super::defaults::materialise;
use super::{Compiler, ProjectionTarget, Projector};

/// One entry per writer field, in wire order.
#[derive(Debug)]
struct FieldProjector {
    /// Canonical reader field name to assign into, or `None` for a
    /// writer-only field whose bytes are drained and dropped.
    target: Option<String>,
    sub: Projector,
}

/// Compiled projector for a (reader record, writer record) pair.
#[derive(Debug)]
pub struct RecordProjector {
    /// Reader record schema; projected records are bound to it.
    schema: Arc<RecordSchema>,
    fields: Vec<FieldProjector>,
    /// Pre-materialised defaults for reader fields absent from the writer.
    defaults: Vec<(String, AvroValue)>,
}

impl RecordProjector {
    pub(super) fn compile(
        reader: &RecordSchema,
        writer: &RecordSchema,
        compiler: &Compiler<'_>,
    ) -> Result<Self, ProjectError> {
        let mut fields = Vec::with_capacity(writer.fields.len());
        let mut aligned: Vec<&str> = Vec::new();

        for writer_field in &writer.fields {
            // Exact name first, reader-side aliases second
            let reader_field = reader
                .fields
                .iter()
                .find(|rf| rf.name == writer_field.name)
                .or_else(|| {
                    reader
                        .fields
                        .iter()
                        .find(|rf| rf.aliases.iter().any(|a| *a == writer_field.name))
                });

            match reader_field {
                Some(rf) => {
                    aligned.push(&rf.name);
                    fields.push(FieldProjector {
                        target: Some(rf.name.clone()),
                        sub: compiler.compile(&rf.schema, &writer_field.schema)?,
                    });
                }
                None => fields.push(FieldProjector {
                    // Drained in the writer's own terms: names resolve
                    // against the writer's declarations
                    target: None,
                    sub: compiler
                        .writer_self()
                        .compile(&writer_field.schema, &writer_field.schema)?,
                }),
            }
        }

        let mut defaults = Vec::new();
        for reader_field in &reader.fields {
            if aligned.contains(&reader_field.name.as_str()) {
                continue;
            }
            let literal = reader_field.default.as_ref().ok_or_else(|| {
                ProjectError::Incompatible(format!(
                    "reader field '{}' is not written by '{}' and has no default",
                    reader_field.name, writer.name
                ))
            })?;
            let value = materialise(
                &reader_field.name,
                literal,
                &reader_field.schema,
                compiler.reader_names(),
            )?;
            defaults.push((reader_field.name.clone(), value));
        }

        Ok(Self {
            schema: Arc::new(reader.clone()),
            fields,
            defaults,
        })
    }

    /// Decode one record into a fresh [`GenericRecord`].
    pub fn project_generic(
        &self,
        dec: &mut dyn crate::decoder::Decoder,
    ) -> Result<GenericRecord, ProjectError> {
        let mut record = GenericRecord::new(Arc::clone(&self.schema));
        for field in &self.fields {
            let value = field.sub.project(dec)?;
            match &field.target {
                Some(name) if !matches!(value, AvroValue::Null) => {
                    record.set(name.clone(), value);
                }
                // Writer-only fields advance the decoder and drop the value;
                // nulls are left unset, like any absent field
                _ => {}
            }
        }
        for (name, value) in &self.defaults {
            record.set(name.clone(), value.clone());
        }
        Ok(record)
    }

    /// Decode one record into a typed target, field by field. A field the
    /// target has no slot for is still decoded, then dropped.
    pub fn project_into(
        &self,
        target: &mut dyn ProjectionTarget,
        dec: &mut dyn crate::decoder::Decoder,
    ) -> Result<(), ProjectError> {
        for field in &self.fields {
            let value = field.sub.project(dec)?;
            if let Some(name) = &field.target {
                if !matches!(value, AvroValue::Null) {
                    target.put_field(name, value);
                }
            }
        }
        for (name, value) in &self.defaults {
            target.put_field(name, value.clone());
        }
        Ok(())
    }

    /// The reader record schema this projector produces.
    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }
}
