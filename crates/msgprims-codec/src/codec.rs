use bytes::{Bytes, BytesMut};
use msgprims_schema::{
    min_element_size, ArrayKind, FieldSpec, FieldType, MessageSchema, PrimitiveKind, SchemaRegistry,
};
use tracing::trace;

use crate::config::CodecConfig;
use crate::error::{CodecError, PathSegment, Result};
use crate::value::{MessageValue, Value};
use crate::wire::{check_array_len, WireReader, WireWriter, LENGTH_PREFIX_SIZE};

/// Encodes and decodes [`MessageValue`]s against compiled schemas.
///
/// Holds only a shared borrow of the registry (for composite fields) and a
/// copy of the limits, so one codec can serve any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec<'r> {
    registry: &'r SchemaRegistry,
    config: CodecConfig,
}

impl<'r> MessageCodec<'r> {
    /// Create a codec with default limits.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self::with_config(registry, CodecConfig::default())
    }

    /// Create a codec with explicit limits.
    pub fn with_config(registry: &'r SchemaRegistry, config: CodecConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Encode a message into a fresh buffer.
    pub fn encode(&self, schema: &MessageSchema, value: &MessageValue) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode_into(schema, value, &mut dst)?;
        Ok(dst.freeze())
    }

    /// Append an encoded message to `dst`.
    ///
    /// On error `dst` is restored to its original length.
    pub fn encode_into(
        &self,
        schema: &MessageSchema,
        value: &MessageValue,
        dst: &mut BytesMut,
    ) -> Result<()> {
        let start = dst.len();
        let mut writer = WireWriter::with_config(dst, self.config);
        match self.write_message(schema, value, &mut writer) {
            Ok(()) => {
                trace!(type_name = %schema.type_name(), bytes = writer.len() - start, "message encoded");
                Ok(())
            }
            Err(err) => {
                writer.truncate(start);
                Err(err)
            }
        }
    }

    /// Exact number of bytes [`encode`](Self::encode) would produce.
    pub fn serialized_len(&self, schema: &MessageSchema, value: &MessageValue) -> Result<usize> {
        self.message_len(schema, value)
    }

    /// Decode one message starting at `offset`.
    ///
    /// Returns the value and the offset just past it. Nothing is returned
    /// unless the whole message decodes.
    pub fn decode(
        &self,
        schema: &MessageSchema,
        bytes: &[u8],
        offset: usize,
    ) -> Result<(MessageValue, usize)> {
        let mut reader = WireReader::with_config(bytes, offset, self.config);
        let value = self.read_message(schema, &mut reader)?;
        trace!(
            type_name = %schema.type_name(),
            bytes = reader.position() - offset,
            "message decoded"
        );
        Ok((value, reader.position()))
    }

    /// Decode a message that must occupy the whole buffer.
    pub fn decode_exact(&self, schema: &MessageSchema, bytes: &[u8]) -> Result<MessageValue> {
        let (value, end) = self.decode(schema, bytes, 0)?;
        if end < bytes.len() {
            return Err(CodecError::TrailingBytes {
                count: bytes.len() - end,
            });
        }
        Ok(value)
    }

    fn resolve(&self, type_name: &str) -> Result<&'r MessageSchema> {
        self.registry
            .get(type_name)
            .map(|schema| schema.as_ref())
            .ok_or_else(|| CodecError::UnknownType(type_name.to_string()))
    }

    fn check_type(schema: &MessageSchema, value: &MessageValue) -> Result<()> {
        if value.type_name() != schema.type_name() {
            return Err(CodecError::TypeMismatch {
                field: String::new(),
                expected: schema.type_name().to_string(),
                found: "message",
            });
        }
        Ok(())
    }

    fn write_message(
        &self,
        schema: &MessageSchema,
        value: &MessageValue,
        w: &mut WireWriter<'_>,
    ) -> Result<()> {
        Self::check_type(schema, value)?;
        for (index, field) in schema.fields().iter().enumerate() {
            value
                .field_at(index, &field.name)
                .ok_or_else(|| CodecError::MissingField(String::new()))
                .and_then(|field_value| self.write_field(field, field_value, w))
                .map_err(|err| err.at(PathSegment::Field(&field.name)))?;
        }
        Ok(())
    }

    fn write_field(&self, field: &FieldSpec, value: &Value, w: &mut WireWriter<'_>) -> Result<()> {
        if field.is_byte_array() {
            let Value::Bytes(bytes) = value else {
                return Err(mismatch(field, value));
            };
            return match field.array {
                ArrayKind::Fixed(len) => {
                    check_array_len(len, bytes.len(), "")?;
                    w.put_raw(bytes);
                    Ok(())
                }
                _ => w.put_byte_vec(bytes, ""),
            };
        }

        match field.array {
            ArrayKind::Scalar => self.write_element(&field.field_type, value, w),
            ArrayKind::Fixed(len) => {
                let Value::Array(items) = value else {
                    return Err(mismatch(field, value));
                };
                check_array_len(len, items.len(), "")?;
                self.write_elements(&field.field_type, items, w)
            }
            ArrayKind::Variable => {
                let Value::Array(items) = value else {
                    return Err(mismatch(field, value));
                };
                w.put_count(items.len(), "")?;
                self.write_elements(&field.field_type, items, w)
            }
        }
    }

    fn write_elements(
        &self,
        field_type: &FieldType,
        items: &[Value],
        w: &mut WireWriter<'_>,
    ) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            self.write_element(field_type, item, w)
                .map_err(|err| err.at(PathSegment::Index(index)))?;
        }
        Ok(())
    }

    fn write_element(&self, field_type: &FieldType, value: &Value, w: &mut WireWriter<'_>) -> Result<()> {
        match (field_type, value) {
            (FieldType::Primitive(kind), value) => write_primitive(*kind, value, w),
            (FieldType::Composite(name), Value::Message(message)) => {
                let schema = self.resolve(name)?;
                self.write_message(schema, message, w)
            }
            (FieldType::Composite(name), other) => Err(CodecError::TypeMismatch {
                field: String::new(),
                expected: name.clone(),
                found: other.kind_name(),
            }),
        }
    }

    fn message_len(&self, schema: &MessageSchema, value: &MessageValue) -> Result<usize> {
        Self::check_type(schema, value)?;
        let mut total = 0usize;
        for (index, field) in schema.fields().iter().enumerate() {
            let len = value
                .field_at(index, &field.name)
                .ok_or_else(|| CodecError::MissingField(String::new()))
                .and_then(|field_value| self.field_len(field, field_value))
                .map_err(|err| err.at(PathSegment::Field(&field.name)))?;
            total += len;
        }
        Ok(total)
    }

    fn field_len(&self, field: &FieldSpec, value: &Value) -> Result<usize> {
        let prefix = match field.array {
            ArrayKind::Variable => LENGTH_PREFIX_SIZE,
            _ => 0,
        };
        match (field.array, value) {
            (ArrayKind::Scalar, value) => self.element_len(&field.field_type, value),
            (array, Value::Bytes(bytes)) if field.is_byte_array() => {
                if let ArrayKind::Fixed(len) = array {
                    check_array_len(len, bytes.len(), "")?;
                }
                Ok(prefix + bytes.len())
            }
            (array, Value::Array(items)) if !field.is_byte_array() => {
                if let ArrayKind::Fixed(len) = array {
                    check_array_len(len, items.len(), "")?;
                }
                let mut total = prefix;
                for (index, item) in items.iter().enumerate() {
                    total += self
                        .element_len(&field.field_type, item)
                        .map_err(|err| err.at(PathSegment::Index(index)))?;
                }
                Ok(total)
            }
            (_, other) => Err(mismatch(field, other)),
        }
    }

    fn element_len(&self, field_type: &FieldType, value: &Value) -> Result<usize> {
        match (field_type, value) {
            (FieldType::Primitive(PrimitiveKind::String), Value::String(s)) => {
                Ok(LENGTH_PREFIX_SIZE + s.len())
            }
            (FieldType::Primitive(kind), value) if value.is_kind(*kind) => {
                Ok(kind.fixed_size().unwrap_or_default())
            }
            (FieldType::Primitive(kind), other) => Err(CodecError::TypeMismatch {
                field: String::new(),
                expected: kind.name().to_string(),
                found: other.kind_name(),
            }),
            (FieldType::Composite(name), Value::Message(message)) => {
                let schema = self.resolve(name)?;
                self.message_len(schema, message)
            }
            (FieldType::Composite(name), other) => Err(CodecError::TypeMismatch {
                field: String::new(),
                expected: name.clone(),
                found: other.kind_name(),
            }),
        }
    }

    fn read_message(&self, schema: &MessageSchema, r: &mut WireReader<'_>) -> Result<MessageValue> {
        let mut fields = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let value = self
                .read_field(field, r)
                .map_err(|err| err.at(PathSegment::Field(&field.name)))?;
            fields.push((field.name.clone(), value));
        }
        Ok(MessageValue::from_parts(schema.type_name().to_string(), fields))
    }

    fn read_field(&self, field: &FieldSpec, r: &mut WireReader<'_>) -> Result<Value> {
        if field.is_byte_array() {
            return match field.array {
                ArrayKind::Fixed(len) => Ok(Value::Bytes(r.take(len, "")?.to_vec())),
                _ => Ok(Value::Bytes(r.read_byte_vec("")?)),
            };
        }

        let count = match field.array {
            ArrayKind::Scalar => return self.read_element(&field.field_type, r),
            ArrayKind::Fixed(len) => len,
            ArrayKind::Variable => {
                r.read_count("", min_element_size(&field.field_type, self.registry))?
            }
        };

        let mut items = Vec::with_capacity(count.min(r.remaining()));
        for index in 0..count {
            let item = self
                .read_element(&field.field_type, r)
                .map_err(|err| err.at(PathSegment::Index(index)))?;
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn read_element(&self, field_type: &FieldType, r: &mut WireReader<'_>) -> Result<Value> {
        match field_type {
            FieldType::Primitive(kind) => read_primitive(*kind, r),
            FieldType::Composite(name) => {
                let schema = self.resolve(name)?;
                Ok(Value::Message(self.read_message(schema, r)?))
            }
        }
    }
}

fn write_primitive(kind: PrimitiveKind, value: &Value, w: &mut WireWriter<'_>) -> Result<()> {
    match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(v)) => w.put_bool(*v),
        (PrimitiveKind::Int8, Value::I8(v)) => w.put_i8(*v),
        (PrimitiveKind::UInt8, Value::U8(v)) => w.put_u8(*v),
        (PrimitiveKind::Int16, Value::I16(v)) => w.put_i16(*v),
        (PrimitiveKind::UInt16, Value::U16(v)) => w.put_u16(*v),
        (PrimitiveKind::Int32, Value::I32(v)) => w.put_i32(*v),
        (PrimitiveKind::UInt32, Value::U32(v)) => w.put_u32(*v),
        (PrimitiveKind::Int64, Value::I64(v)) => w.put_i64(*v),
        (PrimitiveKind::UInt64, Value::U64(v)) => w.put_u64(*v),
        (PrimitiveKind::Float32, Value::F32(v)) => w.put_f32(*v),
        (PrimitiveKind::Float64, Value::F64(v)) => w.put_f64(*v),
        (PrimitiveKind::String, Value::String(v)) => w.put_string(v, "")?,
        (PrimitiveKind::Time, Value::Time(v)) => w.put_time(*v),
        (PrimitiveKind::Duration, Value::Duration(v)) => w.put_duration(*v),
        (kind, other) => {
            return Err(CodecError::TypeMismatch {
                field: String::new(),
                expected: kind.name().to_string(),
                found: other.kind_name(),
            })
        }
    }
    Ok(())
}

fn read_primitive(kind: PrimitiveKind, r: &mut WireReader<'_>) -> Result<Value> {
    Ok(match kind {
        PrimitiveKind::Bool => Value::Bool(r.read_bool("")?),
        PrimitiveKind::Int8 => Value::I8(r.read_i8("")?),
        PrimitiveKind::UInt8 => Value::U8(r.read_u8("")?),
        PrimitiveKind::Int16 => Value::I16(r.read_i16("")?),
        PrimitiveKind::UInt16 => Value::U16(r.read_u16("")?),
        PrimitiveKind::Int32 => Value::I32(r.read_i32("")?),
        PrimitiveKind::UInt32 => Value::U32(r.read_u32("")?),
        PrimitiveKind::Int64 => Value::I64(r.read_i64("")?),
        PrimitiveKind::UInt64 => Value::U64(r.read_u64("")?),
        PrimitiveKind::Float32 => Value::F32(r.read_f32("")?),
        PrimitiveKind::Float64 => Value::F64(r.read_f64("")?),
        PrimitiveKind::String => Value::String(r.read_string("")?),
        PrimitiveKind::Time => Value::Time(r.read_time("")?),
        PrimitiveKind::Duration => Value::Duration(r.read_duration("")?),
    })
}

fn mismatch(field: &FieldSpec, value: &Value) -> CodecError {
    CodecError::TypeMismatch {
        field: String::new(),
        expected: field.type_text(),
        found: value.kind_name(),
    }
}
