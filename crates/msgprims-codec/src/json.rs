//! Schema-directed conversion between [`MessageValue`] and JSON.
//!
//! `time` and `duration` map to `{"secs": .., "nsecs": ..}` objects and
//! byte arrays to arrays of numbers. Object keys follow schema order.

use msgprims_schema::{ArrayKind, FieldSpec, FieldType, MessageSchema, PrimitiveKind, SchemaRegistry};
use serde_json::{Map, Number, Value as Json};

use crate::error::{CodecError, PathSegment, Result};
use crate::value::{Duration, MessageValue, Time, Value};

/// Render a message as a JSON object.
pub fn to_json(message: &MessageValue) -> Json {
    let mut object = Map::with_capacity(message.len());
    for (name, value) in message.fields() {
        object.insert(name.to_string(), value_to_json(value));
    }
    Json::Object(object)
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Bool(v) => Json::Bool(*v),
        Value::I8(v) => Json::from(*v),
        Value::U8(v) => Json::from(*v),
        Value::I16(v) => Json::from(*v),
        Value::U16(v) => Json::from(*v),
        Value::I32(v) => Json::from(*v),
        Value::U32(v) => Json::from(*v),
        Value::I64(v) => Json::from(*v),
        Value::U64(v) => Json::from(*v),
        Value::F32(v) => float_to_json(f64::from(*v)),
        Value::F64(v) => float_to_json(*v),
        Value::String(v) => Json::String(v.clone()),
        Value::Time(t) => pair_to_json(t.secs.into(), t.nsecs.into()),
        Value::Duration(d) => pair_to_json(d.secs.into(), d.nsecs.into()),
        Value::Bytes(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Message(m) => to_json(m),
    }
}

// JSON has no NaN or infinity.
fn float_to_json(v: f64) -> Json {
    Number::from_f64(v).map_or(Json::Null, Json::Number)
}

fn pair_to_json(secs: i64, nsecs: i64) -> Json {
    let mut object = Map::with_capacity(2);
    object.insert("secs".to_string(), Json::from(secs));
    object.insert("nsecs".to_string(), Json::from(nsecs));
    Json::Object(object)
}

/// Build a message of `schema` from a JSON object.
///
/// Keys absent from the object keep their zero defaults. Keys the schema
/// does not declare fail with [`CodecError::UnknownField`]; numbers that do
/// not fit the declared width fail with [`CodecError::TypeMismatch`].
pub fn from_json(
    schema: &MessageSchema,
    registry: &SchemaRegistry,
    json: &Json,
) -> Result<MessageValue> {
    let Json::Object(object) = json else {
        return Err(mismatch(schema.type_name(), json));
    };

    let mut message = MessageValue::new(schema, registry)?;
    for (key, item) in object {
        let field = schema
            .field(key)
            .ok_or_else(|| CodecError::UnknownField(key.clone()))?;
        let value = field_from_json(field, registry, item)
            .map_err(|err| err.at(PathSegment::Field(&field.name)))?;
        message.set(&field.name, value)?;
    }
    Ok(message)
}

fn field_from_json(field: &FieldSpec, registry: &SchemaRegistry, json: &Json) -> Result<Value> {
    if field.array == ArrayKind::Scalar {
        return element_from_json(&field.field_type, registry, json);
    }

    let Json::Array(items) = json else {
        return Err(mismatch(&field.type_text(), json));
    };
    if let ArrayKind::Fixed(expected) = field.array {
        if items.len() != expected {
            return Err(CodecError::ArrayLength {
                field: String::new(),
                expected,
                found: items.len(),
            });
        }
    }

    if field.is_byte_array() {
        let bytes = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                integer(item, PrimitiveKind::UInt8).map_err(|err| err.at(PathSegment::Index(index)))
            })
            .collect::<Result<Vec<u8>>>()?;
        return Ok(Value::Bytes(bytes));
    }

    let values = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            element_from_json(&field.field_type, registry, item)
                .map_err(|err| err.at(PathSegment::Index(index)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(values))
}

fn element_from_json(field_type: &FieldType, registry: &SchemaRegistry, json: &Json) -> Result<Value> {
    let kind = match field_type {
        FieldType::Primitive(kind) => *kind,
        FieldType::Composite(name) => {
            let schema = registry
                .get(name)
                .ok_or_else(|| CodecError::UnknownType(name.clone()))?;
            return Ok(Value::Message(from_json(schema, registry, json)?));
        }
    };

    let value = match kind {
        PrimitiveKind::Bool => match json {
            Json::Bool(v) => Value::Bool(*v),
            other => return Err(mismatch(kind.name(), other)),
        },
        PrimitiveKind::Int8 => Value::I8(integer(json, kind)?),
        PrimitiveKind::UInt8 => Value::U8(integer(json, kind)?),
        PrimitiveKind::Int16 => Value::I16(integer(json, kind)?),
        PrimitiveKind::UInt16 => Value::U16(integer(json, kind)?),
        PrimitiveKind::Int32 => Value::I32(integer(json, kind)?),
        PrimitiveKind::UInt32 => Value::U32(integer(json, kind)?),
        PrimitiveKind::Int64 => Value::I64(integer(json, kind)?),
        PrimitiveKind::UInt64 => Value::U64(integer(json, kind)?),
        PrimitiveKind::Float32 => Value::F32(float(json, kind)? as f32),
        PrimitiveKind::Float64 => Value::F64(float(json, kind)?),
        PrimitiveKind::String => match json {
            Json::String(v) => Value::String(v.clone()),
            other => return Err(mismatch(kind.name(), other)),
        },
        PrimitiveKind::Time => {
            let (secs, nsecs) = pair(json, kind, PrimitiveKind::UInt32)?;
            Value::Time(Time { secs, nsecs })
        }
        PrimitiveKind::Duration => {
            let (secs, nsecs) = pair(json, kind, PrimitiveKind::Int32)?;
            Value::Duration(Duration { secs, nsecs })
        }
    };
    Ok(value)
}

/// An integer of `kind`'s width; floats and out-of-range numbers are rejected.
fn integer<T>(json: &Json, kind: PrimitiveKind) -> Result<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let Json::Number(number) = json else {
        return Err(mismatch(kind.name(), json));
    };
    let converted = match (number.as_i64(), number.as_u64()) {
        (Some(v), _) => <T as TryFrom<i64>>::try_from(v).ok(),
        (None, Some(v)) => <T as TryFrom<u64>>::try_from(v).ok(),
        (None, None) => None,
    };
    converted.ok_or_else(|| mismatch(kind.name(), json))
}

fn float(json: &Json, kind: PrimitiveKind) -> Result<f64> {
    match json {
        Json::Number(number) => number.as_f64().ok_or_else(|| mismatch(kind.name(), json)),
        other => Err(mismatch(kind.name(), other)),
    }
}

/// `{"secs": .., "nsecs": ..}` with both halves of `half`'s width.
fn pair<T>(json: &Json, kind: PrimitiveKind, half: PrimitiveKind) -> Result<(T, T)>
where
    T: TryFrom<i64> + TryFrom<u64> + Default,
{
    let Json::Object(object) = json else {
        return Err(mismatch(kind.name(), json));
    };
    let mut secs = T::default();
    let mut nsecs = T::default();
    for (key, item) in object {
        let slot = match key.as_str() {
            "secs" => &mut secs,
            "nsecs" => &mut nsecs,
            _ => return Err(CodecError::UnknownField(key.clone())),
        };
        *slot = integer(item, half).map_err(|err| err.at(PathSegment::Field(key)))?;
    }
    Ok((secs, nsecs))
}

fn mismatch(expected: &str, found: &Json) -> CodecError {
    CodecError::TypeMismatch {
        field: String::new(),
        expected: expected.to_string(),
        found: json_kind(found),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
