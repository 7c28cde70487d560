//! Dynamically-typed message values.

use std::fmt;

use msgprims_schema::{ArrayKind, FieldSpec, FieldType, MessageSchema, PrimitiveKind, SchemaRegistry};

use crate::error::{CodecError, PathSegment, Result};

/// ROS1 `time`: seconds and nanoseconds since the epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Time {
    pub secs: u32,
    pub nsecs: u32,
}

/// ROS1 `duration`: signed seconds and nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Duration {
    pub secs: i32,
    pub nsecs: i32,
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Time(Time),
    Duration(Duration),
    /// `uint8[]` and `uint8[N]`.
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Message(MessageValue),
}

impl Value {
    /// Zero value of a primitive.
    pub fn zero(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Value::Bool(false),
            PrimitiveKind::Int8 => Value::I8(0),
            PrimitiveKind::UInt8 => Value::U8(0),
            PrimitiveKind::Int16 => Value::I16(0),
            PrimitiveKind::UInt16 => Value::U16(0),
            PrimitiveKind::Int32 => Value::I32(0),
            PrimitiveKind::UInt32 => Value::U32(0),
            PrimitiveKind::Int64 => Value::I64(0),
            PrimitiveKind::UInt64 => Value::U64(0),
            PrimitiveKind::Float32 => Value::F32(0.0),
            PrimitiveKind::Float64 => Value::F64(0.0),
            PrimitiveKind::String => Value::String(String::new()),
            PrimitiveKind::Time => Value::Time(Time::default()),
            PrimitiveKind::Duration => Value::Duration(Duration::default()),
        }
    }

    /// Short name of the runtime type, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I8(_) => "int8",
            Value::U8(_) => "uint8",
            Value::I16(_) => "int16",
            Value::U16(_) => "uint16",
            Value::I32(_) => "int32",
            Value::U32(_) => "uint32",
            Value::I64(_) => "int64",
            Value::U64(_) => "uint64",
            Value::F32(_) => "float32",
            Value::F64(_) => "float64",
            Value::String(_) => "string",
            Value::Time(_) => "time",
            Value::Duration(_) => "duration",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Message(_) => "message",
        }
    }

    /// Whether this value is a scalar of exactly `kind`.
    pub fn is_kind(&self, kind: PrimitiveKind) -> bool {
        matches!(
            (kind, self),
            (PrimitiveKind::Bool, Value::Bool(_))
                | (PrimitiveKind::Int8, Value::I8(_))
                | (PrimitiveKind::UInt8, Value::U8(_))
                | (PrimitiveKind::Int16, Value::I16(_))
                | (PrimitiveKind::UInt16, Value::U16(_))
                | (PrimitiveKind::Int32, Value::I32(_))
                | (PrimitiveKind::UInt32, Value::U32(_))
                | (PrimitiveKind::Int64, Value::I64(_))
                | (PrimitiveKind::UInt64, Value::U64(_))
                | (PrimitiveKind::Float32, Value::F32(_))
                | (PrimitiveKind::Float64, Value::F64(_))
                | (PrimitiveKind::String, Value::String(_))
                | (PrimitiveKind::Time, Value::Time(_))
                | (PrimitiveKind::Duration, Value::Duration(_))
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageValue> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut MessageValue> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Integer value widened to `i128`, for any integer variant.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::U8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::I64(v) => Some(v.into()),
            Value::U64(v) => Some(v.into()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    Time => Time,
    Duration => Duration,
    Vec<u8> => Bytes,
    Vec<Value> => Array,
    MessageValue => Message,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// A message instance: every schema field, in schema order, always set.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageValue {
    type_name: String,
    fields: Vec<(String, Value)>,
}

impl MessageValue {
    /// Build a value with every field at its zero default.
    ///
    /// Strings are empty, numbers zero, bools false, variable arrays empty,
    /// fixed arrays filled with zero elements and composites defaulted
    /// recursively.
    pub fn new(schema: &MessageSchema, registry: &SchemaRegistry) -> Result<Self> {
        let fields = schema
            .fields()
            .iter()
            .map(|field| {
                default_field(field, registry)
                    .map(|value| (field.name.clone(), value))
                    .map_err(|err| err.at(PathSegment::Field(&field.name)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            type_name: schema.type_name().to_string(),
            fields,
        })
    }

    pub(crate) fn from_parts(type_name: String, fields: Vec<(String, Value)>) -> Self {
        Self { type_name, fields }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Look up by schema position first, then by name.
    pub(crate) fn field_at(&self, index: usize, name: &str) -> Option<&Value> {
        match self.fields.get(index) {
            Some((field, value)) if field == name => Some(value),
            _ => self.get(name),
        }
    }

    /// Replace a field's value. Type agreement is checked at encode time.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let slot = self
            .get_mut(name)
            .ok_or_else(|| CodecError::UnknownField(name.to_string()))?;
        *slot = value.into();
        Ok(())
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub(crate) fn default_field(field: &FieldSpec, registry: &SchemaRegistry) -> Result<Value> {
    if field.is_byte_array() {
        let len = field.array.fixed_len().unwrap_or(0);
        return Ok(Value::Bytes(vec![0; len]));
    }
    match field.array {
        ArrayKind::Scalar => default_element(&field.field_type, registry),
        ArrayKind::Fixed(len) => {
            let element = default_element(&field.field_type, registry)?;
            Ok(Value::Array(vec![element; len]))
        }
        ArrayKind::Variable => Ok(Value::Array(Vec::new())),
    }
}

pub(crate) fn default_element(field_type: &FieldType, registry: &SchemaRegistry) -> Result<Value> {
    match field_type {
        FieldType::Primitive(kind) => Ok(Value::zero(*kind)),
        FieldType::Composite(name) => {
            let schema = registry
                .get(name)
                .ok_or_else(|| CodecError::UnknownType(name.clone()))?;
            Ok(Value::Message(MessageValue::new(schema, registry)?))
        }
    }
}

impl fmt::Display for MessageValue {
    /// Indented `name: value` layout; nested messages and message arrays
    /// are expanded on following lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_message(f, self, 0)
    }
}

fn write_message(f: &mut fmt::Formatter<'_>, message: &MessageValue, indent: usize) -> fmt::Result {
    for (name, value) in message.fields() {
        write!(f, "{:indent$}{name}:", "")?;
        match value {
            Value::Message(nested) => {
                writeln!(f)?;
                write_message(f, nested, indent + 2)?;
            }
            Value::Array(items) if items.iter().any(|item| matches!(item, Value::Message(_))) => {
                writeln!(f)?;
                for item in items {
                    writeln!(f, "{:width$}-", "", width = indent + 2)?;
                    match item {
                        Value::Message(nested) => write_message(f, nested, indent + 4)?,
                        other => writeln!(f, "{:width$}{other}", "", width = indent + 4)?,
                    }
                }
            }
            other => writeln!(f, " {other}")?,
        }
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Time(t) => write!(f, "{}.{:09}", t.secs, t.nsecs),
            Value::Duration(d) => write!(f, "{}s {}ns", d.secs, d.nsecs),
            Value::Bytes(bytes) => write_list(f, bytes.iter()),
            Value::Array(items) => write_list(f, items.iter()),
            Value::Message(m) => write!(f, "<{}>", m.type_name()),
        }
    }
}

fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_embedded(&[
            ("geometry_msgs/Point", "float64 x\nfloat64 y\nfloat64 z\n"),
            (
                "test/Sample",
                "string label\nbool ok\nuint8[4] raw\nuint8[] blob\nint32[3] triple\ngeometry_msgs/Point[] points\ngeometry_msgs/Point origin\ntime stamp\n",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn defaults_are_never_absent() {
        let registry = registry();
        let schema = registry.get("test/Sample").unwrap();
        let value = MessageValue::new(schema, &registry).unwrap();

        assert_eq!(value.len(), 8);
        assert_eq!(value.get("label"), Some(&Value::String(String::new())));
        assert_eq!(value.get("ok"), Some(&Value::Bool(false)));
        assert_eq!(value.get("raw"), Some(&Value::Bytes(vec![0; 4])));
        assert_eq!(value.get("blob"), Some(&Value::Bytes(Vec::new())));
        assert_eq!(value.get("triple"), Some(&Value::Array(vec![Value::I32(0); 3])));
        assert_eq!(value.get("points"), Some(&Value::Array(Vec::new())));
        assert_eq!(value.get("stamp"), Some(&Value::Time(Time::default())));

        let origin = value.get("origin").and_then(Value::as_message).unwrap();
        assert_eq!(origin.type_name(), "geometry_msgs/Point");
        assert_eq!(origin.get("x"), Some(&Value::F64(0.0)));
    }

    #[test]
    fn set_rejects_unknown_fields() {
        let registry = registry();
        let schema = registry.get("geometry_msgs/Point").unwrap();
        let mut value = MessageValue::new(schema, &registry).unwrap();

        value.set("x", 1.5f64).unwrap();
        assert_eq!(value.get("x"), Some(&Value::F64(1.5)));
        assert_eq!(
            value.set("w", 1.0f64),
            Err(CodecError::UnknownField("w".to_string()))
        );
    }

    #[test]
    fn display_indents_nested_messages() {
        let registry = SchemaRegistry::from_embedded(&[
            ("a/Inner", "int16 v\n"),
            ("a/Outer", "string name\nInner inner\nInner[] list\nint8[] nums\n"),
        ])
        .unwrap();
        let inner_schema = registry.get("a/Inner").unwrap();
        let outer_schema = registry.get("a/Outer").unwrap();

        let inner = MessageValue::new(inner_schema, &registry)
            .unwrap()
            .with("v", 7i16)
            .unwrap();
        let outer = MessageValue::new(outer_schema, &registry)
            .unwrap()
            .with("name", "ok")
            .unwrap()
            .with("list", vec![Value::Message(inner.clone())])
            .unwrap()
            .with("nums", vec![Value::I8(1), Value::I8(-2)])
            .unwrap();

        assert_eq!(
            outer.to_string(),
            "name: ok\ninner:\n  v: 0\nlist:\n  -\n    v: 7\nnums: [1, -2]\n"
        );
    }
}
