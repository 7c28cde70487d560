//! Field and type descriptors.

use std::fmt;

/// Built-in field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    /// `uint32 secs` followed by `uint32 nsecs`.
    Time,
    /// `int32 secs` followed by `int32 nsecs`.
    Duration,
}

impl PrimitiveKind {
    /// Every primitive, in declaration order.
    pub const ALL: [PrimitiveKind; 14] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Int8,
        PrimitiveKind::UInt8,
        PrimitiveKind::Int16,
        PrimitiveKind::UInt16,
        PrimitiveKind::Int32,
        PrimitiveKind::UInt32,
        PrimitiveKind::Int64,
        PrimitiveKind::UInt64,
        PrimitiveKind::Float32,
        PrimitiveKind::Float64,
        PrimitiveKind::String,
        PrimitiveKind::Time,
        PrimitiveKind::Duration,
    ];

    /// Look up a primitive by its definition-file name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Name as written in message definitions.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::UInt8 => "uint8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::UInt16 => "uint16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::UInt32 => "uint32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::UInt64 => "uint64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::String => "string",
            PrimitiveKind::Time => "time",
            PrimitiveKind::Duration => "duration",
        }
    }

    /// Encoded width in bytes, or `None` for variable-length kinds.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::Int8 | PrimitiveKind::UInt8 => Some(1),
            PrimitiveKind::Int16 | PrimitiveKind::UInt16 => Some(2),
            PrimitiveKind::Int32 | PrimitiveKind::UInt32 | PrimitiveKind::Float32 => Some(4),
            PrimitiveKind::Int64
            | PrimitiveKind::UInt64
            | PrimitiveKind::Float64
            | PrimitiveKind::Time
            | PrimitiveKind::Duration => Some(8),
            PrimitiveKind::String => None,
        }
    }

    /// Whether a constant of this kind may be declared.
    pub fn allows_constant(self) -> bool {
        !matches!(self, PrimitiveKind::Time | PrimitiveKind::Duration)
    }

    /// Check that `literal` is a valid constant value for this kind.
    pub fn validate_literal(self, literal: &str) -> bool {
        match self {
            PrimitiveKind::Bool => matches!(literal, "true" | "false" | "True" | "False" | "0" | "1"),
            PrimitiveKind::Int8 => literal.parse::<i8>().is_ok(),
            PrimitiveKind::UInt8 => literal.parse::<u8>().is_ok(),
            PrimitiveKind::Int16 => literal.parse::<i16>().is_ok(),
            PrimitiveKind::UInt16 => literal.parse::<u16>().is_ok(),
            PrimitiveKind::Int32 => literal.parse::<i32>().is_ok(),
            PrimitiveKind::UInt32 => literal.parse::<u32>().is_ok(),
            PrimitiveKind::Int64 => literal.parse::<i64>().is_ok(),
            PrimitiveKind::UInt64 => literal.parse::<u64>().is_ok(),
            PrimitiveKind::Float32 => literal.parse::<f32>().is_ok(),
            PrimitiveKind::Float64 => literal.parse::<f64>().is_ok(),
            PrimitiveKind::String => true,
            PrimitiveKind::Time | PrimitiveKind::Duration => false,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The element type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Primitive(PrimitiveKind),
    /// Fully-qualified name (`pkg/Name`) of another registered schema.
    Composite(String),
}

impl FieldType {
    /// Name as written in canonical definitions.
    pub fn name(&self) -> &str {
        match self {
            FieldType::Primitive(kind) => kind.name(),
            FieldType::Composite(name) => name,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            FieldType::Primitive(kind) => Some(*kind),
            FieldType::Composite(_) => None,
        }
    }

    pub fn as_composite(&self) -> Option<&str> {
        match self {
            FieldType::Primitive(_) => None,
            FieldType::Composite(name) => Some(name),
        }
    }
}

/// Array shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    Scalar,
    /// `T[N]`: exactly N elements, no length prefix on the wire.
    Fixed(usize),
    /// `T[]`: `u32` element count followed by the elements.
    Variable,
}

impl ArrayKind {
    pub fn is_array(self) -> bool {
        !matches!(self, ArrayKind::Scalar)
    }

    pub fn fixed_len(self) -> Option<usize> {
        match self {
            ArrayKind::Fixed(len) => Some(len),
            _ => None,
        }
    }

    /// Suffix as written in definitions: `""`, `"[N]"` or `"[]"`.
    pub fn suffix(self) -> String {
        match self {
            ArrayKind::Scalar => String::new(),
            ArrayKind::Fixed(len) => format!("[{len}]"),
            ArrayKind::Variable => "[]".to_string(),
        }
    }
}

/// A single named field of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub array: ArrayKind,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType, array: ArrayKind) -> Self {
        Self {
            name: name.into(),
            field_type,
            array,
        }
    }

    /// `uint8[]` / `uint8[N]`, carried as raw bytes rather than element lists.
    pub fn is_byte_array(&self) -> bool {
        self.array.is_array() && self.field_type == FieldType::Primitive(PrimitiveKind::UInt8)
    }

    /// Type as written in definitions, including the array suffix.
    pub fn type_text(&self) -> String {
        format!("{}{}", self.field_type.name(), self.array.suffix())
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_text(), self.name)
    }
}

/// A named constant declared in a message definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstantSpec {
    pub kind: PrimitiveKind,
    pub name: String,
    /// Literal as written, trimmed.
    pub value: String,
}

impl fmt::Display for ConstantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}={}", self.kind, self.name, self.value)
    }
}
