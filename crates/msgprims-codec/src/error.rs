/// Errors that can occur while encoding or decoding message values.
///
/// `field` is a dotted path from the top-level message (`pose.position.x`,
/// `ranges[3]`); it is empty when the error concerns the message itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A value's runtime type disagrees with the schema.
    #[error("type mismatch at `{field}`: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    /// A read would run past the end of the buffer.
    #[error("buffer underflow at `{field}` (offset {offset}): needed {needed} bytes, {remaining} remaining")]
    BufferUnderflow {
        field: String,
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A length or element count exceeds the wire format or configured limit.
    #[error("length overflow at `{field}`: {length} exceeds max {max}")]
    LengthOverflow {
        field: String,
        length: usize,
        max: usize,
    },

    /// A fixed-size array holds the wrong number of elements.
    #[error("array length mismatch at `{field}`: expected {expected} elements, found {found}")]
    ArrayLength {
        field: String,
        expected: usize,
        found: usize,
    },

    /// String bytes are not valid UTF-8.
    #[error("invalid UTF-8 at `{field}` (offset {offset})")]
    InvalidUtf8 { field: String, offset: usize },

    /// A bool byte other than 0 or 1.
    #[error("invalid bool byte {byte:#04x} at `{field}` (offset {offset})")]
    InvalidBool {
        field: String,
        offset: usize,
        byte: u8,
    },

    /// A composite type is not present in the registry.
    #[error("type `{0}` is not registered")]
    UnknownType(String),

    /// The message has no field with this name.
    #[error("no field `{0}`")]
    UnknownField(String),

    /// The value lacks a field the schema declares.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// Bytes remain after a message that should fill the whole buffer.
    #[error("{count} trailing bytes after message")]
    TrailingBytes { count: usize },
}

/// One step of a field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Field(&'a str),
    Index(usize),
}

impl CodecError {
    /// Prefix the error's field path with `segment`.
    ///
    /// Paths are assembled on the way out of a failed call, so successful
    /// calls never build them.
    pub fn at(mut self, segment: PathSegment<'_>) -> Self {
        if let Some(path) = self.path_mut() {
            prefix_path(path, segment);
        }
        self
    }

    /// The field path, if this error carries one.
    pub fn field(&self) -> Option<&str> {
        match self {
            CodecError::TypeMismatch { field, .. }
            | CodecError::BufferUnderflow { field, .. }
            | CodecError::LengthOverflow { field, .. }
            | CodecError::ArrayLength { field, .. }
            | CodecError::InvalidUtf8 { field, .. }
            | CodecError::InvalidBool { field, .. }
            | CodecError::UnknownField(field)
            | CodecError::MissingField(field) => Some(field),
            CodecError::UnknownType(_) | CodecError::TrailingBytes { .. } => None,
        }
    }

    fn path_mut(&mut self) -> Option<&mut String> {
        match self {
            CodecError::TypeMismatch { field, .. }
            | CodecError::BufferUnderflow { field, .. }
            | CodecError::LengthOverflow { field, .. }
            | CodecError::ArrayLength { field, .. }
            | CodecError::InvalidUtf8 { field, .. }
            | CodecError::InvalidBool { field, .. }
            | CodecError::UnknownField(field)
            | CodecError::MissingField(field) => Some(field),
            CodecError::UnknownType(_) | CodecError::TrailingBytes { .. } => None,
        }
    }
}

fn prefix_path(path: &mut String, segment: PathSegment<'_>) {
    let head = match segment {
        PathSegment::Field(name) => name.to_string(),
        PathSegment::Index(index) => format!("[{index}]"),
    };
    if !path.is_empty() && !path.starts_with('[') {
        path.insert(0, '.');
    }
    path.insert_str(0, &head);
}

pub type Result<T> = std::result::Result<T, CodecError>;
