/// Errors that can occur while compiling or registering message schemas.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A field references a composite type that is not registered.
    #[error("line {line}: unknown type `{type_name}`")]
    UnknownType { type_name: String, line: usize },

    /// Two fields or constants share the same name.
    #[error("line {line}: duplicate field `{name}`")]
    DuplicateField { name: String, line: usize },

    /// A definition line could not be parsed.
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A different schema is already registered under the same type name.
    #[error("type `{type_name}` already registered with fingerprint {existing}")]
    Conflict { type_name: String, existing: String },

    /// Definition files could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),
}

impl SchemaError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        SchemaError::Syntax {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
