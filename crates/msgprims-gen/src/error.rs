use crate::config::TargetLanguage;

/// Errors that can occur while generating bindings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    /// The target language cannot represent this field's type exactly.
    #[error("field `{field}` of type {type_name} is not supported for {target}")]
    UnsupportedType {
        field: String,
        type_name: String,
        target: TargetLanguage,
    },

    /// A composite dependency is not present in the registry.
    #[error("type `{0}` is not registered")]
    UnknownType(String),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
