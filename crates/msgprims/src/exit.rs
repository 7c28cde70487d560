use std::fmt;
use std::io;

use msgprims_codec::CodecError;
use msgprims_gen::GeneratorError;
use msgprims_schema::SchemaError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const SCHEMA_INVALID: i32 = 65;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    match err {
        SchemaError::LoadFailed(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(SCHEMA_INVALID, format!("{context}: {other}")),
    }
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    match err {
        CodecError::UnknownType(_) => CliError::new(SCHEMA_INVALID, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn generator_error(context: &str, err: GeneratorError) -> CliError {
    match err {
        GeneratorError::UnknownType(_) => {
            CliError::new(SCHEMA_INVALID, format!("{context}: {err}"))
        }
        GeneratorError::UnsupportedType { .. } => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgprims_gen::TargetLanguage;

    #[test]
    fn permission_denied_maps_to_50() {
        let err = io_error("read", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.code, PERMISSION_DENIED);
        assert!(err.message.starts_with("read: "));
    }

    #[test]
    fn syntax_errors_are_schema_invalid() {
        let err = schema_error(
            "compile",
            SchemaError::Syntax {
                line: 3,
                message: "missing field name".to_string(),
            },
        );
        assert_eq!(err.code, SCHEMA_INVALID);
        assert_eq!(err.message, "compile: line 3: missing field name");
    }

    #[test]
    fn codec_errors_are_data_invalid() {
        let err = codec_error("decode", CodecError::TrailingBytes { count: 2 });
        assert_eq!(err.code, DATA_INVALID);

        let err = codec_error("decode", CodecError::UnknownType("a/B".to_string()));
        assert_eq!(err.code, SCHEMA_INVALID);
    }

    #[test]
    fn unsupported_targets_fail() {
        let err = generator_error(
            "gen",
            GeneratorError::UnsupportedType {
                field: "stamp_ns".to_string(),
                type_name: "uint64".to_string(),
                target: TargetLanguage::TypeScript,
            },
        );
        assert_eq!(err.code, FAILURE);
    }
}
