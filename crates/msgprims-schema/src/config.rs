/// Limits applied when loading `.msg` files from disk.
///
/// Definitions are small text files; anything far past these sizes is
/// almost certainly not a message definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Definition files accepted from one package directory.
    pub max_schemas_from_directory: usize,
    /// Bytes accepted per definition file.
    pub max_schema_file_size: usize,
}

pub const DEFAULT_MAX_DEFINITIONS: usize = 1024;
pub const DEFAULT_MAX_DEFINITION_SIZE: usize = 64 * 1024;

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_schemas_from_directory: DEFAULT_MAX_DEFINITIONS,
            max_schema_file_size: DEFAULT_MAX_DEFINITION_SIZE,
        }
    }
}
