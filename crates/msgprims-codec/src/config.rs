/// Default maximum string byte length and array element count: 16 MiB.
pub const DEFAULT_MAX_LENGTH: usize = 16 * 1024 * 1024;

/// Default number of zero-width elements one decode may produce.
pub const DEFAULT_MAX_EMPTY_ELEMENTS: usize = 1024;

/// Limits applied to length prefixes on both encode and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum string length in bytes.
    pub max_string_len: usize,
    /// Maximum element count of a variable-length array (bytes for `uint8[]`).
    pub max_array_len: usize,
    /// Total elements of empty message types (`std_msgs/Empty[]`) accepted
    /// across one decode. These occupy no bytes, so the buffer length cannot
    /// bound them.
    pub max_empty_elements: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_string_len: DEFAULT_MAX_LENGTH,
            max_array_len: DEFAULT_MAX_LENGTH,
            max_empty_elements: DEFAULT_MAX_EMPTY_ELEMENTS,
        }
    }
}
