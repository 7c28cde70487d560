use std::fmt;
use std::str::FromStr;

/// Language a binding is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetLanguage {
    Rust,
    Python,
    TypeScript,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 3] = [
        TargetLanguage::Rust,
        TargetLanguage::Python,
        TargetLanguage::TypeScript,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TargetLanguage::Rust => "rust",
            TargetLanguage::Python => "python",
            TargetLanguage::TypeScript => "typescript",
        }
    }

    /// File extension of generated sources, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            TargetLanguage::Rust => "rs",
            TargetLanguage::Python => "py",
            TargetLanguage::TypeScript => "ts",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown language name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown target language `{0}` (expected rust, python or typescript)")]
pub struct ParseTargetError(String);

impl FromStr for TargetLanguage {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rust" | "rs" => Ok(TargetLanguage::Rust),
            "python" | "py" => Ok(TargetLanguage::Python),
            "typescript" | "ts" => Ok(TargetLanguage::TypeScript),
            _ => Err(ParseTargetError(s.to_string())),
        }
    }
}

/// Default crate path generated Rust code imports the runtime from.
pub const DEFAULT_RUNTIME_CRATE: &str = "msgprims_codec";

/// Options for [`generate_bindings`](crate::generate_bindings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub target: TargetLanguage,
    /// Crate path used in generated Rust `use` statements.
    pub runtime_crate: String,
}

impl GeneratorConfig {
    pub fn new(target: TargetLanguage) -> Self {
        Self {
            target,
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(TargetLanguage::Rust)
    }
}
