//! Source bindings generator for compiled message schemas.
//!
//! [`generate_bindings`] renders one schema as a Rust, Python or TypeScript
//! source file. Output depends only on the schema, the schemas it references
//! and the [`GeneratorConfig`], so regenerating an unchanged schema yields
//! identical text.

pub mod config;
pub mod error;
mod naming;
mod python;
mod rust;
mod typescript;
mod writer;

use std::collections::BTreeSet;

use msgprims_schema::{MessageSchema, SchemaRegistry};
use tracing::debug;

pub use config::{GeneratorConfig, ParseTargetError, TargetLanguage, DEFAULT_RUNTIME_CRATE};
pub use error::{GeneratorError, Result};

/// Render bindings for `schema` in the configured target language.
///
/// Every composite the schema references, directly or transitively, must be
/// present in `registry`.
pub fn generate_bindings(
    schema: &MessageSchema,
    registry: &SchemaRegistry,
    config: &GeneratorConfig,
) -> Result<String> {
    check_dependencies(schema, registry)?;

    let source = match config.target {
        TargetLanguage::Rust => rust::generate(schema, registry, config)?,
        TargetLanguage::Python => python::generate(schema, registry)?,
        TargetLanguage::TypeScript => typescript::generate(schema, registry)?,
    };

    debug!(
        type_name = %schema.type_name(),
        target = %config.target,
        bytes = source.len(),
        "bindings generated"
    );
    Ok(source)
}

/// Conventional file name for a schema's bindings, e.g. `Ping.rs`.
pub fn file_name(schema: &MessageSchema, target: TargetLanguage) -> String {
    format!("{}.{}", schema.short_name(), target.extension())
}

fn check_dependencies(schema: &MessageSchema, registry: &SchemaRegistry) -> Result<()> {
    let mut seen = BTreeSet::new();
    let mut pending: Vec<String> = schema.dependencies().into_iter().map(String::from).collect();
    while let Some(name) = pending.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        let dep = registry
            .get(&name)
            .ok_or_else(|| GeneratorError::UnknownType(name.clone()))?;
        pending.extend(dep.dependencies().into_iter().map(String::from));
    }
    Ok(())
}
