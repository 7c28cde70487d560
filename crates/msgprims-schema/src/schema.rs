use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::fingerprint::Fingerprint;
use crate::registry::SchemaRegistry;
use crate::types::{ArrayKind, ConstantSpec, FieldSpec, FieldType, PrimitiveKind};

/// Width of the `u32` length prefix on strings and variable arrays.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Separator between definitions in [`MessageSchema::full_text`].
pub const DEFINITION_SEPARATOR: &str =
    "================================================================================";

/// A compiled, immutable message schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSchema {
    type_name: String,
    constants: Vec<ConstantSpec>,
    fields: Vec<FieldSpec>,
    fingerprint: Fingerprint,
    canonical_text: String,
    definition: String,
}

impl MessageSchema {
    /// Fully-qualified type name, e.g. `parallax_eddie_robot/Ping`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Package prefix of the type name, if any.
    pub fn package(&self) -> Option<&str> {
        self.type_name.rsplit_once('/').map(|(package, _)| package)
    }

    /// Type name without its package prefix.
    pub fn short_name(&self) -> &str {
        self.type_name
            .rsplit_once('/')
            .map_or(self.type_name.as_str(), |(_, name)| name)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn constants(&self) -> &[ConstantSpec] {
        &self.constants
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// The text the fingerprint is computed over.
    pub fn canonical_text(&self) -> &str {
        &self.canonical_text
    }

    /// Definition text as supplied to the compiler.
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Composite types referenced directly by this schema, sorted and deduplicated.
    pub fn dependencies(&self) -> Vec<&str> {
        let deps: BTreeSet<&str> = self
            .fields
            .iter()
            .filter_map(|field| field.field_type.as_composite())
            .collect();
        deps.into_iter().collect()
    }

    /// Sum of the encoded sizes if every field has a fixed width.
    pub fn fixed_size(&self, registry: &SchemaRegistry) -> Option<usize> {
        self.fields.iter().try_fold(0usize, |total, field| {
            let element = match &field.field_type {
                FieldType::Primitive(kind) => kind.fixed_size()?,
                FieldType::Composite(name) => registry.get(name)?.fixed_size(registry)?,
            };
            let count = match field.array {
                ArrayKind::Scalar => 1,
                ArrayKind::Fixed(len) => len,
                ArrayKind::Variable => return None,
            };
            total.checked_add(element.checked_mul(count)?)
        })
    }

    /// Smallest number of bytes any encoding of this schema occupies.
    ///
    /// Strings and variable arrays count only their length prefix. Composites
    /// missing from `registry` count as zero.
    pub fn min_size(&self, registry: &SchemaRegistry) -> usize {
        self.fields.iter().fold(0usize, |total, field| {
            let size = match field.array {
                ArrayKind::Variable => LENGTH_PREFIX_SIZE,
                ArrayKind::Scalar => min_element_size(&field.field_type, registry),
                ArrayKind::Fixed(len) => {
                    min_element_size(&field.field_type, registry).saturating_mul(len)
                }
            };
            total.saturating_add(size)
        })
    }

    /// Definition followed by every transitive dependency's definition.
    pub fn full_text(&self, registry: &SchemaRegistry) -> String {
        let mut out = self.definition.trim_end().to_string();
        out.push('\n');

        let mut seen = BTreeSet::new();
        let mut stack: Vec<String> = self.dependencies().into_iter().rev().map(String::from).collect();
        while let Some(name) = stack.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(dep) = registry.get(&name) else {
                continue;
            };
            out.push_str(DEFINITION_SEPARATOR);
            out.push_str("\nMSG: ");
            out.push_str(dep.type_name());
            out.push('\n');
            out.push_str(dep.definition().trim_end());
            out.push('\n');
            stack.extend(dep.dependencies().into_iter().rev().map(String::from));
        }
        out
    }
}

/// Smallest encoded size of one element of `field_type`.
pub fn min_element_size(field_type: &FieldType, registry: &SchemaRegistry) -> usize {
    match field_type {
        FieldType::Primitive(kind) => kind.fixed_size().unwrap_or(LENGTH_PREFIX_SIZE),
        FieldType::Composite(name) => registry
            .get(name)
            .map_or(0, |schema| schema.min_size(registry)),
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Constant {
        kind: PrimitiveKind,
        name: String,
        value: String,
    },
    Field {
        name: String,
        type_ref: String,
        array: ArrayKind,
    },
}

/// Assembles a [`MessageSchema`] field by field.
///
/// This is the single validation path: the definition parser feeds its lines
/// through a builder, so programmatic and textual schemas obey the same rules.
///
/// ```
/// use msgprims_schema::{SchemaBuilder, SchemaRegistry};
///
/// let registry = SchemaRegistry::new();
/// let schema = SchemaBuilder::new("parallax_eddie_robot/Ping")
///     .field("status", "string")
///     .field("value1", "int16")
///     .field("value2", "int16")
///     .build(&registry)
///     .unwrap();
/// assert_eq!(schema.fingerprint().to_hex(), "a9ac828bf931795f5243ecde9378b11f");
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    type_name: String,
    entries: Vec<(Entry, usize)>,
    definition: Option<String>,
}

impl SchemaBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            entries: Vec::new(),
            definition: None,
        }
    }

    /// Add a scalar field. `type_ref` is a primitive name or a composite type name.
    pub fn field(self, name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        self.array_field(name, type_ref, ArrayKind::Scalar)
    }

    pub fn array_field(
        mut self,
        name: impl Into<String>,
        type_ref: impl Into<String>,
        array: ArrayKind,
    ) -> Self {
        let line = self.entries.len() + 1;
        self.push_field(line, name.into(), type_ref.into(), array);
        self
    }

    pub fn constant(
        mut self,
        kind: PrimitiveKind,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let line = self.entries.len() + 1;
        self.push_constant(line, kind, name.into(), value.into());
        self
    }

    pub(crate) fn push_field(&mut self, line: usize, name: String, type_ref: String, array: ArrayKind) {
        self.entries.push((
            Entry::Field {
                name,
                type_ref,
                array,
            },
            line,
        ));
    }

    pub(crate) fn push_constant(&mut self, line: usize, kind: PrimitiveKind, name: String, value: String) {
        self.entries.push((Entry::Constant { kind, name, value }, line));
    }

    pub(crate) fn set_definition(&mut self, text: &str) {
        self.definition = Some(text.to_string());
    }

    /// Validate entries, resolve composite references and compute the fingerprint.
    pub fn build(self, registry: &SchemaRegistry) -> Result<MessageSchema> {
        if !is_valid_type_name(&self.type_name) {
            return Err(SchemaError::syntax(
                0,
                format!("invalid type name `{}`", self.type_name),
            ));
        }
        let package = self.type_name.rsplit_once('/').map(|(package, _)| package);

        let mut names = BTreeSet::new();
        let mut constants = Vec::new();
        let mut fields = Vec::new();
        let mut constant_lines = Vec::new();
        let mut field_lines = Vec::new();

        for (entry, line) in self.entries {
            let name = match &entry {
                Entry::Constant { name, .. } | Entry::Field { name, .. } => name.clone(),
            };
            if !is_valid_identifier(&name) {
                return Err(SchemaError::syntax(line, format!("invalid name `{name}`")));
            }
            if !names.insert(name.clone()) {
                return Err(SchemaError::DuplicateField { name, line });
            }

            match entry {
                Entry::Constant { kind, name, value } => {
                    if !kind.allows_constant() {
                        return Err(SchemaError::syntax(
                            line,
                            format!("constants of type `{kind}` are not allowed"),
                        ));
                    }
                    if !kind.validate_literal(&value) {
                        return Err(SchemaError::syntax(
                            line,
                            format!("invalid {kind} constant value `{value}`"),
                        ));
                    }
                    constant_lines.push(format!("{kind} {name}={value}"));
                    constants.push(ConstantSpec { kind, name, value });
                }
                Entry::Field {
                    name,
                    type_ref,
                    array,
                } => {
                    if array == ArrayKind::Fixed(0) {
                        return Err(SchemaError::syntax(line, "fixed array length must be positive"));
                    }
                    let (field_type, canonical_type) = match PrimitiveKind::from_name(&type_ref) {
                        Some(kind) => (
                            FieldType::Primitive(kind),
                            format!("{}{}", kind.name(), array.suffix()),
                        ),
                        None => {
                            if !is_valid_type_name(&type_ref) {
                                return Err(SchemaError::syntax(
                                    line,
                                    format!("invalid type `{type_ref}`"),
                                ));
                            }
                            let resolved = registry
                                .resolve(&type_ref, package)
                                .filter(|schema| schema.type_name() != self.type_name)
                                .ok_or_else(|| SchemaError::UnknownType {
                                    type_name: type_ref.clone(),
                                    line,
                                })?;
                            (
                                FieldType::Composite(resolved.type_name().to_string()),
                                resolved.fingerprint().to_hex(),
                            )
                        }
                    };
                    field_lines.push(format!("{canonical_type} {name}"));
                    fields.push(FieldSpec {
                        name,
                        field_type,
                        array,
                    });
                }
            }
        }

        constant_lines.extend(field_lines);
        let canonical_text = constant_lines.join("\n");
        let fingerprint = Fingerprint::of_canonical_text(&canonical_text);

        let definition = match self.definition {
            Some(text) => text,
            None => render_definition(&constants, &fields),
        };

        debug!(
            type_name = %self.type_name,
            fields = fields.len(),
            constants = constants.len(),
            %fingerprint,
            "schema compiled"
        );

        Ok(MessageSchema {
            type_name: self.type_name,
            constants,
            fields,
            fingerprint,
            canonical_text,
            definition,
        })
    }
}

fn render_definition(constants: &[ConstantSpec], fields: &[FieldSpec]) -> String {
    let mut out = String::new();
    for constant in constants {
        out.push_str(&constant.to_string());
        out.push('\n');
    }
    for field in fields {
        out.push_str(&field.to_string());
        out.push('\n');
    }
    out
}

pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn is_valid_type_name(name: &str) -> bool {
    match name.split_once('/') {
        Some((package, short)) => is_valid_identifier(package) && is_valid_identifier(short),
        None => is_valid_identifier(name),
    }
}
