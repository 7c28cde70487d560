//! Message definition parser.
//!
//! One declaration per line:
//!
//! ```text
//! # comment
//! TYPE NAME            # field
//! TYPE[] NAME          # variable-length array
//! TYPE[N] NAME         # fixed-length array
//! TYPE NAME=VALUE      # constant
//! ```
//!
//! String constants take the rest of the line verbatim, `#` included.

use crate::error::{Result, SchemaError};
use crate::registry::SchemaRegistry;
use crate::schema::{MessageSchema, SchemaBuilder};
use crate::types::{ArrayKind, PrimitiveKind};

/// Compile definition text into a schema, resolving composite references
/// against `registry`. The registry is not modified.
pub fn compile(type_name: &str, text: &str, registry: &SchemaRegistry) -> Result<MessageSchema> {
    let mut builder = SchemaBuilder::new(type_name);
    builder.set_definition(text);

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (type_token, rest) = trimmed
            .split_once(char::is_whitespace)
            .ok_or_else(|| SchemaError::syntax(line, "expected `TYPE NAME`"))?;
        let (base, array) = parse_type_token(type_token, line)?;
        let rest = rest.trim_start();

        let hash = rest.find('#');
        let equals = rest.find('=');
        let string_constant = match (equals, hash) {
            (Some(eq), Some(h)) if eq < h => Some(eq),
            (Some(eq), None) => Some(eq),
            _ => None,
        }
        .filter(|_| base == PrimitiveKind::String.name());

        if let Some(eq) = string_constant {
            let name = rest[..eq].trim().to_string();
            let value = rest[eq + 1..].trim().to_string();
            push_constant(&mut builder, line, base, array, name, value)?;
            continue;
        }

        let rest = match hash {
            Some(h) => rest[..h].trim(),
            None => rest.trim(),
        };

        match rest.split_once('=') {
            Some((name, value)) => {
                let name = name.trim().to_string();
                let value = value.trim().to_string();
                push_constant(&mut builder, line, base, array, name, value)?;
            }
            None => {
                if rest.is_empty() {
                    return Err(SchemaError::syntax(line, "missing field name"));
                }
                if rest.contains(char::is_whitespace) {
                    return Err(SchemaError::syntax(
                        line,
                        format!("unexpected tokens after field name: `{rest}`"),
                    ));
                }
                builder.push_field(line, rest.to_string(), base.to_string(), array);
            }
        }
    }

    builder.build(registry)
}

fn push_constant(
    builder: &mut SchemaBuilder,
    line: usize,
    base: &str,
    array: ArrayKind,
    name: String,
    value: String,
) -> Result<()> {
    if array.is_array() {
        return Err(SchemaError::syntax(line, "array constants are not allowed"));
    }
    let kind = PrimitiveKind::from_name(base).ok_or_else(|| {
        SchemaError::syntax(line, format!("constants must be primitive, found `{base}`"))
    })?;
    builder.push_constant(line, kind, name, value);
    Ok(())
}

fn parse_type_token(token: &str, line: usize) -> Result<(&str, ArrayKind)> {
    let Some(open) = token.find('[') else {
        return Ok((token, ArrayKind::Scalar));
    };
    let Some(inner) = token[open + 1..].strip_suffix(']') else {
        return Err(SchemaError::syntax(line, format!("malformed array type `{token}`")));
    };
    let base = &token[..open];
    if base.is_empty() {
        return Err(SchemaError::syntax(line, format!("malformed array type `{token}`")));
    }
    if inner.is_empty() {
        return Ok((base, ArrayKind::Variable));
    }
    let len = inner
        .parse::<usize>()
        .map_err(|_| SchemaError::syntax(line, format!("invalid array length `{inner}`")))?;
    Ok((base, ArrayKind::Fixed(len)))
}
