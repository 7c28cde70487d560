//! Rust profile: a plain struct plus `write`/`encode`/`decode` over the
//! runtime crate's `wire` module.
//!
//! Composite fields are referenced as `crate::{package}::{Name}`, so the
//! consuming crate declares one module per package.

use std::collections::BTreeSet;

use msgprims_schema::{
    min_element_size, ArrayKind, ConstantSpec, FieldSpec, FieldType, MessageSchema, PrimitiveKind,
    SchemaRegistry,
};

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::naming::{rust_ident, rust_quoted, split_type_name};
use crate::writer::CodeWriter;

pub(crate) fn generate(
    schema: &MessageSchema,
    registry: &SchemaRegistry,
    config: &GeneratorConfig,
) -> Result<String> {
    let runtime = &config.runtime_crate;
    let mut w = CodeWriter::new("    ");

    w.line(format!("// Generated by msgprims from {}. Do not edit.", schema.type_name()));
    w.blank();
    for import in imports(schema, runtime) {
        w.line(import);
    }
    w.blank();

    let name = schema.short_name();
    w.line(format!("/// `{}` message.", schema.type_name()));
    w.line("#[derive(Debug, Clone, PartialEq)]");
    if schema.fields().is_empty() {
        w.line(format!("pub struct {name} {{}}"));
    } else {
        w.block(format!("pub struct {name} {{"), "}", |w| {
            for field in schema.fields() {
                w.line(format!("pub {}: {},", rust_ident(&field.name), field_type(field)));
            }
        });
    }
    w.blank();

    w.block(format!("impl Default for {name} {{"), "}", |w| {
        w.block("fn default() -> Self {", "}", |w| {
            w.block("Self {", "}", |w| {
                for field in schema.fields() {
                    w.line(format!("{}: {},", rust_ident(&field.name), default_expr(field)));
                }
            });
        });
    });
    w.blank();

    let writer = if schema.fields().is_empty() { "_writer" } else { "writer" };
    let reader = if schema.fields().is_empty() { "_reader" } else { "reader" };
    let fingerprint = schema.fingerprint().to_hex();
    let definition = schema.full_text(registry);

    w.block(format!("impl {name} {{"), "}", |w| {
        w.line(format!("pub const TYPE_NAME: &str = {};", rust_quoted(schema.type_name())));
        w.line(format!("pub const FINGERPRINT: &str = {};", rust_quoted(&fingerprint)));
        w.line(format!("pub const DEFINITION: &str = {};", rust_quoted(&definition)));
        for constant in schema.constants() {
            w.line(constant_decl(constant));
        }
        w.blank();

        w.line("/// Append the encoded message to `dst`; `dst` is unchanged on error.");
        w.block("pub fn encode(&self, dst: &mut BytesMut) -> Result<(), CodecError> {", "}", |w| {
            w.line("let start = dst.len();");
            w.line("let result = self.write(&mut WireWriter::new(dst));");
            w.block("if result.is_err() {", "}", |w| w.line("dst.truncate(start);"));
            w.line("result");
        });
        w.blank();

        w.block(
            format!("pub fn write(&self, {writer}: &mut WireWriter<'_>) -> Result<(), CodecError> {{"),
            "}",
            |w| {
                for field in schema.fields() {
                    write_field(w, field);
                }
                w.line("Ok(())");
            },
        );
        w.blank();

        w.block(
            format!("pub fn decode({reader}: &mut WireReader<'_>) -> Result<Self, CodecError> {{"),
            "}",
            |w| {
                if schema.fields().is_empty() {
                    w.line("Ok(Self {})");
                    return;
                }
                w.block("Ok(Self {", "})", |w| {
                    for field in schema.fields() {
                        read_field(w, field, registry);
                    }
                });
            },
        );
    });

    Ok(w.finish())
}

fn imports(schema: &MessageSchema, runtime: &str) -> Vec<String> {
    let mut items = BTreeSet::from(["CodecError"]);
    for field in schema.fields() {
        match &field.field_type {
            FieldType::Primitive(PrimitiveKind::Time) => {
                items.insert("Time");
            }
            FieldType::Primitive(PrimitiveKind::Duration) => {
                items.insert("Duration");
            }
            FieldType::Composite(_) => {
                items.insert("PathSegment");
            }
            FieldType::Primitive(_) => {}
        }
        if field.array.is_array() && !field.is_byte_array() {
            items.insert("PathSegment");
        }
        if matches!(field.array, ArrayKind::Fixed(_)) {
            items.insert("check_array_len");
        }
    }

    let items: Vec<&str> = items.into_iter().collect();
    let runtime_items = match items.as_slice() {
        [single] => format!("use {runtime}::{single};"),
        _ => format!("use {runtime}::{{{}}};", items.join(", ")),
    };
    vec![
        format!("use {runtime}::bytes::BytesMut;"),
        format!("use {runtime}::wire::{{WireReader, WireWriter}};"),
        runtime_items,
    ]
}

fn composite_path(type_name: &str) -> String {
    match split_type_name(type_name) {
        (Some(package), name) => format!("crate::{package}::{name}"),
        (None, name) => format!("crate::{name}"),
    }
}

fn element_type(field_type: &FieldType) -> String {
    match field_type {
        FieldType::Primitive(kind) => primitive_type(*kind).to_string(),
        FieldType::Composite(name) => composite_path(name),
    }
}

fn primitive_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::Int8 => "i8",
        PrimitiveKind::UInt8 => "u8",
        PrimitiveKind::Int16 => "i16",
        PrimitiveKind::UInt16 => "u16",
        PrimitiveKind::Int32 => "i32",
        PrimitiveKind::UInt32 => "u32",
        PrimitiveKind::Int64 => "i64",
        PrimitiveKind::UInt64 => "u64",
        PrimitiveKind::Float32 => "f32",
        PrimitiveKind::Float64 => "f64",
        PrimitiveKind::String => "String",
        PrimitiveKind::Time => "Time",
        PrimitiveKind::Duration => "Duration",
    }
}

fn field_type(field: &FieldSpec) -> String {
    if field.array.is_array() {
        format!("Vec<{}>", element_type(&field.field_type))
    } else {
        element_type(&field.field_type)
    }
}

fn default_expr(field: &FieldSpec) -> String {
    match field.array {
        ArrayKind::Scalar => "Default::default()".to_string(),
        ArrayKind::Fixed(len) if field.is_byte_array() => format!("vec![0; {len}]"),
        ArrayKind::Fixed(len) => format!("vec![Default::default(); {len}]"),
        ArrayKind::Variable => "Vec::new()".to_string(),
    }
}

fn constant_decl(constant: &ConstantSpec) -> String {
    let (ty, literal) = match constant.kind {
        PrimitiveKind::String => ("&str", rust_quoted(&constant.value)),
        PrimitiveKind::Bool => (
            "bool",
            matches!(constant.value.as_str(), "true" | "True" | "1").to_string(),
        ),
        PrimitiveKind::Float32 | PrimitiveKind::Float64 => {
            let ty = primitive_type(constant.kind);
            (ty, float_literal(ty, &constant.value))
        }
        kind => {
            let literal = constant
                .value
                .parse::<i128>()
                .map_or_else(|_| constant.value.clone(), |v| v.to_string());
            (primitive_type(kind), literal)
        }
    };
    format!("pub const {}: {ty} = {literal};", constant.name)
}

fn float_literal(ty: &str, text: &str) -> String {
    match text.parse::<f64>() {
        Ok(v) if v.is_nan() => format!("{ty}::NAN"),
        Ok(v) if v == f64::INFINITY => format!("{ty}::INFINITY"),
        Ok(v) if v == f64::NEG_INFINITY => format!("{ty}::NEG_INFINITY"),
        Ok(v) if ty == "f32" => format!("{:?}", v as f32),
        Ok(v) => format!("{v:?}"),
        Err(_) => text.to_string(),
    }
}

fn write_field(w: &mut CodeWriter, field: &FieldSpec) {
    let ident = rust_ident(&field.name);
    let label = rust_quoted(&field.name);

    if field.is_byte_array() {
        match field.array {
            ArrayKind::Fixed(len) => {
                w.line(format!("check_array_len({len}, self.{ident}.len(), {label})?;"));
                w.line(format!("writer.put_raw(&self.{ident});"));
            }
            _ => w.line(format!("writer.put_byte_vec(&self.{ident}, {label})?;")),
        }
        return;
    }

    match field.array {
        ArrayKind::Scalar => {
            write_element(w, &field.field_type, &format!("self.{ident}"), &label, false, None);
            return;
        }
        ArrayKind::Fixed(len) => {
            w.line(format!("check_array_len({len}, self.{ident}.len(), {label})?;"));
        }
        ArrayKind::Variable => {
            w.line(format!("writer.put_count(self.{ident}.len(), {label})?;"));
        }
    }

    // Only composite and string elements can fail to write.
    let fallible = matches!(
        field.field_type,
        FieldType::Composite(_) | FieldType::Primitive(PrimitiveKind::String)
    );
    if fallible {
        w.block(
            format!("for (index, item) in self.{ident}.iter().enumerate() {{"),
            "}",
            |w| write_element(w, &field.field_type, "item", &label, true, Some("index")),
        );
    } else {
        w.block(format!("for item in &self.{ident} {{"), "}", |w| {
            write_element(w, &field.field_type, "item", &label, true, None)
        });
    }
}

/// `by_ref` is true when `expr` is already a reference (loop items).
fn write_element(
    w: &mut CodeWriter,
    field_type: &FieldType,
    expr: &str,
    label: &str,
    by_ref: bool,
    index: Option<&str>,
) {
    match field_type {
        FieldType::Primitive(PrimitiveKind::String) => {
            let arg = if by_ref { expr.to_string() } else { format!("&{expr}") };
            match index {
                Some(_) => w.line(format!(
                    "writer.put_string({arg}, \"\").map_err(|err| {})?;",
                    path_chain(label, index)
                )),
                None => w.line(format!("writer.put_string({arg}, {label})?;")),
            }
        }
        FieldType::Primitive(kind) => {
            let arg = if by_ref { format!("*{expr}") } else { expr.to_string() };
            w.line(format!("writer.put_{}({arg});", wire_suffix(*kind)));
        }
        FieldType::Composite(_) => {
            w.line(format!("{expr}.write(writer).map_err(|err| {{"));
            w.indent();
            w.line(path_chain(label, index));
            w.dedent();
            w.line("})?;");
        }
    }
}

fn read_field(w: &mut CodeWriter, field: &FieldSpec, registry: &SchemaRegistry) {
    let ident = rust_ident(&field.name);
    let label = rust_quoted(&field.name);

    if field.is_byte_array() {
        match field.array {
            ArrayKind::Fixed(len) => w.line(format!("{ident}: reader.take({len}, {label})?.to_vec(),")),
            _ => w.line(format!("{ident}: reader.read_byte_vec({label})?,")),
        }
        return;
    }

    let count = match field.array {
        ArrayKind::Scalar => {
            w.line(format!("{ident}: {},", read_element(&field.field_type, &label, None)));
            return;
        }
        ArrayKind::Fixed(len) => len.to_string(),
        ArrayKind::Variable => format!(
            "reader.read_count({label}, {})?",
            min_element_size(&field.field_type, registry)
        ),
    };

    w.block(format!("{ident}: {{"), "},", |w| {
        w.line(format!("let count = {count};"));
        w.line("let mut items = Vec::with_capacity(count.min(reader.remaining()));");
        w.block("for index in 0..count {", "}", |w| {
            w.line(format!("items.push({});", read_element(&field.field_type, &label, Some("index"))));
        });
        w.line("items");
    });
}

fn read_element(field_type: &FieldType, label: &str, index: Option<&str>) -> String {
    match field_type {
        FieldType::Primitive(kind) => match index {
            Some(_) => format!(
                "reader.read_{}(\"\").map_err(|err| {})?",
                wire_suffix(*kind),
                path_chain(label, index)
            ),
            None => format!("reader.read_{}({label})?", wire_suffix(*kind)),
        },
        FieldType::Composite(name) => format!(
            "{}::decode(reader).map_err(|err| {})?",
            composite_path(name),
            path_chain(label, index)
        ),
    }
}

fn path_chain(label: &str, index: Option<&str>) -> String {
    match index {
        Some(index) => format!(
            "err.at(PathSegment::Index({index})).at(PathSegment::Field({label}))"
        ),
        None => format!("err.at(PathSegment::Field({label}))"),
    }
}

fn wire_suffix(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::Int8 => "i8",
        PrimitiveKind::UInt8 => "u8",
        PrimitiveKind::Int16 => "i16",
        PrimitiveKind::UInt16 => "u16",
        PrimitiveKind::Int32 => "i32",
        PrimitiveKind::UInt32 => "u32",
        PrimitiveKind::Int64 => "i64",
        PrimitiveKind::UInt64 => "u64",
        PrimitiveKind::Float32 => "f32",
        PrimitiveKind::Float64 => "f64",
        PrimitiveKind::String => "string",
        PrimitiveKind::Time => "time",
        PrimitiveKind::Duration => "duration",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetLanguage;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_embedded(&[
            ("geometry_msgs/Point", "float64 x\nfloat64 y\nfloat64 z\n"),
            (
                "nav/Track",
                "int32 MAX=10\nfloat32 SCALE=2\nstring LABEL=a \"b\" # c\n\
                 string name\nuint8[] data\nuint8[4] tag\ngeometry_msgs/Point[] points\n\
                 geometry_msgs/Point origin\nint16[3] triple\ntime stamp\nstring type\n",
            ),
            ("nav/Empty", ""),
        ])
        .unwrap()
    }

    fn generate_for(registry: &SchemaRegistry, name: &str) -> String {
        let config = GeneratorConfig::new(TargetLanguage::Rust);
        generate(registry.get(name).unwrap(), registry, &config).unwrap()
    }

    #[test]
    fn struct_uses_runtime_types() {
        let out = generate_for(&registry(), "nav/Track");
        assert!(out.starts_with("// Generated by msgprims from nav/Track. Do not edit.\n"));
        assert!(out.contains(
            "use msgprims_codec::{CodecError, PathSegment, Time, check_array_len};"
        ));
        assert!(out.contains("    pub name: String,\n"));
        assert!(out.contains("    pub data: Vec<u8>,\n"));
        assert!(out.contains("    pub points: Vec<crate::geometry_msgs::Point>,\n"));
        assert!(out.contains("    pub r#type: String,\n"));
        assert!(out.contains("tag: vec![0; 4],"));
        assert!(out.contains("triple: vec![Default::default(); 3],"));
    }

    #[test]
    fn constants_become_associated_consts() {
        let out = generate_for(&registry(), "nav/Track");
        assert!(out.contains("pub const MAX: i32 = 10;"));
        assert!(out.contains("pub const SCALE: f32 = 2.0;"));
        assert!(out.contains(r#"pub const LABEL: &str = "a \"b\" # c";"#));
    }

    #[test]
    fn encode_and_decode_follow_field_order() {
        let out = generate_for(&registry(), "nav/Track");
        let name = out.find("writer.put_string(&self.name, \"name\")?;").unwrap();
        let data = out.find("writer.put_byte_vec(&self.data, \"data\")?;").unwrap();
        let stamp = out.find("writer.put_time(self.stamp);").unwrap();
        assert!(name < data && data < stamp);

        assert!(out.contains("let count = reader.read_count(\"points\", 24)?;"));
        assert!(out.contains("let count = 3;"));
        assert!(out.contains(
            "items.push(reader.read_i16(\"\").map_err(|err| err.at(PathSegment::Index(index)).at(PathSegment::Field(\"triple\")))?);"
        ));
        assert!(out.contains("tag: reader.take(4, \"tag\")?.to_vec(),"));
        assert!(out.contains(
            "crate::geometry_msgs::Point::decode(reader).map_err(|err| err.at(PathSegment::Index(index)).at(PathSegment::Field(\"points\")))?"
        ));
    }

    #[test]
    fn string_array_elements_carry_their_index() {
        let registry = SchemaRegistry::from_embedded(&[("nav/Notes", "string[] lines
")]).unwrap();
        let out = generate_for(&registry, "nav/Notes");
        assert!(out.contains("use msgprims_codec::{CodecError, PathSegment};"));
        assert!(out.contains("for (index, item) in self.lines.iter().enumerate() {"));
        assert!(out.contains(
            "writer.put_string(item, \"\").map_err(|err| err.at(PathSegment::Index(index)).at(PathSegment::Field(\"lines\")))?;"
        ));
        assert!(out.contains("let count = reader.read_count(\"lines\", 4)?;"));
    }

    #[test]
    fn empty_message_elements_have_zero_width() {
        let registry = SchemaRegistry::from_embedded(&[
            ("std_msgs/Empty", ""),
            ("nav/Pings", "std_msgs/Empty[] beats
"),
        ])
        .unwrap();
        let out = generate_for(&registry, "nav/Pings");
        assert!(out.contains("let count = reader.read_count(\"beats\", 0)?;"));
    }

    #[test]
    fn empty_message_has_unused_parameters_marked() {
        let out = generate_for(&registry(), "nav/Empty");
        assert!(out.contains("pub struct Empty {}"));
        assert!(out.contains("pub fn write(&self, _writer: &mut WireWriter<'_>)"));
        assert!(out.contains("Ok(Self {})"));
        assert!(out.contains("use msgprims_codec::CodecError;\n"));
    }
}
