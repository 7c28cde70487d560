//! TypeScript profile: an interface plus `create`, `size`, `write`, `read`,
//! `encode` and `decode` functions over `DataView`.
//!
//! 64-bit integers have no exact `number` representation and are rejected.
//! Integer fields are range-checked before they are stored, since `DataView`
//! setters wrap out-of-range values silently.
//! Composites are imported from `./{Name}` within a package and from
//! `../{package}/{Name}` across packages.

use msgprims_schema::{
    min_element_size, ArrayKind, ConstantSpec, FieldSpec, FieldType, MessageSchema, PrimitiveKind,
    SchemaRegistry,
};

use crate::config::TargetLanguage;
use crate::error::{GeneratorError, Result};
use crate::naming::{quoted, split_type_name};
use crate::writer::CodeWriter;

const HELPERS: &str = r#"const textEncoder = new TextEncoder();
const textDecoder = new TextDecoder("utf-8", { fatal: true });
const MAX_EMPTY_ELEMENTS = 1024;

function need(view: DataView, end: number, field: string): void {
  if (end > view.byteLength) {
    throw new RangeError(`buffer underflow at ${field}: need ${end} bytes, have ${view.byteLength}`);
  }
}

function checkLength(found: number, expected: number, field: string): void {
  if (found !== expected) {
    throw new RangeError(`${field}: expected ${expected} elements, found ${found}`);
  }
}

function checkInteger(value: number, min: number, max: number, field: string): void {
  if (!(Number.isInteger(value) && value >= min && value <= max)) {
    throw new TypeError(`${field}: ${value} is not an integer in [${min}, ${max}]`);
  }
}

function writeBytes(view: DataView, offset: number, bytes: Uint8Array, prefixed: boolean): number {
  if (prefixed) {
    view.setUint32(offset, bytes.length, true);
    offset += 4;
  }
  new Uint8Array(view.buffer, view.byteOffset + offset, bytes.length).set(bytes);
  return offset + bytes.length;
}

function readBytes(view: DataView, offset: number, length: number, field: string): [Uint8Array, number] {
  need(view, offset + length, field);
  const bytes = new Uint8Array(view.buffer, view.byteOffset + offset, length).slice();
  return [bytes, offset + length];
}

function readCount(view: DataView, offset: number, field: string): [number, number] {
  need(view, offset + 4, field);
  return [view.getUint32(offset, true), offset + 4];
}

function readArrayCount(view: DataView, offset: number, field: string, minSize: number): [number, number] {
  const [count, start] = readCount(view, offset, field);
  if (minSize === 0) {
    if (count > MAX_EMPTY_ELEMENTS) {
      throw new RangeError(`length overflow at ${field}: ${count} exceeds max ${MAX_EMPTY_ELEMENTS}`);
    }
  } else {
    need(view, start + count * minSize, field);
  }
  return [count, start];
}

function readBool(view: DataView, offset: number, field: string): boolean {
  const byte = view.getUint8(offset);
  if (byte > 1) {
    throw new RangeError(`invalid bool byte ${byte} at ${field}`);
  }
  return byte === 1;
}

function writeString(view: DataView, offset: number, value: string): number {
  return writeBytes(view, offset, textEncoder.encode(value), true);
}

function readString(view: DataView, offset: number, field: string): [string, number] {
  const [length, start] = readCount(view, offset, field);
  const [bytes, end] = readBytes(view, start, length, field);
  return [textDecoder.decode(bytes), end];
}"#;

pub(crate) fn generate(schema: &MessageSchema, registry: &SchemaRegistry) -> Result<String> {
    check_representable(schema)?;

    let name = schema.short_name();
    let mut w = CodeWriter::new("  ");

    w.line(format!("// Generated by msgprims from {}. Do not edit.", schema.type_name()));
    w.blank();
    let dependencies = schema.dependencies();
    if !dependencies.is_empty() {
        for dep in &dependencies {
            w.line(import_line(schema.package(), dep));
        }
        w.blank();
    }
    for line in HELPERS.lines() {
        w.line(line);
    }
    w.blank();

    w.block(format!("export interface {name} {{"), "}", |w| {
        for field in schema.fields() {
            w.line(format!("{}: {};", field.name, field_type(field)));
        }
    });
    w.blank();

    w.block(format!("export const {name}Info = {{"), "} as const;", |w| {
        w.line(format!("typeName: {},", quoted(schema.type_name())));
        w.line(format!("fingerprint: {},", quoted(&schema.fingerprint().to_hex())));
        w.line(format!("definition: {},", quoted(&schema.full_text(registry))));
    });
    if !schema.constants().is_empty() {
        w.blank();
        w.block(format!("export const {name}Constants = {{"), "} as const;", |w| {
            for constant in schema.constants() {
                w.line(constant_entry(constant));
            }
        });
    }
    w.blank();

    w.block(format!("export function create{name}(): {name} {{"), "}", |w| {
        w.block("return {", "};", |w| {
            for field in schema.fields() {
                w.line(format!("{}: {},", field.name, default_expr(field)));
            }
        });
    });
    w.blank();

    w.block(format!("export function size{name}(msg: {name}): number {{"), "}", |w| {
        w.line("let size = 0;");
        for field in schema.fields() {
            size_field(w, field);
        }
        w.line("return size;");
    });
    w.blank();

    w.block(
        format!("export function write{name}(view: DataView, offset: number, msg: {name}): number {{"),
        "}",
        |w| {
            for field in schema.fields() {
                write_field(w, field);
            }
            w.line("return offset;");
        },
    );
    w.blank();

    w.block(
        format!("export function read{name}(view: DataView, offset: number): [{name}, number] {{"),
        "}",
        |w| {
            w.line(format!("const msg = create{name}();"));
            for field in schema.fields() {
                read_field(w, field, registry);
            }
            w.line("return [msg, offset];");
        },
    );
    w.blank();

    w.block(format!("export function encode{name}(msg: {name}): Uint8Array {{"), "}", |w| {
        w.line(format!("const bytes = new Uint8Array(size{name}(msg));"));
        w.line(format!("write{name}(new DataView(bytes.buffer), 0, msg);"));
        w.line("return bytes;");
    });
    w.blank();

    w.block(format!("export function decode{name}(bytes: Uint8Array): {name} {{"), "}", |w| {
        w.line("const view = new DataView(bytes.buffer, bytes.byteOffset, bytes.byteLength);");
        w.line(format!("return read{name}(view, 0)[0];"));
    });

    Ok(w.finish())
}

fn check_representable(schema: &MessageSchema) -> Result<()> {
    for field in schema.fields() {
        if let FieldType::Primitive(PrimitiveKind::Int64 | PrimitiveKind::UInt64) = field.field_type {
            return Err(GeneratorError::UnsupportedType {
                field: field.name.clone(),
                type_name: field.type_text(),
                target: TargetLanguage::TypeScript,
            });
        }
    }
    Ok(())
}

fn import_line(own_package: Option<&str>, dep: &str) -> String {
    let (package, name) = split_type_name(dep);
    let path = match package {
        Some(package) if Some(package) != own_package => format!("../{package}/{name}"),
        _ => format!("./{name}"),
    };
    format!(
        "import {{ {name}, create{name}, read{name}, size{name}, write{name} }} from {};",
        quoted(&path)
    )
}

fn element_type(field_type: &FieldType) -> String {
    match field_type {
        FieldType::Primitive(PrimitiveKind::Bool) => "boolean".to_string(),
        FieldType::Primitive(PrimitiveKind::String) => "string".to_string(),
        FieldType::Primitive(PrimitiveKind::Time | PrimitiveKind::Duration) => {
            "{ secs: number; nsecs: number }".to_string()
        }
        FieldType::Primitive(_) => "number".to_string(),
        FieldType::Composite(name) => split_type_name(name).1.to_string(),
    }
}

fn field_type(field: &FieldSpec) -> String {
    if field.is_byte_array() {
        return "Uint8Array".to_string();
    }
    match field.array {
        ArrayKind::Scalar => element_type(&field.field_type),
        _ => format!("{}[]", element_type(&field.field_type)),
    }
}

fn element_default(field_type: &FieldType) -> String {
    match field_type {
        FieldType::Primitive(PrimitiveKind::Bool) => "false".to_string(),
        FieldType::Primitive(PrimitiveKind::String) => "\"\"".to_string(),
        FieldType::Primitive(PrimitiveKind::Time | PrimitiveKind::Duration) => {
            "{ secs: 0, nsecs: 0 }".to_string()
        }
        FieldType::Primitive(_) => "0".to_string(),
        FieldType::Composite(name) => format!("create{}()", split_type_name(name).1),
    }
}

fn default_expr(field: &FieldSpec) -> String {
    match field.array {
        ArrayKind::Variable if field.is_byte_array() => "new Uint8Array(0)".to_string(),
        ArrayKind::Fixed(len) if field.is_byte_array() => format!("new Uint8Array({len})"),
        ArrayKind::Scalar => element_default(&field.field_type),
        ArrayKind::Variable => "[]".to_string(),
        ArrayKind::Fixed(len) => format!(
            "Array.from({{ length: {len} }}, () => {})",
            element_default(&field.field_type)
        ),
    }
}

fn constant_entry(constant: &ConstantSpec) -> String {
    let literal = match constant.kind {
        PrimitiveKind::String => quoted(&constant.value),
        PrimitiveKind::Bool => matches!(constant.value.as_str(), "true" | "True" | "1").to_string(),
        PrimitiveKind::Int64 | PrimitiveKind::UInt64 => format!("{}n", constant.value),
        _ => constant.value.clone(),
    };
    format!("{}: {literal},", constant.name)
}

/// Inclusive range of the integer kinds `number` holds exactly.
fn integer_range(kind: PrimitiveKind) -> Option<(i64, i64)> {
    Some(match kind {
        PrimitiveKind::Int8 => (i8::MIN.into(), i8::MAX.into()),
        PrimitiveKind::UInt8 => (0, u8::MAX.into()),
        PrimitiveKind::Int16 => (i16::MIN.into(), i16::MAX.into()),
        PrimitiveKind::UInt16 => (0, u16::MAX.into()),
        PrimitiveKind::Int32 | PrimitiveKind::Duration => (i32::MIN.into(), i32::MAX.into()),
        PrimitiveKind::UInt32 | PrimitiveKind::Time => (0, u32::MAX.into()),
        _ => return None,
    })
}

/// Accessor and byte width for fixed-width scalars.
fn view_method(kind: PrimitiveKind) -> Option<(&'static str, usize)> {
    Some(match kind {
        PrimitiveKind::Bool | PrimitiveKind::UInt8 => ("Uint8", 1),
        PrimitiveKind::Int8 => ("Int8", 1),
        PrimitiveKind::Int16 => ("Int16", 2),
        PrimitiveKind::UInt16 => ("Uint16", 2),
        PrimitiveKind::Int32 => ("Int32", 4),
        PrimitiveKind::UInt32 => ("Uint32", 4),
        PrimitiveKind::Float32 => ("Float32", 4),
        PrimitiveKind::Float64 => ("Float64", 8),
        PrimitiveKind::Time => ("Uint32", 8),
        PrimitiveKind::Duration => ("Int32", 8),
        PrimitiveKind::Int64 | PrimitiveKind::UInt64 | PrimitiveKind::String => return None,
    })
}

fn size_field(w: &mut CodeWriter, field: &FieldSpec) {
    let expr = format!("msg.{}", field.name);
    let prefix = if field.array == ArrayKind::Variable { "4 + " } else { "" };

    if field.is_byte_array() {
        w.line(format!("size += {prefix}{expr}.length;"));
        return;
    }

    let fixed = match &field.field_type {
        FieldType::Primitive(kind) => kind.fixed_size(),
        FieldType::Composite(_) => None,
    };
    match (field.array, fixed) {
        (ArrayKind::Scalar, Some(width)) => w.line(format!("size += {width};")),
        (ArrayKind::Scalar, None) => w.line(format!("size += {};", element_size(&field.field_type, &expr))),
        (_, Some(width)) => w.line(format!("size += {prefix}{expr}.length * {width};")),
        (_, None) => {
            if !prefix.is_empty() {
                w.line("size += 4;");
            }
            w.block(format!("for (const item of {expr}) {{"), "}", |w| {
                w.line(format!("size += {};", element_size(&field.field_type, "item")));
            });
        }
    }
}

fn element_size(field_type: &FieldType, expr: &str) -> String {
    match field_type {
        FieldType::Composite(name) => format!("size{}({expr})", split_type_name(name).1),
        FieldType::Primitive(_) => format!("4 + textEncoder.encode({expr}).length"),
    }
}

fn write_field(w: &mut CodeWriter, field: &FieldSpec) {
    let expr = format!("msg.{}", field.name);
    let label = quoted(&field.name);
    let label = label.as_str();

    if let ArrayKind::Fixed(len) = field.array {
        w.line(format!("checkLength({expr}.length, {len}, {label});"));
    }
    if field.is_byte_array() {
        let prefixed = field.array == ArrayKind::Variable;
        w.line(format!("offset = writeBytes(view, offset, {expr}, {prefixed});"));
        return;
    }

    match field.array {
        ArrayKind::Scalar => write_element(w, &field.field_type, &expr, label),
        ArrayKind::Fixed(_) => w.block(format!("for (const item of {expr}) {{"), "}", |w| {
            write_element(w, &field.field_type, "item", label);
        }),
        ArrayKind::Variable => {
            w.line(format!("view.setUint32(offset, {expr}.length, true);"));
            w.line("offset += 4;");
            w.block(format!("for (const item of {expr}) {{"), "}", |w| {
                write_element(w, &field.field_type, "item", label);
            });
        }
    }
}

fn write_element(w: &mut CodeWriter, field_type: &FieldType, expr: &str, label: &str) {
    match field_type {
        FieldType::Composite(name) => {
            w.line(format!("offset = write{}(view, offset, {expr});", split_type_name(name).1));
        }
        FieldType::Primitive(PrimitiveKind::String) => {
            w.line(format!("offset = writeString(view, offset, {expr});"));
        }
        FieldType::Primitive(kind @ (PrimitiveKind::Time | PrimitiveKind::Duration)) => {
            let (method, _) = view_method(*kind).unwrap_or(("Uint32", 8));
            if let Some((min, max)) = integer_range(*kind) {
                w.line(format!("checkInteger({expr}.secs, {min}, {max}, {label});"));
                w.line(format!("checkInteger({expr}.nsecs, {min}, {max}, {label});"));
            }
            w.line(format!("view.set{method}(offset, {expr}.secs, true);"));
            w.line(format!("view.set{method}(offset + 4, {expr}.nsecs, true);"));
            w.line("offset += 8;");
        }
        FieldType::Primitive(PrimitiveKind::Bool) => {
            w.line(format!("view.setUint8(offset, {expr} ? 1 : 0);"));
            w.line("offset += 1;");
        }
        FieldType::Primitive(kind) => {
            let (method, width) = view_method(*kind).unwrap_or(("Uint8", 1));
            let endian = if width > 1 { ", true" } else { "" };
            if let Some((min, max)) = integer_range(*kind) {
                w.line(format!("checkInteger({expr}, {min}, {max}, {label});"));
            }
            w.line(format!("view.set{method}(offset, {expr}{endian});"));
            w.line(format!("offset += {width};"));
        }
    }
}

fn read_field(w: &mut CodeWriter, field: &FieldSpec, registry: &SchemaRegistry) {
    let target = format!("msg.{}", field.name);
    let label = quoted(&field.name);

    if field.is_byte_array() {
        match field.array {
            ArrayKind::Fixed(len) => {
                w.line(format!("[{target}, offset] = readBytes(view, offset, {len}, {label});"));
            }
            _ => {
                w.block("{", "}", |w| {
                    w.line(format!("const [length, start] = readCount(view, offset, {label});"));
                    w.line(format!("[{target}, offset] = readBytes(view, start, length, {label});"));
                });
            }
        }
        return;
    }

    let count = match field.array {
        ArrayKind::Scalar => {
            read_element(w, &field.field_type, &target, &label, false);
            return;
        }
        ArrayKind::Fixed(len) => len.to_string(),
        ArrayKind::Variable => "count".to_string(),
    };

    w.block("{", "}", |w| {
        if field.array == ArrayKind::Variable {
            w.line("let count: number;");
            w.line(format!(
                "[count, offset] = readArrayCount(view, offset, {label}, {});",
                min_element_size(&field.field_type, registry)
            ));
        }
        w.line(format!("{target} = [];"));
        w.block(format!("for (let i = 0; i < {count}; i++) {{"), "}", |w| {
            read_element(w, &field.field_type, "item", &label, true);
            w.line(format!("{target}.push(item);"));
        });
    });
}

/// Read one element into `target`, declaring it first when `declare`.
fn read_element(w: &mut CodeWriter, field_type: &FieldType, target: &str, label: &str, declare: bool) {
    match field_type {
        FieldType::Composite(name) => {
            let short = split_type_name(name).1;
            if declare {
                w.line(format!("let {target}: {short};"));
            }
            w.line(format!("[{target}, offset] = read{short}(view, offset);"));
        }
        FieldType::Primitive(PrimitiveKind::String) => {
            if declare {
                w.line(format!("let {target}: string;"));
            }
            w.line(format!("[{target}, offset] = readString(view, offset, {label});"));
        }
        FieldType::Primitive(kind) => {
            let (method, width) = view_method(*kind).unwrap_or(("Uint8", 1));
            let value = match kind {
                PrimitiveKind::Time | PrimitiveKind::Duration => format!(
                    "{{ secs: view.get{method}(offset, true), nsecs: view.get{method}(offset + 4, true) }}"
                ),
                PrimitiveKind::Bool => format!("readBool(view, offset, {label})"),
                _ if width == 1 => format!("view.get{method}(offset)"),
                _ => format!("view.get{method}(offset, true)"),
            };
            let binding = if declare { format!("const {target}") } else { target.to_string() };
            w.line(format!("need(view, offset + {width}, {label});"));
            w.line(format!("{binding} = {value};"));
            w.line(format!("offset += {width};"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_embedded(&[
            ("parallax_eddie_robot/Ping", "string status\nint16 value1\nint16 value2\n"),
            ("geometry_msgs/Point", "float64 x\nfloat64 y\nfloat64 z\n"),
            (
                "nav/Track",
                "uint8 MODE=2\nuint8[] data\ngeometry_msgs/Point[] points\ntime stamp\nbool[2] flags\n",
            ),
            ("nav/Counter", "uint64 ticks\n"),
        ])
        .unwrap()
    }

    #[test]
    fn ping_interface_and_functions() {
        let registry = registry();
        let out = generate(registry.get("parallax_eddie_robot/Ping").unwrap(), &registry).unwrap();

        assert!(out.contains("export interface Ping {\n  status: string;\n  value1: number;\n  value2: number;\n}\n"));
        assert!(out.contains("  fingerprint: \"a9ac828bf931795f5243ecde9378b11f\",\n"));
        assert!(out.contains("export function encodePing(msg: Ping): Uint8Array {"));
        assert!(out.contains("  view.setInt16(offset, msg.value1, true);\n  offset += 2;\n"));
        assert!(out.contains("  [msg.status, offset] = readString(view, offset, \"status\");\n"));
        assert!(out.contains("  size += 4 + textEncoder.encode(msg.status).length;\n"));
        assert!(!out.contains("import {"));
    }

    #[test]
    fn composites_are_imported_across_packages() {
        let registry = registry();
        let out = generate(registry.get("nav/Track").unwrap(), &registry).unwrap();

        assert!(out.contains(
            "import { Point, createPoint, readPoint, sizePoint, writePoint } from \"../geometry_msgs/Point\";"
        ));
        assert!(out.contains("  points: Point[];\n"));
        assert!(out.contains("  stamp: { secs: number; nsecs: number };\n"));
        assert!(out.contains("  flags: Array.from({ length: 2 }, () => false),\n"));
        assert!(out.contains("  MODE: 2,\n"));
        assert!(out.contains("  checkLength(msg.flags.length, 2, \"flags\");\n"));
        assert!(out.contains("      [item, offset] = readPoint(view, offset);\n"));
        assert!(out.contains("    [count, offset] = readArrayCount(view, offset, \"points\", 24);\n"));
        assert!(out.contains("    const item = readBool(view, offset, \"flags\");\n"));
        assert!(!out.contains("!== 0"));
    }

    #[test]
    fn integer_stores_are_range_checked() {
        let registry = registry();
        let out = generate(registry.get("parallax_eddie_robot/Ping").unwrap(), &registry).unwrap();
        assert!(out.contains(
            "  checkInteger(msg.value1, -32768, 32767, \"value1\");\n  view.setInt16(offset, msg.value1, true);\n"
        ));
        assert!(out.contains("if (!(Number.isInteger(value) && value >= min && value <= max)) {"));
        assert!(out.contains("throw new TypeError(`${field}: ${value} is not an integer in [${min}, ${max}]`);"));

        let out = generate(registry.get("nav/Track").unwrap(), &registry).unwrap();
        assert!(out.contains("  checkInteger(msg.stamp.secs, 0, 4294967295, \"stamp\");\n"));
        assert!(!out.contains("checkInteger(msg.flags"));
    }

    #[test]
    fn empty_element_counts_are_capped() {
        let registry = SchemaRegistry::from_embedded(&[
            ("std_msgs/Empty", ""),
            ("nav/Beats", "std_msgs/Empty[] beats\n"),
        ])
        .unwrap();
        let out = generate(registry.get("nav/Beats").unwrap(), &registry).unwrap();
        assert!(out.contains("[count, offset] = readArrayCount(view, offset, \"beats\", 0);"));
        assert!(out.contains("const MAX_EMPTY_ELEMENTS = 1024;\n"));
    }

    #[test]
    fn sixty_four_bit_fields_are_unsupported() {
        let registry = registry();
        let err = generate(registry.get("nav/Counter").unwrap(), &registry).unwrap_err();
        assert_eq!(
            err,
            GeneratorError::UnsupportedType {
                field: "ticks".to_string(),
                type_name: "uint64".to_string(),
                target: TargetLanguage::TypeScript,
            }
        );
    }
}
