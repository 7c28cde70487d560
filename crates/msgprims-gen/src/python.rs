//! Python profile: one class per message with `serialize(buff)` and
//! `deserialize(data)`, packing through `struct` with `<` formats.
//!
//! Composite fields are referenced as `{package}.msg.{Name}`. `serialize`
//! encodes into a local buffer, so `buff` sees nothing when a field fails.

use std::collections::BTreeSet;

use msgprims_schema::{
    min_element_size, ArrayKind, ConstantSpec, FieldSpec, FieldType, MessageSchema, PrimitiveKind,
    SchemaRegistry,
};

use crate::error::Result;
use crate::naming::{python_ident, quoted, split_type_name};
use crate::writer::CodeWriter;

const HELPERS: &str = r#"_U32 = struct.Struct("<I")
_MAX_EMPTY_ELEMENTS = 1024


def _need(data, end, field):
    if end > len(data):
        raise ValueError("buffer underflow at %s: need %d bytes, have %d" % (field, end, len(data)))


def _check_len(value, expected, field):
    if len(value) != expected:
        raise ValueError("%s: expected %d elements, found %d" % (field, expected, len(value)))


def _unpack(fmt, data, offset, field):
    end = offset + struct.calcsize(fmt)
    _need(data, end, field)
    return struct.unpack_from(fmt, data, offset), end


def _read_count(data, offset, field):
    (count,), offset = _unpack("<I", data, offset, field)
    return count, offset


def _read_array_count(data, offset, field, min_size):
    count, offset = _read_count(data, offset, field)
    if min_size == 0:
        if count > _MAX_EMPTY_ELEMENTS:
            raise ValueError("length overflow at %s: %d exceeds max %d" % (field, count, _MAX_EMPTY_ELEMENTS))
    else:
        _need(data, offset + count * min_size, field)
    return count, offset


def _read_bool(data, offset, field):
    (raw,), offset = _unpack("<B", data, offset, field)
    if raw > 1:
        raise ValueError("invalid bool byte 0x%02x at %s" % (raw, field))
    return raw == 1, offset


def _read_bytes(data, offset, length, field):
    _need(data, offset + length, field)
    return bytes(data[offset:offset + length]), offset + length


def _write_string(buff, value):
    raw = value.encode("utf-8")
    buff.write(_U32.pack(len(raw)))
    buff.write(raw)


def _read_string(data, offset, field):
    length, offset = _read_count(data, offset, field)
    raw, offset = _read_bytes(data, offset, length, field)
    return raw.decode("utf-8"), offset
"#;

pub(crate) fn generate(schema: &MessageSchema, registry: &SchemaRegistry) -> Result<String> {
    let mut w = CodeWriter::new("    ");
    let name = schema.short_name();

    w.line(format!(
        "\"\"\"Generated by msgprims from {}. Do not edit.\"\"\"",
        schema.type_name()
    ));
    w.blank();
    w.line("import io");
    w.line("import struct");

    let packages: BTreeSet<&str> = schema
        .dependencies()
        .into_iter()
        .filter_map(|dep| split_type_name(dep).0)
        .collect();
    if !packages.is_empty() {
        w.blank();
        for package in packages {
            w.line(format!("import {package}.msg"));
        }
    }
    w.blank();
    for line in HELPERS.lines() {
        w.line(line);
    }
    w.blank();
    w.blank();

    let slots: Vec<String> = schema
        .fields()
        .iter()
        .map(|field| quoted(&python_ident(&field.name)))
        .collect();
    let slot_types: Vec<String> = schema
        .fields()
        .iter()
        .map(|field| quoted(&field.type_text()))
        .collect();

    w.scope(format!("class {name}:"), |w| {
        w.line(format!("_type = {}", quoted(schema.type_name())));
        w.line(format!("_md5sum = {}", quoted(&schema.fingerprint().to_hex())));
        w.line(format!("_full_text = {}", quoted(&schema.full_text(registry))));
        w.line(format!("__slots__ = [{}]", slots.join(", ")));
        w.line(format!("_slot_types = [{}]", slot_types.join(", ")));
        if !schema.constants().is_empty() {
            w.blank();
            for constant in schema.constants() {
                w.line(constant_decl(constant));
            }
        }
        w.blank();

        w.scope("def __init__(self, **kwds):", |w| {
            w.line("\"\"\"Unset or None fields take their zero defaults.\"\"\"");
            for field in schema.fields() {
                let attr = python_ident(&field.name);
                w.line(format!("self.{attr} = kwds.pop({}, None)", quoted(&attr)));
            }
            w.scope("if kwds:", |w| {
                w.line("raise TypeError(\"unknown fields: %s\" % \", \".join(sorted(kwds)))");
            });
            for field in schema.fields() {
                let attr = python_ident(&field.name);
                w.scope(format!("if self.{attr} is None:"), |w| {
                    w.line(format!("self.{attr} = {}", default_expr(field)));
                });
            }
        });

        w.blank();

        w.scope("def serialize(self, buff):", |w| {
            w.line("\"\"\"Write the encoded message to a binary stream.\"\"\"");
            w.line("out = io.BytesIO()");
            for field in schema.fields() {
                serialize_field(w, field);
            }
            w.line("buff.write(out.getvalue())");
        });

        w.blank();

        w.scope("def deserialize(self, data):", |w| {
            w.line("\"\"\"Populate this message from bytes; raises ValueError on underflow.\"\"\"");
            w.line("self._read(memoryview(data), 0)");
            w.line("return self");
        });

        w.blank();

        w.scope("def _read(self, data, offset):", |w| {
            for field in schema.fields() {
                read_field(w, field, registry);
            }
            w.line("return offset");
        });
    });

    Ok(w.finish())
}

fn composite_ref(type_name: &str) -> String {
    match split_type_name(type_name) {
        (Some(package), name) => format!("{package}.msg.{name}"),
        (None, name) => name.to_string(),
    }
}

fn struct_code(kind: PrimitiveKind) -> Option<&'static str> {
    Some(match kind {
        PrimitiveKind::Bool => "?",
        PrimitiveKind::Int8 => "b",
        PrimitiveKind::UInt8 => "B",
        PrimitiveKind::Int16 => "h",
        PrimitiveKind::UInt16 => "H",
        PrimitiveKind::Int32 => "i",
        PrimitiveKind::UInt32 => "I",
        PrimitiveKind::Int64 => "q",
        PrimitiveKind::UInt64 => "Q",
        PrimitiveKind::Float32 => "f",
        PrimitiveKind::Float64 => "d",
        PrimitiveKind::Time => "2I",
        PrimitiveKind::Duration => "2i",
        PrimitiveKind::String => return None,
    })
}

/// Format code for element types that pack as one value each. Bools are
/// read one at a time so that bytes other than 0 and 1 are rejected.
fn packed_code(field_type: &FieldType) -> Option<&'static str> {
    match field_type {
        FieldType::Primitive(PrimitiveKind::Time | PrimitiveKind::Duration | PrimitiveKind::Bool) => None,
        FieldType::Primitive(kind) => struct_code(*kind),
        FieldType::Composite(_) => None,
    }
}

fn element_default(field_type: &FieldType) -> String {
    match field_type {
        FieldType::Primitive(PrimitiveKind::Bool) => "False".to_string(),
        FieldType::Primitive(PrimitiveKind::Float32 | PrimitiveKind::Float64) => "0.0".to_string(),
        FieldType::Primitive(PrimitiveKind::String) => "\"\"".to_string(),
        FieldType::Primitive(PrimitiveKind::Time | PrimitiveKind::Duration) => "(0, 0)".to_string(),
        FieldType::Primitive(_) => "0".to_string(),
        FieldType::Composite(name) => format!("{}()", composite_ref(name)),
    }
}

fn default_expr(field: &FieldSpec) -> String {
    match field.array {
        ArrayKind::Variable if field.is_byte_array() => "b\"\"".to_string(),
        ArrayKind::Fixed(len) if field.is_byte_array() => format!("bytes({len})"),
        ArrayKind::Scalar => element_default(&field.field_type),
        ArrayKind::Variable => "[]".to_string(),
        ArrayKind::Fixed(len) => match &field.field_type {
            FieldType::Composite(_) => {
                format!("[{} for _ in range({len})]", element_default(&field.field_type))
            }
            field_type => format!("[{}] * {len}", element_default(field_type)),
        },
    }
}

fn constant_decl(constant: &ConstantSpec) -> String {
    let literal = match constant.kind {
        PrimitiveKind::String => quoted(&constant.value),
        PrimitiveKind::Bool => {
            if matches!(constant.value.as_str(), "true" | "True" | "1") {
                "True".to_string()
            } else {
                "False".to_string()
            }
        }
        _ => constant.value.clone(),
    };
    format!("{} = {literal}", constant.name)
}

fn serialize_field(w: &mut CodeWriter, field: &FieldSpec) {
    let attr = format!("self.{}", python_ident(&field.name));
    let label = quoted(&field.name);

    if field.is_byte_array() {
        match field.array {
            ArrayKind::Fixed(len) => w.line(format!("_check_len({attr}, {len}, {label})")),
            _ => w.line(format!("out.write(_U32.pack(len({attr})))")),
        }
        w.line(format!("out.write(bytes({attr}))"));
        return;
    }

    match field.array {
        ArrayKind::Scalar => {
            serialize_element(w, &field.field_type, &attr);
            return;
        }
        ArrayKind::Fixed(len) => w.line(format!("_check_len({attr}, {len}, {label})")),
        ArrayKind::Variable => w.line(format!("out.write(_U32.pack(len({attr})))")),
    }

    match packed_code(&field.field_type) {
        Some(code) => w.line(format!(
            "out.write(struct.pack(\"<%d{code}\" % len({attr}), *{attr}))"
        )),
        None => w.scope(format!("for _x in {attr}:"), |w| {
            serialize_element(w, &field.field_type, "_x");
        }),
    }
}

fn serialize_element(w: &mut CodeWriter, field_type: &FieldType, expr: &str) {
    match field_type {
        FieldType::Primitive(PrimitiveKind::String) => w.line(format!("_write_string(out, {expr})")),
        FieldType::Primitive(kind @ (PrimitiveKind::Time | PrimitiveKind::Duration)) => {
            let code = struct_code(*kind).unwrap_or_default();
            w.line(format!("out.write(struct.pack(\"<{code}\", *{expr}))"));
        }
        FieldType::Primitive(kind) => {
            let code = struct_code(*kind).unwrap_or_default();
            w.line(format!("out.write(struct.pack(\"<{code}\", {expr}))"));
        }
        FieldType::Composite(_) => w.line(format!("{expr}.serialize(out)")),
    }
}

fn read_field(w: &mut CodeWriter, field: &FieldSpec, registry: &SchemaRegistry) {
    let attr = format!("self.{}", python_ident(&field.name));
    let label = quoted(&field.name);

    if field.is_byte_array() {
        match field.array {
            ArrayKind::Fixed(len) => {
                w.line(format!("{attr}, offset = _read_bytes(data, offset, {len}, {label})"));
            }
            _ => {
                w.line(format!("length, offset = _read_count(data, offset, {label})"));
                w.line(format!("{attr}, offset = _read_bytes(data, offset, length, {label})"));
            }
        }
        return;
    }

    let count = match field.array {
        ArrayKind::Scalar => {
            read_element(w, &field.field_type, &attr, &label);
            return;
        }
        ArrayKind::Fixed(len) => len.to_string(),
        ArrayKind::Variable => {
            w.line(format!(
                "count, offset = _read_array_count(data, offset, {label}, {})",
                min_element_size(&field.field_type, registry)
            ));
            "count".to_string()
        }
    };

    match packed_code(&field.field_type) {
        Some(code) => {
            w.line(format!(
                "_v, offset = _unpack(\"<%d{code}\" % {count}, data, offset, {label})"
            ));
            w.line(format!("{attr} = list(_v)"));
        }
        None => {
            w.line(format!("{attr} = []"));
            w.scope(format!("for _ in range({count}):"), |w| {
                read_element(w, &field.field_type, "_v", &label);
                w.line(format!("{attr}.append(_v)"));
            });
        }
    }
}

fn read_element(w: &mut CodeWriter, field_type: &FieldType, target: &str, label: &str) {
    match field_type {
        FieldType::Primitive(PrimitiveKind::String) => {
            w.line(format!("{target}, offset = _read_string(data, offset, {label})"));
        }
        FieldType::Primitive(PrimitiveKind::Bool) => {
            w.line(format!("{target}, offset = _read_bool(data, offset, {label})"));
        }
        FieldType::Primitive(kind @ (PrimitiveKind::Time | PrimitiveKind::Duration)) => {
            let code = struct_code(*kind).unwrap_or_default();
            w.line(format!("{target}, offset = _unpack(\"<{code}\", data, offset, {label})"));
        }
        FieldType::Primitive(kind) => {
            let code = struct_code(*kind).unwrap_or_default();
            w.line(format!("({target},), offset = _unpack(\"<{code}\", data, offset, {label})"));
        }
        FieldType::Composite(name) => {
            w.line(format!("{target} = {}()", composite_ref(name)));
            w.line(format!("offset = {target}._read(data, offset)"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING: &str = "string status\nint16 value1\nint16 value2\n";

    #[test]
    fn ping_class_carries_metadata() {
        let registry = SchemaRegistry::from_embedded(&[("parallax_eddie_robot/Ping", PING)]).unwrap();
        let out = generate(registry.get("parallax_eddie_robot/Ping").unwrap(), &registry).unwrap();

        assert!(out.contains("class Ping:\n"));
        assert!(out.contains("    _md5sum = \"a9ac828bf931795f5243ecde9378b11f\"\n"));
        assert!(out.contains("    __slots__ = [\"status\", \"value1\", \"value2\"]\n"));
        assert!(out.contains("    _slot_types = [\"string\", \"int16\", \"int16\"]\n"));
        assert!(out.contains("            self.status = \"\"\n"));
        assert!(out.contains("        _write_string(out, self.status)\n"));
        assert!(out.contains("        out.write(struct.pack(\"<h\", self.value1))\n"));
        assert!(out.contains(
            "        (self.value2,), offset = _unpack(\"<h\", data, offset, \"value2\")\n"
        ));
        assert!(out.ends_with("return offset\n"));
    }

    #[test]
    fn arrays_and_composites() {
        let registry = SchemaRegistry::from_embedded(&[
            ("geometry_msgs/Point", "float64 x\nfloat64 y\nfloat64 z\n"),
            (
                "nav/Path",
                "uint16[] value\ngeometry_msgs/Point[2] corners\nstring[] tags\nuint8[] blob\nint8 KIND=3\n",
            ),
        ])
        .unwrap();
        let out = generate(registry.get("nav/Path").unwrap(), &registry).unwrap();

        assert!(out.contains("\nimport geometry_msgs.msg\n"));
        assert!(out.contains("    KIND = 3\n"));
        assert!(out.contains("out.write(struct.pack(\"<%dH\" % len(self.value), *self.value))"));
        assert!(out.contains("count, offset = _read_array_count(data, offset, \"value\", 2)"));
        assert!(out.contains(
            "self.corners = [geometry_msgs.msg.Point() for _ in range(2)]"
        ));
        assert!(out.contains("_check_len(self.corners, 2, \"corners\")"));
        assert!(out.contains("offset = _v._read(data, offset)"));
        assert!(out.contains("_v, offset = _read_string(data, offset, \"tags\")"));
        assert!(out.contains("self.blob = b\"\""));
    }

    #[test]
    fn serialize_writes_once_after_every_field() {
        let registry = SchemaRegistry::from_embedded(&[("parallax_eddie_robot/Ping", PING)]).unwrap();
        let out = generate(registry.get("parallax_eddie_robot/Ping").unwrap(), &registry).unwrap();

        let start = out.find("    def serialize(self, buff):\n").unwrap();
        let end = out.find("    def deserialize(self, data):\n").unwrap();
        let body = &out[start..end];
        assert!(body.contains("        out = io.BytesIO()\n"));
        assert_eq!(body.matches("buff.write(").count(), 1);
        assert!(body.ends_with("        buff.write(out.getvalue())\n\n"));
        assert!(out.contains("\nimport io\nimport struct\n"));
    }

    #[test]
    fn bools_are_read_strictly() {
        let registry = SchemaRegistry::from_embedded(&[("nav/Flags", "bool armed\nbool[2] lights\n")]).unwrap();
        let out = generate(registry.get("nav/Flags").unwrap(), &registry).unwrap();

        assert!(!out.contains("\"<?\", data"));
        assert!(!out.contains("%d?"));
        assert!(out.contains("        self.armed, offset = _read_bool(data, offset, \"armed\")\n"));
        assert!(out.contains("            _v, offset = _read_bool(data, offset, \"lights\")\n"));
        assert!(out.contains("    if raw > 1:\n        raise ValueError("));
    }

    #[test]
    fn empty_element_counts_are_capped() {
        let registry = SchemaRegistry::from_embedded(&[
            ("std_msgs/Empty", ""),
            ("geometry_msgs/Point", "float64 x\nfloat64 y\nfloat64 z\n"),
            ("nav/Mixed", "std_msgs/Empty[] beats\ngeometry_msgs/Point[] points\n"),
        ])
        .unwrap();
        let out = generate(registry.get("nav/Mixed").unwrap(), &registry).unwrap();

        assert!(out.contains("count, offset = _read_array_count(data, offset, \"beats\", 0)"));
        assert!(out.contains("count, offset = _read_array_count(data, offset, \"points\", 24)"));
        assert!(out.contains("_MAX_EMPTY_ELEMENTS = 1024\n"));
    }
}
