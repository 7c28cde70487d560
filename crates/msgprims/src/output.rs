use std::fmt::Write as _;
use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use msgprims_codec::{to_json, MessageValue};
use msgprims_schema::{MessageSchema, SchemaRegistry};
use serde::Serialize;

use crate::exit::{CliError, CliResult, USAGE};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct SchemaOutput<'a> {
    schema_id: &'a str,
    type_name: &'a str,
    fingerprint: String,
    fixed_size: Option<usize>,
    dependencies: Vec<&'a str>,
    constants: Vec<ConstantOutput<'a>>,
    fields: Vec<FieldOutput<'a>>,
}

#[derive(Serialize)]
struct ConstantOutput<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct FieldOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    type_text: String,
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    schema_id: &'a str,
    type_name: &'a str,
    fingerprint: String,
    size: usize,
    hex: String,
}

#[derive(Serialize)]
struct GeneratedOutput<'a> {
    schema_id: &'a str,
    type_name: &'a str,
    language: &'a str,
    file_name: &'a str,
    source: &'a str,
}

pub fn print_schema(schema: &MessageSchema, registry: &SchemaRegistry, format: OutputFormat) {
    let fingerprint = schema.fingerprint().to_hex();
    match format {
        OutputFormat::Json => {
            let out = SchemaOutput {
                schema_id: "https://schemas.3leaps.dev/msgprims/cli/v1/schema-compiled.schema.json",
                type_name: schema.type_name(),
                fingerprint,
                fixed_size: schema.fixed_size(registry),
                dependencies: schema.dependencies(),
                constants: schema
                    .constants()
                    .iter()
                    .map(|constant| ConstantOutput {
                        kind: constant.kind.name(),
                        name: &constant.name,
                        value: &constant.value,
                    })
                    .collect(),
                fields: schema
                    .fields()
                    .iter()
                    .map(|field| FieldOutput {
                        name: &field.name,
                        type_text: field.type_text(),
                    })
                    .collect(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            println!("{} ({fingerprint})", schema.type_name());
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "NAME", "TYPE", "VALUE"]);
            for constant in schema.constants() {
                table.add_row(vec![
                    "constant".to_string(),
                    constant.name.clone(),
                    constant.kind.name().to_string(),
                    constant.value.clone(),
                ]);
            }
            for field in schema.fields() {
                table.add_row(vec![
                    "field".to_string(),
                    field.name.clone(),
                    field.type_text(),
                    String::new(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("type={} md5={fingerprint}", schema.type_name());
            for constant in schema.constants() {
                println!("  {constant}");
            }
            for field in schema.fields() {
                println!("  {field}");
            }
        }
        OutputFormat::Raw => println!("{fingerprint}"),
    }
}

/// Raw output writes the bytes themselves unless `as_hex` is set.
pub fn print_encoded(schema: &MessageSchema, bytes: &[u8], as_hex: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                schema_id: "https://schemas.3leaps.dev/msgprims/cli/v1/message-encoded.schema.json",
                type_name: schema.type_name(),
                fingerprint: schema.fingerprint().to_hex(),
                size: bytes.len(),
                hex: to_hex(bytes),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "SIZE", "HEX"])
                .add_row(vec![
                    schema.type_name().to_string(),
                    bytes.len().to_string(),
                    to_hex(bytes),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("type={} size={}", schema.type_name(), bytes.len());
            print!("{}", hex_dump(bytes));
        }
        OutputFormat::Raw if as_hex => println!("{}", to_hex(bytes)),
        OutputFormat::Raw => print_raw(bytes),
    }
}

pub fn print_message(message: &MessageValue, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&to_json(message)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (name, value) in message.fields() {
                let rendered = match value.as_message() {
                    Some(nested) => to_json(nested).to_string(),
                    None => value.to_string(),
                };
                table.add_row(vec![name.to_string(), rendered]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => print!("{message}"),
    }
}

pub fn print_generated(
    schema: &MessageSchema,
    language: &str,
    file_name: &str,
    source: &str,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = GeneratedOutput {
                schema_id: "https://schemas.3leaps.dev/msgprims/cli/v1/bindings-generated.schema.json",
                type_name: schema.type_name(),
                language,
                file_name,
                source,
            };
            print_json(&out);
        }
        _ => print_raw(source.as_bytes()),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Parse hex text; whitespace between digits is ignored.
pub fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&digits).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}

fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let _ = write!(out, "{:08x} ", row * 16);
        for byte in chunk {
            let _ = write!(out, " {byte:02x}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips() {
        let bytes = [0x02, 0x00, 0x6f, 0xff];
        assert_eq!(to_hex(&bytes), "02006fff");
        assert_eq!(parse_hex("02 00 6F ff").unwrap(), bytes);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(parse_hex("abc").unwrap_err().code, USAGE);
        assert_eq!(parse_hex("zz").unwrap_err().code, USAGE);
        assert!(parse_hex("0g").unwrap_err().message.contains("invalid hex input"));
        assert!(parse_hex("").unwrap().is_empty());
    }

    #[test]
    fn hex_dump_wraps_at_sixteen_bytes() {
        let dump = hex_dump(&[0u8; 17]);
        let lines: Vec<_> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("00000010  00"));
    }
}
