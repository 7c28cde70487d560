use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use msgprims_gen::TargetLanguage;
use msgprims_schema::{MessageSchema, SchemaRegistry};
use tracing::debug;

use crate::exit::{io_error, schema_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod compile;
pub mod decode;
pub mod encode;
pub mod gen;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a definition and print its fingerprint and layout.
    Compile(CompileArgs),
    /// Generate source bindings for a definition.
    Gen(GenArgs),
    /// Encode a JSON message to wire bytes.
    Encode(EncodeArgs),
    /// Decode wire bytes into a message.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Compile(args) => compile::run(args, format),
        Command::Gen(args) => gen::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

/// Locating and naming the definition file; shared by every schema command.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Definition file (`.msg`).
    pub file: PathBuf,
    /// Directory of definitions to load first (repeatable).
    #[arg(long, short = 'I', value_name = "DIR")]
    pub include: Vec<PathBuf>,
    /// Full type name (`pkg/Name`). Default: derived from the file path.
    #[arg(long = "type", value_name = "NAME")]
    pub type_name: Option<String>,
}

#[derive(Args, Debug)]
pub struct CompileArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,
}

#[derive(Args, Debug)]
pub struct GenArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,
    /// Target language (rust, python, typescript).
    #[arg(long, short = 'l')]
    pub lang: TargetLanguage,
    /// Write to this file, or into this directory when it exists.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub out: Option<PathBuf>,
    /// Crate path generated Rust code imports the runtime from.
    #[arg(long, value_name = "CRATE")]
    pub runtime_crate: Option<String>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,
    /// Message as a JSON object; absent fields take zero defaults.
    #[arg(long)]
    pub json: String,
    /// With `--format raw`, print hex instead of binary.
    #[arg(long)]
    pub hex: bool,
}

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("source").required(true).args(["hex", "input"]))]
pub struct DecodeArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,
    /// Wire bytes as hex.
    #[arg(long, conflicts_with = "input")]
    pub hex: Option<String>,
    /// Read wire bytes from a file.
    #[arg(long, conflicts_with = "hex")]
    pub input: Option<PathBuf>,
    /// Allow bytes after the end of the message.
    #[arg(long)]
    pub allow_trailing: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Load include directories, then compile the definition file.
pub fn load_schema(args: &SchemaArgs) -> CliResult<(SchemaRegistry, Arc<MessageSchema>)> {
    let mut registry = SchemaRegistry::new();
    for dir in &args.include {
        let loaded = registry
            .load_directory(dir)
            .map_err(|err| schema_error(&format!("load {}", dir.display()), err))?;
        debug!(dir = %dir.display(), loaded, "include directory loaded");
    }

    let type_name = match &args.type_name {
        Some(name) => name.clone(),
        None => type_name_for_file(&args.file)?,
    };
    let text = std::fs::read_to_string(&args.file)
        .map_err(|err| io_error(&format!("read {}", args.file.display()), err))?;
    let schema = registry
        .compile(&type_name, &text)
        .map_err(|err| schema_error(&format!("compile {type_name}"), err))?;
    Ok((registry, schema))
}

/// `pkg/Name` from `.../pkg/msg/Name.msg` or `.../pkg/Name.msg`.
fn type_name_for_file(path: &Path) -> CliResult<String> {
    let underivable = || {
        CliError::new(
            USAGE,
            format!(
                "cannot derive a type name from {}; pass --type",
                path.display()
            ),
        )
    };

    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(underivable)?;
    let absolute = std::path::absolute(path).map_err(|_| underivable())?;
    let mut dirs = absolute
        .parent()
        .into_iter()
        .flat_map(Path::ancestors)
        .filter_map(|dir| dir.file_name().and_then(|name| name.to_str()));
    let package = match dirs.next() {
        Some("msg") => dirs.next(),
        other => other,
    }
    .ok_or_else(underivable)?;
    Ok(format!("{package}/{stem}"))
}
