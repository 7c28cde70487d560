use msgprims_codec::{from_json, MessageCodec};
use tracing::debug;

use crate::cmd::{load_schema, EncodeArgs};
use crate::exit::{codec_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let (registry, schema) = load_schema(&args.schema)?;

    let json: serde_json::Value = serde_json::from_str(&args.json)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid --json: {err}")))?;
    let message = from_json(&schema, &registry, &json)
        .map_err(|err| codec_error(&format!("build {}", schema.type_name()), err))?;

    let bytes = MessageCodec::new(&registry)
        .encode(&schema, &message)
        .map_err(|err| codec_error(&format!("encode {}", schema.type_name()), err))?;
    debug!(type_name = schema.type_name(), size = bytes.len(), "message encoded");

    print_encoded(&schema, &bytes, args.hex, format);
    Ok(SUCCESS)
}
