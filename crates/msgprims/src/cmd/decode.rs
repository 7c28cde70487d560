use msgprims_codec::MessageCodec;
use tracing::{debug, warn};

use crate::cmd::{load_schema, DecodeArgs};
use crate::exit::{codec_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{parse_hex, print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let (registry, schema) = load_schema(&args.schema)?;

    let bytes = match (&args.hex, &args.input) {
        (Some(hex), _) => parse_hex(hex)?,
        (None, Some(path)) => std::fs::read(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?,
        (None, None) => return Err(CliError::new(USAGE, "either --hex or --input is required")),
    };

    let codec = MessageCodec::new(&registry);
    let context = format!("decode {}", schema.type_name());
    let message = if args.allow_trailing {
        let (message, end) = codec
            .decode(&schema, &bytes, 0)
            .map_err(|err| codec_error(&context, err))?;
        if end < bytes.len() {
            warn!(trailing = bytes.len() - end, "ignoring bytes after message");
        }
        message
    } else {
        codec
            .decode_exact(&schema, &bytes)
            .map_err(|err| codec_error(&context, err))?
    };
    debug!(type_name = schema.type_name(), size = bytes.len(), "message decoded");

    print_message(&message, format);
    Ok(SUCCESS)
}
