use tracing::info;

use crate::cmd::{load_schema, CompileArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_schema, OutputFormat};

pub fn run(args: CompileArgs, format: OutputFormat) -> CliResult<i32> {
    let (registry, schema) = load_schema(&args.schema)?;
    info!(
        type_name = schema.type_name(),
        fingerprint = %schema.fingerprint(),
        "definition compiled"
    );
    print_schema(&schema, &registry, format);
    Ok(SUCCESS)
}
