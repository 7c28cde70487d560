use msgprims_gen::{file_name, generate_bindings, GeneratorConfig};
use tracing::info;

use crate::cmd::{load_schema, GenArgs};
use crate::exit::{generator_error, io_error, CliResult, SUCCESS};
use crate::output::{print_generated, OutputFormat};

pub fn run(args: GenArgs, format: OutputFormat) -> CliResult<i32> {
    let (registry, schema) = load_schema(&args.schema)?;

    let mut config = GeneratorConfig::new(args.lang);
    if let Some(runtime_crate) = args.runtime_crate {
        config.runtime_crate = runtime_crate;
    }
    let source = generate_bindings(&schema, &registry, &config)
        .map_err(|err| generator_error(&format!("generate {}", schema.type_name()), err))?;
    let name = file_name(&schema, args.lang);

    let Some(out) = args.out else {
        print_generated(&schema, args.lang.name(), &name, &source, format);
        return Ok(SUCCESS);
    };

    let path = if out.is_dir() {
        out.join(&name)
    } else {
        out
    };
    std::fs::write(&path, &source)
        .map_err(|err| io_error(&format!("write {}", path.display()), err))?;
    info!(path = %path.display(), language = %args.lang, "bindings written");
    println!("{}", path.display());
    Ok(SUCCESS)
}
