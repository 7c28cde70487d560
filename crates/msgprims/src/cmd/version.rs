use serde::Serialize;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
    target: &'static str,
    profile: &'static str,
    git_hash: &'static str,
    languages: Vec<&'static str>,
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.extended {
        println!("msgprims {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let out = VersionOutput {
        name: "msgprims",
        version: env!("CARGO_PKG_VERSION"),
        target: option_env!("MSGPRIMS_BUILD_TARGET").unwrap_or("unknown"),
        profile: option_env!("MSGPRIMS_BUILD_PROFILE").unwrap_or("unknown"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        languages: msgprims_gen::TargetLanguage::ALL
            .iter()
            .map(|language| language.name())
            .collect(),
    };

    if matches!(format, OutputFormat::Json) {
        println!(
            "{}",
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(SUCCESS);
    }

    println!("name: {}", out.name);
    println!("version: {}", out.version);
    println!("target: {}", out.target);
    println!("profile: {}", out.profile);
    println!("git_hash: {}", out.git_hash);
    println!("languages: {}", out.languages.join(", "));
    Ok(SUCCESS)
}
