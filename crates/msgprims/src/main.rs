mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "msgprims", version, about = "Message schema compiler and codec CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgprims_gen::TargetLanguage;

    #[test]
    fn parses_compile_with_includes() {
        let cli = Cli::try_parse_from([
            "msgprims",
            "compile",
            "msg/Ping.msg",
            "--include",
            "std_msgs/msg",
            "--include",
            "geometry_msgs/msg",
        ])
        .expect("compile args should parse");

        let Command::Compile(args) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.schema.include.len(), 2);
        assert!(args.schema.type_name.is_none());
    }

    #[test]
    fn parses_gen_language_aliases() {
        let cli = Cli::try_parse_from(["msgprims", "gen", "Ping.msg", "--lang", "ts"])
            .expect("gen args should parse");
        let Command::Gen(args) = cli.command else {
            panic!("expected gen");
        };
        assert_eq!(args.lang, TargetLanguage::TypeScript);
    }

    #[test]
    fn rejects_unknown_language() {
        let err = Cli::try_parse_from(["msgprims", "gen", "Ping.msg", "--lang", "cobol"])
            .expect_err("unknown language should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn decode_requires_exactly_one_input() {
        let err = Cli::try_parse_from([
            "msgprims",
            "decode",
            "Ping.msg",
            "--hex",
            "00",
            "--input",
            "ping.bin",
        ])
        .expect_err("conflicting inputs should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        let err = Cli::try_parse_from(["msgprims", "decode", "Ping.msg"])
            .expect_err("missing input should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "msgprims",
            "version",
            "--format",
            "json",
            "--log-format",
            "json",
        ])
        .expect("global flags should parse after subcommand");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.log_format, LogFormat::Json));
    }
}
