mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "cpebridge", version, about = "CPE radio bridge gateway")]
struct Cli {
    /// Output format for inspection commands.
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

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f";

    #[test]
    fn parses_run_subcommand() {
        let cli = Cli::try_parse_from([
            "cpebridge",
            "run",
            "--key",
            KEY_HEX,
            "--bind",
            "127.0.0.1:5000",
            "--lax-ids",
        ])
        .expect("run args should parse");

        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.lax_ids);
        assert_eq!(args.radio.bind.port(), 5000);
    }

    #[test]
    fn rejects_malformed_key() {
        let err = Cli::try_parse_from(["cpebridge", "run", "--key", "abcd"])
            .expect_err("short key should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_encode_control() {
        let cli = Cli::try_parse_from([
            "cpebridge",
            "encode",
            "--key",
            KEY_HEX,
            "control",
            "--id",
            "7",
            "--order",
            "THLP",
        ])
        .expect("encode args should parse");
        assert!(matches!(cli.command, Command::Encode(_)));
    }

    #[test]
    fn parses_negative_temperature() {
        let cli = Cli::try_parse_from([
            "cpebridge",
            "encode",
            "--key",
            KEY_HEX,
            "measure",
            "--id",
            "9",
            "--temperature",
            "-512",
        ])
        .expect("negative values should parse");
        assert!(matches!(cli.command, Command::Encode(_)));
    }

    #[test]
    fn parses_order_subcommand() {
        let cli = Cli::try_parse_from(["cpebridge", "--format", "json", "order", "tlhp"])
            .expect("order args should parse");
        assert!(matches!(cli.command, Command::Order(_)));
    }
}
