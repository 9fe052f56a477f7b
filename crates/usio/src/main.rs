mod action;
mod cmd;
mod config;
mod dispatch;
mod exit;
mod logging;
mod output;
mod server;

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Command;
use crate::config::DEFAULT_CONFIG_PATH;
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "usio", version, about = "Serial I/O controller daemon")]
struct Cli {
    /// Configuration file.
    #[arg(
        long,
        short = 'c',
        value_name = "PATH",
        env = "USIO_CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        global = true
    )]
    config: PathBuf,

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

    match cmd::run(cli.command, &cli.config) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
