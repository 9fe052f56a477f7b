use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod check_config;
pub mod ctl;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the daemon in the foreground.
    Run(RunArgs),
    /// Send one query to a running daemon and print the reply.
    Ctl(CtlArgs),
    /// Parse and validate the configuration file.
    CheckConfig(CheckConfigArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, config: &Path) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, config),
        Command::Ctl(args) => ctl::run(args),
        Command::CheckConfig(args) => check_config::run(args, config),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Serial device, overriding `uart_dev`.
    #[arg(long, value_name = "PATH")]
    pub device: Option<PathBuf>,
    /// Control socket, overriding `control_socket`.
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CtlArgs {
    /// Control socket of the running daemon.
    pub socket: PathBuf,
    /// Query words, e.g. `relay_set 3 1`.
    #[arg(required = true, num_args = 1..)]
    pub command: Vec<String>,
    /// Output format. Default: text on a terminal, json otherwise.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,
    /// How long to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "10s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Print the resolved configuration as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
