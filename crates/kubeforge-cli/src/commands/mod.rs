//! CLI command definitions and dispatch.

pub mod compose;
pub mod convert;
pub mod validate;

use clap::{Parser, Subcommand};

/// Kubeforge — container-build descriptor to Kubernetes manifest translator.
#[derive(Parser, Debug)]
#[command(name = "kforge", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Translate a Dockerfile into a Kubernetes manifest set.
    Convert(convert::ConvertArgs),
    /// Translate a docker-compose manifest into a Kubernetes manifest set.
    Compose(compose::ComposeArgs),
    /// Validate an existing multi-document manifest file.
    Validate(validate::ValidateArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Convert(args) => convert::execute(args),
        Command::Compose(args) => compose::execute(args),
        Command::Validate(args) => validate::execute(args),
    }
}
