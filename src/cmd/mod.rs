//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`validate`], or [`health`]. Each handler
//! lives in its own submodule.

pub mod health;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::ConfigGateError;

pub async fn dispatch(cli: Cli) -> Result<(), ConfigGateError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args).await,
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  configgate v{version} - configuration readiness gate\n\n  \
         No command provided. To get started:\n\n    \
         configgate run --store-dir ./cluster --root /services/demo\n    \
         configgate validate configgate.yaml   Check a settings file\n    \
         configgate health                     Query a running instance\n    \
         configgate --help                     See all commands and options\n"
    );
}
