//! Command dispatch: bridges CLI args -> router calls -> output formatting.

pub mod config_cmd;
pub mod endpoint;
pub mod login;
pub mod readings;
pub mod watch;

use miwifi_core::Router;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a router-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    router: &Router,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login => login::handle(router, global).await,
        Command::Readings(args) => readings::handle(router, args, global).await,
        Command::Get(args) => endpoint::get(router, args, global).await,
        Command::Read(args) => endpoint::read(router, args, global).await,
        Command::Watch(args) => watch::handle(router, args, global).await,
        // Handled before a router is built
        Command::Endpoints | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
