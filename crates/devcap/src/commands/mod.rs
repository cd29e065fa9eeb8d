//! Command handlers, one module per top-level subcommand.

pub mod classify;
pub mod config_cmd;
pub mod device;
pub mod index;
pub mod util;
pub mod virtual_caps;

use devcap_core::Engine;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route an engine-backed command to its handler.
pub fn dispatch(cmd: Command, engine: &Engine, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Classify(args) => classify::handle(engine, args, global),
        Command::Device(args) => device::handle(engine, args, global),
        Command::Virtual(args) => virtual_caps::handle(engine, args, global),
        Command::Index(args) => index::handle(engine, args, global),
        Command::Config(_) | Command::Completions(_) => unreachable!("handled before dispatch"),
    }
}
