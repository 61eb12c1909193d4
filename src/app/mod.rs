//! Application runtime helpers shared by the subcommands.

pub(crate) mod exit_handler;
pub(crate) mod progress;
pub(crate) mod terminal;
