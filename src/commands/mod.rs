//! CLI command handlers.

mod config;
mod export;
mod list;
mod push;
mod show;

pub use config::{run_config_set_command, run_config_show_command};
pub use export::run_export_command;
pub use list::run_list_command;
pub use push::run_push_command;
pub use show::run_show_command;
