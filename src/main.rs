//! CLI entry point for sharefetch.

use anyhow::Result;
use clap::Parser;
use sharefetch_core::CancelFlag;
use tracing::{debug, warn};

mod app;
mod cli;
mod commands;
mod output;

use cli::{Args, Command, ConfigAction};

/// Process outcome mapped to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Partial,
    Failure,
}

impl ProcessExit {
    pub(crate) fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Failure => 2,
        }
    }
}

#[tokio::main]
async fn main() {
    let exit = match run().await {
        Ok(exit) => exit,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure
        }
    };
    std::process::exit(exit.code());
}

async fn run() -> Result<ProcessExit> {
    // Parse before tracing so --help works without logs
    let args = Args::parse();

    let default_level = app::terminal::default_log_level(args.quiet, args.verbose);
    let no_color = app::terminal::is_no_color_requested(args.no_color);
    app::terminal::init_tracing(default_level, no_color);
    debug!(?args, "CLI arguments parsed");

    let cancel = CancelFlag::new();
    spawn_interrupt_watcher(cancel.clone());

    match args.command {
        Command::List(list) => {
            commands::run_list_command(&list, &args.cache_dir, &cancel).await
        }
        Command::Show => commands::run_show_command(&args.cache_dir),
        Command::Export(export) => commands::run_export_command(&export, &args.cache_dir),
        Command::Push(push) => {
            commands::run_push_command(&push, &args.cache_dir, args.quiet, &cancel).await
        }
        Command::Config { action } => match action {
            ConfigAction::Show => commands::run_config_show_command(&args.cache_dir),
            ConfigAction::Set { rpc, secret } => commands::run_config_set_command(
                &args.cache_dir,
                rpc.as_deref(),
                secret.as_deref(),
            ),
        },
    }
}

/// Trips `cancel` on the first Ctrl-C so long-running work stops at its
/// next checkpoint.
fn spawn_interrupt_watcher(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current request");
            cancel.cancel();
        }
    });
}
