//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".sharefetch";

/// Default retry count for read-only share requests.
pub const DEFAULT_RETRIES: u8 = 5;

/// Resolve cloud share links into direct file links and push them to aria2.
///
/// `list` enumerates a share into the cache; `show`, `export`, and `push`
/// then work from that cache.
#[derive(Parser, Debug)]
#[command(name = "sharefetch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Directory holding the link cache and saved aria2 config
    #[arg(long, global = true, default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enumerate a share link and cache every file it contains
    List(ListArgs),

    /// Print the cached listing
    Show,

    /// Write selected links to a text file
    Export(ExportArgs),

    /// Send selected files to aria2
    Push(PushArgs),

    /// Show or change the saved aria2 endpoint
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Share link, e.g. https://1drv.ms/f/s!...
    pub share_url: String,

    /// Maximum retry attempts for read-only requests (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_RETRIES, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub retries: u8,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Entries to export, e.g. `1,3,5-7` or `all`
    #[arg(short, long, default_value = "all")]
    pub select: String,

    /// Output file (defaults to 直链.txt or result.txt by format)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Links)]
    pub format: ExportFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// Labelled blocks with name, size, and direct link
    Links,
    /// Name / size / URL blocks readable by `push --from-list`
    List,
}

#[derive(clap::Args, Debug)]
pub struct PushArgs {
    /// Entries to push, e.g. `1,3,5-7` or `all`
    #[arg(short, long, default_value = "all")]
    pub select: String,

    /// aria2 RPC address (overrides the saved config)
    #[arg(long)]
    pub rpc: Option<String>,

    /// aria2 RPC secret (overrides the saved config)
    #[arg(long)]
    pub secret: Option<String>,

    /// Push entries from a download list instead of the cache
    #[arg(long, value_name = "FILE")]
    pub from_list: Option<PathBuf>,

    /// Save the RPC address and secret after at least one successful submission
    #[arg(long)]
    pub save_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the saved aria2 endpoint
    Show,

    /// Save a new aria2 endpoint (the previous file is kept as .bak)
    Set {
        /// aria2 RPC address, e.g. http://127.0.0.1:6800/jsonrpc
        #[arg(long)]
        rpc: Option<String>,

        /// aria2 RPC secret; pass an empty string to clear it
        #[arg(long)]
        secret: Option<String>,
    },
}
