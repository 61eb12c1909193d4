//! Sharefetch Core Library
//!
//! This library resolves a public cloud share link into a flat list of direct
//! file links and hands selected files to an aria2 download daemon.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`http`] - Reusable HTTP session with bounded retry for read-only calls
//! - [`share`] - Share-link resolution, token exchange, and folder enumeration
//! - [`cache`] - The enumeration result cache shared by every downstream step
//! - [`selection`] - Parsing of `1,3,5-7` style selection expressions
//! - [`export`] - Human-readable link exports and download lists
//! - [`dispatch`] - aria2 JSON-RPC submission with graduated batch fatality
//! - [`config`] - Persisted aria2 endpoint configuration
//!
//! # Example
//!
//! ```no_run
//! use sharefetch_core::{CancelFlag, FolderEnumerator, HttpSession, LinkCache};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = HttpSession::new()?;
//! let cache = LinkCache::new(".sharefetch");
//! let enumerator = FolderEnumerator::new(http);
//! let result = enumerator
//!     .enumerate_share("https://1drv.ms/f/s!example", &cache, &CancelFlag::new())
//!     .await?;
//! println!("found {} files", result.len());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod export;
pub mod http;
pub mod selection;
pub mod share;
mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use cache::{CacheError, EnumerationResult, FileEntry, LinkCache};
pub use cancel::CancelFlag;
pub use config::{ConfigError, ConfigStore, DEFAULT_RPC_ENDPOINT, RpcConfig};
pub use dispatch::{
    BatchReport, DispatchClient, DispatchError, DispatchErrorKind, DispatchOutcome,
    DispatchStatus, validate_endpoint,
};
pub use export::{
    DownloadListEntry, ExportError, format_size_mib, parse_download_list, read_download_list,
    total_size_gib, write_download_list, write_link_export,
};
pub use http::{HttpResponse, HttpSession, RequestSpec, RetryPolicy, TransportError};
pub use selection::{SelectionError, SelectionSet};
pub use share::{
    ContainerKind, FolderEnumerator, ProviderEndpoints, ShareError, ShareResolver, ShareSession,
    TokenExchange,
};
