//! `list`: enumerate a share into the cache.

use std::path::Path;

use anyhow::{Context, Result};
use sharefetch_core::{
    CancelFlag, FolderEnumerator, HttpSession, LinkCache, RetryPolicy, ShareError,
};
use tracing::info;

use crate::ProcessExit;
use crate::cli::ListArgs;
use crate::output;

pub async fn run_list_command(
    args: &ListArgs,
    cache_dir: &Path,
    cancel: &CancelFlag,
) -> Result<ProcessExit> {
    let http = HttpSession::new()
        .context("failed to build HTTP client")?
        .with_retry_policy(RetryPolicy::with_retries(u32::from(args.retries)));
    let enumerator = FolderEnumerator::new(http);
    let cache = LinkCache::new(cache_dir);

    info!(share_url = %args.share_url, "enumerating share");
    let result = match enumerator
        .enumerate_share(&args.share_url, &cache, cancel)
        .await
    {
        Ok(result) => result,
        Err(ShareError::Cancelled { files_found }) => {
            eprintln!("Interrupted after {files_found} file(s); the cache was not updated.");
            return Ok(ProcessExit::Failure);
        }
        Err(error) => return Err(error).context("enumeration failed"),
    };

    output::print_listing(result.entries());
    info!(path = %cache.path().display(), "listing cached");
    Ok(ProcessExit::Success)
}
