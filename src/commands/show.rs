//! `show`: print the cached listing.

use std::path::Path;

use anyhow::Result;
use sharefetch_core::LinkCache;

use crate::ProcessExit;
use crate::output;

pub fn run_show_command(cache_dir: &Path) -> Result<ProcessExit> {
    let result = LinkCache::new(cache_dir).read()?;
    output::print_listing(result.entries());
    Ok(ProcessExit::Success)
}
