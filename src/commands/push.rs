//! `push`: submit selected files to aria2.

use std::path::Path;

use anyhow::{Context, Result};
use sharefetch_core::{
    CancelFlag, ConfigStore, DispatchClient, EnumerationResult, FileEntry, LinkCache,
    RpcConfig, SelectionSet, read_download_list, validate_endpoint,
};
use tracing::{info, warn};

use crate::ProcessExit;
use crate::app::{exit_handler, progress, terminal};
use crate::cli::PushArgs;
use crate::output;

const BYTES_PER_MIB: f64 = 1_048_576.0;

pub async fn run_push_command(
    args: &PushArgs,
    cache_dir: &Path,
    quiet: bool,
    cancel: &CancelFlag,
) -> Result<ProcessExit> {
    let store = ConfigStore::in_dir(cache_dir);
    let config = effective_config(store.load_or_default()?, args)?;

    let result = match &args.from_list {
        Some(list_path) => load_download_list(list_path)?,
        None => LinkCache::new(cache_dir).read()?,
    };
    let selection = SelectionSet::parse(&args.select, result.len())?;
    let selected = result.select(&selection)?;

    let client = DispatchClient::from_config(&config)?;
    info!(endpoint = client.endpoint(), count = selected.len(), "pushing to aria2");

    let bar = progress::batch_progress(terminal::progress_requested(quiet), selected.len());
    let report = client
        .dispatch_batch(selected.iter().copied(), cancel, |outcome| {
            bar.set_message(outcome.name.clone());
            bar.inc(1);
        })
        .await
        .context("aria2 is not usable")?;
    bar.finish_and_clear();

    println!("{}", output::batch_summary(&report));

    if args.save_config {
        if report.succeeded() > 0 {
            store.save(&config)?;
            info!(path = %store.path().display(), "aria2 config saved");
        } else {
            warn!("nothing was submitted; config not saved");
        }
    }

    Ok(exit_handler::batch_exit_outcome(&report))
}

/// Saved config with command-line overrides applied.
fn effective_config(saved: RpcConfig, args: &PushArgs) -> Result<RpcConfig> {
    let rpc = match &args.rpc {
        Some(rpc) => validate_endpoint(rpc)?,
        None => saved.rpc,
    };
    let secret = args.secret.clone().unwrap_or(saved.secret);
    Ok(RpcConfig { rpc, secret })
}

fn load_download_list(path: &Path) -> Result<EnumerationResult> {
    let entries = read_download_list(path)?
        .into_iter()
        .map(|entry| FileEntry {
            size: entry.size_mib.map_or(0, mib_to_bytes),
            name: entry.name,
            raw_url: entry.url,
        })
        .collect();
    Ok(EnumerationResult::new(entries))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn mib_to_bytes(mib: f64) -> u64 {
    (mib.max(0.0) * BYTES_PER_MIB).round() as u64
}
