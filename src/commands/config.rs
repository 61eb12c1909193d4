//! Config command handlers: show or change the saved aria2 endpoint.

use std::path::Path;

use anyhow::{Result, bail};
use sharefetch_core::{ConfigStore, validate_endpoint};

use crate::ProcessExit;

pub fn run_config_show_command(cache_dir: &Path) -> Result<ProcessExit> {
    let store = ConfigStore::in_dir(cache_dir);
    let loaded = store.load()?;
    println!("config_path = {}", store.path().display());
    println!(
        "config_file = {}",
        if loaded.is_some() {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    let config = loaded.unwrap_or_default();
    println!("rpc = {}", config.rpc);
    println!("secret = {}", config.masked_secret());
    Ok(ProcessExit::Success)
}

pub fn run_config_set_command(
    cache_dir: &Path,
    rpc: Option<&str>,
    secret: Option<&str>,
) -> Result<ProcessExit> {
    if rpc.is_none() && secret.is_none() {
        bail!("nothing to change\n  Suggestion: Pass --rpc and/or --secret");
    }

    let store = ConfigStore::in_dir(cache_dir);
    let mut config = store.load_or_default()?;
    if let Some(rpc) = rpc {
        config.rpc = validate_endpoint(rpc)?;
    }
    if let Some(secret) = secret {
        config.secret = secret.to_string();
    }

    if let Some(backup) = store.save(&config)? {
        println!("Previous config kept at {}", backup.display());
    }
    println!("Saved rpc = {} (secret {})", config.rpc, config.masked_secret());
    Ok(ProcessExit::Success)
}
