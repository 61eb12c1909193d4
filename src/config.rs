//! Persisted aria2 endpoint configuration.
//!
//! The file is a small JSON object `{ "rpc": ..., "secret": ... }` stored in
//! the cache directory. Saving over an existing file first moves it to
//! `<name>.bak`, keeping exactly one previous version.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// File name of the persisted configuration inside the cache directory.
pub const CONFIG_FILE_NAME: &str = "aria2_config.json";

/// aria2's default local RPC endpoint.
pub const DEFAULT_RPC_ENDPOINT: &str = "http://127.0.0.1:6800/jsonrpc";

/// Errors loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error at {path}: {source}\n  Suggestion: Check permissions on the cache directory")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not valid JSON: {source}\n  Suggestion: Fix the file by hand or run `sharefetch config set` to rewrite it")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Endpoint and secret for the download daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    pub rpc: String,
    #[serde(default)]
    pub secret: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            rpc: DEFAULT_RPC_ENDPOINT.to_string(),
            secret: String::new(),
        }
    }
}

impl RpcConfig {
    /// Secret rendered for display: masked unless empty.
    #[must_use]
    pub fn masked_secret(&self) -> String {
        if self.secret.is_empty() {
            "(none)".to_string()
        } else {
            "*".repeat(self.secret.chars().count().min(8))
        }
    }
}

/// Reads and writes [`RpcConfig`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for [`CONFIG_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CONFIG_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Loads the configuration, or `None` when no file exists.
    ///
    /// A leading UTF-8 byte-order mark is tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on read failure and [`ConfigError::Parse`]
    /// on malformed JSON.
    pub fn load(&self) -> Result<Option<RpcConfig>, ConfigError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved config");
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Loads the configuration, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_or_default(&self) -> Result<RpcConfig, ConfigError> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Saves `config`, moving any existing file to the backup path first.
    ///
    /// Returns the backup path when a previous file was rotated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when rotation or writing fails.
    pub fn save(&self, config: &RpcConfig) -> Result<Option<PathBuf>, ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let backup = if self.path.exists() {
            let backup = self.backup_path();
            if backup.exists() {
                fs::remove_file(&backup).map_err(io_error(&backup))?;
            }
            fs::rename(&self.path, &backup).map_err(io_error(&backup))?;
            debug!(backup = %backup.display(), "rotated previous config");
            Some(backup)
        } else {
            None
        };

        let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_error(&self.path))?;
        info!(path = %self.path.display(), rpc = %config.rpc, "config saved");
        Ok(backup)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError {
    let path = path.to_path_buf();
    move |source| ConfigError::Io { path, source }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::in_dir(dir.path());
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.load_or_default().unwrap(), RpcConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::in_dir(dir.path().join("nested"));
        let config = RpcConfig {
            rpc: "http://nas:6800/jsonrpc".to_string(),
            secret: "s3cret".to_string(),
        };
        assert!(store.save(&config).unwrap().is_none());
        assert_eq!(store.load().unwrap(), Some(config));
    }

    #[test]
    fn test_save_rotates_previous_file_to_bak() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::in_dir(dir.path());
        let first = RpcConfig::default();
        let second = RpcConfig {
            rpc: "http://a/jsonrpc".to_string(),
            secret: String::new(),
        };
        let third = RpcConfig {
            rpc: "http://b/jsonrpc".to_string(),
            secret: String::new(),
        };
        store.save(&first).unwrap();
        let backup = store.save(&second).unwrap().unwrap();
        assert_eq!(backup, dir.path().join("aria2_config.json.bak"));

        // A second rotation replaces the old backup.
        store.save(&third).unwrap();
        let backed_up: RpcConfig =
            serde_json::from_str(&fs::read_to_string(&backup).unwrap()).unwrap();
        assert_eq!(backed_up, second);
        assert_eq!(store.load().unwrap(), Some(third));
    }

    #[test]
    fn test_load_tolerates_bom_and_missing_secret() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::in_dir(dir.path());
        fs::write(store.path(), "\u{feff}{\"rpc\": \"http://x/jsonrpc\"}").unwrap();
        let config = store.load().unwrap().unwrap();
        assert_eq!(config.rpc, "http://x/jsonrpc");
        assert!(config.secret.is_empty());
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::in_dir(dir.path());
        fs::write(store.path(), "rpc=").unwrap();
        assert!(matches!(store.load(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_masked_secret() {
        assert_eq!(RpcConfig::default().masked_secret(), "(none)");
        let config = RpcConfig {
            rpc: String::new(),
            secret: "abc".to_string(),
        };
        assert_eq!(config.masked_secret(), "***");
    }
}
