//! On-disk cache of the flattened enumeration result.
//!
//! The cache file is the hand-off point between enumeration and every
//! downstream step (selection, export, dispatch). Writes are atomic and
//! single-writer: only the holder of a [`CacheWriter`] can replace the file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::selection::{SelectionError, SelectionSet};

/// File name of the cached enumeration result inside the cache directory.
pub const CACHE_FILE_NAME: &str = "links.json";

const LOCK_FILE_NAME: &str = ".links.lock";
const TEMP_FILE_NAME: &str = "links.json.tmp";

/// One downloadable file found during enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Display name as served by the provider.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Pre-authorized direct download URL.
    pub raw_url: String,
}

/// Ordered, flattened listing of every file under a share.
///
/// Position in the sequence is the entry's identity for selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumerationResult {
    entries: Vec<FileEntry>,
}

impl EnumerationResult {
    /// Wraps an already ordered entry list.
    #[must_use]
    pub fn new(entries: Vec<FileEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }

    /// Sum of all entry sizes in bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|entry| entry.size).sum()
    }

    /// Resolves a selection to `(index, entry)` pairs in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Stale`] when the selection was validated
    /// against a result of a different length.
    pub fn select(
        &self,
        selection: &SelectionSet,
    ) -> Result<Vec<(usize, &FileEntry)>, SelectionError> {
        if selection.bound() != self.entries.len() {
            return Err(SelectionError::Stale {
                selected_against: selection.bound(),
                current: self.entries.len(),
            });
        }
        Ok(selection
            .iter()
            .filter_map(|index| self.entries.get(index).map(|entry| (index, entry)))
            .collect())
    }
}

impl<'a> IntoIterator for &'a EnumerationResult {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Errors reading or writing the link cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(
        "no cached listing at {path}\n  Suggestion: Run `sharefetch list <share-url>` first to enumerate the share"
    )]
    Missing { path: PathBuf },

    #[error(
        "another enumeration is already writing to {path}\n  Suggestion: Wait for the other run to finish or use a different --cache-dir"
    )]
    Busy { path: PathBuf },

    #[error("cache I/O error at {path}: {source}\n  Suggestion: Check that the cache directory exists and is writable")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache file {path} is not a valid listing: {source}\n  Suggestion: Delete the file and enumerate the share again")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Location of the cached enumeration result.
#[derive(Debug, Clone)]
pub struct LinkCache {
    dir: PathBuf,
}

impl LinkCache {
    /// Creates a cache rooted at `dir`. Nothing is touched on disk until a
    /// read or a lock is requested.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the cache file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE_NAME)
    }

    /// Acquires the exclusive writer lock for this cache directory.
    ///
    /// The lock is released when the returned writer is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Busy`] when another process or writer holds the
    /// lock, and [`CacheError::Io`] when the directory cannot be prepared.
    pub fn lock(&self) -> Result<CacheWriter, CacheError> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        let lock_path = self.dir.join(LOCK_FILE_NAME);
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| CacheError::io(&lock_path, e))?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| CacheError::Busy {
                path: self.dir.clone(),
            })?;
        debug!(path = %lock_path.display(), "acquired cache lock");
        Ok(CacheWriter {
            cache: self.clone(),
            lock_file,
        })
    }

    /// Loads the cached result.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Missing`] when no listing has been written yet
    /// and [`CacheError::Json`] when the file is corrupt.
    pub fn read(&self) -> Result<EnumerationResult, CacheError> {
        let path = self.path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::Missing { path });
            }
            Err(e) => return Err(CacheError::io(&path, e)),
        };
        let contents = contents.strip_prefix('\u{feff}').unwrap_or(&contents);
        serde_json::from_str(contents).map_err(|source| CacheError::Json { path, source })
    }
}

/// Exclusive write access to a [`LinkCache`].
#[derive(Debug)]
pub struct CacheWriter {
    cache: LinkCache,
    lock_file: File,
}

impl CacheWriter {
    /// Atomically replaces the cache file with `result`.
    ///
    /// The JSON is pretty-printed with four-space indentation and keeps
    /// non-ASCII names verbatim so the file stays readable by hand.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] on write or rename failure.
    pub fn write(&self, result: &EnumerationResult) -> Result<PathBuf, CacheError> {
        let final_path = self.cache.path();
        let temp_path = self.cache.dir.join(TEMP_FILE_NAME);

        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        result
            .serialize(&mut serializer)
            .map_err(|source| CacheError::Json {
                path: final_path.clone(),
                source,
            })?;

        let mut file = File::create(&temp_path).map_err(|e| CacheError::io(&temp_path, e))?;
        file.write_all(&buffer)
            .and_then(|()| file.sync_all())
            .map_err(|e| CacheError::io(&temp_path, e))?;
        drop(file);
        fs::rename(&temp_path, &final_path).map_err(|e| CacheError::io(&final_path, e))?;

        info!(path = %final_path.display(), entries = result.len(), "link cache written");
        Ok(final_path)
    }

    #[must_use]
    pub fn cache(&self) -> &LinkCache {
        &self.cache
    }
}

impl Drop for CacheWriter {
    fn drop(&mut self) {
        // Closing the handle releases the lock as well; unlock explicitly so
        // release does not depend on descriptor lifetime.
        let _ = FileExt::unlock(&self.lock_file);
    }
}
