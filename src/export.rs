//! Human-readable link exports and download lists.
//!
//! Two text formats are produced from an enumeration result:
//!
//! - the link export (`直链.txt`), one labelled block per file, meant for
//!   people copying links by hand;
//! - the download list (`result.txt`), `name` / size comment / `url` blocks
//!   that [`parse_download_list`] reads back so a list can be pushed to the
//!   daemon later without a cache.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::cache::FileEntry;

/// Default file name of the link export.
pub const LINK_EXPORT_FILE_NAME: &str = "直链.txt";

/// Default file name of the download list.
pub const DOWNLOAD_LIST_FILE_NAME: &str = "result.txt";

const SIZE_COMMENT_PREFIX: &str = "# 文件大小:";

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Errors writing or reading export files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {path}: {source}\n  Suggestion: Check that the output directory exists and is writable")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path}: {source}\n  Suggestion: Check the download list path")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One entry recovered from a download list.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadListEntry {
    pub name: String,
    pub url: String,
    /// Size in MiB when the list carried a size comment.
    pub size_mib: Option<f64>,
}

/// Formats a byte count as MiB with two decimals, e.g. `"1.00MB"`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size_mib(bytes: u64) -> String {
    format!("{:.2}MB", bytes as f64 / BYTES_PER_MIB)
}

/// Sum of entry sizes in GiB.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn total_size_gib<'a>(entries: impl IntoIterator<Item = &'a FileEntry>) -> f64 {
    let bytes: u64 = entries.into_iter().map(|entry| entry.size).sum();
    bytes as f64 / BYTES_PER_GIB
}

/// Names are written on a single line; line breaks would split a block.
fn single_line(name: &str) -> String {
    name.trim().replace(['\r', '\n'], " ")
}

/// Renders the labelled link export.
#[must_use]
pub fn render_link_export<'a>(entries: impl IntoIterator<Item = &'a FileEntry>) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "文件名：{}\n大小：{}\n直链：{}\n\n",
            single_line(&entry.name),
            format_size_mib(entry.size),
            entry.raw_url.trim()
        ));
    }
    out
}

/// Renders a download list that [`parse_download_list`] can read back.
#[must_use]
pub fn render_download_list<'a>(entries: impl IntoIterator<Item = &'a FileEntry>) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{}\n{SIZE_COMMENT_PREFIX} {}\n{}\n\n",
            single_line(&entry.name),
            format_size_mib(entry.size),
            entry.raw_url.trim()
        ));
    }
    out
}

/// Writes the labelled link export to `path`, returning the entry count.
///
/// # Errors
///
/// Returns [`ExportError::Write`] when the file cannot be written.
pub fn write_link_export<'a>(
    path: &Path,
    entries: impl IntoIterator<Item = &'a FileEntry>,
) -> Result<usize, ExportError> {
    let entries: Vec<&FileEntry> = entries.into_iter().collect();
    write_text(path, &render_link_export(entries.iter().copied()))?;
    info!(path = %path.display(), count = entries.len(), "link export written");
    Ok(entries.len())
}

/// Writes a download list to `path`, returning the entry count.
///
/// # Errors
///
/// Returns [`ExportError::Write`] when the file cannot be written.
pub fn write_download_list<'a>(
    path: &Path,
    entries: impl IntoIterator<Item = &'a FileEntry>,
) -> Result<usize, ExportError> {
    let entries: Vec<&FileEntry> = entries.into_iter().collect();
    write_text(path, &render_download_list(entries.iter().copied()))?;
    info!(path = %path.display(), count = entries.len(), "download list written");
    Ok(entries.len())
}

fn write_text(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a download list file.
///
/// # Errors
///
/// Returns [`ExportError::Read`] when the file cannot be read.
pub fn read_download_list(path: &Path) -> Result<Vec<DownloadListEntry>, ExportError> {
    let text = fs::read_to_string(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_download_list(text.strip_prefix('\u{feff}').unwrap_or(&text)))
}

/// Parses download-list text.
///
/// Blank lines are ignored, so blocks may or may not be separated. Each
/// entry is a name line, an optional `# 文件大小: X.XXMB` line, then the URL.
/// A trailing name with no URL after it is dropped.
#[must_use]
pub fn parse_download_list(text: &str) -> Vec<DownloadListEntry> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty()).peekable();
    let mut entries = Vec::new();
    while let Some(name) = lines.next() {
        let size_mib = lines
            .next_if(|line| line.starts_with(SIZE_COMMENT_PREFIX))
            .map(parse_size_comment);
        let Some(url) = lines.next() else {
            break;
        };
        entries.push(DownloadListEntry {
            name: name.to_string(),
            url: url.to_string(),
            size_mib,
        });
    }
    entries
}

/// An unreadable size counts as zero.
fn parse_size_comment(line: &str) -> f64 {
    line.strip_prefix(SIZE_COMMENT_PREFIX)
        .unwrap_or(line)
        .trim()
        .trim_end_matches("MB")
        .trim()
        .parse()
        .unwrap_or(0.0)
}
