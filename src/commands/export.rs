//! `export`: write selected cache entries to a text file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use sharefetch_core::export::{DOWNLOAD_LIST_FILE_NAME, LINK_EXPORT_FILE_NAME};
use sharefetch_core::{
    LinkCache, SelectionSet, total_size_gib, write_download_list, write_link_export,
};

use crate::ProcessExit;
use crate::cli::{ExportArgs, ExportFormat};

pub fn run_export_command(args: &ExportArgs, cache_dir: &Path) -> Result<ProcessExit> {
    let result = LinkCache::new(cache_dir).read()?;
    let selection = SelectionSet::parse(&args.select, result.len())?;
    let selected: Vec<_> = result
        .select(&selection)?
        .into_iter()
        .map(|(_, entry)| entry)
        .collect();

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(args.format));
    let written = match args.format {
        ExportFormat::Links => write_link_export(&path, selected.iter().copied())?,
        ExportFormat::List => write_download_list(&path, selected.iter().copied())?,
    };

    println!(
        "Exported {written} entr{} to {} ({:.2} GB total)",
        if written == 1 { "y" } else { "ies" },
        path.display(),
        total_size_gib(selected.iter().copied())
    );
    Ok(ProcessExit::Success)
}

fn default_output_path(format: ExportFormat) -> PathBuf {
    PathBuf::from(match format {
        ExportFormat::Links => LINK_EXPORT_FILE_NAME,
        ExportFormat::List => DOWNLOAD_LIST_FILE_NAME,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path_by_format() {
        assert_eq!(default_output_path(ExportFormat::Links), PathBuf::from("直链.txt"));
        assert_eq!(default_output_path(ExportFormat::List), PathBuf::from("result.txt"));
    }
}
