//! CLI output formatting and display helpers.

use std::fmt::Write as _;

use sharefetch_core::{BatchReport, DispatchStatus, FileEntry, format_size_mib, total_size_gib};

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

/// One numbered line per entry (1-based, as selections are typed), followed
/// by a count and total-size footer.
pub fn listing_lines(entries: &[FileEntry], width: usize) -> Vec<String> {
    let number_width = entries.len().to_string().len();
    let mut lines: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let line = format!(
                "{:>number_width$}. {:>10}  {}",
                i + 1,
                format_size_mib(entry.size),
                entry.name
            );
            truncate_to_width(&line, width)
        })
        .collect();
    lines.push(format!(
        "{} file(s), {:.2} GB total",
        entries.len(),
        total_size_gib(entries)
    ));
    lines
}

pub fn print_listing(entries: &[FileEntry]) {
    for line in listing_lines(entries, terminal_width()) {
        println!("{line}");
    }
}

/// Summary of a dispatch batch: counts, why it stopped, then one line per
/// failure.
pub fn batch_summary(report: &BatchReport) -> String {
    let mut out = format!(
        "Submitted {}/{} ({} failed",
        report.succeeded(),
        report.requested,
        report.failed()
    );
    if report.skipped() > 0 {
        let _ = write!(out, ", {} skipped", report.skipped());
    }
    out.push(')');
    if let Some(kind) = report.aborted_by {
        let _ = write!(out, "\nStopped early: {kind}");
    } else if report.cancelled {
        out.push_str("\nStopped early: interrupted");
    }
    for failure in report.failures() {
        if let DispatchStatus::Failed { kind, message } = &failure.status {
            let _ = write!(
                out,
                "\n  #{} {}: {kind}: {message}",
                failure.index + 1,
                failure.name
            );
        }
    }
    out
}
