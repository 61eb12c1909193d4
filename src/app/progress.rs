//! Progress bar for dispatch batches.

use indicatif::{ProgressBar, ProgressStyle};

/// Creates the batch progress bar; hidden when `visible` is false.
pub(crate) fn batch_progress(visible: bool, total: usize) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::batch_progress;

    #[test]
    fn test_hidden_bar_when_not_visible() {
        let bar = batch_progress(false, 3);
        assert!(bar.is_hidden());
    }

    #[test]
    fn test_bar_length_matches_total() {
        let bar = batch_progress(true, 7);
        assert_eq!(bar.length(), Some(7));
        bar.inc(2);
        assert_eq!(bar.position(), 2);
        bar.finish_and_clear();
    }
}
