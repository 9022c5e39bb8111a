//! Progress reporting for harvest runs
//!
//! The orchestrator reports lifecycle events through [`ProgressReporter`].
//! The CLI logs them; library callers can forward them to a channel or UI.

use tracing::info;

/// Lifecycle events of a harvest run
pub trait ProgressReporter: Send + Sync {
    /// The search for `keyword` is about to be entered
    fn report_search_started(&self, keyword: &str);

    /// `cards` listing cards were found on `page`
    fn report_page_loaded(&self, page: u32, cards: usize);

    fn report_record_extracted(&self, page: u32, index: usize);

    /// A record was skipped; extraction goes on with the next card
    fn report_record_skipped(&self, page: u32, index: usize, reason: &str);

    fn report_checkpoint_written(&self, page: u32, path: &std::path::Path);

    fn report_completed(&self, pages: u32, records: usize);

    fn report_error(&self, error: &str);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_search_started(&self, _keyword: &str) {}

    #[inline(always)]
    fn report_page_loaded(&self, _page: u32, _cards: usize) {}

    #[inline(always)]
    fn report_record_extracted(&self, _page: u32, _index: usize) {}

    #[inline(always)]
    fn report_record_skipped(&self, _page: u32, _index: usize, _reason: &str) {}

    #[inline(always)]
    fn report_checkpoint_written(&self, _page: u32, _path: &std::path::Path) {}

    #[inline(always)]
    fn report_completed(&self, _pages: u32, _records: usize) {}

    #[inline(always)]
    fn report_error(&self, _error: &str) {}
}

/// Reports through `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report_search_started(&self, keyword: &str) {
        if keyword.is_empty() {
            info!("Opening unfiltered listing");
        } else {
            info!("Searching for '{keyword}'");
        }
    }

    fn report_page_loaded(&self, page: u32, cards: usize) {
        info!("Page {page}: {cards} listing cards");
    }

    fn report_record_extracted(&self, _page: u32, _index: usize) {}

    fn report_record_skipped(&self, page: u32, index: usize, reason: &str) {
        info!("Page {page}, card {index} skipped: {reason}");
    }

    fn report_checkpoint_written(&self, page: u32, path: &std::path::Path) {
        info!("Checkpoint for page {page} written to {}", path.display());
    }

    fn report_completed(&self, pages: u32, records: usize) {
        info!("Harvest finished: {records} records from {pages} pages");
    }

    fn report_error(&self, error: &str) {
        tracing::error!("{error}");
    }
}
