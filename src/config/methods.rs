//! Builder methods available for all states
//!
//! Optional settings can be given before or after the required ones.

use std::path::PathBuf;

use super::builder::ScrapeConfigBuilder;
use crate::session::Credentials;

impl<State> ScrapeConfigBuilder<State> {
    /// Search keyword. Leading and trailing whitespace is dropped; an empty
    /// keyword harvests the unfiltered listing.
    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    /// Stop after this many pages. Zero is rejected by `build()`.
    #[must_use]
    pub fn page_limit(mut self, pages: u32) -> Self {
        self.page_limit = Some(pages);
        self
    }

    #[must_use]
    pub fn unlimited_pages(mut self) -> Self {
        self.page_limit = None;
        self
    }

    /// Run with a visible browser window. Useful when the portal asks for
    /// interaction the engine does not handle.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Keep the Chrome profile in `dir` between runs. Without it a throwaway
    /// profile is used and removed afterwards.
    #[must_use]
    pub fn chrome_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chrome_profile_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn save_photos(mut self, save: bool) -> Self {
        self.save_photos = save;
        self
    }

    /// Write screenshot and HTML snapshots when a login or search step fails
    #[must_use]
    pub fn save_snapshots(mut self, save: bool) -> Self {
        self.save_snapshots = save;
        self
    }

    #[must_use]
    pub fn min_asset_bytes(mut self, bytes: usize) -> Self {
        self.min_asset_bytes = bytes;
        self
    }
}
