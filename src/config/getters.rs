//! Getter methods for `ScrapeConfig`

use std::path::{Path, PathBuf};

use super::types::ScrapeConfig;
use crate::extraction::listing_profile::ListingProfile;
use crate::session::Credentials;

impl ScrapeConfig {
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn profile(&self) -> &ListingProfile {
        &self.profile
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[must_use]
    pub fn page_limit(&self) -> Option<u32> {
        self.page_limit
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    #[must_use]
    pub fn chrome_profile_dir(&self) -> Option<&Path> {
        self.chrome_profile_dir.as_deref()
    }

    #[must_use]
    pub fn save_photos(&self) -> bool {
        self.save_photos
    }

    #[must_use]
    pub fn save_snapshots(&self) -> bool {
        self.save_snapshots
    }

    #[must_use]
    pub fn min_asset_bytes(&self) -> usize {
        self.min_asset_bytes
    }

    /// Where downloaded profile photos are saved
    #[must_use]
    pub fn photo_dir(&self) -> PathBuf {
        self.output_dir.join("profile_photos")
    }

    /// Where diagnostic snapshots are saved
    #[must_use]
    pub fn snapshot_dir(&self) -> PathBuf {
        self.output_dir.join("diagnostics")
    }

    /// Whether `page` is the last page this run may process
    #[must_use]
    pub fn is_last_page(&self, page: u32) -> bool {
        self.page_limit.is_some_and(|limit| page >= limit)
    }
}
