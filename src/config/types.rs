//! Core configuration type for harvest runs

use std::path::PathBuf;

use crate::extraction::listing_profile::ListingProfile;
use crate::session::Credentials;

/// Everything a harvest run needs besides the browser.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Checkpoints, photos and diagnostics go under this directory
    pub(crate) output_dir: PathBuf,
    pub(crate) profile: ListingProfile,
    /// Search keyword; empty means the unfiltered listing
    pub(crate) keyword: String,
    /// `None` runs until the results run out
    pub(crate) page_limit: Option<u32>,
    pub(crate) headless: bool,
    pub(crate) credentials: Option<Credentials>,
    /// Persistent Chrome profile. Keeping one lets later runs skip login.
    pub(crate) chrome_profile_dir: Option<PathBuf>,
    pub(crate) save_photos: bool,
    pub(crate) save_snapshots: bool,
    /// Payloads at or below this size are treated as failed downloads
    pub(crate) min_asset_bytes: usize,
}
