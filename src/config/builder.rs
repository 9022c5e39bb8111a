//! Type-safe builder for `ScrapeConfig` using the typestate pattern
//!
//! The output directory and the listing profile must be set, in that order,
//! before `build()` becomes available.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::ScrapeConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::extraction::listing_profile::ListingProfile;
use crate::session::Credentials;
use crate::utils::MIN_ASSET_BYTES;

// Type states for the builder
pub struct WithOutputDir;
pub struct Complete;

pub struct ScrapeConfigBuilder<State = ()> {
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) profile: Option<ListingProfile>,
    pub(crate) keyword: String,
    pub(crate) page_limit: Option<u32>,
    pub(crate) headless: bool,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) chrome_profile_dir: Option<PathBuf>,
    pub(crate) save_photos: bool,
    pub(crate) save_snapshots: bool,
    pub(crate) min_asset_bytes: usize,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScrapeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            output_dir: None,
            profile: None,
            keyword: String::new(),
            page_limit: None,
            headless: true,
            credentials: None,
            chrome_profile_dir: None,
            save_photos: true,
            save_snapshots: true,
            min_asset_bytes: MIN_ASSET_BYTES,
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder<()> {
        ScrapeConfigBuilder::default()
    }
}

impl ScrapeConfigBuilder<()> {
    pub fn output_dir(self, dir: impl Into<PathBuf>) -> ScrapeConfigBuilder<WithOutputDir> {
        ScrapeConfigBuilder {
            output_dir: Some(dir.into()),
            profile: self.profile,
            keyword: self.keyword,
            page_limit: self.page_limit,
            headless: self.headless,
            credentials: self.credentials,
            chrome_profile_dir: self.chrome_profile_dir,
            save_photos: self.save_photos,
            save_snapshots: self.save_snapshots,
            min_asset_bytes: self.min_asset_bytes,
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfigBuilder<WithOutputDir> {
    pub fn profile(self, profile: ListingProfile) -> ScrapeConfigBuilder<Complete> {
        ScrapeConfigBuilder {
            output_dir: self.output_dir,
            profile: Some(profile),
            keyword: self.keyword,
            page_limit: self.page_limit,
            headless: self.headless,
            credentials: self.credentials,
            chrome_profile_dir: self.chrome_profile_dir,
            save_photos: self.save_photos,
            save_snapshots: self.save_snapshots,
            min_asset_bytes: self.min_asset_bytes,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when all required fields are set
impl ScrapeConfigBuilder<Complete> {
    /// # Errors
    /// `ScrapeError::Config` for a zero page limit, or for a profile that
    /// needs a session when no credentials were given.
    pub fn build(self) -> ScrapeResult<ScrapeConfig> {
        let output_dir = self
            .output_dir
            .ok_or_else(|| ScrapeError::Config("output_dir is required".to_string()))?;
        let profile = self
            .profile
            .ok_or_else(|| ScrapeError::Config("profile is required".to_string()))?;

        if self.page_limit == Some(0) {
            return Err(ScrapeError::Config(
                "page limit must be positive; leave it unset for no limit".to_string(),
            ));
        }
        if let Some(credentials) = &self.credentials
            && (credentials.username.is_empty() || credentials.password.is_empty())
        {
            return Err(ScrapeError::Config(
                "username and password must both be non-empty".to_string(),
            ));
        }

        Ok(ScrapeConfig {
            output_dir,
            profile,
            keyword: self.keyword.trim().to_string(),
            page_limit: self.page_limit,
            headless: self.headless,
            credentials: self.credentials,
            chrome_profile_dir: self.chrome_profile_dir,
            save_photos: self.save_photos,
            save_snapshots: self.save_snapshots,
            min_asset_bytes: self.min_asset_bytes,
        })
    }
}
