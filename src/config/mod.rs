//! Configuration for harvest runs
//!
//! `ScrapeConfig` is built through a typestate builder so a run cannot start
//! without an output directory and a listing profile.

pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

pub use builder::{Complete, ScrapeConfigBuilder, WithOutputDir};
pub use types::ScrapeConfig;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::extraction::listing_profile::ListingProfile;
    use crate::session::Credentials;

    #[test]
    fn defaults_and_trimming() {
        let config = ScrapeConfig::builder()
            .output_dir("/tmp/harvest")
            .profile(ListingProfile::jobs().unwrap())
            .keyword("  工程師 ")
            .build()
            .unwrap();
        assert_eq!(config.keyword(), "工程師");
        assert_eq!(config.page_limit(), None);
        assert!(config.headless());
        assert!(!config.is_last_page(50));
        assert!(config.photo_dir().ends_with("profile_photos"));
    }

    #[test]
    fn zero_page_limit_is_rejected() {
        let err = ScrapeConfig::builder()
            .page_limit(0)
            .output_dir("/tmp/harvest")
            .profile(ListingProfile::jobs().unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let err = ScrapeConfig::builder()
            .output_dir("/tmp/harvest")
            .profile(ListingProfile::resumes().unwrap())
            .credentials(Credentials::new("recruiter@example.com", ""))
            .build()
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn page_limit_marks_the_last_page() {
        let config = ScrapeConfig::builder()
            .output_dir("/tmp/harvest")
            .profile(ListingProfile::companies().unwrap())
            .page_limit(3)
            .build()
            .unwrap();
        assert!(!config.is_last_page(2));
        assert!(config.is_last_page(3));
    }
}
