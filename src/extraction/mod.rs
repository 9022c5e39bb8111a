//! Listing extraction
//!
//! One parameterized loop ([`orchestrator`]) driven by per-target
//! [`listing_profile::ListingProfile`]s.

pub mod card;
pub mod checkpoint;
pub mod listing_profile;
pub mod orchestrator;
pub mod progress;

pub use card::extract_card;
pub use checkpoint::{checkpoint_path, write_checkpoint};
pub use listing_profile::{
    FieldRule, ListingKind, ListingProfile, NoResultMarkers, PhotoRule, SearchEntry, TagClass,
};
pub use orchestrator::{Orchestrator, RunReport, Termination};
pub use progress::{LogProgress, NoOpProgress, ProgressReporter};
