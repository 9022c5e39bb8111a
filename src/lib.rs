pub mod assets;
pub mod browser_setup;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod extraction;
pub mod locator;
pub mod pagination;
pub mod record;
pub mod retry;
pub mod segmentation;
pub mod session;
pub mod utils;

pub use assets::{AssetArtifact, AssetRetriever, ArtifactState, RetrievalStage};
pub use browser_setup::{LaunchOptions, download_managed_browser, find_browser_executable, launch_browser};
pub use config::ScrapeConfig;
pub use diagnostics::{FsSnapshotSink, NoOpSnapshots, SnapshotSink};
pub use driver::{BrowserSession, ChromiumDriver, PageDriver, SessionCookie};
pub use error::{LoginFailure, ScrapeError, ScrapeResult};
pub use extraction::{
    ListingKind, ListingProfile, LogProgress, NoOpProgress, Orchestrator, ProgressReporter,
    RunReport, Termination,
};
pub use locator::{Locator, LocatorList, Resolved};
pub use pagination::{AdvanceOutcome, PaginationController, PaginationProfile};
pub use record::ExtractedRecord;
pub use segmentation::{AnchorTable, sanitize, segment};
pub use session::{Credentials, PasscodePrompt, PasscodeRequest, SessionController, SessionProfile};

/// Run one harvest end to end against an already opened page.
///
/// Signs in first when the profile needs a session, and answers passcode
/// requests through `prompt`.
pub async fn harvest<D, P>(
    driver: &D,
    config: &ScrapeConfig,
    prompt: PasscodePrompt,
    progress: &P,
) -> ScrapeResult<RunReport>
where
    D: PageDriver,
    P: ProgressReporter,
{
    let retriever = AssetRetriever::new(config.profile().base_url.clone())?
        .with_min_bytes(config.min_asset_bytes());
    let mut session = SessionController::new(SessionProfile::vip_portal()?, prompt);

    if config.save_snapshots() {
        let snapshots = FsSnapshotSink::new(config.snapshot_dir());
        Orchestrator::new(driver, config, &retriever, progress, &snapshots)
            .harvest(&mut session)
            .await
    } else {
        Orchestrator::new(driver, config, &retriever, progress, &NoOpSnapshots)
            .harvest(&mut session)
            .await
    }
}
