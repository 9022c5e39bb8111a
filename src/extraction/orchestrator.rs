//! The per-page harvest loop
//!
//! locate cards → read fields → fetch photos → checkpoint → paginate, until
//! the page limit is reached, pagination runs dry, or the first page has no
//! cards. Failures below run level are logged and absorbed; the run always
//! returns what it collected.

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::card::extract_card;
use super::checkpoint::write_checkpoint;
use super::listing_profile::{ListingProfile, SearchEntry};
use super::progress::ProgressReporter;
use crate::assets::{AssetArtifact, AssetRetriever};
use crate::config::ScrapeConfig;
use crate::diagnostics::SnapshotSink;
use crate::driver::PageDriver;
use crate::error::{LoginFailure, ScrapeError, ScrapeResult};
use crate::locator::{resolve_all, resolve_first};
use crate::pagination::{AdvanceOutcome, PaginationController};
use crate::record::{ExtractedRecord, fields};
use crate::session::SessionController;
use crate::utils::{asset_file_stem, fill_keyword_template};

/// Why the page loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    PageLimitReached,
    NoMoreResults,
    /// The first page had no listing cards
    NoItemsFound,
    /// The result set could not be reached
    PageFailed(String),
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub records: Vec<ExtractedRecord>,
    pub pages_completed: u32,
    pub termination: Termination,
    pub checkpoints: Vec<PathBuf>,
    pub assets: Vec<AssetArtifact>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            pages_completed: 0,
            termination: Termination::NoMoreResults,
            checkpoints: Vec::new(),
            assets: Vec::new(),
        }
    }
}

/// Runs the page loop of one harvest against one page driver.
pub struct Orchestrator<'a, D, P, S> {
    driver: &'a D,
    config: &'a ScrapeConfig,
    retriever: &'a AssetRetriever,
    progress: &'a P,
    snapshots: &'a S,
}

impl<'a, D, P, S> Orchestrator<'a, D, P, S>
where
    D: PageDriver,
    P: ProgressReporter,
    S: SnapshotSink,
{
    pub fn new(
        driver: &'a D,
        config: &'a ScrapeConfig,
        retriever: &'a AssetRetriever,
        progress: &'a P,
        snapshots: &'a S,
    ) -> Self {
        Self {
            driver,
            config,
            retriever,
            progress,
            snapshots,
        }
    }

    fn profile(&self) -> &ListingProfile {
        self.config.profile()
    }

    /// Sign in when the profile needs a session, then run the page loop.
    ///
    /// # Errors
    /// Only authentication failures are returned; everything after login is
    /// reported through the `RunReport`.
    pub async fn harvest(&self, session: &mut SessionController) -> ScrapeResult<RunReport> {
        if self.profile().requires_session {
            let authenticated = match self.config.credentials() {
                Some(credentials) => {
                    session
                        .establish_session(self.driver, credentials, self.snapshots)
                        .await?
                }
                None => {
                    self.driver.goto(&session.profile().entry_url).await.map_err(|e| {
                        ScrapeError::SessionInit(format!("entry page unreachable: {e:#}"))
                    })?;
                    if !session.is_logged_in(self.driver).await {
                        return Err(LoginFailure::new(
                            "no credentials given and no existing session",
                        )
                        .into());
                    }
                    crate::session::Authenticated::ExistingSession
                }
            };
            info!("Session ready ({authenticated:?})");
        }
        Ok(self.run().await)
    }

    /// The page loop. Assumes any needed session is already established.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::new();
        let profile = self.profile();

        self.progress.report_search_started(self.config.keyword());
        if let Err(e) = self.enter_search().await {
            warn!("Could not reach the result set: {e}");
            self.progress.report_error(&e.to_string());
            self.snapshots.capture(self.driver, "search_error").await;
            report.termination = Termination::PageFailed(e.to_string());
            return report;
        }

        let pagination = PaginationController::new(&profile.pagination, &profile.cards);
        let mut seen: HashSet<String> = HashSet::new();
        let mut page: u32 = 1;

        loop {
            let cards = resolve_all(self.driver, None, &profile.cards, profile.card_timeout)
                .await
                .into_all();
            self.progress.report_page_loaded(page, cards.len());

            if cards.is_empty() {
                report.termination = if page == 1 {
                    if self.shows_no_results().await {
                        info!("Portal reports no results for '{}'", self.config.keyword());
                    }
                    Termination::NoItemsFound
                } else {
                    Termination::NoMoreResults
                };
                break;
            }

            for (index, card) in cards.iter().enumerate() {
                let mut record = match extract_card(self.driver, card, profile, page).await {
                    Ok(record) => record,
                    Err(e) => {
                        self.progress.report_record_skipped(page, index, &e.to_string());
                        continue;
                    }
                };

                if let Some(key) = profile.dedupe_key(&record)
                    && !seen.insert(key)
                {
                    debug!("Duplicate of an earlier record on page {page}, skipping");
                    continue;
                }

                if self.config.save_photos()
                    && let Some(url) = record.get(fields::PHOTO_URL).map(str::to_string)
                {
                    let artifact = self.fetch_photo(&record, &url, page, index).await;
                    record.set(fields::PHOTO_PATH, artifact.path_string());
                    report.assets.push(artifact);
                }

                self.progress.report_record_extracted(page, index);
                report.records.push(record);
            }
            drop(cards);

            match write_checkpoint(self.config.output_dir(), page, &profile.schema, &report.records) {
                Ok(path) => {
                    self.progress.report_checkpoint_written(page, &path);
                    report.checkpoints.push(path);
                }
                Err(e) => {
                    warn!("{e}");
                    self.progress.report_error(&e.to_string());
                }
            }
            report.pages_completed = page;

            if self.config.is_last_page(page) {
                report.termination = Termination::PageLimitReached;
                break;
            }

            match pagination.advance(self.driver, page).await {
                AdvanceOutcome::Advanced(next) => page = next,
                AdvanceOutcome::NoMoreResults => {
                    report.termination = Termination::NoMoreResults;
                    break;
                }
            }
        }

        self.progress
            .report_completed(report.pages_completed, report.records.len());
        report
    }

    async fn fetch_photo(&self, record: &ExtractedRecord, url: &str, page: u32, index: usize) -> AssetArtifact {
        let stem = asset_file_stem(record.get(fields::NAME), "candidate");
        let dest = self.config.photo_dir().join(format!("{stem}_p{page}_{index}"));
        self.retriever.retrieve(self.driver, url, &dest).await
    }

    async fn enter_search(&self) -> ScrapeResult<()> {
        let profile = self.profile();
        let keyword = self.config.keyword();

        match &profile.search {
            SearchEntry::UrlTemplate(template) => {
                let url = fill_keyword_template(template, keyword);
                self.driver.goto(&url).await?;
            }
            SearchEntry::Form { fallback_url, .. } if keyword.is_empty() => {
                self.driver.goto(fallback_url).await?;
            }
            SearchEntry::Form { inputs, fallback_url } => {
                let mut input = resolve_first(self.driver, None, inputs, profile.card_timeout)
                    .await
                    .into_first();
                if input.is_none() {
                    info!("No search box here, opening {fallback_url}");
                    self.driver.goto(fallback_url).await?;
                    input = resolve_first(self.driver, None, inputs, profile.card_timeout)
                        .await
                        .into_first();
                }
                let input = input.ok_or_else(|| ScrapeError::structural(inputs.label()))?;
                self.driver.fill(&input, keyword).await?;
                self.driver.press_enter(&input).await?;
            }
        }

        if let Err(e) = self
            .driver
            .wait_for_network_idle(profile.pagination.network_idle_timeout)
            .await
        {
            debug!("Results did not settle: {e:#}");
        }
        Ok(())
    }

    async fn shows_no_results(&self) -> bool {
        let markers = &self.profile().no_results;
        if let Some(locators) = &markers.locators
            && resolve_first(self.driver, None, locators, std::time::Duration::ZERO)
                .await
                .is_found()
        {
            return true;
        }
        if markers.texts.is_empty() {
            return false;
        }
        match self.driver.content().await {
            Ok(html) => markers.texts.iter().any(|t| html.contains(t.as_str())),
            Err(_) => false,
        }
    }
}
