//! Result-set pagination
//!
//! [`PaginationController::advance`] moves the page to the next result page
//! using three strategies in order: activating the next-page control,
//! rewriting the `page=` query parameter, and a scripted click on the
//! control. A strategy only counts when new listing cards appear afterwards.
//! When none works the result set is treated as exhausted.

use std::time::Duration;
use tracing::{debug, info};

use crate::driver::PageDriver;
use crate::error::ScrapeResult;
use crate::locator::{Locator, LocatorList, resolve_all, resolve_first};
use crate::utils::constants::{
    DEFAULT_CANDIDATE_TIMEOUT_MS, DEFAULT_NETWORK_IDLE_TIMEOUT_SECS, DEFAULT_PAGE_SETTLE_MS,
};
use crate::utils::next_page_url;

/// Where the next-page control is and how long to wait after using it.
#[derive(Debug, Clone)]
pub struct PaginationProfile {
    pub next_controls: LocatorList,
    /// Query parameter carrying the page number
    pub page_param: String,
    pub network_idle_timeout: Duration,
    /// Fixed pause after the network goes quiet, for client-side rendering
    pub settle_delay: Duration,
    /// Per-candidate wait when resolving the control or the cards
    pub candidate_timeout: Duration,
}

impl PaginationProfile {
    /// Next-page controls seen across the portal's listing pages.
    pub fn portal_default() -> ScrapeResult<Self> {
        Ok(Self {
            next_controls: LocatorList::new(
                "next-page control",
                vec![
                    Locator::css("a.page-next"),
                    Locator::css("a[data-gtm-promotion=\"下一頁\"]"),
                    Locator::css("a.page-link[aria-label=\"Next\"]"),
                    Locator::css(".n-pagination .n-pagination-item--next"),
                    Locator::containing_text("a", "下一頁"),
                    Locator::containing_text("button", "下一頁"),
                    Locator::css(".pagination li:last-child a"),
                    Locator::css(".n-pagination .n-pagination-item:last-child"),
                ],
            )?,
            page_param: "page".to_string(),
            network_idle_timeout: Duration::from_secs(DEFAULT_NETWORK_IDLE_TIMEOUT_SECS),
            settle_delay: Duration::from_millis(DEFAULT_PAGE_SETTLE_MS),
            candidate_timeout: Duration::from_millis(DEFAULT_CANDIDATE_TIMEOUT_MS),
        })
    }

    #[must_use]
    pub fn without_waits(mut self) -> Self {
        self.network_idle_timeout = Duration::ZERO;
        self.settle_delay = Duration::ZERO;
        self.candidate_timeout = Duration::ZERO;
        self
    }
}

/// Result of one `advance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced(u32),
    NoMoreResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ControlClick,
    UrlRewrite,
    ScriptClick,
}

async fn card_text<D: PageDriver>(driver: &D, card: &D::Element) -> String {
    driver
        .text_of(card)
        .await
        .ok()
        .flatten()
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

enum Attempt {
    Inapplicable(&'static str),
    Failed(String),
    Verified,
}

pub struct PaginationController<'a> {
    profile: &'a PaginationProfile,
    cards: &'a LocatorList,
}

impl<'a> PaginationController<'a> {
    /// `cards` locates the listing cards whose change proves a page turned.
    pub fn new(profile: &'a PaginationProfile, cards: &'a LocatorList) -> Self {
        Self { profile, cards }
    }

    /// Text of the first listing card, or `None` when there are no cards.
    /// A card without readable text fingerprints as `""`.
    async fn fingerprint<D: PageDriver>(&self, driver: &D) -> Option<String> {
        let card = resolve_first(driver, None, self.cards, self.profile.candidate_timeout)
            .await
            .into_first()?;
        Some(card_text(driver, &card).await)
    }

    /// Move from `current_page` to the next page.
    ///
    /// Returns `NoMoreResults` without trying anything when the current page
    /// has no listing cards.
    pub async fn advance<D: PageDriver>(&self, driver: &D, current_page: u32) -> AdvanceOutcome {
        let cards = resolve_all(driver, None, self.cards, self.profile.candidate_timeout)
            .await
            .into_all();
        if cards.is_empty() {
            info!("Page {current_page} has no listing cards, stopping");
            return AdvanceOutcome::NoMoreResults;
        }
        let previous = match cards.first() {
            Some(card) => Some(card_text(driver, card).await),
            None => None,
        };
        drop(cards);
        let origin = match driver.current_url().await {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("Current URL unavailable: {e:#}");
                None
            }
        };

        for strategy in [Strategy::ControlClick, Strategy::UrlRewrite, Strategy::ScriptClick] {
            let attempt = match strategy {
                Strategy::ControlClick => self.control_click(driver, previous.as_deref()).await,
                Strategy::UrlRewrite => {
                    self.url_rewrite(driver, origin.as_deref(), current_page, previous.as_deref())
                        .await
                }
                Strategy::ScriptClick => self.script_click(driver, previous.as_deref()).await,
            };
            match attempt {
                Attempt::Verified => {
                    let next = current_page.saturating_add(1);
                    info!("Advanced to page {next} via {strategy:?}");
                    return AdvanceOutcome::Advanced(next);
                }
                Attempt::Inapplicable(why) => debug!("{strategy:?} not applicable: {why}"),
                Attempt::Failed(why) => debug!("{strategy:?} failed: {why}"),
            }
        }

        info!("No pagination strategy reached a new page after page {current_page}");
        AdvanceOutcome::NoMoreResults
    }

    /// Resolve the next control, returning it only when it can be used.
    async fn usable_control<D: PageDriver>(&self, driver: &D) -> Result<D::Element, &'static str> {
        let control = resolve_first(driver, None, &self.profile.next_controls, self.profile.candidate_timeout)
            .await
            .into_first()
            .ok_or("no next-page control")?;
        if driver.is_disabled(&control).await.unwrap_or(false) {
            return Err("next-page control is disabled");
        }
        Ok(control)
    }

    async fn control_click<D: PageDriver>(&self, driver: &D, previous: Option<&str>) -> Attempt {
        let control = match self.usable_control(driver).await {
            Ok(control) => control,
            Err(why) => return Attempt::Inapplicable(why),
        };
        if !driver.is_visible(&control).await.unwrap_or(false) {
            return Attempt::Inapplicable("next-page control is hidden");
        }
        if let Err(e) = driver.scroll_into_view(&control).await {
            debug!("Scroll into view failed: {e:#}");
        }
        if let Err(e) = driver.click(&control).await {
            return Attempt::Failed(format!("{e:#}"));
        }
        drop(control);
        self.verify(driver, previous).await
    }

    /// Navigate straight to `current_page + 1`, computed from the URL the
    /// page was on before any strategy ran.
    async fn url_rewrite<D: PageDriver>(
        &self,
        driver: &D,
        origin: Option<&str>,
        current_page: u32,
        previous: Option<&str>,
    ) -> Attempt {
        let Some(origin) = origin else {
            return Attempt::Inapplicable("page URL unknown");
        };
        let next = match next_page_url(origin, &self.profile.page_param, current_page) {
            Ok(next) => next,
            Err(_) => return Attempt::Inapplicable("page URL cannot be rewritten"),
        };
        if let Err(e) = driver.goto(&next).await {
            return Attempt::Failed(format!("{e:#}"));
        }

        match self.verify(driver, previous).await {
            Attempt::Verified => Attempt::Verified,
            other => {
                // The script click needs the control from the original page
                if let Err(e) = driver.goto(origin).await {
                    debug!("Return to {origin} failed: {e:#}");
                }
                other
            }
        }
    }

    async fn script_click<D: PageDriver>(&self, driver: &D, previous: Option<&str>) -> Attempt {
        let control = match self.usable_control(driver).await {
            Ok(control) => control,
            Err(why) => return Attempt::Inapplicable(why),
        };
        if let Err(e) = driver.script_click(&control).await {
            return Attempt::Failed(format!("{e:#}"));
        }
        drop(control);
        self.verify(driver, previous).await
    }

    /// New content appeared: at least one card, and the first card differs
    /// from before when both are known.
    async fn verify<D: PageDriver>(&self, driver: &D, previous: Option<&str>) -> Attempt {
        if let Err(e) = driver.wait_for_network_idle(self.profile.network_idle_timeout).await {
            debug!("Network did not go idle: {e:#}");
        }
        if !self.profile.settle_delay.is_zero() {
            tokio::time::sleep(self.profile.settle_delay).await;
        }

        match self.fingerprint(driver).await {
            None => Attempt::Failed("no listing cards after advancing".to_string()),
            Some(current) if previous.is_some_and(|p| !p.is_empty() && p == current) => {
                Attempt::Failed("listing unchanged after advancing".to_string())
            }
            Some(_) => Attempt::Verified,
        }
    }
}
