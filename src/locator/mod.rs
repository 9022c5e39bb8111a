//! Ordered-fallback element location
//!
//! Portal markup changes class names between deployments and differs across
//! page variants, so every element the engine needs is described by a
//! [`LocatorList`]: candidates ordered most specific first. The first
//! candidate that matches anything wins, even if a later one would match
//! more elements.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::driver::PageDriver;
use crate::error::{ScrapeError, ScrapeResult};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One way of finding an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Plain CSS selector
    Css(String),
    /// CSS selector narrowed to elements whose trimmed text equals `text`
    ExactText { css: String, text: String },
    /// CSS selector narrowed to elements whose text contains `text`
    ContainsText { css: String, text: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn exact_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::ExactText {
            css: css.into(),
            text: text.into(),
        }
    }

    pub fn containing_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::ContainsText {
            css: css.into(),
            text: text.into(),
        }
    }

    fn selector(&self) -> &str {
        match self {
            Locator::Css(css)
            | Locator::ExactText { css, .. }
            | Locator::ContainsText { css, .. } => css,
        }
    }

    fn accepts(&self, text: Option<&str>) -> bool {
        match self {
            Locator::Css(_) => true,
            Locator::ExactText { text: wanted, .. } => {
                text.is_some_and(|t| t.trim() == wanted.as_str())
            }
            Locator::ContainsText { text: wanted, .. } => {
                text.is_some_and(|t| t.contains(wanted.as_str()))
            }
        }
    }

    fn needs_text(&self) -> bool {
        !matches!(self, Locator::Css(_))
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(css) => write!(f, "{css}"),
            Locator::ExactText { css, text } => write!(f, "{css}[text=\"{text}\"]"),
            Locator::ContainsText { css, text } => write!(f, "{css}[text*=\"{text}\"]"),
        }
    }
}

/// Non-empty, ordered list of candidates for one logical element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorList {
    label: String,
    candidates: Vec<Locator>,
}

impl LocatorList {
    /// # Errors
    /// `ScrapeError::Config` when `candidates` is empty.
    pub fn new(label: impl Into<String>, candidates: Vec<Locator>) -> ScrapeResult<Self> {
        let label = label.into();
        if candidates.is_empty() {
            return Err(ScrapeError::Config(format!(
                "locator list '{label}' needs at least one candidate"
            )));
        }
        Ok(Self { label, candidates })
    }

    /// Shorthand for a list of plain CSS candidates.
    pub fn from_css(label: impl Into<String>, selectors: &[&str]) -> ScrapeResult<Self> {
        Self::new(label, selectors.iter().map(|s| Locator::css(*s)).collect())
    }

    /// What this list finds, for log and error messages
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn candidates(&self) -> &[Locator] {
        &self.candidates
    }
}

/// Outcome of a resolution.
#[derive(Debug)]
pub enum Resolved<E> {
    /// `candidate` is the index of the winning locator; `matches` is never empty
    Found { candidate: usize, matches: Vec<E> },
    NotFound,
}

impl<E> Resolved<E> {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Resolved::Found { .. })
    }

    pub fn into_first(self) -> Option<E> {
        match self {
            Resolved::Found { matches, .. } => matches.into_iter().next(),
            Resolved::NotFound => None,
        }
    }

    pub fn into_all(self) -> Vec<E> {
        match self {
            Resolved::Found { matches, .. } => matches,
            Resolved::NotFound => Vec::new(),
        }
    }

    /// Turn `NotFound` into a structural mismatch naming `what`.
    pub fn required(self, what: &str) -> ScrapeResult<E> {
        self.into_first().ok_or_else(|| ScrapeError::structural(what))
    }
}

async fn query_candidate<D: PageDriver>(
    driver: &D,
    scope: Option<&D::Element>,
    locator: &Locator,
) -> Vec<D::Element> {
    let elements = match driver.query_all(scope, locator.selector()).await {
        Ok(elements) => elements,
        Err(e) => {
            debug!("Query for '{locator}' failed: {e}");
            return Vec::new();
        }
    };

    if !locator.needs_text() {
        return elements;
    }

    let mut kept = Vec::with_capacity(elements.len());
    for element in elements {
        let text = driver.text_of(&element).await.ok().flatten();
        if locator.accepts(text.as_deref()) {
            kept.push(element);
        }
    }
    kept
}

/// Wait up to `timeout` for one candidate to match; zero means a single query.
async fn wait_for_candidate<D: PageDriver>(
    driver: &D,
    scope: Option<&D::Element>,
    locator: &Locator,
    timeout: Duration,
) -> Vec<D::Element> {
    let start = Instant::now();
    loop {
        let matches = query_candidate(driver, scope, locator).await;
        if !matches.is_empty() || start.elapsed() >= timeout {
            return matches;
        }
        tokio::time::sleep(POLL_INTERVAL.min(timeout.saturating_sub(start.elapsed()))).await;
    }
}

/// All matches of the first candidate that matches anything.
///
/// Each candidate gets up to `timeout_per_candidate` before the next one is
/// tried. Exhausting the list is a quiet `NotFound`.
pub async fn resolve_all<D: PageDriver>(
    driver: &D,
    scope: Option<&D::Element>,
    list: &LocatorList,
    timeout_per_candidate: Duration,
) -> Resolved<D::Element> {
    for (index, locator) in list.candidates().iter().enumerate() {
        let matches = wait_for_candidate(driver, scope, locator, timeout_per_candidate).await;
        if !matches.is_empty() {
            debug!(
                "{}: candidate #{index} '{locator}' matched {} element(s)",
                list.label(),
                matches.len()
            );
            return Resolved::Found {
                candidate: index,
                matches,
            };
        }
        debug!("{}: candidate #{index} '{locator}' missed", list.label());
    }
    debug!("{}: no candidate matched", list.label());
    Resolved::NotFound
}

/// First match of the first candidate that matches anything.
pub async fn resolve_first<D: PageDriver>(
    driver: &D,
    scope: Option<&D::Element>,
    list: &LocatorList,
    timeout_per_candidate: Duration,
) -> Resolved<D::Element> {
    match resolve_all(driver, scope, list, timeout_per_candidate).await {
        Resolved::Found {
            candidate,
            mut matches,
        } => {
            matches.truncate(1);
            Resolved::Found { candidate, matches }
        }
        Resolved::NotFound => Resolved::NotFound,
    }
}

/// Trimmed, non-empty text of the first match, or `None`.
pub async fn resolve_text<D: PageDriver>(
    driver: &D,
    scope: Option<&D::Element>,
    list: &LocatorList,
    timeout_per_candidate: Duration,
) -> Option<String> {
    let element = resolve_first(driver, scope, list, timeout_per_candidate)
        .await
        .into_first()?;
    let text = driver.text_of(&element).await.ok().flatten()?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
