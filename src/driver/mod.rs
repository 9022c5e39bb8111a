//! Page driver abstraction
//!
//! Everything the harvest engine does to a browser page goes through
//! [`PageDriver`]. The chromiumoxide implementation lives in [`chromium`];
//! the locator, session, pagination and asset modules are generic over the
//! trait and never touch CDP directly.

pub mod browser;
pub mod chromium;
pub mod js_scripts;
pub mod page_enhancer;
pub mod page_timeout;

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

pub use browser::{BrowserSession, CleanupResult};
pub use chromium::ChromiumDriver;
pub use page_timeout::with_timeout;

/// Cookie from the live browser session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// Operations the engine needs from one browser page.
///
/// Element handles are only valid for the document they were queried from;
/// callers drop them before navigating.
pub trait PageDriver: Send + Sync {
    type Element: Send + Sync;

    /// Navigate the page and wait for the response.
    fn goto(&self, url: &str) -> impl Future<Output = Result<()>> + Send;

    fn current_url(&self) -> impl Future<Output = Result<String>> + Send;

    /// All elements matching `css` inside `scope`, or in the document when
    /// `scope` is `None`. No match is `Ok(vec![])`, not an error.
    fn query_all(
        &self,
        scope: Option<&Self::Element>,
        css: &str,
    ) -> impl Future<Output = Result<Vec<Self::Element>>> + Send;

    /// Rendered text (`innerText`) of an element.
    fn text_of(&self, element: &Self::Element) -> impl Future<Output = Result<Option<String>>> + Send;

    fn attribute_of(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Trusted click at the element's center.
    fn click(&self, element: &Self::Element) -> impl Future<Output = Result<()>> + Send;

    /// Script-dispatched `element.click()`, bypassing hit-testing.
    fn script_click(&self, element: &Self::Element) -> impl Future<Output = Result<()>> + Send;

    /// Replace the value of an input with `value`.
    fn fill(&self, element: &Self::Element, value: &str) -> impl Future<Output = Result<()>> + Send;

    fn press_enter(&self, element: &Self::Element) -> impl Future<Output = Result<()>> + Send;

    fn scroll_into_view(&self, element: &Self::Element) -> impl Future<Output = Result<()>> + Send;

    fn is_visible(&self, element: &Self::Element) -> impl Future<Output = Result<bool>> + Send;

    /// Disabled by attribute, CSS class (own or parent) or `aria-disabled`.
    fn is_disabled(&self, element: &Self::Element) -> impl Future<Output = Result<bool>> + Send;

    /// Scan every node for `phrase` and click the innermost hit.
    /// `Ok(false)` when nothing contains the phrase.
    fn click_first_containing_text(&self, phrase: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Wait until the document is complete and no new resources load for a
    /// short quiet window. Errors on timeout.
    fn wait_for_network_idle(&self, timeout: Duration) -> impl Future<Output = Result<()>> + Send;

    /// PNG screenshot of the current page.
    fn screenshot(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Serialized DOM of the current page.
    fn content(&self) -> impl Future<Output = Result<String>> + Send;

    /// Fetch `url` from inside the page, with its cookies and referrer.
    fn fetch_in_session(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn cookies(&self) -> impl Future<Output = Result<Vec<SessionCookie>>> + Send;

    /// Open a separate page, navigate it to `url`, screenshot it and close
    /// it again before returning. The primary page is not touched.
    fn capture_in_scratch_page(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
