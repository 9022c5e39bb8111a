//! chromiumoxide implementation of [`PageDriver`]

use anyhow::{Context, Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::{Browser, Element, Page};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::js_scripts::{
    CLEAR_VALUE_FN, IS_DISABLED_FN, IS_VISIBLE_FN, NETWORK_STATE_SCRIPT, SCRIPT_CLICK_FN,
    fetch_base64_script, text_scan_click_script,
};
use super::page_timeout::with_timeout;
use crate::error::ScrapeError;
use super::{PageDriver, SessionCookie};

/// Consecutive unchanged polls required before the network counts as idle
const QUIET_POLLS: u32 = 2;

/// One listing page in a launched browser.
///
/// Holds a handle on the browser so asset capture can open scratch pages
/// without disturbing the listing page's navigation state.
pub struct ChromiumDriver {
    browser: Arc<Mutex<Browser>>,
    page: Page,
}

impl ChromiumDriver {
    pub(crate) fn new(browser: Arc<Mutex<Browser>>, page: Page) -> Self {
        Self { browser, page }
    }

    /// Underlying page, for callers that need raw CDP access
    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn call_bool(element: &Element, function: &str) -> Result<bool> {
        let returns = element
            .call_js_fn(function, false)
            .await
            .context("Failed to evaluate element predicate")?;
        Ok(returns
            .result
            .value
            .as_ref()
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }

    fn png_params() -> CaptureScreenshotParams {
        CaptureScreenshotParams {
            format: Some(CaptureScreenshotFormat::Png),
            ..Default::default()
        }
    }
}

impl PageDriver for ChromiumDriver {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn query_all(&self, scope: Option<&Element>, css: &str) -> Result<Vec<Element>> {
        let found = match scope {
            Some(element) => element.find_elements(css).await,
            None => self.page.find_elements(css).await,
        };
        found.with_context(|| format!("Query failed for selector '{css}'"))
    }

    async fn text_of(&self, element: &Element) -> Result<Option<String>> {
        Ok(element.inner_text().await?)
    }

    async fn attribute_of(&self, element: &Element, name: &str) -> Result<Option<String>> {
        Ok(element.attribute(name).await?)
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element.click().await.context("Click failed")?;
        Ok(())
    }

    async fn script_click(&self, element: &Element) -> Result<()> {
        element
            .call_js_fn(SCRIPT_CLICK_FN, false)
            .await
            .context("Scripted click failed")?;
        Ok(())
    }

    async fn fill(&self, element: &Element, value: &str) -> Result<()> {
        element
            .call_js_fn(CLEAR_VALUE_FN, false)
            .await
            .context("Failed to clear input")?;
        element.focus().await?;
        element.type_str(value).await.context("Failed to type into input")?;
        Ok(())
    }

    async fn press_enter(&self, element: &Element) -> Result<()> {
        element.press_key("Enter").await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<()> {
        element.scroll_into_view().await?;
        Ok(())
    }

    async fn is_visible(&self, element: &Element) -> Result<bool> {
        Self::call_bool(element, IS_VISIBLE_FN).await
    }

    async fn is_disabled(&self, element: &Element) -> Result<bool> {
        Self::call_bool(element, IS_DISABLED_FN).await
    }

    async fn click_first_containing_text(&self, phrase: &str) -> Result<bool> {
        let clicked: bool = self
            .page
            .evaluate(text_scan_click_script(phrase))
            .await
            .context("Text scan script failed")?
            .into_value()?;
        Ok(clicked)
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        let poll_interval = Duration::from_millis(250);
        let mut last_resources: Option<u64> = None;
        let mut quiet = 0u32;

        loop {
            if let Ok(result) = self.page.evaluate(NETWORK_STATE_SCRIPT).await
                && let Ok(state) = result.into_value::<serde_json::Value>()
            {
                let complete = state.get("readyState").and_then(|v| v.as_str()) == Some("complete");
                let resources = state.get("resources").and_then(serde_json::Value::as_u64);

                if complete && resources.is_some() && resources == last_resources {
                    quiet += 1;
                    if quiet >= QUIET_POLLS {
                        debug!("Network idle after {:.2}s", start.elapsed().as_secs_f64());
                        return Ok(());
                    }
                } else {
                    quiet = 0;
                }
                last_resources = resources;
            }

            if start.elapsed() >= timeout {
                return Err(ScrapeError::timeout("network idle", timeout).into());
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(Self::png_params())
            .await
            .map_err(|e| anyhow!("Failed to capture screenshot: {e}"))
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn fetch_in_session(&self, url: &str) -> Result<Vec<u8>> {
        let value: serde_json::Value = self
            .page
            .evaluate(fetch_base64_script(url))
            .await
            .context("In-page fetch script failed")?
            .into_value()?;

        if !value.get("ok").and_then(serde_json::Value::as_bool).unwrap_or(false) {
            let status = value.get("status").and_then(serde_json::Value::as_i64).unwrap_or(0);
            let error = value
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            return Err(anyhow!("In-page fetch of {url} failed (status={status}): {error}"));
        }

        let data = value
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("In-page fetch of {url} returned no data"))?;
        STANDARD
            .decode(data)
            .context("In-page fetch returned invalid base64")
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        let cookies = self.page.get_cookies().await?;
        Ok(cookies
            .into_iter()
            .map(|c| SessionCookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
            })
            .collect())
    }

    async fn capture_in_scratch_page(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let scratch = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .context("Failed to open scratch page")?
        };

        let captured = with_timeout(
            async {
                scratch.goto(url).await?;
                // A directly opened image renders as a lone <img>; prefer its
                // bounds over the whole viewport.
                let png = match scratch.find_element("img").await {
                    Ok(img) => img
                        .screenshot(CaptureScreenshotFormat::Png)
                        .await
                        .map_err(|e| anyhow!("Failed to capture image element: {e}"))?,
                    Err(_) => scratch
                        .screenshot(Self::png_params())
                        .await
                        .map_err(|e| anyhow!("Failed to capture scratch page: {e}"))?,
                };
                Ok::<_, anyhow::Error>(png)
            },
            timeout,
            "scratch page capture",
        )
        .await;

        if let Err(e) = scratch.close().await {
            warn!("Failed to close scratch page: {e}");
        }

        captured
    }
}
