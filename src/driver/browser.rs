//! Browser lifecycle for a harvest run
//!
//! One [`BrowserSession`] owns the Chrome process, its CDP handler task and
//! the profile directory for the length of a run.

use anyhow::Result;
use chromiumoxide::Browser;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::chromium::ChromiumDriver;
use super::page_enhancer::enhance_page;
use super::page_timeout::with_timeout;
use crate::browser_setup::{LaunchOptions, launch_browser};

/// Result of cleanup operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

/// Launched browser plus its handler task.
///
/// The handler is aborted on drop. An ephemeral profile directory is removed
/// on drop as well; a persistent one (`--profile-dir`) is left in place so the
/// next run can reuse its session cookies.
pub struct BrowserSession {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
    ephemeral: bool,
}

impl BrowserSession {
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let (browser, handler, user_data_dir) = launch_browser(options).await?;
        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler,
            user_data_dir: Some(user_data_dir),
            ephemeral: options.profile_dir.is_none(),
        })
    }

    /// Open a new page with stealth patches and wrap it as a driver.
    pub async fn open_driver(&self) -> Result<ChromiumDriver> {
        let page = {
            let browser = self.browser.lock().await;
            browser.new_page("about:blank").await?
        };

        if let Err(e) = with_timeout(
            enhance_page(&page),
            Duration::from_secs(5),
            "page enhancement",
        )
        .await
        {
            warn!(target: "harvest::browser", "Page enhancement failed, continuing unpatched: {e}");
        }

        Ok(ChromiumDriver::new(Arc::clone(&self.browser), page))
    }

    /// Close the browser, wait for the process and remove an ephemeral
    /// profile directory.
    pub async fn shutdown(mut self) -> CleanupResult {
        let mut errors = Vec::new();

        {
            let mut browser = self.browser.lock().await;
            debug!(target: "harvest::cleanup", "Closing browser");
            if let Err(e) = browser.close().await {
                warn!(target: "harvest::cleanup", "Failed to close browser: {e}");
                errors.push(format!("Browser close failed: {e}"));
            }

            // Chrome must release its file handles before the profile goes
            if let Err(e) = browser.wait().await {
                warn!(target: "harvest::cleanup", "Failed to wait for browser exit: {e}");
                errors.push(format!("Browser wait failed: {e}"));
            }
        }

        self.handler.abort();

        if let Some(dir) = self.user_data_dir.take()
            && self.ephemeral
        {
            debug!(target: "harvest::cleanup", "Removing profile directory {}", dir.display());
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!(target: "harvest::cleanup", "Failed to remove profile directory: {e}");
                errors.push(format!("Directory cleanup failed: {e}"));
            }
        }

        if errors.is_empty() {
            CleanupResult::Success
        } else {
            CleanupResult::PartialFailure(errors)
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();

        if let Some(dir) = self.user_data_dir.take()
            && self.ephemeral
        {
            info!(target: "harvest::cleanup", "BrowserSession dropped without shutdown, removing {}", dir.display());
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!(
                    target: "harvest::cleanup",
                    "Failed to remove profile directory {}: {e}. Manual cleanup may be required.",
                    dir.display()
                );
            }
        }
    }
}
