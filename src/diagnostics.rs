//! Diagnostic page snapshots
//!
//! The engine calls a [`SnapshotSink`] when a login step breaks or a page
//! cannot be processed. What happens with the snapshot is up to the sink.

use chrono::Local;
use log::{debug, warn};
use std::future::Future;
use std::path::PathBuf;

use crate::driver::PageDriver;
use crate::utils::asset_file_stem;

/// Receives a snapshot of the current page under a short label such as
/// `login_error` or `page_3_failure`.
pub trait SnapshotSink: Send + Sync {
    fn capture<D: PageDriver>(&self, driver: &D, label: &str) -> impl Future<Output = ()> + Send;
}

/// Discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSnapshots;

impl SnapshotSink for NoOpSnapshots {
    #[inline(always)]
    async fn capture<D: PageDriver>(&self, _driver: &D, _label: &str) {}
}

/// Writes `<label>_<timestamp>.png` and `.html` into a directory.
#[derive(Debug, Clone)]
pub struct FsSnapshotSink {
    dir: PathBuf,
}

impl FsSnapshotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

impl SnapshotSink for FsSnapshotSink {
    async fn capture<D: PageDriver>(&self, driver: &D, label: &str) {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(target: "harvest::diagnostics", "Cannot create snapshot directory {}: {e}", self.dir.display());
            return;
        }

        let stem = format!(
            "{}_{}",
            asset_file_stem(Some(label), "snapshot"),
            Local::now().format("%Y%m%d_%H%M%S")
        );

        match driver.screenshot().await {
            Ok(png) => {
                let path = self.dir.join(format!("{stem}.png"));
                match tokio::fs::write(&path, png).await {
                    Ok(()) => debug!(target: "harvest::diagnostics", "Saved screenshot {}", path.display()),
                    Err(e) => warn!(target: "harvest::diagnostics", "Failed to save screenshot: {e}"),
                }
            }
            Err(e) => warn!(target: "harvest::diagnostics", "Screenshot for '{label}' failed: {e}"),
        }

        match driver.content().await {
            Ok(html) => {
                let path = self.dir.join(format!("{stem}.html"));
                if let Err(e) = tokio::fs::write(&path, html).await {
                    warn!(target: "harvest::diagnostics", "Failed to save page source: {e}");
                }
            }
            Err(e) => warn!(target: "harvest::diagnostics", "Page source for '{label}' failed: {e}"),
        }
    }
}
