//! Four-stage asset retrieval

use anyhow::{Context, anyhow};
use reqwest::header::{COOKIE, REFERER, USER_AGENT};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::placeholder::placeholder_gif;
use super::{ArtifactState, AssetArtifact, RetrievalStage};
use crate::driver::PageDriver;
use crate::error::{ScrapeError, ScrapeResult};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::utils::constants::{CHROME_USER_AGENT, DEFAULT_SCRATCH_NAVIGATION_SECS, MIN_ASSET_BYTES};
use crate::utils::{cookie_domain_matches, host_of};

/// Downloads assets, falling back from the cheapest strategy to a placeholder.
#[derive(Debug, Clone)]
pub struct AssetRetriever {
    http: reqwest::Client,
    referer: String,
    min_bytes: usize,
    scratch_timeout: Duration,
    retry: RetryPolicy,
}

impl AssetRetriever {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(referer: impl Into<String>) -> ScrapeResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            referer: referer.into(),
            min_bytes: MIN_ASSET_BYTES,
            scratch_timeout: Duration::from_secs(DEFAULT_SCRATCH_NAVIGATION_SECS),
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_min_bytes(mut self, min_bytes: usize) -> Self {
        self.min_bytes = min_bytes;
        self
    }

    #[must_use]
    pub fn with_scratch_timeout(mut self, timeout: Duration) -> Self {
        self.scratch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn min_bytes(&self) -> usize {
        self.min_bytes
    }

    fn check_size(&self, bytes: &[u8]) -> ScrapeResult<()> {
        if bytes.len() <= self.min_bytes {
            return Err(ScrapeError::AssetIntegrity {
                bytes: bytes.len(),
                threshold: self.min_bytes,
            });
        }
        Ok(())
    }

    /// Retrieve `url` into `dest_stem` plus an extension matching the payload.
    ///
    /// Never ends in `Failed` because a download failed: when every strategy
    /// comes back empty or undersized the placeholder GIF is written instead.
    /// `Failed` means the placeholder itself could not be written.
    pub async fn retrieve<D: PageDriver>(&self, driver: &D, url: &str, dest_stem: &Path) -> AssetArtifact {
        let mut artifact = AssetArtifact::pending(url);

        if let Some(parent) = dest_stem.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!("Cannot create asset directory {}: {e}", parent.display());
        }

        match self.in_session(driver, url).await {
            Ok(bytes) => match persist(dest_stem, &bytes) {
                Ok(path) => return downloaded(artifact, path, bytes.len(), RetrievalStage::InSession),
                Err(e) => warn!("Saving in-session payload failed: {e}"),
            },
            Err(e) => debug!("In-session fetch of {url} failed: {e}"),
        }

        match self.external(driver, url, dest_stem).await {
            Ok((path, len)) => return downloaded(artifact, path, len, RetrievalStage::ExternalHttp),
            Err(e) => debug!("External fetch of {url} failed: {e}"),
        }

        match self.render_capture(driver, url).await {
            Ok(bytes) => match persist(dest_stem, &bytes) {
                Ok(path) => return downloaded(artifact, path, bytes.len(), RetrievalStage::RenderCapture),
                Err(e) => warn!("Saving captured render failed: {e}"),
            },
            Err(e) => debug!("Render capture of {url} failed: {e}"),
        }

        let gif = placeholder_gif(self.min_bytes);
        match persist(dest_stem, &gif) {
            Ok(path) => {
                info!("All strategies failed for {url}, wrote placeholder {}", path.display());
                artifact.path = Some(path);
                artifact.bytes = gif.len();
                artifact.state = ArtifactState::Placeholder;
            }
            Err(e) => {
                warn!("Could not write placeholder for {url}: {e}");
                artifact.state = ArtifactState::Failed;
            }
        }
        artifact
    }

    async fn in_session<D: PageDriver>(&self, driver: &D, url: &str) -> ScrapeResult<Vec<u8>> {
        let bytes = driver.fetch_in_session(url).await?;
        self.check_size(&bytes)?;
        Ok(bytes)
    }

    /// Download with reqwest, carrying the browser session's cookies for
    /// the asset host, into a temp file that is moved into place.
    async fn external<D: PageDriver>(&self, driver: &D, url: &str, dest_stem: &Path) -> ScrapeResult<(PathBuf, usize)> {
        let host = host_of(url).ok_or_else(|| ScrapeError::Other(format!("asset URL has no host: {url}")))?;
        let cookie_header = match driver.cookies().await {
            Ok(cookies) => cookies
                .iter()
                .filter(|c| cookie_domain_matches(&c.domain, &host))
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
            Err(e) => {
                debug!("Reading session cookies failed: {e:#}");
                String::new()
            }
        };

        let this = self;
        let cookies = cookie_header.as_str();
        let bytes = retry_with_backoff(self.retry, || async move {
            let mut request = this
                .http
                .get(url)
                .header(USER_AGENT, CHROME_USER_AGENT)
                .header(REFERER, this.referer.as_str());
            if !cookies.is_empty() {
                request = request.header(COOKIE, cookies);
            }

            let response = request.send().await.context("error sending request")?;
            let status = response.status();
            if !status.is_success() {
                return Err(anyhow!("HTTP status {} for {url}", status.as_u16()));
            }
            let body = response.bytes().await.context("Failed to read response body")?;
            this.check_size(&body).map_err(anyhow::Error::new)?;
            Ok(body)
        })
        .await?;

        let target = persist(dest_stem, &bytes)?;
        Ok((target, bytes.len()))
    }

    async fn render_capture<D: PageDriver>(&self, driver: &D, url: &str) -> ScrapeResult<Vec<u8>> {
        let bytes = driver.capture_in_scratch_page(url, self.scratch_timeout).await?;
        self.check_size(&bytes)?;
        Ok(bytes)
    }
}

fn downloaded(mut artifact: AssetArtifact, path: PathBuf, bytes: usize, stage: RetrievalStage) -> AssetArtifact {
    info!("Saved {} ({bytes} bytes) via {stage:?}", path.display());
    artifact.path = Some(path);
    artifact.bytes = bytes;
    artifact.state = ArtifactState::Downloaded(stage);
    artifact
}

/// Extension from the payload's magic bytes; unknown payloads are saved as jpg
fn extension_for(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG") {
        "png"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else if bytes.len() > 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else {
        "jpg"
    }
}

fn with_extension_for(dest_stem: &Path, bytes: &[u8]) -> PathBuf {
    let mut path = dest_stem.as_os_str().to_owned();
    path.push(".");
    path.push(extension_for(bytes));
    PathBuf::from(path)
}

/// Write through a temp file in the destination directory and rename it
/// over the final path.
fn persist(dest_stem: &Path, bytes: &[u8]) -> ScrapeResult<PathBuf> {
    let dir = dest_stem.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.flush()?;
    let target = with_extension_for(dest_stem, bytes);
    staged
        .persist(&target)
        .map_err(|e| ScrapeError::Io(e.error))?;
    Ok(target)
}
