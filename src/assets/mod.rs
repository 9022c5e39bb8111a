//! Binary asset retrieval behind an authenticated session
//!
//! Profile photos are served from hosts that check cookies and referrer, and
//! some are only reachable while the page that linked them is open. The
//! [`AssetRetriever`] tries progressively heavier strategies and, when all
//! of them fail, writes a placeholder so every record still points at a file.

pub mod placeholder;
pub mod retriever;

use std::path::PathBuf;

pub use placeholder::placeholder_gif;
pub use retriever::AssetRetriever;

/// Which strategy produced a downloaded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    /// `fetch()` from inside the listing page
    InSession,
    /// reqwest with the session's cookies
    ExternalHttp,
    /// Screenshot of the asset opened in a scratch page
    RenderCapture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Pending,
    Downloaded(RetrievalStage),
    /// Every strategy failed; the file is a synthesized placeholder
    Placeholder,
    /// Not even the placeholder could be written
    Failed,
}

/// A retrieved (or substituted) asset on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetArtifact {
    pub source_url: String,
    pub path: Option<PathBuf>,
    pub bytes: usize,
    pub state: ArtifactState,
}

impl AssetArtifact {
    pub fn pending(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            path: None,
            bytes: 0,
            state: ArtifactState::Pending,
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.state == ArtifactState::Placeholder
    }

    /// Saved path as a string for the record's `photo_path` column
    #[must_use]
    pub fn path_string(&self) -> Option<String> {
        self.path.as_ref().map(|p| p.to_string_lossy().into_owned())
    }
}
