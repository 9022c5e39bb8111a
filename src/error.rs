//! Error types for listing harvests
//!
//! Most failures in a harvest are recovered where they happen (a missing
//! field becomes `None`, a failed pagination strategy falls through to the
//! next one). The variants here are what crosses module boundaries, and only
//! `Authentication` and `SessionInit` ever abort a run.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for harvest operations
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Login or passcode rejected, or the login flow broke part way.
///
/// Carried as its own type so `establish_session` can return it without
/// the rest of the taxonomy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("login failed: {reason}")]
pub struct LoginFailure {
    pub reason: String,
    /// The entry page never loaded, so no login was attempted
    pub entry_unreachable: bool,
}

impl LoginFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            entry_unreachable: false,
        }
    }

    pub fn entry_unreachable(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            entry_unreachable: true,
        }
    }
}

/// Error types for harvest operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No candidate locator matched a required element
    #[error("no candidate matched for {what}")]
    StructuralMismatch { what: String },

    /// Timed out waiting for navigation, quiescence or an element
    #[error("{operation} timed out after {elapsed:?}")]
    TransientNavigation {
        operation: String,
        elapsed: Duration,
    },

    /// Credentials or passcode rejected
    #[error(transparent)]
    Authentication(LoginFailure),

    /// Browser could not be launched or the entry page never loaded
    #[error("session initialization failed: {0}")]
    SessionInit(String),

    /// Downloaded payload too small to be the real asset
    #[error("asset payload of {bytes} bytes is below the {threshold} byte threshold")]
    AssetIntegrity { bytes: usize, threshold: usize },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Checkpoint could not be written
    #[error("failed to write checkpoint {path}: {message}")]
    Checkpoint { path: PathBuf, message: String },

    /// Passcode responder went away before answering
    #[error("passcode prompt closed without a response")]
    PromptClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<LoginFailure> for ScrapeError {
    fn from(failure: LoginFailure) -> Self {
        if failure.entry_unreachable {
            ScrapeError::SessionInit(failure.reason)
        } else {
            ScrapeError::Authentication(failure)
        }
    }
}

impl From<anyhow::Error> for ScrapeError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<ScrapeError>() {
            Ok(error) => error,
            Err(error) => ScrapeError::Other(format!("{error:#}")),
        }
    }
}

impl From<csv::Error> for ScrapeError {
    fn from(error: csv::Error) -> Self {
        ScrapeError::Other(format!("CSV error: {error}"))
    }
}

impl ScrapeError {
    pub fn structural(what: impl Into<String>) -> Self {
        ScrapeError::StructuralMismatch { what: what.into() }
    }

    pub fn timeout(operation: impl Into<String>, elapsed: Duration) -> Self {
        ScrapeError::TransientNavigation {
            operation: operation.into(),
            elapsed,
        }
    }

    /// Whether this error ends the whole run rather than one strategy,
    /// record or page.
    #[must_use]
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, ScrapeError::Authentication(_) | ScrapeError::SessionInit(_))
    }

    /// Check if error is transient and the operation may be retried
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::TransientNavigation { .. } | ScrapeError::Io(_) => true,
            ScrapeError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}
