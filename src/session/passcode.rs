//! One-time passcode request/response boundary
//!
//! The login flow suspends on [`PasscodePrompt::request`] until whoever
//! holds the receiving end answers. The CLI answers from stdin; tests answer
//! from a spawned task.

use tokio::sync::{mpsc, oneshot};

use crate::error::{ScrapeError, ScrapeResult};

/// A pending passcode question
#[derive(Debug)]
pub struct PasscodeRequest {
    pub prompt: String,
    reply: oneshot::Sender<String>,
}

impl PasscodeRequest {
    /// Answer the request. Returns `false` if the login flow stopped waiting.
    pub fn respond(self, passcode: impl Into<String>) -> bool {
        self.reply.send(passcode.into()).is_ok()
    }
}

/// Requesting side of the passcode boundary.
#[derive(Debug, Clone)]
pub struct PasscodePrompt {
    tx: mpsc::Sender<PasscodeRequest>,
}

impl PasscodePrompt {
    /// Create a prompt and the receiver its requests arrive on.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<PasscodeRequest>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    /// Ask for a passcode and wait for the answer.
    ///
    /// # Errors
    /// `ScrapeError::PromptClosed` if the receiver or the request is dropped
    /// without an answer.
    pub async fn request(&self, prompt: impl Into<String>) -> ScrapeResult<String> {
        let (reply, answer) = oneshot::channel();
        self.tx
            .send(PasscodeRequest {
                prompt: prompt.into(),
                reply,
            })
            .await
            .map_err(|_| ScrapeError::PromptClosed)?;
        let passcode = answer.await.map_err(|_| ScrapeError::PromptClosed)?;
        Ok(passcode.trim().to_string())
    }
}
