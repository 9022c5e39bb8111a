//! Login flow
//!
//! Establishes an authenticated portal session, reusing an existing one when
//! the browser profile is already signed in.

use std::time::Duration;
use tracing::{debug, info, warn};

use super::passcode::PasscodePrompt;
use super::profile::SessionProfile;
use crate::diagnostics::SnapshotSink;
use crate::driver::{PageDriver, with_timeout};
use crate::error::{LoginFailure, ScrapeError, ScrapeResult};
use crate::locator::{Locator, LocatorList, resolve_first};

/// Portal account credentials
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session attributes carried through a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub authenticated: bool,
    pub last_checked_url: Option<String>,
}

/// How the session was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authenticated {
    /// The browser profile was already signed in
    ExistingSession,
    /// Credentials were accepted without a passcode
    Credentials,
    /// Credentials plus a one-time passcode
    Passcode,
}

pub struct SessionController {
    profile: SessionProfile,
    prompt: PasscodePrompt,
    state: SessionState,
}

impl SessionController {
    pub fn new(profile: SessionProfile, prompt: PasscodePrompt) -> Self {
        Self {
            profile,
            prompt,
            state: SessionState::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    /// Whether the current page belongs to a signed-in session.
    ///
    /// Only reads the page: the URL, then a single query each for the
    /// sign-out control and the account indicator.
    pub async fn is_logged_in<D: PageDriver>(&self, driver: &D) -> bool {
        if let Ok(url) = driver.current_url().await
            && url.contains(&self.profile.authenticated_marker)
        {
            return true;
        }
        if resolve_first(driver, None, &self.profile.sign_out_control, Duration::ZERO)
            .await
            .is_found()
        {
            return true;
        }
        resolve_first(driver, None, &self.profile.account_indicator, Duration::ZERO)
            .await
            .is_found()
    }

    async fn check<D: PageDriver>(&mut self, driver: &D) -> bool {
        let logged_in = self.is_logged_in(driver).await;
        self.state.authenticated = logged_in;
        self.state.last_checked_url = driver.current_url().await.ok();
        logged_in
    }

    /// Sign in, or confirm an existing sign-in.
    ///
    /// Returns without touching the credential fields when the entry page is
    /// already authenticated. Failures past the fast path leave a `login_error`
    /// snapshot behind.
    pub async fn establish_session<D: PageDriver, S: SnapshotSink>(
        &mut self,
        driver: &D,
        credentials: &Credentials,
        snapshots: &S,
    ) -> Result<Authenticated, LoginFailure> {
        info!("Opening {}", self.profile.entry_url);
        driver
            .goto(&self.profile.entry_url)
            .await
            .map_err(|e| LoginFailure::entry_unreachable(format!("entry page unreachable: {e:#}")))?;

        if self.check(driver).await {
            info!("Existing session detected, skipping credential entry");
            return Ok(Authenticated::ExistingSession);
        }

        match self.sign_in(driver, credentials).await {
            Ok(how) => {
                self.state.authenticated = true;
                Ok(how)
            }
            Err(e) => {
                warn!("Login failed: {e}");
                self.state.authenticated = false;
                snapshots.capture(driver, "login_error").await;
                Err(match e {
                    ScrapeError::Authentication(failure) => failure,
                    other => LoginFailure::new(other.to_string()),
                })
            }
        }
    }

    async fn sign_in<D: PageDriver>(
        &mut self,
        driver: &D,
        credentials: &Credentials,
    ) -> ScrapeResult<Authenticated> {
        let url = driver.current_url().await?;
        if url.contains(&self.profile.interstitial_marker) {
            self.clear_interstitial(driver).await?;
            if self.check(driver).await {
                info!("Session resumed after repeat-login interstitial");
                return Ok(Authenticated::ExistingSession);
            }
        }

        self.submit_credentials(driver, credentials).await?;

        if self.check(driver).await {
            info!("Signed in without passcode");
            return Ok(Authenticated::Credentials);
        }

        self.submit_passcode(driver).await?;

        if self.check(driver).await {
            info!("Signed in after passcode verification");
            Ok(Authenticated::Passcode)
        } else {
            Err(LoginFailure::new("passcode rejected or session not established").into())
        }
    }

    /// Dismiss the repeat-login interstitial, escalating from a strict text
    /// match to a loose one to a scripted scan of the whole DOM.
    async fn clear_interstitial<D: PageDriver>(&self, driver: &D) -> ScrapeResult<()> {
        info!("Repeat-login interstitial detected");
        let phrase = &self.profile.interstitial_phrase;
        let step = self.profile.interstitial_step_timeout;

        let strict = LocatorList::new(
            "interstitial control (exact)",
            vec![Locator::exact_text("button", phrase.as_str())],
        )?;
        let loose = LocatorList::new(
            "interstitial control (substring)",
            vec![Locator::containing_text("button, a, [role=\"button\"]", phrase.as_str())],
        )?;

        let mut dismissed = false;
        for list in [&strict, &loose] {
            let attempt = with_timeout(
                async {
                    let Some(control) = resolve_first(driver, None, list, step).await.into_first() else {
                        return Ok(false);
                    };
                    driver.click(&control).await?;
                    Ok::<_, anyhow::Error>(true)
                },
                step,
                list.label(),
            )
            .await;
            match attempt {
                Ok(true) => {
                    dismissed = true;
                    break;
                }
                Ok(false) => debug!("{} not found", list.label()),
                Err(e) => debug!("{} failed: {e:#}", list.label()),
            }
        }

        if !dismissed {
            match with_timeout(driver.click_first_containing_text(phrase), step, "interstitial scan").await {
                Ok(true) => debug!("Interstitial dismissed by DOM scan"),
                Ok(false) => debug!("DOM scan found no interstitial control"),
                Err(e) => debug!("Interstitial scan failed: {e:#}"),
            }
        }

        self.settle(driver).await;

        if driver.current_url().await?.contains(&self.profile.interstitial_marker) {
            warn!("Interstitial still present, navigating to {}", self.profile.authenticated_root);
            driver.goto(&self.profile.authenticated_root).await?;
            self.settle(driver).await;
        }
        Ok(())
    }

    async fn submit_credentials<D: PageDriver>(
        &self,
        driver: &D,
        credentials: &Credentials,
    ) -> ScrapeResult<()> {
        let timeout = self.profile.candidate_timeout;

        match resolve_first(driver, None, &self.profile.login_control, timeout)
            .await
            .into_first()
        {
            Some(control) => {
                driver.click(&control).await?;
                self.settle(driver).await;
            }
            None => debug!("No login control, assuming the form is already shown"),
        }

        let username = resolve_first(driver, None, &self.profile.username_field, timeout)
            .await
            .required(self.profile.username_field.label())?;
        driver.fill(&username, &credentials.username).await?;

        let password = resolve_first(driver, None, &self.profile.password_field, timeout)
            .await
            .required(self.profile.password_field.label())?;
        driver.fill(&password, &credentials.password).await?;

        let submit = resolve_first(driver, None, &self.profile.submit_control, timeout)
            .await
            .required(self.profile.submit_control.label())?;
        driver.click(&submit).await?;
        info!("Credentials submitted");

        self.settle(driver).await;
        Ok(())
    }

    async fn submit_passcode<D: PageDriver>(&self, driver: &D) -> ScrapeResult<()> {
        info!(
            "Passcode challenge, waiting {:?} for delivery",
            self.profile.passcode_wait
        );
        tokio::time::sleep(self.profile.passcode_wait).await;

        let passcode = self
            .prompt
            .request("請輸入您收到的郵箱驗證碼")
            .await
            .map_err(|e| LoginFailure::new(e.to_string()))?;
        if passcode.is_empty() {
            return Err(LoginFailure::new("empty passcode").into());
        }

        let timeout = self.profile.candidate_timeout;
        let field = resolve_first(driver, None, &self.profile.passcode_field, timeout)
            .await
            .required(self.profile.passcode_field.label())?;
        driver.fill(&field, &passcode).await?;

        let confirm = resolve_first(driver, None, &self.profile.passcode_confirm, timeout)
            .await
            .required(self.profile.passcode_confirm.label())?;
        driver.click(&confirm).await?;
        info!("Passcode submitted");

        self.settle(driver).await;
        Ok(())
    }

    async fn settle<D: PageDriver>(&self, driver: &D) {
        if let Err(e) = driver.wait_for_network_idle(self.profile.settle_timeout).await {
            debug!("Settle wait ended early: {e:#}");
        }
    }
}
