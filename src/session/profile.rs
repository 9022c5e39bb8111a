//! Portal-specific login configuration

use std::time::Duration;

use crate::error::ScrapeResult;
use crate::locator::{Locator, LocatorList};
use crate::utils::constants::{
    DEFAULT_CANDIDATE_TIMEOUT_MS, DEFAULT_PASSCODE_WAIT_SECS, DEFAULT_SETTLE_TIMEOUT_SECS,
};

/// Everything `establish_session` needs to know about one portal.
#[derive(Debug, Clone)]
pub struct SessionProfile {
    pub entry_url: String,
    /// Substring of the URL once inside the authenticated area
    pub authenticated_marker: String,
    /// Where to force-navigate when the repeat-login interstitial will not go away
    pub authenticated_root: String,
    /// Substring of the URL on the repeat-login interstitial
    pub interstitial_marker: String,
    /// Text of the control that dismisses the interstitial
    pub interstitial_phrase: String,

    pub login_control: LocatorList,
    pub username_field: LocatorList,
    pub password_field: LocatorList,
    pub submit_control: LocatorList,
    pub passcode_field: LocatorList,
    pub passcode_confirm: LocatorList,
    /// Present only while signed in
    pub sign_out_control: LocatorList,
    /// Element showing the signed-in account
    pub account_indicator: LocatorList,

    pub candidate_timeout: Duration,
    /// Bound on each interstitial dismissal attempt
    pub interstitial_step_timeout: Duration,
    pub settle_timeout: Duration,
    /// Pause before asking for the passcode, while the portal sends it
    pub passcode_wait: Duration,
}

impl SessionProfile {
    /// The 104 VIP recruiter portal.
    pub fn vip_portal() -> ScrapeResult<Self> {
        Ok(Self {
            entry_url: "https://vip.104.com.tw/".to_string(),
            authenticated_marker: "/index/index".to_string(),
            authenticated_root: "https://vip.104.com.tw/index/index".to_string(),
            interstitial_marker: "repeatLogin".to_string(),
            interstitial_phrase: "將目前帳號登出，立即登入".to_string(),

            login_control: LocatorList::new(
                "login control",
                vec![
                    Locator::exact_text("a", "登入"),
                    Locator::exact_text("button", "登入"),
                    Locator::css(".login-btn"),
                    Locator::css("a[href*=\"login\"]"),
                ],
            )?,
            username_field: LocatorList::from_css(
                "username field",
                &["input[autocomplete=\"username\"]", "input[type=\"text\"]"],
            )?,
            password_field: LocatorList::from_css("password field", &["input[type=\"password\"]"])?,
            submit_control: LocatorList::new(
                "submit control",
                vec![
                    Locator::css("button[type=\"submit\"]"),
                    Locator::exact_text("button", "登入"),
                    Locator::css("input[type=\"submit\"]"),
                ],
            )?,
            passcode_field: LocatorList::from_css(
                "passcode field",
                &[
                    "input[name=\"captcha\"]",
                    "input[placeholder*=\"驗證碼\"]",
                    "input[type=\"text\"]:not([autocomplete=\"username\"])",
                ],
            )?,
            passcode_confirm: LocatorList::new(
                "passcode confirm",
                vec![
                    Locator::css("button[type=\"submit\"]"),
                    Locator::exact_text("button", "確認"),
                    Locator::exact_text("button", "提交"),
                    Locator::css("input[type=\"submit\"]"),
                ],
            )?,
            sign_out_control: LocatorList::new(
                "sign-out control",
                vec![
                    Locator::css("a[href*=\"logout\"]"),
                    Locator::exact_text("a", "登出"),
                    Locator::exact_text("button", "登出"),
                ],
            )?,
            account_indicator: LocatorList::from_css(
                "account indicator",
                &[".user-name", ".member-name", "[data-qa-id=\"userName\"]"],
            )?,

            candidate_timeout: Duration::from_millis(DEFAULT_CANDIDATE_TIMEOUT_MS),
            interstitial_step_timeout: Duration::from_millis(DEFAULT_CANDIDATE_TIMEOUT_MS),
            settle_timeout: Duration::from_secs(DEFAULT_SETTLE_TIMEOUT_SECS),
            passcode_wait: Duration::from_secs(DEFAULT_PASSCODE_WAIT_SECS),
        })
    }

    /// Same profile with every wait set to zero, for driving fakes.
    #[must_use]
    pub fn without_waits(mut self) -> Self {
        self.candidate_timeout = Duration::ZERO;
        self.interstitial_step_timeout = Duration::ZERO;
        self.settle_timeout = Duration::ZERO;
        self.passcode_wait = Duration::ZERO;
        self
    }
}
