//! Shared configuration constants for listing harvests
//!
//! Default bounds and thresholds used across the session, pagination and
//! asset subsystems. Per-run overrides live in `ScrapeConfig`.

/// Per-candidate wait when resolving a locator list: 5 seconds
///
/// Applies to interactive controls (login button, interstitial dismissal,
/// passcode field). Optional card fields resolve with a zero wait.
pub const DEFAULT_CANDIDATE_TIMEOUT_MS: u64 = 5_000;

/// Settle bound after dismissing the repeat-login interstitial: 8 seconds
pub const DEFAULT_SETTLE_TIMEOUT_SECS: u64 = 8;

/// Fixed wait before asking for a one-time passcode: 10 seconds
///
/// The portal sends the passcode out of band; asking immediately tends to
/// race the delivery.
pub const DEFAULT_PASSCODE_WAIT_SECS: u64 = 10;

/// Network quiescence bound after activating a pagination control: 30 seconds
pub const DEFAULT_NETWORK_IDLE_TIMEOUT_SECS: u64 = 30;

/// Minimum delay after network quiescence before re-reading cards: 3 seconds
///
/// List items are rendered client-side after the XHR settles.
pub const DEFAULT_PAGE_SETTLE_MS: u64 = 3_000;

/// Navigation bound for the scratch page used to capture assets: 30 seconds
pub const DEFAULT_SCRATCH_NAVIGATION_SECS: u64 = 30;

/// Payloads at or below this size are treated as failed downloads
///
/// Broken-image responses and tracking pixels from the portal are all under
/// 100 bytes, real head shots are several kilobytes.
pub const MIN_ASSET_BYTES: usize = 100;

/// Maximum characters kept per extracted field
///
/// Matches the spreadsheet cell limit consumers import checkpoints into.
pub const MAX_FIELD_CHARS: usize = 32_000;

/// Retries for idempotent network calls (the external asset fetch)
pub const MAX_NETWORK_RETRIES: u32 = 1;

/// Chrome user agent string for stealth mode
///
/// Also sent by the external asset client so the portal sees one browser.
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
