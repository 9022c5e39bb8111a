// Listing harvest CLI
//
// Launches Chromium, signs in when the chosen listing needs it, harvests the
// result pages and writes per-page CSV checkpoints into the output directory.
// Passcode challenges are answered on stdin.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use listing_harvest::browser_setup::LaunchOptions;
use listing_harvest::driver::{BrowserSession, CleanupResult};
use listing_harvest::extraction::{ListingKind, LogProgress, Termination};
use listing_harvest::session::{Credentials, PasscodePrompt, PasscodeRequest};
use listing_harvest::{ScrapeConfig, harvest};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Listing {
    Resumes,
    Jobs,
    Companies,
}

impl From<Listing> for ListingKind {
    fn from(listing: Listing) -> Self {
        match listing {
            Listing::Resumes => ListingKind::Resumes,
            Listing::Jobs => ListingKind::Jobs,
            Listing::Companies => ListingKind::Companies,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "listing-harvest", version, about = "Harvest listings from a job portal")]
struct Cli {
    /// Which listing to harvest
    #[arg(value_enum)]
    listing: Listing,

    /// Search keyword; omit for the unfiltered listing
    #[arg(short, long, default_value = "")]
    keyword: String,

    /// Stop after this many pages
    #[arg(short, long)]
    pages: Option<u32>,

    #[arg(short, long, default_value = "harvest_output")]
    output: PathBuf,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Persistent Chrome profile directory
    #[arg(long)]
    chrome_profile: Option<PathBuf>,

    #[arg(long, env = "HARVEST_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "HARVEST_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Do not download profile photos
    #[arg(long)]
    no_photos: bool,

    /// Do not save diagnostic snapshots
    #[arg(long)]
    no_snapshots: bool,
}

impl Cli {
    fn into_config(self) -> Result<ScrapeConfig> {
        let profile = ListingKind::from(self.listing).profile()?;
        let mut builder = ScrapeConfig::builder()
            .output_dir(self.output)
            .profile(profile)
            .keyword(self.keyword)
            .headless(!self.headed)
            .save_photos(!self.no_photos)
            .save_snapshots(!self.no_snapshots);
        if let Some(pages) = self.pages {
            builder = builder.page_limit(pages);
        }
        if let Some(dir) = self.chrome_profile {
            builder = builder.chrome_profile_dir(dir);
        }
        if let (Some(username), Some(password)) = (self.username, self.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }
        Ok(builder.build()?)
    }
}

/// Answer passcode requests from stdin until the prompt is dropped.
async fn answer_from_stdin(mut requests: tokio::sync::mpsc::Receiver<PasscodeRequest>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(request) = requests.recv().await {
        eprint!("{}: ", request.prompt);
        match lines.next_line().await {
            Ok(Some(line)) => {
                request.respond(line);
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Could not read passcode: {e}");
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Cli::parse().into_config()?;
    std::fs::create_dir_all(config.output_dir())
        .with_context(|| format!("Failed to create {}", config.output_dir().display()))?;

    let options = LaunchOptions {
        headless: config.headless(),
        profile_dir: config.chrome_profile_dir().map(PathBuf::from),
        ..LaunchOptions::default()
    };
    let browser = BrowserSession::launch(&options).await?;

    let (prompt, requests) = PasscodePrompt::channel(1);
    let responder = tokio::spawn(answer_from_stdin(requests));

    let outcome = match browser.open_driver().await {
        Ok(driver) => harvest(&driver, &config, prompt, &LogProgress).await.map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };
    responder.abort();

    if let CleanupResult::PartialFailure(problems) = browser.shutdown().await {
        for problem in problems {
            warn!("Browser cleanup: {problem}");
        }
    }

    let report = outcome?;
    match &report.termination {
        Termination::PageFailed(reason) => warn!("Run stopped early: {reason}"),
        Termination::NoItemsFound => info!("No listings matched"),
        other => info!("Run ended: {other:?}"),
    }
    info!(
        "{} records in {} pages, {} photos ({} placeholders)",
        report.records.len(),
        report.pages_completed,
        report.assets.len(),
        report.assets.iter().filter(|a| a.is_placeholder()).count()
    );
    if let Some(last) = report.checkpoints.last() {
        println!("{}", last.display());
    }
    Ok(())
}
