//! End-to-end page loop runs against the in-memory driver

use assert_fs::TempDir;
use listing_harvest::assets::{ArtifactState, AssetRetriever, RetrievalStage};
use listing_harvest::config::ScrapeConfig;
use listing_harvest::diagnostics::NoOpSnapshots;
use listing_harvest::extraction::{ListingProfile, NoOpProgress, Orchestrator, RunReport, Termination};
use listing_harvest::record::fields;
use listing_harvest::session::{PasscodePrompt, SessionController, SessionProfile};
use listing_harvest::utils::{fill_keyword_template, next_page_url};

mod common;
use common::{FakeDriver, FakeNode, FakePage, photo_bytes};

const JOB_SEARCH: &str = "https://www.104.com.tw/jobs/search/?keyword={keyword}";

fn jobs_url(keyword: &str) -> String {
    fill_keyword_template(JOB_SEARCH, keyword)
}

/// Adds a job card; `href` is the job link, relative to the portal origin.
fn job_card(page: &mut FakePage, title: Option<&str>, href: &str, tags: &[&str]) {
    let card = page.add(FakeNode::new(&[".job-list-item"]).text(title.unwrap_or("(untitled)")));
    if let Some(title) = title {
        page.add(
            FakeNode::new(&[".info-job__text", "a.info-job__text"])
                .text(title)
                .attr("href", href)
                .inside(card),
        );
    }
    page.add(FakeNode::new(&[".info-company__text"]).text("某某科技股份有限公司").inside(card));
    for tag in tags {
        page.add(FakeNode::new(&[".info-tags__text"]).text(tag).inside(card));
    }
}

fn jobs_config(dir: &TempDir, keyword: &str, pages: Option<u32>) -> ScrapeConfig {
    let builder = ScrapeConfig::builder()
        .output_dir(dir.path())
        .profile(ListingProfile::jobs().unwrap().without_waits())
        .keyword(keyword)
        .save_snapshots(false);
    match pages {
        Some(pages) => builder.page_limit(pages),
        None => builder.unlimited_pages(),
    }
    .build()
    .unwrap()
}

async fn run(driver: &FakeDriver, config: &ScrapeConfig) -> RunReport {
    let retriever = AssetRetriever::new("https://www.104.com.tw/").unwrap();
    Orchestrator::new(driver, config, &retriever, &NoOpProgress, &NoOpSnapshots)
        .run()
        .await
}

fn csv_files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".csv"))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn single_page_limit_writes_one_checkpoint() {
    let dir = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    let mut page = FakePage::new();
    job_card(&mut page, Some("後端工程師"), "/job/a1", &["台北市信義區", "3年以上", "大學", "月薪45,000~60,000元"]);
    job_card(&mut page, Some("資料工程師"), "/job/a2", &["新北市板橋區", "經歷不拘"]);
    page.add(FakeNode::new(&["a.page-next"]).text("下一頁").navigates_to("https://www.104.com.tw/next"));
    driver.add_page(&jobs_url("工程師"), page);

    let config = jobs_config(&dir, "工程師", Some(1));
    let report = run(&driver, &config).await;

    assert_eq!(report.termination, Termination::PageLimitReached);
    assert_eq!(report.pages_completed, 1);
    assert_eq!(csv_files(&dir), vec!["checkpoint_page1.csv".to_string()]);
    assert_eq!(driver.visits(), vec![jobs_url("工程師")]);
    assert!(driver.clicks().is_empty());

    assert_eq!(report.records.len(), 2);
    assert!(report.records.iter().all(|r| r.page_number() == Some(1)));

    let first = &report.records[0];
    assert_eq!(first.get(fields::TITLE), Some("後端工程師"));
    assert_eq!(first.get(fields::LOCATION), Some("台北市信義區"));
    assert_eq!(first.get(fields::EXPERIENCE), Some("3年以上"));
    assert_eq!(first.get(fields::EDUCATION), Some("大學"));
    assert_eq!(first.get(fields::SALARY), Some("月薪45,000~60,000元"));
    assert_eq!(first.get(fields::JOB_URL), Some("https://www.104.com.tw/job/a1"));
    assert_eq!(report.records[1].get(fields::SALARY), None);
}

#[tokio::test]
async fn checkpoint_columns_follow_the_profile_schema() {
    let dir = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    let mut page = FakePage::new();
    job_card(&mut page, Some("後端工程師"), "/job/a1", &[]);
    driver.add_page(&jobs_url("rust"), page);

    let config = jobs_config(&dir, "rust", Some(1));
    let report = run(&driver, &config).await;

    let bytes = std::fs::read(&report.checkpoints[0]).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let header = text.trim_start_matches('\u{feff}').lines().next().unwrap();
    assert_eq!(header, config.profile().schema.join(","));
}

#[tokio::test]
async fn untitled_and_duplicate_cards_are_skipped() {
    let dir = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    let mut page = FakePage::new();
    job_card(&mut page, Some("後端工程師"), "/job/a1", &[]);
    job_card(&mut page, None, "/job/a2", &[]);
    job_card(&mut page, Some("後端工程師(急徵)"), "/job/a1", &[]);
    job_card(&mut page, Some("測試工程師"), "/job/a3", &[]);
    driver.add_page(&jobs_url(""), page);

    let config = jobs_config(&dir, "", Some(1));
    let report = run(&driver, &config).await;

    let titles: Vec<_> = report.records.iter().filter_map(|r| r.get(fields::TITLE)).collect();
    assert_eq!(titles, vec!["後端工程師", "測試工程師"]);
}

#[tokio::test]
async fn empty_first_page_is_no_items_found() {
    let dir = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    driver.add_page(
        &jobs_url("不存在的職缺"),
        FakePage::new().with(FakeNode::new(&[".no-result"]).text("查無符合條件的職缺")),
    );

    let config = jobs_config(&dir, "不存在的職缺", None);
    let report = run(&driver, &config).await;

    assert_eq!(report.termination, Termination::NoItemsFound);
    assert_eq!(report.pages_completed, 0);
    assert!(report.records.is_empty());
    assert!(csv_files(&dir).is_empty());
}

#[tokio::test]
async fn pages_run_until_pagination_is_exhausted() {
    let dir = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    let first_url = jobs_url("rust");
    let second_url = next_page_url(&first_url, "page", 1).unwrap();

    let mut first = FakePage::new();
    job_card(&mut first, Some("Rust 工程師"), "/job/r1", &[]);
    job_card(&mut first, Some("系統工程師"), "/job/r2", &[]);
    driver.add_page(&first_url, first);
    let mut second = FakePage::new();
    job_card(&mut second, Some("韌體工程師"), "/job/r3", &[]);
    driver.add_page(&second_url, second);

    let config = jobs_config(&dir, "rust", None);
    let report = run(&driver, &config).await;

    assert_eq!(report.termination, Termination::NoMoreResults);
    assert_eq!(report.pages_completed, 2);
    assert_eq!(
        csv_files(&dir),
        vec!["checkpoint_page1.csv".to_string(), "checkpoint_page2.csv".to_string()]
    );
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.records[2].page_number(), Some(2));

    let mut reader = csv::Reader::from_path(dir.path().join("checkpoint_page2.csv")).unwrap();
    assert_eq!(reader.records().count(), 3);
}

#[tokio::test]
async fn unreachable_search_is_a_page_failure() {
    let dir = TempDir::new().unwrap();
    let driver = FakeDriver::new();

    let config = jobs_config(&dir, "rust", None);
    let report = run(&driver, &config).await;

    assert!(matches!(report.termination, Termination::PageFailed(_)));
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn resume_harvest_reuses_session_and_saves_photos() {
    let dir = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    let results = "https://vip.104.com.tw/search/result";
    let photo = "https://pic.104.com.tw/webHeadShot/123.jpg";

    driver.add_page(
        "https://vip.104.com.tw/",
        FakePage::new()
            .with(FakeNode::new(&["a[href*=\"logout\"]"]).text("登出"))
            .with(FakeNode::new(&["input[data-qa-id=\"inputKeywordSearch\"]"]).navigates_to(results)),
    );
    let mut page = FakePage::new();
    let card = page.card(".resume-card", &[(".name", "王小明")]);
    page.add(
        FakeNode::new(&["img[src*=\"webHeadShot\"]"])
            .attr("src", "//pic.104.com.tw/webHeadShot/123.jpg")
            .inside(card),
    );
    driver.add_page(results, page);
    driver.serve_in_session(photo, photo_bytes());

    let config = ScrapeConfig::builder()
        .output_dir(dir.path())
        .profile(ListingProfile::resumes().unwrap().without_waits())
        .keyword("工程師")
        .page_limit(1)
        .save_snapshots(false)
        .build()
        .unwrap();
    let (prompt, _requests) = PasscodePrompt::channel(1);
    let mut session = SessionController::new(SessionProfile::vip_portal().unwrap().without_waits(), prompt);
    let retriever = AssetRetriever::new("https://vip.104.com.tw/").unwrap();

    let report = Orchestrator::new(&driver, &config, &retriever, &NoOpProgress, &NoOpSnapshots)
        .harvest(&mut session)
        .await
        .unwrap();

    assert_eq!(driver.fills(), vec![(
        "input[data-qa-id=\"inputKeywordSearch\"]".to_string(),
        "工程師".to_string()
    )]);
    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.get(fields::NAME), Some("王小明"));
    assert_eq!(record.get(fields::PHOTO_URL), Some(photo));

    let expected = config.photo_dir().join("王小明_p1_0.png");
    assert_eq!(record.get(fields::PHOTO_PATH), Some(&*expected.to_string_lossy()));
    assert!(expected.is_file());
    assert_eq!(report.assets[0].state, ArtifactState::Downloaded(RetrievalStage::InSession));
}

#[tokio::test]
async fn resume_harvest_without_session_or_credentials_is_refused() {
    let dir = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    driver.add_page("https://vip.104.com.tw/", FakePage::new().with(FakeNode::new(&["a"]).text("登入")));

    let config = ScrapeConfig::builder()
        .output_dir(dir.path())
        .profile(ListingProfile::resumes().unwrap().without_waits())
        .build()
        .unwrap();
    let (prompt, _requests) = PasscodePrompt::channel(1);
    let mut session = SessionController::new(SessionProfile::vip_portal().unwrap().without_waits(), prompt);
    let retriever = AssetRetriever::new("https://vip.104.com.tw/").unwrap();

    let err = Orchestrator::new(&driver, &config, &retriever, &NoOpProgress, &NoOpSnapshots)
        .harvest(&mut session)
        .await
        .unwrap_err();
    assert!(err.is_run_fatal());
}

#[tokio::test]
async fn repeated_candidate_is_kept_once() {
    let dir = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    let search = "https://vip.104.com.tw/";
    let results = "https://vip.104.com.tw/search/result";

    driver.add_page(
        search,
        FakePage::new().with(FakeNode::new(&["input[data-qa-id=\"inputKeywordSearch\"]"]).navigates_to(results)),
    );
    let mut page = FakePage::new();
    page.card(".resume-card", &[(".name", "王小明"), (".info", "男 28歲 代碼：A12345")]);
    page.card(".resume-card", &[(".name", "王小明"), (".info", "男 28歲 代碼：A12345")]);
    page.card(".resume-card", &[(".name", "王小明"), (".info", "男 35歲 代碼：B67890")]);
    driver.add_page(results, page);
    driver.open(search);

    let config = ScrapeConfig::builder()
        .output_dir(dir.path())
        .profile(ListingProfile::resumes().unwrap().without_waits())
        .keyword("工程師")
        .page_limit(1)
        .save_snapshots(false)
        .build()
        .unwrap();
    let report = run(&driver, &config).await;

    let codes: Vec<_> = report.records.iter().filter_map(|r| r.get(fields::CODE)).collect();
    assert_eq!(codes, vec!["A12345", "B67890"]);
}
