//! Asset retrieval fallbacks, down to the placeholder

use assert_fs::TempDir;
use assert_fs::prelude::*;
use listing_harvest::assets::{ArtifactState, AssetRetriever, RetrievalStage};
use listing_harvest::retry::RetryPolicy;
use std::time::Duration;

mod common;
use common::{FakeDriver, TINY_PNG, photo_bytes};

const REFERER: &str = "https://vip.104.com.tw/";

fn retriever() -> AssetRetriever {
    AssetRetriever::new(REFERER)
        .unwrap()
        .with_retry_policy(RetryPolicy {
            max_retries: 1,
            base_delay: Duration::ZERO,
        })
}

#[tokio::test]
async fn in_session_fetch_is_tried_first() {
    let dir = TempDir::new().unwrap();
    let url = "https://pic.104.com.tw/webHeadShot/a.png";
    let driver = FakeDriver::new();
    driver.serve_in_session(url, photo_bytes());

    let artifact = retriever()
        .retrieve(&driver, url, &dir.path().join("王小明_p1_0"))
        .await;

    assert_eq!(artifact.state, ArtifactState::Downloaded(RetrievalStage::InSession));
    assert_eq!(artifact.bytes, 2048);
    assert!(dir.child("王小明_p1_0.png").path().is_file());
}

#[tokio::test]
async fn undersized_in_session_payload_falls_back_to_http_with_cookies() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/webHeadShot/b.jpg")
        .match_header("cookie", "sid=abc")
        .match_header("referer", REFERER)
        .with_status(200)
        .with_body(vec![0xFF; 512])
        .create_async()
        .await;
    let url = format!("{}/webHeadShot/b.jpg", server.url());

    let driver = FakeDriver::new();
    driver.serve_in_session(&url, TINY_PNG.to_vec());
    driver.add_cookie("sid", "abc", "127.0.0.1");
    driver.add_cookie("other", "zzz", ".example.org");

    let artifact = retriever().retrieve(&driver, &url, &dir.path().join("b")).await;

    mock.assert_async().await;
    assert_eq!(artifact.state, ArtifactState::Downloaded(RetrievalStage::ExternalHttp));
    assert_eq!(artifact.path, Some(dir.path().join("b.jpg")));
}

#[tokio::test]
async fn client_errors_fall_through_to_render_capture() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/c.jpg")
        .with_status(403)
        .expect(1)
        .create_async()
        .await;
    let url = format!("{}/c.jpg", server.url());

    let driver = FakeDriver::new();
    driver.serve_render(&url, photo_bytes());

    let artifact = retriever().retrieve(&driver, &url, &dir.path().join("c")).await;

    mock.assert_async().await;
    assert_eq!(artifact.state, ArtifactState::Downloaded(RetrievalStage::RenderCapture));
}

#[tokio::test]
async fn server_errors_are_retried_once() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/d.jpg")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;
    let url = format!("{}/d.jpg", server.url());

    let artifact = retriever()
        .retrieve(&FakeDriver::new(), &url, &dir.path().join("d"))
        .await;

    mock.assert_async().await;
    assert!(artifact.is_placeholder());
}

#[tokio::test]
async fn exhausted_strategies_write_a_placeholder_over_the_threshold() {
    let dir = TempDir::new().unwrap();
    let driver = FakeDriver::new();
    let url = "http://127.0.0.1:9/unreachable.jpg";
    driver.serve_render(url, TINY_PNG.to_vec());

    let retriever = retriever().with_min_bytes(300);
    let artifact = retriever
        .retrieve(&driver, url, &dir.path().join("photos").join("e"))
        .await;

    assert_eq!(artifact.state, ArtifactState::Placeholder);
    let path = artifact.path.clone().unwrap();
    assert_eq!(path, dir.path().join("photos").join("e.gif"));
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.len() > 300);
    assert!(bytes.starts_with(b"GIF89a"));
    assert_eq!(artifact.bytes, bytes.len());
}
