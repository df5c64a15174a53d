//! Integration tests for the direct page-scrape path: unknown extra URLs
//! get scraped and gated, known ones only get their comments re-crawled,
//! and layout mismatches are tolerated.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use forum_monitor::config::Config;
use forum_monitor::db::{get_thread_by_link, Database};
use forum_monitor::monitor::Monitor;
use forum_monitor::notify::Notifier;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

fn discussion_page(stamp: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><body>
  <div id="Item_0" class="PageTitle">
    <h1>Big Storage Deal</h1>
  </div>
  <div class="Item-Header DiscussionHeader">
    <span class="Author"><a class="Username" href="/profile/seller">seller</a></span>
    <span class="MItem Category">in <a href="/categories/offers">Offers</a></span>
    <time datetime="{stamp}">today</time>
  </div>
  <div class="Message userContent"><p>Huge disks, tiny price.</p></div>
</body></html>"#
    )
}

#[tokio::test]
async fn test_unknown_extra_url_is_scraped_gated_and_notified() {
    let (db, _tmp) = setup_db().await;
    let mock_server = MockServer::start().await;

    let stamp = Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string();
    // The scrape itself should happen exactly once across both cycles; the
    // second pass only re-crawls comments.
    Mock::given(method("GET"))
        .and(path("/discussion/55"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(discussion_page(&stamp), "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;
    // Comment pages are never mounted: the crawl ends on page 1.

    let url = format!("{}/discussion/55", mock_server.uri());
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = Monitor::new(
        Config::for_testing(),
        db.clone(),
        test_client(),
        notifier.clone(),
        None,
    );

    monitor.check_extra_url(&url).await.unwrap();

    let thread = get_thread_by_link(db.pool(), &url)
        .await
        .unwrap()
        .expect("thread should be stored");
    assert_eq!(thread.title, "Big Storage Deal");
    assert_eq!(thread.creator, "seller");
    assert_eq!(thread.category, "Offers");
    assert_eq!(thread.description, "Huge disks, tiny price.");
    // The first comment fetch failed, so the crawler backed off to page 0.
    assert_eq!(thread.last_page, 0);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Big Storage Deal"));
    assert!(sent[0].contains("seller"));

    // Second pass: the thread is known, only the comment crawl runs.
    monitor.check_extra_url(&url).await.unwrap();
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_layout_mismatch_yields_no_record() {
    let (db, _tmp) = setup_db().await;
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weird"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><h1>A blog, not a forum</h1></body></html>", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/weird", mock_server.uri());
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = Monitor::new(
        Config::for_testing(),
        db.clone(),
        test_client(),
        notifier.clone(),
        None,
    );

    monitor.check_extra_url(&url).await.unwrap();

    assert!(get_thread_by_link(db.pool(), &url).await.unwrap().is_none());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_page_fetch_failure_is_tolerated() {
    let (db, _tmp) = setup_db().await;
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/gone", mock_server.uri());
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = Monitor::new(
        Config::for_testing(),
        db.clone(),
        test_client(),
        notifier.clone(),
        None,
    );

    monitor.check_extra_url(&url).await.unwrap();

    assert!(get_thread_by_link(db.pool(), &url).await.unwrap().is_none());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_scraped_thread_with_old_date_is_not_notified() {
    let (db, _tmp) = setup_db().await;
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discussion/56"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(discussion_page("2020-01-01T00:00:00+00:00"), "text/html"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/discussion/56", mock_server.uri());
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = Monitor::new(
        Config::for_testing(),
        db.clone(),
        test_client(),
        notifier.clone(),
        None,
    );

    monitor.check_extra_url(&url).await.unwrap();

    assert!(get_thread_by_link(db.pool(), &url).await.unwrap().is_some());
    assert!(notifier.sent().is_empty());
}
