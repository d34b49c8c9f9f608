//! Integration tests for browsing and search using wiremock
//!
//! These tests cover the dual result modes, page-move validation, the
//! channel-filter page reset, history recording, and discarding of
//! out-of-order responses.

mod common;

use capstan::browse::BrowseMode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test browsing fetches pages and navigation moves between them
#[tokio::test]
async fn test_browse_then_navigate() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "20"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::browse_body(1, 3, 50, &["First"])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::browse_body(2, 3, 50, &["Second"])),
        )
        .mount(&mock_server)
        .await;

    let console = common::test_console(&mock_server.uri(), &dir);

    let state = console.browser.execute(None).await.unwrap();
    assert_eq!(state.mode, BrowseMode::Browse);
    assert_eq!(state.page, 1);
    assert_eq!(state.total_pages, 3);
    assert_eq!(state.total, 50);
    assert_eq!(state.resources[0].title, "First");

    let state = console.browser.change_page(1).await.unwrap();
    assert_eq!(state.page, 2);
    assert_eq!(state.resources[0].title, "Second");
}

/// Test page moves outside the valid range issue no request
#[tokio::test]
async fn test_out_of_range_move_is_a_no_op() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::browse_body(1, 1, 4, &["Only"])),
        )
        .expect(1) // The two rejected moves below must not fetch
        .mount(&mock_server)
        .await;

    let console = common::test_console(&mock_server.uri(), &dir);
    console.browser.execute(None).await.unwrap();

    let state = console.browser.change_page(1).await.unwrap();
    assert_eq!(state.page, 1);

    let state = console.browser.change_page(-1).await.unwrap();
    assert_eq!(state.page, 1);
    assert_eq!(state.resources[0].title, "Only");
}

/// Test searching is a single page, records history, and disables paging
#[tokio::test]
async fn test_search_single_page_and_history() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "matrix"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::search_body(&["The Matrix", "Matrix Reloaded"])),
        )
        .expect(1) // Page moves in search mode must not refetch
        .mount(&mock_server)
        .await;

    let console = common::test_console(&mock_server.uri(), &dir);

    let state = console.browser.execute(Some("matrix")).await.unwrap();
    assert_eq!(state.mode, BrowseMode::Search);
    assert_eq!(state.query, "matrix");
    assert_eq!(state.total, 2);
    assert_eq!(state.total_pages, 1);

    assert_eq!(console.history.entries().await, vec!["matrix".to_string()]);

    let state = console.browser.change_page(1).await.unwrap();
    assert_eq!(state.mode, BrowseMode::Search);
    assert_eq!(state.resources.len(), 2);
}

/// Test a whitespace-only query falls back to browse mode without history
#[tokio::test]
async fn test_whitespace_query_browses() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::browse_body(1, 1, 0, &[])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let console = common::test_console(&mock_server.uri(), &dir);
    let state = console.browser.execute(Some("   ")).await.unwrap();

    assert_eq!(state.mode, BrowseMode::Browse);
    assert!(console.history.is_empty().await);
}

/// Test changing the channel filter resets to page 1 before fetching
#[tokio::test]
async fn test_channel_change_resets_page() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .and(query_param("channel", "movies"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::browse_body(1, 2, 30, &["Filtered"])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::browse_body(1, 5, 90, &["Any"])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::browse_body(3, 5, 90, &["Deep"])),
        )
        .mount(&mock_server)
        .await;

    let console = common::test_console(&mock_server.uri(), &dir);

    console.browser.execute(None).await.unwrap();
    let state = console.browser.change_page(2).await.unwrap();
    assert_eq!(state.page, 3);

    // Page 3 may not exist in the filtered set, so the filter change
    // must land on page 1
    let state = console
        .browser
        .set_channel(Some("movies".to_string()))
        .await
        .unwrap();
    assert_eq!(state.page, 1);
    assert_eq!(state.channel.as_deref(), Some("movies"));
    assert_eq!(state.resources[0].title, "Filtered");
}

/// Test a slow superseded response cannot overwrite a newer result
#[tokio::test]
async fn test_stale_response_discarded() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::search_body(&["Slow Result"]))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::search_body(&["Fast Result"])))
        .mount(&mock_server)
        .await;

    let console = Arc::new(common::test_console(&mock_server.uri(), &dir));

    let slow = {
        let console = Arc::clone(&console);
        tokio::spawn(async move { console.browser.execute(Some("slow")).await })
    };

    // The second request overtakes the first while it is still in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    let state = console.browser.execute(Some("fast")).await.unwrap();
    assert_eq!(state.resources[0].title, "Fast Result");

    // The slow response lands afterwards and must change nothing
    let stale = slow.await.unwrap().unwrap();
    assert_eq!(stale.resources[0].title, "Fast Result");

    let current = console.browser.current().await;
    assert_eq!(current.query, "fast");
    assert_eq!(current.resources[0].title, "Fast Result");

    // Both submissions were recorded, newest first
    assert_eq!(
        console.history.entries().await,
        vec!["fast".to_string(), "slow".to_string()]
    );
}

/// Test a failed fetch propagates the server text and keeps prior state
#[tokio::test]
async fn test_failed_fetch_keeps_state() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::browse_body(1, 2, 30, &["Kept"])),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .mount(&mock_server)
        .await;

    let console = common::test_console(&mock_server.uri(), &dir);
    console.browser.execute(None).await.unwrap();

    let err = console.browser.change_page(1).await.unwrap_err();
    assert_eq!(err.user_message(), "boom");

    let state = console.browser.current().await;
    assert_eq!(state.resources[0].title, "Kept");
}
