//! Scraper loop against a scripted YouTube stand-in on localhost

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};
use yt_sentiment_analyzer::config::ScraperConfig;
use yt_sentiment_analyzer::error::ScrapeError;
use yt_sentiment_analyzer::youtube::CommentSort;
use yt_sentiment_analyzer::{CommentSource, YoutubeCommentScraper};

const API_KEY: &str = "test-key";

/// Scripted watch page and continuation responses
struct FakeYoutube {
    watch_page: Option<String>,
    /// token -> responses served in order; the last one repeats
    continuations: HashMap<String, Vec<(u16, Value)>>,
    hits: Mutex<HashMap<String, usize>>,
}

impl FakeYoutube {
    fn new(watch_page: Option<String>) -> Self {
        Self {
            watch_page,
            continuations: HashMap::new(),
            hits: Mutex::new(HashMap::new()),
        }
    }

    fn respond(mut self, token: &str, responses: Vec<(u16, Value)>) -> Self {
        self.continuations.insert(token.to_string(), responses);
        self
    }

    fn hits(&self, token: &str) -> usize {
        self.hits.lock().unwrap().get(token).copied().unwrap_or(0)
    }
}

async fn watch(State(fake): State<Arc<FakeYoutube>>) -> Response {
    match &fake.watch_page {
        Some(page) => Html(page.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn next(
    State(fake): State<Arc<FakeYoutube>>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if query.get("key").map(String::as_str) != Some(API_KEY) {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let token = body["continuation"].as_str().unwrap_or_default().to_string();
    let hit = {
        let mut hits = fake.hits.lock().unwrap();
        let count = hits.entry(token.clone()).or_insert(0);
        *count += 1;
        *count
    };

    let Some(responses) = fake.continuations.get(&token) else {
        return StatusCode::FORBIDDEN.into_response();
    };
    let (status, payload) = &responses[(hit - 1).min(responses.len() - 1)];
    let status = StatusCode::from_u16(*status).unwrap();
    (status, Json(payload.clone())).into_response()
}

async fn serve(fake: Arc<FakeYoutube>) -> String {
    let app = Router::new()
        .route("/watch", get(watch))
        .route("/youtubei/v1/next", post(next))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn scraper(base_url: &str, sort: CommentSort, max_retries: u32) -> YoutubeCommentScraper {
    let config = ScraperConfig {
        base_url: base_url.to_string(),
        consent_url: format!("{}/consent", base_url),
        sort_by: sort,
        max_retries,
        retry_delay_ms: 0,
        request_timeout_seconds: 5,
        ..ScraperConfig::default()
    };
    YoutubeCommentScraper::new(&config).unwrap()
}

fn endpoint(token: &str) -> Value {
    json!({
        "commandMetadata": {"webCommandMetadata": {"apiUrl": "/youtubei/v1/next"}},
        "continuationCommand": {"token": token}
    })
}

fn sort_menu() -> Value {
    json!({"sortFilterSubMenuRenderer": {"subMenuItems": [
        {"title": "Top comments", "serviceEndpoint": endpoint("top")},
        {"title": "Newest first", "serviceEndpoint": endpoint("new")}
    ]}})
}

fn video_data() -> Value {
    json!({
        "contents": {"itemSectionRenderer": {"contents": [
            {"continuationItemRenderer": {"continuationEndpoint": endpoint("section")}}
        ]}},
        "header": sort_menu()
    })
}

fn watch_page(initial_data: &Value, playability: &str) -> String {
    let ytcfg = json!({
        "INNERTUBE_API_KEY": API_KEY,
        "INNERTUBE_CONTEXT": {"client": {"hl": "en", "clientName": "WEB"}}
    });
    let player = json!({
        "playabilityStatus": {"status": playability, "reason": "This video is private"}
    });

    format!(
        "<html><head><script>ytcfg.set({});</script></head><body>\
         <script>var ytInitialPlayerResponse = {};</script>\
         <script>var ytInitialData = {};</script></body></html>",
        ytcfg, player, initial_data
    )
}

/// One page of comments, optionally pointing at the next page
fn comment_page(texts: &[&str], next_token: Option<&str>) -> Value {
    let mut items: Vec<Value> = Vec::new();
    if let Some(token) = next_token {
        items.push(json!({"continuationItemRenderer": {"continuationEndpoint": endpoint(token)}}));
    }
    let mutations: Vec<Value> = texts
        .iter()
        .map(|text| json!({"payload": {"commentEntityPayload": {"properties": {"content": {"content": text}}}}}))
        .collect();

    json!({
        "onResponseReceivedEndpoints": [
            {"appendContinuationItemsAction": {"targetId": "comments-section", "continuationItems": items}}
        ],
        "frameworkUpdates": {"entityBatchUpdate": {"mutations": mutations}}
    })
}

fn video_url(base: &str) -> String {
    format!("{}/watch?v=abc123", base)
}

#[tokio::test]
async fn test_missing_watch_page_is_video_not_found() {
    let base = serve(Arc::new(FakeYoutube::new(None))).await;

    let err = assert_err!(scraper(&base, CommentSort::Recent, 3).fetch_comments(&video_url(&base), 10).await);
    assert!(matches!(err, ScrapeError::VideoNotFound(_)));
}

#[tokio::test]
async fn test_private_video_is_unavailable() {
    let fake = Arc::new(FakeYoutube::new(Some(watch_page(&video_data(), "LOGIN_REQUIRED"))));
    let base = serve(fake.clone()).await;

    let err = assert_err!(scraper(&base, CommentSort::Recent, 3).fetch_comments(&video_url(&base), 10).await);
    assert!(matches!(err, ScrapeError::VideoUnavailable(_)));
    assert_eq!(fake.hits("new"), 0);
}

#[tokio::test]
async fn test_follows_pages_in_order() {
    let fake = Arc::new(
        FakeYoutube::new(Some(watch_page(&video_data(), "OK")))
            .respond("new", vec![(200, comment_page(&["first", "second"], Some("page-2")))])
            .respond("page-2", vec![(200, comment_page(&["third"], None))]),
    );
    let base = serve(fake.clone()).await;

    let comments = assert_ok!(scraper(&base, CommentSort::Recent, 3).fetch_comments(&video_url(&base), 10).await);

    assert_eq!(comments, vec!["first", "second", "third"]);
    assert_eq!(fake.hits("new"), 1);
    assert_eq!(fake.hits("page-2"), 1);
}

#[tokio::test]
async fn test_popular_sort_uses_first_menu_entry() {
    let fake = Arc::new(
        FakeYoutube::new(Some(watch_page(&video_data(), "OK")))
            .respond("top", vec![(200, comment_page(&["most liked"], None))])
            .respond("new", vec![(200, comment_page(&["latest"], None))]),
    );
    let base = serve(fake.clone()).await;

    let comments = assert_ok!(scraper(&base, CommentSort::Popular, 3).fetch_comments(&video_url(&base), 10).await);

    assert_eq!(comments, vec!["most liked"]);
    assert_eq!(fake.hits("new"), 0);
}

#[tokio::test]
async fn test_stops_at_limit() {
    let fake = Arc::new(
        FakeYoutube::new(Some(watch_page(&video_data(), "OK")))
            .respond("new", vec![(200, comment_page(&["a", "b"], Some("page-2")))])
            .respond("page-2", vec![(200, comment_page(&["c", "d"], Some("page-3")))])
            .respond("page-3", vec![(200, comment_page(&["e"], None))]),
    );
    let base = serve(fake.clone()).await;

    let comments = assert_ok!(scraper(&base, CommentSort::Recent, 3).fetch_comments(&video_url(&base), 3).await);

    assert_eq!(comments, vec!["a", "b", "c"]);
    assert_eq!(fake.hits("page-3"), 0);
}

#[tokio::test]
async fn test_forbidden_continuation_stops_without_retry() {
    for status in [403, 413] {
        let fake = Arc::new(
            FakeYoutube::new(Some(watch_page(&video_data(), "OK")))
                .respond("new", vec![(200, comment_page(&["kept"], Some("page-2")))])
                .respond("page-2", vec![(status, json!({}))]),
        );
        let base = serve(fake.clone()).await;

        let comments = assert_ok!(scraper(&base, CommentSort::Recent, 5).fetch_comments(&video_url(&base), 10).await);

        assert_eq!(comments, vec!["kept"]);
        assert_eq!(fake.hits("page-2"), 1);
    }
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let fake = Arc::new(
        FakeYoutube::new(Some(watch_page(&video_data(), "OK"))).respond(
            "new",
            vec![
                (500, json!({})),
                (503, json!({})),
                (200, comment_page(&["after retries"], None)),
            ],
        ),
    );
    let base = serve(fake.clone()).await;

    let comments = assert_ok!(scraper(&base, CommentSort::Recent, 3).fetch_comments(&video_url(&base), 10).await);

    assert_eq!(comments, vec!["after retries"]);
    assert_eq!(fake.hits("new"), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let fake = Arc::new(
        FakeYoutube::new(Some(watch_page(&video_data(), "OK"))).respond("new", vec![(500, json!({}))]),
    );
    let base = serve(fake.clone()).await;

    let comments = assert_ok!(scraper(&base, CommentSort::Recent, 2).fetch_comments(&video_url(&base), 10).await);

    assert!(comments.is_empty());
    assert_eq!(fake.hits("new"), 2);
}

#[tokio::test]
async fn test_external_error_message_is_server_error() {
    let fake = Arc::new(
        FakeYoutube::new(Some(watch_page(&video_data(), "OK"))).respond(
            "new",
            vec![(200, json!({"error": {"externalErrorMessage": "Comments are turned off."}}))],
        ),
    );
    let base = serve(fake).await;

    let err = assert_err!(scraper(&base, CommentSort::Recent, 3).fetch_comments(&video_url(&base), 10).await);
    match err {
        ScrapeError::Server(message) => assert_eq!(message, "Comments are turned off."),
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_community_post_loads_sort_menu_from_first_continuation() {
    let post_data = json!({
        "contents": {"sectionListRenderer": {"contents": [
            {"itemSectionRenderer": {"contents": [
                {"continuationItemRenderer": {"continuationEndpoint": endpoint("community")}}
            ]}}
        ]}}
    });
    let fake = Arc::new(
        FakeYoutube::new(Some(watch_page(&post_data, "OK")))
            .respond("community", vec![(200, json!({"header": sort_menu()}))])
            .respond("new", vec![(200, comment_page(&["post reply"], None))]),
    );
    let base = serve(fake.clone()).await;

    let comments = assert_ok!(scraper(&base, CommentSort::Recent, 3).fetch_comments(&video_url(&base), 10).await);

    assert_eq!(comments, vec!["post reply"]);
    assert_eq!(fake.hits("community"), 1);
}

#[tokio::test]
async fn test_disabled_comments_yield_nothing() {
    let data = json!({"contents": {"itemSectionRenderer": {"contents": []}}, "header": sort_menu()});
    let fake = Arc::new(FakeYoutube::new(Some(watch_page(&data, "OK"))));
    let base = serve(fake.clone()).await;

    let comments = assert_ok!(scraper(&base, CommentSort::Recent, 3).fetch_comments(&video_url(&base), 10).await);

    assert!(comments.is_empty());
    assert_eq!(fake.hits("new"), 0);
}
