/// YouTube web scraper for video comments
use super::{CommentSort, CommentSource};
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::cookie::Jar;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const PAGE_DELAY: Duration = Duration::from_millis(100);

/// Continuation targets that belong to the top-level comment list
const COMMENT_SECTION_TARGETS: [&str; 3] = [
    "comments-section",
    "engagement-panel-comments-section",
    "shorts-engagement-panel-comments-section",
];

fn ytcfg_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"ytcfg\.set\s*\(\s*(\{.+?\})\s*\)\s*;").expect("valid ytcfg regex")
    })
}

fn initial_data_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?:window\s*\[\s*["']ytInitialData["']\s*\]|ytInitialData)\s*=\s*(\{.+?\})\s*;\s*(?:var\s+meta|</script|\n)"#,
        )
        .expect("valid ytInitialData regex")
    })
}

fn player_response_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"ytInitialPlayerResponse\s*=\s*(\{.+?\})\s*;\s*(?:var\s+meta|</script|\n)")
            .expect("valid ytInitialPlayerResponse regex")
    })
}

/// YouTube comment scraper working on the public watch page and the
/// internal continuation API
#[derive(Clone)]
pub struct YoutubeCommentScraper {
    client: Client,
    base_url: String,
    consent_url: String,
    sort: CommentSort,
    language: Option<String>,
    max_retries: u32,
    retry_delay: Duration,
}

impl YoutubeCommentScraper {
    /// Create a new scraper instance
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let jar = Jar::default();
        if let Ok(base) = Url::parse(&config.base_url) {
            jar.add_cookie_str("CONSENT=YES+cb; Domain=.youtube.com; Path=/", &base);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .cookie_provider(Arc::new(jar))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            consent_url: config.consent_url.clone(),
            sort: config.sort_by,
            language: config.language.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Download the watch page, accepting the cookie consent form if YouTube
    /// redirects there
    async fn fetch_watch_page(&self, url: &Url) -> Result<String, ScrapeError> {
        let response = self.client.get(url.as_str()).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScrapeError::VideoNotFound(url.to_string()));
        }
        let response = response.error_for_status()?;

        if !response.url().as_str().contains("consent") {
            return Ok(response.text().await?);
        }

        info!("🍪 Accepting YouTube cookie consent");
        let consent_page = response.text().await?;
        let params = consent_params(&consent_page, url.as_str());

        let response = self
            .client
            .post(&self.consent_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }

    /// POST one continuation to the internal API.
    ///
    /// Returns `None` when the server refuses the continuation or every
    /// attempt failed.
    async fn ajax_request(&self, endpoint: &Value, ytcfg: &Value) -> Result<Option<Value>, ScrapeError> {
        let api_url = endpoint
            .pointer("/commandMetadata/webCommandMetadata/apiUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| ScrapeError::Parsing("continuation without apiUrl".to_string()))?;
        let token = endpoint
            .pointer("/continuationCommand/token")
            .and_then(Value::as_str)
            .ok_or_else(|| ScrapeError::Parsing("continuation without token".to_string()))?;
        let api_key = ytcfg
            .get("INNERTUBE_API_KEY")
            .and_then(Value::as_str)
            .ok_or_else(|| ScrapeError::Parsing("ytcfg without INNERTUBE_API_KEY".to_string()))?;

        let url = format!("{}{}", self.base_url, api_url);
        let body = json!({
            "context": ytcfg.get("INNERTUBE_CONTEXT").cloned().unwrap_or(Value::Null),
            "continuation": token,
        });

        for attempt in 1..=self.max_retries {
            match self
                .client
                .post(&url)
                .query(&[("key", api_key)])
                .json(&body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::OK {
                        return Ok(Some(response.json().await?));
                    }
                    if status == StatusCode::FORBIDDEN || status == StatusCode::PAYLOAD_TOO_LARGE {
                        debug!("Continuation refused with {}", status);
                        return Ok(None);
                    }
                    warn!("Continuation attempt {}/{} failed: {}", attempt, self.max_retries, status);
                }
                Err(e) if e.is_timeout() => {
                    warn!("Continuation attempt {}/{} timed out", attempt, self.max_retries);
                }
                Err(e) => return Err(e.into()),
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl CommentSource for YoutubeCommentScraper {
    async fn fetch_comments(&self, video_url: &str, limit: usize) -> Result<Vec<String>, ScrapeError> {
        let url = Url::parse(video_url.trim())
            .map_err(|e| ScrapeError::InvalidUrl(format!("{}: {}", video_url, e)))?;

        info!("🔍 Fetching up to {} comments for: {}", limit, url);

        let html = self.fetch_watch_page(&url).await?;

        let Some(mut ytcfg) = extract_json(&html, ytcfg_regex())? else {
            warn!("⚠️ Unable to extract ytcfg from watch page");
            return Ok(Vec::new());
        };
        if let Some(language) = &self.language {
            if let Some(client) = ytcfg.pointer_mut("/INNERTUBE_CONTEXT/client") {
                client["hl"] = json!(language);
            }
        }

        check_playability(&html)?;

        let data = extract_json(&html, initial_data_regex())?.unwrap_or(Value::Null);
        if !has_comment_section(&data) {
            info!("💬 Comment section missing (comments disabled?)");
            return Ok(Vec::new());
        }

        let mut sort_menu = sort_menu_items(&data);
        if sort_menu.is_empty() {
            // Community posts expose the sort menu only after a first continuation
            let retry_endpoint = search_dict(&data, "sectionListRenderer")
                .next()
                .and_then(|section| search_dict(section, "continuationEndpoint").next());
            if let Some(endpoint) = retry_endpoint {
                if let Some(retry_data) = self.ajax_request(endpoint, &ytcfg).await? {
                    sort_menu = sort_menu_items(&retry_data);
                }
            }
        }

        let start = sort_menu
            .get(self.sort.menu_index())
            .and_then(|item| item.get("serviceEndpoint"))
            .cloned()
            .ok_or(ScrapeError::SortingUnavailable)?;

        let mut continuations = VecDeque::from([start]);
        let mut comments = Vec::new();

        while let Some(continuation) = continuations.pop_back() {
            let Some(response) = self.ajax_request(&continuation, &ytcfg).await? else {
                break;
            };

            if let Some(error) = search_dict(&response, "externalErrorMessage").next() {
                let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
                return Err(ScrapeError::Server(message));
            }

            queue_continuations(&response, &mut continuations);

            for text in extract_comment_texts(&response) {
                comments.push(text);
                if comments.len() >= limit {
                    info!("✅ Collected {} comments (limit reached)", comments.len());
                    return Ok(comments);
                }
            }

            debug!("Collected {} comments so far, {} continuations queued", comments.len(), continuations.len());
            tokio::time::sleep(PAGE_DELAY).await;
        }

        info!("✅ Collected {} comments", comments.len());
        Ok(comments)
    }
}

/// Depth-first search for every value stored under `key`, in the same order
/// YouTube's own client walks the response tree
pub struct SearchDict<'a, 'k> {
    key: &'k str,
    stack: Vec<&'a Value>,
    ready: VecDeque<&'a Value>,
}

impl<'a, 'k> Iterator for SearchDict<'a, 'k> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        loop {
            if let Some(found) = self.ready.pop_front() {
                return Some(found);
            }

            match self.stack.pop()? {
                Value::Object(map) => {
                    for (key, value) in map {
                        if key == self.key {
                            self.ready.push_back(value);
                        } else {
                            self.stack.push(value);
                        }
                    }
                }
                Value::Array(items) => self.stack.extend(items.iter()),
                _ => {}
            }
        }
    }
}

pub fn search_dict<'a, 'k>(root: &'a Value, key: &'k str) -> SearchDict<'a, 'k> {
    SearchDict {
        key,
        stack: vec![root],
        ready: VecDeque::new(),
    }
}

/// Parse the first capture group of `regex` in `html` as JSON
fn extract_json(html: &str, regex: &Regex) -> Result<Option<Value>, ScrapeError> {
    match regex.captures(html).and_then(|caps| caps.get(1)) {
        Some(found) => Ok(Some(serde_json::from_str(found.as_str())?)),
        None => Ok(None),
    }
}

/// Fail early on videos the player refuses to show
fn check_playability(html: &str) -> Result<(), ScrapeError> {
    let Ok(Some(player)) = extract_json(html, player_response_regex()) else {
        return Ok(());
    };

    let status = player
        .pointer("/playabilityStatus/status")
        .and_then(Value::as_str)
        .unwrap_or("OK");

    if matches!(status, "ERROR" | "LOGIN_REQUIRED" | "UNPLAYABLE") {
        let reason = player
            .pointer("/playabilityStatus/reason")
            .and_then(Value::as_str)
            .unwrap_or("Video unavailable");
        return Err(ScrapeError::VideoUnavailable(reason.to_string()));
    }

    Ok(())
}

fn has_comment_section(data: &Value) -> bool {
    search_dict(data, "itemSectionRenderer")
        .next()
        .and_then(|section| search_dict(section, "continuationItemRenderer").next())
        .is_some()
}

fn sort_menu_items(data: &Value) -> Vec<Value> {
    search_dict(data, "sortFilterSubMenuRenderer")
        .next()
        .and_then(|menu| menu.get("subMenuItems"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Queue further pages: comment-list pages go to the front, "show more
/// replies" buttons to the back
fn queue_continuations(response: &Value, continuations: &mut VecDeque<Value>) {
    let actions = search_dict(response, "reloadContinuationItemsCommand")
        .chain(search_dict(response, "appendContinuationItemsAction"));

    for action in actions {
        let target_id = action.get("targetId").and_then(Value::as_str).unwrap_or_default();
        let Some(items) = action.get("continuationItems").and_then(Value::as_array) else {
            continue;
        };

        for item in items {
            if COMMENT_SECTION_TARGETS.contains(&target_id) {
                let endpoints: Vec<&Value> = search_dict(item, "continuationEndpoint").collect();
                for endpoint in endpoints.into_iter().rev() {
                    continuations.push_front(endpoint.clone());
                }
            }

            if target_id.starts_with("comment-replies-item") && item.get("continuationItemRenderer").is_some() {
                if let Some(command) = search_dict(item, "buttonRenderer")
                    .next()
                    .and_then(|button| button.get("command"))
                {
                    continuations.push_back(command.clone());
                }
            }
        }
    }
}

/// Comment texts of one continuation response, in display order
fn extract_comment_texts(response: &Value) -> Vec<String> {
    let payloads: Vec<&Value> = search_dict(response, "commentEntityPayload").collect();
    if !payloads.is_empty() {
        return payloads
            .into_iter()
            .rev()
            .filter_map(|payload| payload.pointer("/properties/content/content"))
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }

    // Older layout
    let renderers: Vec<&Value> = search_dict(response, "commentRenderer").collect();
    renderers.into_iter().rev().filter_map(renderer_text).collect()
}

fn renderer_text(renderer: &Value) -> Option<String> {
    let content = renderer.get("contentText")?;
    if let Some(runs) = content.get("runs").and_then(Value::as_array) {
        return Some(
            runs.iter()
                .filter_map(|run| run.get("text").and_then(Value::as_str))
                .collect(),
        );
    }
    content.get("simpleText").and_then(Value::as_str).map(str::to_string)
}

/// Hidden fields of the consent form plus the overrides that accept it
fn consent_params(html: &str, video_url: &str) -> Vec<(String, String)> {
    let overrides = [
        ("continue", video_url),
        ("set_eom", "false"),
        ("set_ytc", "true"),
        ("set_apyt", "true"),
    ];

    let mut params: Vec<(String, String)> = hidden_inputs(html)
        .into_iter()
        .filter(|(name, _)| !overrides.iter().any(|(key, _)| key == name))
        .collect();
    params.extend(overrides.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    params
}

fn hidden_inputs(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(r#"input[type="hidden"]"#) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
