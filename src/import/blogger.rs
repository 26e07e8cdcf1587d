use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/blogger/v3";

/// Blogger's ceiling for `maxResults` on the posts listing
pub const MAX_RESULTS_LIMIT: u32 = 500;

// ── Public Types ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloggerConfig {
    pub blog_id: String,
    pub api_key: String,
    pub api_base: String,
    pub max_results: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "displayName", default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    /// RFC 3339 timestamp, kept as Blogger sent it
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostList {
    #[serde(default)]
    items: Vec<Post>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// The Blogger API could not be reached or refused the request.
#[derive(Debug)]
pub struct AccessError(pub String);

impl std::fmt::Display for AccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Post {
    /// Author name as used for local usernames.
    pub fn author_name(&self) -> String {
        normalize_author(&self.author.display_name)
    }
}

pub fn normalize_author(display_name: &str) -> String {
    display_name.trim().replace(' ', "-")
}

// ── Fetch ────────────────────────────────────────────

pub fn posts_url(config: &BloggerConfig) -> Result<Url, AccessError> {
    let invalid = |e: String| AccessError(format!("Invalid Blogger API base '{}': {}", config.api_base, e));
    let mut url = Url::parse(&config.api_base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("not a hierarchical URL".to_string()))?
        .pop_if_empty()
        .extend(["blogs", config.blog_id.as_str(), "posts"]);
    url.query_pairs_mut()
        .append_pair("key", &config.api_key)
        .append_pair(
            "maxResults",
            &config.max_results.clamp(1, MAX_RESULTS_LIMIT).to_string(),
        );
    Ok(url)
}

/// Fetch the blog's posts in a single page of at most `max_results`.
pub fn fetch_posts(config: &BloggerConfig) -> Result<Vec<Post>, AccessError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| AccessError(format!("HTTP client error: {}", e)))?;

    let resp = client
        .get(posts_url(config)?)
        .send()
        .map_err(|e| AccessError(format!("Blogger API request failed: {}", e)))?;

    if !resp.status().is_success() {
        return Err(AccessError(status_message(resp.status().as_u16())));
    }

    let body = resp
        .text()
        .map_err(|e| AccessError(format!("Failed to read Blogger response: {}", e)))?;
    let posts = parse_posts(&body)?;
    info!("> {} posts fetched from blog {}.", posts.len(), config.blog_id);
    Ok(posts)
}

/// Decode a posts listing. A listing without `items` is an empty blog.
pub fn parse_posts(body: &str) -> Result<Vec<Post>, AccessError> {
    let list: PostList = serde_json::from_str(body)
        .map_err(|e| AccessError(format!("Failed to parse Blogger response: {}", e)))?;

    if list.next_page_token.is_some() {
        warn!(
            "Blogger returned more posts than fit in one page; only the first {} are imported",
            list.items.len()
        );
    }
    Ok(list.items)
}

fn status_message(code: u16) -> String {
    match code {
        400 => "Invalid request. Please check the Blogger blog id.".to_string(),
        401 | 403 => "Access denied. Please check the Blogger API key.".to_string(),
        404 => "Blog not found. Please check the Blogger blog id.".to_string(),
        429 => "Rate limited by Blogger. Please wait and try again.".to_string(),
        _ => format!("Blogger API error ({}). Please try again later.", code),
    }
}
