//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests to the platform, including:
//! - Building HTTP clients with the configured user agent and login headers
//! - Building comment page URLs
//! - Classifying transport and status failures into [`PageError`]

use crate::comment::PageCursor;
use crate::config::{load_headers, RequestConfig};
use crate::crawler::api::{parse_comment_page, CommentApi, CommentPage, PageError, PageRequest};
use crate::post::{parse_post_details, PostDetails};
use crate::shortcode::PostRef;
use crate::{ConfigError, CrawlError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Path of the comment listing endpoint
const COMMENTS_PATH: &str = "/ajax/statuses/buildComments";

/// Path of the profile endpoint
const PROFILE_PATH: &str = "/ajax/profile/info";

/// Path of the post details endpoint
const POST_PATH: &str = "/ajax/statuses/show";

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The request configuration
/// * `headers` - Extra headers sent with every request (cookie, tokens)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(CrawlError)` - A header was invalid or the client failed to build
pub fn build_http_client(
    config: &RequestConfig,
    headers: &BTreeMap<String, String>,
) -> Result<Client, CrawlError> {
    let mut default_headers = HeaderMap::new();
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
            name: name.clone(),
            message: e.to_string(),
        })?;
        default_headers.insert(header_name, header_value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(default_headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Comment API client backed by reqwest
#[derive(Debug, Clone)]
pub struct WeiboClient {
    client: Client,
    base_url: Url,
    page_size: u32,
    locale: String,
}

impl WeiboClient {
    /// Creates a client from the request configuration
    ///
    /// Loads the headers file when one is configured.
    pub fn new(config: &RequestConfig, page_size: u32) -> Result<Self, CrawlError> {
        let headers = match &config.headers_file {
            Some(path) => load_headers(Path::new(path))?,
            None => BTreeMap::new(),
        };
        let client = build_http_client(config, &headers)?;
        Self::with_client(client, config, page_size)
    }

    /// Creates a client around an already built reqwest client
    pub fn with_client(
        client: Client,
        config: &RequestConfig,
        page_size: u32,
    ) -> Result<Self, CrawlError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            page_size,
            locale: config.locale.clone(),
        })
    }

    /// Builds the URL of a comment page request
    ///
    /// ```
    /// use weibo_threads::comment::{CommentLevel, PageCursor};
    /// use weibo_threads::config::RequestConfig;
    /// use weibo_threads::crawler::{PageRequest, WeiboClient};
    ///
    /// let client = WeiboClient::new(&RequestConfig::default(), 20).unwrap();
    /// let url = client.comments_url(&PageRequest {
    ///     target_id: "5153820120452372".to_string(),
    ///     level: CommentLevel::Root,
    ///     cursor: PageCursor::after("138"),
    ///     author_uid: Some("2397417584".to_string()),
    /// });
    /// assert!(url.as_str().contains("fetch_level=0"));
    /// assert!(url.as_str().contains("max_id=138"));
    /// ```
    pub fn comments_url(&self, request: &PageRequest) -> Url {
        let mut url = self.base_url.join(COMMENTS_PATH).unwrap_or_else(|_| self.base_url.clone());

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("flow", "1")
                .append_pair("is_reload", "1")
                .append_pair("id", &request.target_id)
                .append_pair("is_show_bulletin", "2")
                .append_pair("is_mix", "0");
            if let Some(max_id) = request.cursor.max_id() {
                query.append_pair("max_id", max_id);
            }
            query.append_pair("count", &self.page_size.to_string());
            if let Some(uid) = &request.author_uid {
                query.append_pair("uid", uid);
            }
            query
                .append_pair("fetch_level", &request.level.fetch_level().to_string())
                .append_pair("locale", &self.locale);
        }

        url
    }

    /// Looks up the display name of a user
    pub async fn fetch_screen_name(&self, uid: &str) -> Result<String, PageError> {
        let mut url = self.base_url.join(PROFILE_PATH).unwrap_or_else(|_| self.base_url.clone());
        url.query_pairs_mut().append_pair("custom", uid);

        let body = self.get_text(url).await?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| PageError::MalformedBody(e.to_string()))?;

        value
            .pointer("/data/user/screen_name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                PageError::UnexpectedResponseShape("missing data.user.screen_name".to_string())
            })
    }

    /// Builds the URL of a post details request
    ///
    /// The endpoint takes the short code itself; `isGetLongText` asks for the
    /// full text of long posts.
    pub fn post_url(&self, short_code: &str) -> Url {
        let mut url = self.base_url.join(POST_PATH).unwrap_or_else(|_| self.base_url.clone());
        url.query_pairs_mut()
            .append_pair("id", short_code)
            .append_pair("locale", &self.locale)
            .append_pair("isGetLongText", "true");
        url
    }

    /// Fetches the details of a post
    pub async fn fetch_post(&self, post: &PostRef) -> Result<PostDetails, PageError> {
        let body = self.get_text(self.post_url(&post.short_code)).await?;
        let details = parse_post_details(&body, &post.url)?;

        tracing::debug!(
            "Post {}: {} comments, {} reposts, {} likes",
            details.mid,
            details.comments_count,
            details.reposts_count,
            details.like_count
        );

        Ok(details)
    }

    /// Sends a GET request and returns the body of a 2xx response
    async fn get_text(&self, url: Url) -> Result<String, PageError> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(classify_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PageError::Status(status.as_u16()));
        }

        response.text().await.map_err(classify_error)
    }
}

#[async_trait]
impl CommentApi for WeiboClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<CommentPage, PageError> {
        let body = self.get_text(self.comments_url(request)).await?;
        let page = parse_comment_page(&body)?;

        tracing::debug!(
            "{} page of {} at cursor {}: {} items, next {}",
            request.level,
            request.target_id,
            request.cursor,
            page.items.len(),
            page.next_cursor
                .as_ref()
                .map(PageCursor::to_string)
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(page)
    }

    async fn screen_name(&self, uid: &str) -> Result<Option<String>, PageError> {
        self.fetch_screen_name(uid).await.map(Some)
    }

    async fn post_details(&self, post: &PostRef) -> Result<Option<PostDetails>, PageError> {
        self.fetch_post(post).await.map(Some)
    }
}

/// Maps a reqwest error to a page error
fn classify_error(e: reqwest::Error) -> PageError {
    if e.is_timeout() {
        PageError::Transport("Request timeout".to_string())
    } else if e.is_connect() {
        PageError::Transport("Connection refused".to_string())
    } else {
        PageError::Transport(e.to_string())
    }
}
