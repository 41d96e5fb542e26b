//! Comment API seam
//!
//! The traversal talks to the platform only through [`CommentApi`], so it can
//! be driven by the reqwest client in production and by in-memory stubs in
//! tests.

use crate::comment::{CommentLevel, PageCursor, RawComment};
use crate::post::PostDetails;
use crate::shortcode::PostRef;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while fetching one page of comments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("response is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("unexpected response shape: {0}")]
    UnexpectedResponseShape(String),
}

impl PageError {
    /// Returns true if requesting the same cursor again may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::UnexpectedResponseShape(_))
    }
}

/// A request for one page of comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Post mid for root pages, root comment id for child pages
    pub target_id: String,

    pub level: CommentLevel,
    pub cursor: PageCursor,

    /// UID of the post author, sent along when known
    pub author_uid: Option<String>,
}

/// One page of comments
#[derive(Debug, Clone, Default)]
pub struct CommentPage {
    pub items: Vec<RawComment>,

    /// Cursor of the following page; None when this was the last page
    pub next_cursor: Option<PageCursor>,

    /// Items dropped because they lacked required fields
    pub skipped_items: usize,
}

/// Source of comment pages
#[async_trait]
pub trait CommentApi: Send + Sync {
    /// Fetches a single page of comments
    ///
    /// Re-fetching the same request is idempotent.
    async fn fetch_page(&self, request: &PageRequest) -> Result<CommentPage, PageError>;

    /// Looks up the display name of a post author
    ///
    /// Sources without a profile endpoint return `Ok(None)`.
    async fn screen_name(&self, uid: &str) -> Result<Option<String>, PageError> {
        let _ = uid;
        Ok(None)
    }

    /// Fetches the details of a post (text, counters, media)
    ///
    /// Sources without a post endpoint return `Ok(None)`.
    async fn post_details(&self, post: &PostRef) -> Result<Option<PostDetails>, PageError> {
        let _ = post;
        Ok(None)
    }
}

/// Parses a comment page response body
///
/// A body that is not JSON at all is a [`PageError::MalformedBody`] (usually a
/// login page or a truncated response, worth retrying). JSON without a `data`
/// array is a [`PageError::UnexpectedResponseShape`]. Items inside `data` are
/// parsed one by one; an item missing required fields is dropped and counted
/// in [`CommentPage::skipped_items`] while the rest of the page and its
/// cursor are kept.
pub fn parse_comment_page(body: &str) -> Result<CommentPage, PageError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| PageError::MalformedBody(e.to_string()))?;

    let data = value
        .get("data")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| PageError::UnexpectedResponseShape("missing data array".to_string()))?;

    let next_cursor = value
        .get("max_id")
        .and_then(PageCursor::from_response);

    let mut items = Vec::with_capacity(data.len());
    let mut skipped_items = 0;
    for item in data {
        match RawComment::deserialize(item) {
            Ok(raw) => items.push(raw),
            Err(e) => {
                tracing::debug!("Dropping comment item: {}", e);
                skipped_items += 1;
            }
        }
    }

    Ok(CommentPage {
        items,
        next_cursor,
        skipped_items,
    })
}
