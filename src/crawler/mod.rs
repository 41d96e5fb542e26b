//! Crawler module for comment collection
//!
//! This module contains the core crawling logic, including:
//! - The comment API seam and its Weibo HTTP implementation
//! - Retry with exponential backoff
//! - Pacing between comments
//! - Traversal of a post's two-level comment tree
//! - Batch crawl coordination

mod api;
mod coordinator;
mod fetcher;
mod pacing;
mod retry;
mod traversal;

pub use api::{parse_comment_page, CommentApi, CommentPage, PageError, PageRequest};
pub use coordinator::{post_pause, run_crawl, Coordinator};
pub use fetcher::{build_http_client, WeiboClient};
pub use pacing::Pacer;
pub use retry::RetryPolicy;
pub use traversal::{CommentTraversal, TraversalOptions};

use crate::shortcode::{decode, MessageId};
use crate::CrawlError;

/// Starts a traversal over the comments of one post
///
/// No request is issued until the traversal is first advanced.
pub fn crawl<A: CommentApi + ?Sized>(
    api: &A,
    post_id: MessageId,
    options: TraversalOptions,
) -> CommentTraversal<'_, A> {
    CommentTraversal::new(api, post_id, options)
}

/// Starts a traversal for a short code
///
/// The short code is decoded first, so an invalid code fails with
/// [`CrawlError::InvalidShortCode`] before any network activity.
pub fn crawl_short_code<'a, A: CommentApi + ?Sized>(
    api: &'a A,
    short_code: &str,
    options: TraversalOptions,
) -> Result<CommentTraversal<'a, A>, CrawlError> {
    let post_id = decode(short_code)?;
    Ok(crawl(api, post_id, options))
}
