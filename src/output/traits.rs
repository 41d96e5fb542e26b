//! Output sink traits and types
//!
//! This module defines the trait interface for comment sinks and the summary
//! a batch crawl reports when it finishes.

use crate::comment::CommentNode;
use crate::post::PostDetails;
use crate::storage::RunStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A post that could not be crawled completely
#[derive(Debug, Clone)]
pub struct PostFailure {
    /// The post URL
    pub url: String,

    /// Error message
    pub message: String,
}

/// Summary of a batch crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    pub posts_attempted: u64,
    pub posts_completed: u64,
    pub root_comments: u64,
    pub child_comments: u64,
    pub pages_skipped: u64,
    pub items_skipped: u64,
    pub stalled_branches: u64,
    pub failed_branches: u64,

    /// Posts whose details could not be fetched
    pub details_failed: u64,
    pub failures: Vec<PostFailure>,
    pub duration: Duration,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Total comments collected
    pub fn total_comments(&self) -> u64 {
        self.root_comments + self.child_comments
    }

    /// Returns the share of posts crawled without any failure, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.posts_attempted == 0 {
            return 0.0;
        }
        (self.posts_completed as f64 / self.posts_attempted as f64) * 100.0
    }

    /// Final status to record for the run
    pub fn run_status(&self) -> RunStatus {
        if self.failures.is_empty() {
            RunStatus::Completed
        } else if self.posts_completed > 0 || self.total_comments() > 0 {
            RunStatus::Partial
        } else {
            RunStatus::Failed
        }
    }
}

/// Destination for collected comments
///
/// Sinks are owned by the caller of a traversal and receive every comment
/// as soon as it is emitted.
pub trait CommentSink: Send {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Writes one comment
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The comment was written
    /// * `Ok(false)` - The sink already held this comment and skipped it
    fn write_comment(&mut self, node: &CommentNode) -> OutputResult<bool>;

    /// Writes the details of a post
    ///
    /// Sinks that only record comments ignore posts.
    fn write_post(&mut self, post: &PostDetails) -> OutputResult<()> {
        let _ = post;
        Ok(())
    }

    /// Flushes buffered output
    fn flush(&mut self) -> OutputResult<()>;

    /// Finalizes the output at the end of a batch
    fn finish(&mut self, summary: &CrawlSummary) -> OutputResult<()> {
        let _ = summary;
        self.flush()
    }
}
