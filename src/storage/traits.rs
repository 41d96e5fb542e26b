//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::comment::{CommentLevel, CommentNode, Gender};
use crate::post::PostDetails;
use crate::shortcode::MessageId;
use crate::storage::{CommentRecord, RunRecord, RunStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid stored media list: {0}")]
    MediaList(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as finished with its final status and counters
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        posts_crawled: u64,
        comments_collected: u64,
    ) -> StorageResult<()>;

    // ===== Comments =====

    /// Stores a comment
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The comment was new
    /// * `Ok(false)` - The comment was already stored for this post
    fn insert_comment(&mut self, node: &CommentNode, run_id: i64) -> StorageResult<bool>;

    /// Gets all comments of a post in collection order
    fn get_comments_for_post(&self, post_id: MessageId) -> StorageResult<Vec<CommentRecord>>;

    // ===== Posts =====

    /// Stores the details of a post, replacing what an earlier run stored
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The post was new
    /// * `Ok(false)` - An earlier row was updated
    fn upsert_post(&mut self, post: &PostDetails, run_id: i64) -> StorageResult<bool>;

    /// Gets the stored details of a post
    fn get_post(&self, post_id: &str) -> StorageResult<Option<PostDetails>>;

    // ===== Statistics =====

    /// Gets total comment count
    fn count_comments(&self) -> StorageResult<u64>;

    /// Counts comments at one level
    fn count_comments_by_level(&self, level: CommentLevel) -> StorageResult<u64>;

    /// Counts posts with at least one stored comment
    fn count_posts(&self) -> StorageResult<u64>;

    /// Counts posts with stored details
    fn count_post_details(&self) -> StorageResult<u64>;

    /// Counts distinct comment authors
    fn count_authors(&self) -> StorageResult<u64>;

    /// Gets comment counts per author gender
    fn get_gender_breakdown(&self) -> StorageResult<HashMap<Gender, u64>>;
}
