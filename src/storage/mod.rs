//! Storage module for persisting collected comments
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Comment persistence with per-post deduplication
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::comment::Gender;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a stored comment
#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub post_id: String,
    pub comment_id: String,
    pub parent_id: Option<String>,
    pub level: String,
    pub author_id: String,
    pub author_name: String,
    pub gender: Gender,
    pub created_at: String,
    pub text: String,
    pub like_count: u64,
    pub reply_count: u32,
    pub source: Option<String>,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub posts_crawled: u64,
    pub comments_collected: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    /// Finished, but at least one post failed
    Partial,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "partial" => Some(Self::Partial),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
