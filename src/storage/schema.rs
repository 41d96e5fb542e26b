//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Weibo-Threads database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    posts_crawled INTEGER NOT NULL DEFAULT 0,
    comments_collected INTEGER NOT NULL DEFAULT 0
);

-- Collected comments, one row per (post, comment)
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id TEXT NOT NULL,
    comment_id TEXT NOT NULL,
    parent_id TEXT,
    level TEXT NOT NULL,
    author_id TEXT NOT NULL,
    author_name TEXT NOT NULL,
    gender TEXT NOT NULL,
    created_at TEXT NOT NULL,
    text TEXT NOT NULL,
    like_count INTEGER NOT NULL DEFAULT 0,
    reply_count INTEGER NOT NULL DEFAULT 0,
    source TEXT,
    collected_at TEXT NOT NULL,
    collected_run INTEGER NOT NULL REFERENCES runs(id),
    UNIQUE(post_id, comment_id)
);

-- Post details, one row per post; refreshed on every crawl
CREATE TABLE IF NOT EXISTS posts (
    post_id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL,
    author_url TEXT NOT NULL,
    url TEXT NOT NULL,
    created_at TEXT NOT NULL,
    text TEXT NOT NULL,
    region TEXT,
    pic_count INTEGER NOT NULL DEFAULT 0,
    pic_urls TEXT NOT NULL DEFAULT '[]',
    video_urls TEXT NOT NULL DEFAULT '[]',
    comments_count INTEGER NOT NULL DEFAULT 0,
    reposts_count INTEGER NOT NULL DEFAULT 0,
    like_count INTEGER NOT NULL DEFAULT 0,
    collected_at TEXT NOT NULL,
    collected_run INTEGER NOT NULL REFERENCES runs(id)
);

CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
CREATE INDEX IF NOT EXISTS idx_comments_author ON comments(author_id);
CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
