//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::comment::{CommentLevel, CommentNode, Gender};
use crate::post::PostDetails;
use crate::shortcode::MessageId;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CommentRecord, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
        posts_crawled: row.get::<_, i64>(5)? as u64,
        comments_collected: row.get::<_, i64>(6)? as u64,
    })
}

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, posts_crawled, comments_collected";

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        posts_crawled: u64,
        comments_collected: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, posts_crawled = ?3, comments_collected = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                posts_crawled as i64,
                comments_collected as i64,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Comments =====

    fn insert_comment(&mut self, node: &CommentNode, run_id: i64) -> StorageResult<bool> {
        let payload = &node.payload;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO comments (
                post_id, comment_id, parent_id, level, author_id, author_name, gender,
                created_at, text, like_count, reply_count, source, collected_at, collected_run
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                node.root_post_id.to_string(),
                node.id,
                node.parent_id,
                node.level.to_db_string(),
                payload.author_id,
                payload.author_name,
                payload.gender.to_db_string(),
                payload.created_at,
                payload.text,
                payload.like_count as i64,
                node.child_count,
                payload.source,
                Utc::now().to_rfc3339(),
                run_id
            ],
        )?;
        Ok(inserted == 1)
    }

    fn get_comments_for_post(&self, post_id: MessageId) -> StorageResult<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT post_id, comment_id, parent_id, level, author_id, author_name, gender,
                    created_at, text, like_count, reply_count, source
             FROM comments WHERE post_id = ?1 ORDER BY id",
        )?;

        let records = stmt
            .query_map(params![post_id.to_string()], |row| {
                Ok(CommentRecord {
                    post_id: row.get(0)?,
                    comment_id: row.get(1)?,
                    parent_id: row.get(2)?,
                    level: row.get(3)?,
                    author_id: row.get(4)?,
                    author_name: row.get(5)?,
                    gender: Gender::from_db_string(&row.get::<_, String>(6)?)
                        .unwrap_or(Gender::Unknown),
                    created_at: row.get(7)?,
                    text: row.get(8)?,
                    like_count: row.get::<_, i64>(9)? as u64,
                    reply_count: row.get(10)?,
                    source: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ===== Posts =====

    fn upsert_post(&mut self, post: &PostDetails, run_id: i64) -> StorageResult<bool> {
        let existed: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE post_id = ?1)",
            params![post.mid],
            |row| row.get(0),
        )?;

        self.conn.execute(
            "INSERT INTO posts (
                post_id, author_id, author_url, url, created_at, text, region, pic_count,
                pic_urls, video_urls, comments_count, reposts_count, like_count,
                collected_at, collected_run
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(post_id) DO UPDATE SET
                author_url = excluded.author_url,
                url = excluded.url,
                text = excluded.text,
                region = excluded.region,
                pic_count = excluded.pic_count,
                pic_urls = excluded.pic_urls,
                video_urls = excluded.video_urls,
                comments_count = excluded.comments_count,
                reposts_count = excluded.reposts_count,
                like_count = excluded.like_count,
                collected_at = excluded.collected_at,
                collected_run = excluded.collected_run",
            params![
                post.mid,
                post.author_id,
                post.author_url,
                post.url,
                post.created_at,
                post.text,
                post.region,
                post.pic_count,
                serde_json::to_string(&post.pic_urls)?,
                serde_json::to_string(&post.video_urls)?,
                post.comments_count as i64,
                post.reposts_count as i64,
                post.like_count as i64,
                Utc::now().to_rfc3339(),
                run_id
            ],
        )?;

        Ok(!existed)
    }

    fn get_post(&self, post_id: &str) -> StorageResult<Option<PostDetails>> {
        let row = self
            .conn
            .query_row(
                "SELECT post_id, author_id, author_url, url, created_at, text, region, pic_count,
                        pic_urls, video_urls, comments_count, reposts_count, like_count
                 FROM posts WHERE post_id = ?1",
                params![post_id],
                |row| {
                    let post = PostDetails {
                        mid: row.get(0)?,
                        author_id: row.get(1)?,
                        author_url: row.get(2)?,
                        url: row.get(3)?,
                        created_at: row.get(4)?,
                        text: row.get(5)?,
                        region: row.get(6)?,
                        pic_count: row.get(7)?,
                        comments_count: row.get::<_, i64>(10)? as u64,
                        reposts_count: row.get::<_, i64>(11)? as u64,
                        like_count: row.get::<_, i64>(12)? as u64,
                        ..PostDetails::default()
                    };
                    Ok((post, row.get::<_, String>(8)?, row.get::<_, String>(9)?))
                },
            )
            .optional()?;

        let Some((mut post, pics, videos)) = row else {
            return Ok(None);
        };
        post.pic_urls = serde_json::from_str(&pics)?;
        post.video_urls = serde_json::from_str(&videos)?;
        Ok(Some(post))
    }

    // ===== Statistics =====

    fn count_comments(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM comments")
    }

    fn count_comments_by_level(&self, level: CommentLevel) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE level = ?1",
            params![level.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_posts(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(DISTINCT post_id) FROM comments")
    }

    fn count_post_details(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM posts")
    }

    fn count_authors(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(DISTINCT author_id) FROM comments")
    }

    fn get_gender_breakdown(&self) -> StorageResult<HashMap<Gender, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT gender, COUNT(*) FROM comments GROUP BY gender")?;

        let mut breakdown = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (gender, count) = row?;
            let gender = Gender::from_db_string(&gender).unwrap_or(Gender::Unknown);
            *breakdown.entry(gender).or_insert(0) += count as u64;
        }

        Ok(breakdown)
    }
}
