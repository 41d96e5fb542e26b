//! SQLite comment sink
//!
//! Stores comments through the storage layer and records the crawl run they
//! belong to. Comments already stored for the same post are skipped.

use crate::comment::CommentNode;
use crate::post::PostDetails;
use crate::output::traits::{CommentSink, CrawlSummary, OutputResult};
use crate::storage::{SqliteStorage, Storage};
use tracing::debug;

/// Comment sink backed by a SQLite database
pub struct StoreSink {
    storage: SqliteStorage,
    run_id: i64,
    inserted: u64,
    duplicates: u64,
}

impl StoreSink {
    /// Creates a sink that opens a new run in `storage`
    ///
    /// # Arguments
    ///
    /// * `storage` - The database to write to
    /// * `config_hash` - Hash of the configuration, recorded on the run
    pub fn new(mut storage: SqliteStorage, config_hash: &str) -> OutputResult<Self> {
        let run_id = storage.create_run(config_hash)?;
        debug!("Opened run {}", run_id);

        Ok(Self {
            storage,
            run_id,
            inserted: 0,
            duplicates: 0,
        })
    }

    /// ID of the run this sink records into
    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Comments stored for the first time
    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    /// Comments skipped because they were already stored
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Gives access to the underlying storage
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}

impl CommentSink for StoreSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn write_comment(&mut self, node: &CommentNode) -> OutputResult<bool> {
        let is_new = self.storage.insert_comment(node, self.run_id)?;
        if is_new {
            self.inserted += 1;
        } else {
            self.duplicates += 1;
        }
        Ok(is_new)
    }

    fn write_post(&mut self, post: &PostDetails) -> OutputResult<()> {
        if !self.storage.upsert_post(post, self.run_id)? {
            debug!("Refreshed stored details of post {}", post.mid);
        }
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }

    fn finish(&mut self, summary: &CrawlSummary) -> OutputResult<()> {
        if self.duplicates > 0 {
            debug!("Skipped {} already stored comments", self.duplicates);
        }
        self.storage.finish_run(
            self.run_id,
            summary.run_status(),
            summary.posts_completed,
            self.inserted,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::{CommentLevel, CommentPayload, Gender};
    use crate::shortcode::MessageId;
    use crate::storage::RunStatus;

    fn root(id: &str) -> CommentNode {
        CommentNode {
            id: id.to_string(),
            parent_id: None,
            root_post_id: MessageId(1),
            level: CommentLevel::Root,
            child_count: 0,
            payload: CommentPayload {
                author_id: "7".to_string(),
                author_name: "bob".to_string(),
                gender: Gender::Male,
                created_at: "2025-01-01 00:00:00".to_string(),
                text: "hi".to_string(),
                like_count: 0,
                source: Some("北京".to_string()),
            },
        }
    }

    #[test]
    fn test_duplicates_are_counted() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let mut sink = StoreSink::new(storage, "hash").unwrap();

        assert!(sink.write_comment(&root("1")).unwrap());
        assert!(sink.write_comment(&root("2")).unwrap());
        assert!(!sink.write_comment(&root("1")).unwrap());

        assert_eq!(sink.inserted(), 2);
        assert_eq!(sink.duplicates(), 1);
        assert_eq!(sink.storage().count_comments().unwrap(), 2);
    }

    #[test]
    fn test_write_post() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let mut sink = StoreSink::new(storage, "hash").unwrap();

        let post = PostDetails {
            mid: "1".to_string(),
            text: "正文".to_string(),
            like_count: 4,
            ..PostDetails::default()
        };
        sink.write_post(&post).unwrap();
        sink.write_post(&post).unwrap();

        assert_eq!(sink.storage().count_post_details().unwrap(), 1);
        assert_eq!(sink.storage().get_post("1").unwrap().unwrap().like_count, 4);
    }

    #[test]
    fn test_finish_records_run() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let mut sink = StoreSink::new(storage, "abc123").unwrap();
        sink.write_comment(&root("1")).unwrap();

        let mut summary = CrawlSummary::new();
        summary.posts_attempted = 1;
        summary.posts_completed = 1;
        summary.root_comments = 1;
        sink.finish(&summary).unwrap();

        let run = sink.storage().get_run(sink.run_id()).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.config_hash, "abc123");
        assert_eq!(run.posts_crawled, 1);
        assert_eq!(run.comments_collected, 1);
        assert!(run.finished_at.is_some());
    }
}
