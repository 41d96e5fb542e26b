//! CSV comment sink
//!
//! Writes one row per comment, and optionally one row per post to a second
//! file. A header (preceded by a UTF-8 byte order mark so spreadsheet tools
//! detect the encoding) is only written when a file starts out empty.

use crate::comment::CommentNode;
use crate::post::PostDetails;
use crate::output::traits::{CommentSink, OutputResult};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column layout of the CSV file
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    post_id: String,
    comment_id: &'a str,
    parent_id: &'a str,
    level: &'static str,
    user_id: &'a str,
    screen_name: &'a str,
    created_at: &'a str,
    gender: &'static str,
    source: &'a str,
    text: &'a str,
    like_count: u64,
    reply_count: u32,
}

impl<'a> From<&'a CommentNode> for CsvRow<'a> {
    fn from(node: &'a CommentNode) -> Self {
        let payload = &node.payload;
        Self {
            post_id: node.root_post_id.to_string(),
            comment_id: &node.id,
            parent_id: node.parent_id.as_deref().unwrap_or(""),
            level: node.level.to_db_string(),
            user_id: &payload.author_id,
            screen_name: &payload.author_name,
            created_at: &payload.created_at,
            gender: payload.gender.to_db_string(),
            source: payload.source.as_deref().unwrap_or(""),
            text: &payload.text,
            like_count: payload.like_count,
            reply_count: node.child_count,
        }
    }
}

/// Column layout of the posts CSV file
#[derive(Debug, Serialize)]
struct PostRow<'a> {
    mid: &'a str,
    uid: &'a str,
    text: &'a str,
    created_at: &'a str,
    region: &'a str,
    pic_num: u32,
    pic_urls: String,
    video_urls: String,
    comments_count: u64,
    reposts_count: u64,
    like_count: u64,
    original_url: &'a str,
    user_url: &'a str,
}

/// Separator of URL lists inside one cell
const URL_SEPARATOR: &str = " ";

impl<'a> From<&'a PostDetails> for PostRow<'a> {
    fn from(post: &'a PostDetails) -> Self {
        Self {
            mid: &post.mid,
            uid: &post.author_id,
            text: &post.text,
            created_at: &post.created_at,
            region: post.region.as_deref().unwrap_or(""),
            pic_num: post.pic_count,
            pic_urls: post.pic_urls.join(URL_SEPARATOR),
            video_urls: post.video_urls.join(URL_SEPARATOR),
            comments_count: post.comments_count,
            reposts_count: post.reposts_count,
            like_count: post.like_count,
            original_url: &post.url,
            user_url: &post.author_url,
        }
    }
}

/// Opens a CSV file for writing, adding the BOM and header to empty files
fn open_writer(path: &Path, append: bool) -> OutputResult<csv::Writer<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;

    let is_empty = file.metadata()?.len() == 0;
    if is_empty {
        file.write_all(UTF8_BOM)?;
    }

    Ok(csv::WriterBuilder::new()
        .has_headers(is_empty)
        .from_writer(file))
}

/// Comment sink backed by a CSV file
pub struct CsvSink {
    writer: csv::Writer<File>,
    posts: Option<csv::Writer<File>>,
    rows: u64,
}

impl CsvSink {
    /// Opens the CSV file at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - The CSV file; parent directories are created as needed
    /// * `append` - Keep existing rows instead of truncating the file
    pub fn open(path: &Path, append: bool) -> OutputResult<Self> {
        Ok(Self {
            writer: open_writer(path, append)?,
            posts: None,
            rows: 0,
        })
    }

    /// Also writes post details, to a separate file at `path`
    pub fn with_posts(mut self, path: &Path, append: bool) -> OutputResult<Self> {
        self.posts = Some(open_writer(path, append)?);
        Ok(self)
    }

    /// Comment rows written through this sink
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl CommentSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write_comment(&mut self, node: &CommentNode) -> OutputResult<bool> {
        self.writer.serialize(CsvRow::from(node))?;
        self.rows += 1;
        Ok(true)
    }

    fn write_post(&mut self, post: &PostDetails) -> OutputResult<()> {
        if let Some(posts) = &mut self.posts {
            posts.serialize(PostRow::from(post))?;
        }
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        if let Some(posts) = &mut self.posts {
            posts.flush()?;
        }
        Ok(())
    }
}
