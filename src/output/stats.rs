//! Statistics generation from the comment database
//!
//! This module provides functionality for extracting and displaying
//! collection statistics from the storage layer.

use crate::comment::{CommentLevel, Gender};
use crate::storage::{RunRecord, Storage};
use crate::CrawlError;
use std::collections::HashMap;

/// Collection statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of stored comments
    pub total_comments: u64,

    /// Number of root comments
    pub root_comments: u64,

    /// Number of child comments
    pub child_comments: u64,

    /// Number of posts with at least one comment
    pub posts: u64,

    /// Number of posts with stored details
    pub post_details: u64,

    /// Number of distinct comment authors
    pub authors: u64,

    /// Comment count per author gender
    pub genders: HashMap<Gender, u64>,

    /// The most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, CrawlError> {
    Ok(CrawlStatistics {
        total_comments: storage.count_comments()?,
        root_comments: storage.count_comments_by_level(CommentLevel::Root)?,
        child_comments: storage.count_comments_by_level(CommentLevel::Child)?,
        posts: storage.count_posts()?,
        post_details: storage.count_post_details()?,
        authors: storage.count_authors()?,
        genders: storage.get_gender_breakdown()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Comment Statistics ===\n");

    println!("Overview:");
    println!("  Posts: {}", stats.posts);
    println!("  Posts with details: {}", stats.post_details);
    println!("  Total comments: {}", stats.total_comments);
    println!("  Root comments: {}", stats.root_comments);
    println!("  Child comments: {}", stats.child_comments);
    println!("  Distinct authors: {}", stats.authors);
    println!();

    if !stats.genders.is_empty() {
        println!("Authors by Gender:");
        for gender in [Gender::Female, Gender::Male, Gender::Unknown] {
            let count = stats.genders.get(&gender).copied().unwrap_or(0);
            let percentage = if stats.total_comments > 0 {
                (count as f64 / stats.total_comments as f64) * 100.0
            } else {
                0.0
            };
            println!("  {:?}: {} ({:.1}%)", gender, count, percentage);
        }
        println!();
    }

    if let Some(run) = &stats.latest_run {
        println!("Latest Run:");
        println!("  ID: {}", run.id);
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Status: {}", run.status.to_db_string());
        println!(
            "  Collected: {} comments from {} posts",
            run.comments_collected, run.posts_crawled
        );
    }
}
