//! Output module for writing collected comments
//!
//! This module handles:
//! - Writing comments to CSV files
//! - Persisting comments and run records to SQLite
//! - Reporting collection statistics

mod csv_output;
pub mod stats;
mod store_output;
mod traits;

pub use csv_output::CsvSink;
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use store_output::StoreSink;
pub use traits::{CommentSink, CrawlSummary, OutputError, OutputResult, PostFailure};

use crate::config::OutputConfig;
use crate::storage::open_storage;
use std::path::Path;
use tracing::info;

/// Opens every sink named by the output configuration
///
/// # Arguments
///
/// * `config` - The output section of the configuration
/// * `config_hash` - Hash recorded on the database run
/// * `fresh` - Truncate the CSV file even when the configuration appends
pub fn open_sinks(
    config: &OutputConfig,
    config_hash: &str,
    fresh: bool,
) -> OutputResult<Vec<Box<dyn CommentSink>>> {
    let mut sinks: Vec<Box<dyn CommentSink>> = Vec::new();

    if let Some(path) = config.csv_path.as_deref().map(Path::new) {
        let append = config.append && !fresh;
        info!(
            "Writing CSV to {} ({})",
            path.display(),
            if append { "append" } else { "truncate" }
        );
        let mut sink = CsvSink::open(path, append)?;
        if let Some(posts) = config.posts_csv_path.as_deref().map(Path::new) {
            info!("Writing post details to {}", posts.display());
            sink = sink.with_posts(posts, append)?;
        }
        sinks.push(Box::new(sink));
    }

    if let Some(path) = config.database_path.as_deref().map(Path::new) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!("Storing comments in {}", path.display());
        let storage = open_storage(path)?;
        sinks.push(Box::new(StoreSink::new(storage, config_hash)?));
    }

    Ok(sinks)
}
