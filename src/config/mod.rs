//! Configuration module for Weibo-Threads
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! as well as the auxiliary header and URL list files they point to.
//!
//! # Example
//!
//! ```no_run
//! use weibo_threads::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Pausing every {} comments", config.crawler.pacing_interval);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, InputConfig, OutputConfig, RequestConfig, RetryConfig,
};

// Re-export parser functions
pub use parser::{
    collect_post_urls, compute_config_hash, load_config, load_config_with_hash, load_headers,
    load_url_list,
};
