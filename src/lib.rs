//! Weibo-Threads: a paced collector for Weibo comment trees
//!
//! This crate decodes Weibo short post codes into numeric message IDs and walks
//! the two-level comment forest of a post through the cursor-paginated comment
//! API, emitting a flat, order-preserving stream of comments.

pub mod comment;
pub mod config;
pub mod crawler;
pub mod output;
pub mod post;
pub mod shortcode;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Weibo-Threads operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid short code: {0}")]
    InvalidShortCode(#[from] ShortCodeError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Failed to fetch {context} page at cursor {cursor}: {source}")]
    PageFetchFailed {
        context: comment::CommentLevel,
        cursor: comment::PageCursor,
        #[source]
        source: crawler::PageError,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse headers file: {0}")]
    Headers(#[from] serde_json::Error),

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Short code decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortCodeError {
    #[error("short code is empty")]
    Empty,

    #[error("character {character:?} at position {position} is not base62")]
    InvalidCharacter { character: char, position: usize },

    #[error("short code {0:?} does not fit in a 64-bit message id")]
    Overflow(String),
}

/// Post URL errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Post URL must end with /<uid>/<short-code>: {0}")]
    MissingSegments(String),
}

/// Result type alias for Weibo-Threads operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use comment::{CommentLevel, CommentNode, CommentPayload, Gender, PageCursor};
pub use config::Config;
pub use shortcode::{decode, parse_post_url, MessageId, PostRef};
pub use state::TraversalState;
