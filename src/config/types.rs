use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Weibo-Threads
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub request: RequestConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub input: InputConfig,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Comments requested per page (`count` parameter)
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Pause after every this many emitted comments
    #[serde(rename = "pacing-interval")]
    pub pacing_interval: u64,

    /// Lower bound of the pacing pause (milliseconds)
    #[serde(rename = "pacing-min-delay-ms")]
    pub pacing_min_delay_ms: u64,

    /// Upper bound of the pacing pause (milliseconds)
    #[serde(rename = "pacing-max-delay-ms")]
    pub pacing_max_delay_ms: u64,

    /// Shortest pause between two posts of a batch (milliseconds)
    #[serde(rename = "post-pause-min-ms")]
    pub post_pause_min_ms: u64,

    /// Longest pause between two posts of a batch (milliseconds)
    #[serde(rename = "post-pause-max-ms")]
    pub post_pause_max_ms: u64,

    /// Fetch each post's text, counters and media before its comments
    #[serde(rename = "fetch-post-details")]
    pub fetch_post_details: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            pacing_interval: 100,
            pacing_min_delay_ms: 5_000,
            pacing_max_delay_ms: 10_000,
            post_pause_min_ms: 1_000,
            post_pause_max_ms: 5_000,
            fetch_post_details: true,
        }
    }
}

impl CrawlerConfig {
    pub fn pacing_delay_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.pacing_min_delay_ms),
            Duration::from_millis(self.pacing_max_delay_ms),
        )
    }

    pub fn post_pause_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.post_pause_min_ms),
            Duration::from_millis(self.post_pause_max_ms),
        )
    }
}

/// Retry policy for failed page requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per page, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each retry
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,

    /// Cap on any single retry delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 2_000,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

/// HTTP request configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Scheme and host of the comment API
    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// JSON object of extra headers (cookie, x-xsrf-token, ...)
    #[serde(rename = "headers-file")]
    pub headers_file: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    pub locale: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://weibo.com".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            headers_file: None,
            timeout_secs: 30,
            locale: "zh-CN".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV file comments are appended to
    #[serde(rename = "csv-path", default)]
    pub csv_path: Option<String>,

    /// Path to the SQLite database file
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,

    /// Path to the CSV file post details are appended to
    #[serde(rename = "posts-csv-path", default)]
    pub posts_csv_path: Option<String>,

    /// Append to an existing CSV file instead of truncating it
    #[serde(default = "default_append")]
    pub append: bool,
}

fn default_append() -> bool {
    true
}

/// Posts to crawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputConfig {
    /// File with one post URL per line
    #[serde(rename = "urls-file", default)]
    pub urls_file: Option<String>,

    /// Post URLs listed inline
    #[serde(default)]
    pub urls: Vec<String>,
}
