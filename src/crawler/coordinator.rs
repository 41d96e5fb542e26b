//! Crawler coordinator - batch crawl orchestration
//!
//! This module contains the loop that crawls a list of posts one after
//! another, including:
//! - Resolving post URLs to message IDs before any request is made
//! - Fetching post details
//! - Driving one comment traversal per post
//! - Handing every comment to the configured sinks
//! - Pausing between posts
//! - Recording per-post failures without stopping the batch

use crate::comment::CommentNode;
use crate::config::{Config, CrawlerConfig};
use crate::crawler::api::CommentApi;
use crate::crawler::fetcher::WeiboClient;
use crate::crawler::traversal::{CommentTraversal, TraversalOptions};
use crate::crawler::retry::RetryPolicy;
use crate::output::{open_sinks, CommentSink, CrawlSummary, OutputError, PostFailure};
use crate::post::PostDetails;
use crate::shortcode::{parse_post_url, PostRef};
use crate::state::TraversalStats;
use crate::CrawlError;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Share of a post's crawl time spent pausing before the next post
const POST_PAUSE_RATIO: f64 = 0.1;

/// Computes the pause after a post that took `elapsed` to crawl
///
/// The pause is a tenth of the crawl time, clamped to `[min, max]`.
pub fn post_pause(elapsed: Duration, min: Duration, max: Duration) -> Duration {
    elapsed.mul_f64(POST_PAUSE_RATIO).max(min).min(max.max(min))
}

/// Outcome of crawling one post
struct PostOutcome {
    /// Errors yielded by the traversal; already collected comments are kept
    errors: Vec<CrawlError>,

    /// A sink failure that stops the batch
    sink_error: Option<OutputError>,

    /// Set when pages or comments were dropped without an error
    incomplete: Option<String>,
}

impl PostOutcome {
    fn stopped(e: OutputError) -> Self {
        Self {
            errors: Vec::new(),
            sink_error: Some(e),
            incomplete: None,
        }
    }
}

/// Describes what a traversal dropped, if anything
fn incomplete_message(stats: &TraversalStats) -> Option<String> {
    stats.is_lossy().then(|| {
        format!(
            "incomplete: {} pages skipped, {} comments dropped, {} branches stalled",
            stats.pages_skipped, stats.items_skipped, stats.stalled_branches
        )
    })
}

/// Main batch crawl structure
pub struct Coordinator<'a, A: CommentApi + ?Sized> {
    api: &'a A,
    options: TraversalOptions,
    post_pause: (Duration, Duration),
    fetch_details: bool,
    sinks: Vec<Box<dyn CommentSink>>,
    summary: CrawlSummary,
}

impl<'a, A: CommentApi + ?Sized> Coordinator<'a, A> {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `api` - The comment source
    /// * `config` - The crawler configuration
    /// * `sinks` - Destinations for collected comments
    pub fn new(api: &'a A, config: &Config, sinks: Vec<Box<dyn CommentSink>>) -> Self {
        Self::with_options(
            api,
            TraversalOptions::from_config(config),
            &config.crawler,
            sinks,
        )
    }

    /// Creates a coordinator with explicit traversal options
    pub fn with_options(
        api: &'a A,
        options: TraversalOptions,
        crawler: &CrawlerConfig,
        sinks: Vec<Box<dyn CommentSink>>,
    ) -> Self {
        Self {
            api,
            options,
            post_pause: crawler.post_pause_range(),
            fetch_details: crawler.fetch_post_details,
            sinks,
            summary: CrawlSummary::new(),
        }
    }

    /// Crawls every post in `urls`, in order
    ///
    /// A post that fails, or whose comments came back incomplete, is logged
    /// and recorded in the summary; the batch moves on to the next post. Only
    /// a sink failure stops the batch.
    pub async fn run(&mut self, urls: &[String]) -> Result<CrawlSummary, CrawlError> {
        info!("Starting crawl of {} posts", urls.len());
        let start_time = Instant::now();

        for (index, url) in urls.iter().enumerate() {
            info!("[{}/{}] Crawling {}", index + 1, urls.len(), url);
            self.summary.posts_attempted += 1;

            let post_start = Instant::now();
            let outcome = self.crawl_post(url).await;
            let flushed = self.flush_sinks();

            match outcome {
                Ok(outcome) => {
                    if let Some(e) = outcome.sink_error {
                        return self.abort(e.into());
                    }
                    if outcome.errors.is_empty() && outcome.incomplete.is_none() {
                        self.summary.posts_completed += 1;
                    }
                    for e in outcome.errors {
                        self.record_failure(url, &e);
                    }
                    if let Some(message) = outcome.incomplete {
                        warn!("Post {} {}", url, message);
                        self.summary.failures.push(PostFailure {
                            url: url.to_string(),
                            message,
                        });
                    }
                }
                Err(e) => self.record_failure(url, &e),
            }

            if let Err(e) = flushed {
                return self.abort(e.into());
            }

            if index + 1 < urls.len() {
                let (min, max) = self.post_pause;
                let pause = post_pause(post_start.elapsed(), min, max);
                debug!("Pausing {:.2}s before the next post", pause.as_secs_f64());
                tokio::time::sleep(pause).await;
            }
        }

        self.summary.duration = start_time.elapsed();
        self.finish_sinks()?;

        info!(
            "Crawl complete: {} comments from {}/{} posts in {:.1}s",
            self.summary.total_comments(),
            self.summary.posts_completed,
            self.summary.posts_attempted,
            self.summary.duration.as_secs_f64()
        );

        Ok(self.summary.clone())
    }

    /// Summary of the posts crawled so far
    pub fn summary(&self) -> &CrawlSummary {
        &self.summary
    }

    /// Crawls the comments of a single post
    ///
    /// URL and short code errors are returned before any request is made.
    async fn crawl_post(&mut self, url: &str) -> Result<PostOutcome, CrawlError> {
        let post = parse_post_url(url)?;

        match self.api.screen_name(&post.author_uid).await {
            Ok(Some(name)) => info!("Post {} by {} ({})", post.mid, name, post.author_uid),
            Ok(None) => info!("Post {} by {}", post.mid, post.author_uid),
            Err(e) => warn!("Could not look up author {}: {}", post.author_uid, e),
        }

        if self.fetch_details {
            if let Some(details) = self.fetch_post_details(&post).await {
                if let Err(e) = self.write_post(&details) {
                    return Ok(PostOutcome::stopped(e));
                }
            }
        }

        let options = self.options.clone().with_author(post.author_uid.clone());
        let mut traversal = CommentTraversal::new(self.api, post.mid, options);

        let mut errors = Vec::new();
        let mut sink_error = None;

        while let Some(item) = traversal.next().await {
            match item {
                Ok(node) => {
                    if let Err(e) = self.write(&node) {
                        sink_error = Some(e);
                        break;
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        let stats = traversal.stats();
        self.summary.root_comments += stats.root_comments;
        self.summary.child_comments += stats.child_comments;
        self.summary.pages_skipped += stats.pages_skipped;
        self.summary.items_skipped += stats.items_skipped;
        self.summary.stalled_branches += stats.stalled_branches;
        self.summary.failed_branches += stats.failed_branches;

        info!(
            "Post {}: {} root and {} child comments over {} pages",
            post.mid, stats.root_comments, stats.child_comments, stats.pages_fetched
        );

        Ok(PostOutcome {
            errors,
            sink_error,
            incomplete: incomplete_message(stats),
        })
    }

    /// Fetches the details of a post under the retry policy
    ///
    /// A failure is logged and counted; the comments are crawled regardless.
    async fn fetch_post_details(&mut self, post: &PostRef) -> Option<PostDetails> {
        let api = self.api;
        let retry: &RetryPolicy = &self.options.retry;
        let label = format!("Details of post {}", post.mid);

        let result = retry.run(&label, move || api.post_details(post)).await;
        match result {
            Ok(details) => details,
            Err(e) => {
                warn!("Could not fetch details of post {}: {}", post.mid, e);
                self.summary.details_failed += 1;
                None
            }
        }
    }

    /// Hands one comment to every sink
    fn write(&mut self, node: &CommentNode) -> Result<(), OutputError> {
        for sink in &mut self.sinks {
            if !sink.write_comment(node)? {
                debug!("{} sink already holds comment {}", sink.name(), node.id);
            }
        }
        Ok(())
    }

    fn write_post(&mut self, details: &PostDetails) -> Result<(), OutputError> {
        for sink in &mut self.sinks {
            sink.write_post(details)?;
        }
        Ok(())
    }

    fn flush_sinks(&mut self) -> Result<(), OutputError> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }

    fn finish_sinks(&mut self) -> Result<(), OutputError> {
        for sink in &mut self.sinks {
            sink.finish(&self.summary)?;
        }
        Ok(())
    }

    fn record_failure(&mut self, url: &str, e: &CrawlError) {
        error!("Post {} failed: {}", url, e);
        self.summary.failures.push(PostFailure {
            url: url.to_string(),
            message: e.to_string(),
        });
    }

    /// Stops the batch after a sink failure, recording what was collected
    fn abort(&mut self, e: CrawlError) -> Result<CrawlSummary, CrawlError> {
        error!("Stopping crawl: {}", e);
        self.summary.failures.push(PostFailure {
            url: String::new(),
            message: e.to_string(),
        });
        if let Err(finish_err) = self.finish_sinks() {
            warn!("Failed to finalize output: {}", finish_err);
        }
        Err(e)
    }
}

/// Runs a batch crawl against the Weibo API
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, recorded on the run
/// * `urls` - Post URLs to crawl, in order
/// * `fresh` - Truncate the CSV output before writing
///
/// # Example
///
/// ```no_run
/// use weibo_threads::config::{collect_post_urls, load_config_with_hash};
/// use weibo_threads::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let urls = collect_post_urls(&config)?;
/// let summary = run_crawl(&config, &hash, &urls, false).await?;
/// println!("{} comments", summary.total_comments());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    config_hash: &str,
    urls: &[String],
    fresh: bool,
) -> Result<CrawlSummary, CrawlError> {
    let client = WeiboClient::new(&config.request, config.crawler.page_size)?;
    let sinks = open_sinks(&config.output, config_hash, fresh)?;

    let mut coordinator = Coordinator::new(&client, config, sinks);
    coordinator.run(urls).await
}
