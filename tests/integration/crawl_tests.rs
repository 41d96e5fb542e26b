//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the Weibo comment API and
//! exercise the HTTP client, the traversal and the batch crawl end-to-end.

use serde_json::json;
use std::time::Duration;
use weibo_threads::comment::{CommentLevel, CommentNode, PageCursor};
use weibo_threads::config::{
    Config, CrawlerConfig, InputConfig, OutputConfig, RequestConfig, RetryConfig,
};
use weibo_threads::crawler::{
    CommentApi, CommentTraversal, Coordinator, Pacer, PageError, PageRequest, RetryPolicy,
    TraversalOptions, WeiboClient,
};
use weibo_threads::output::open_sinks;
use weibo_threads::shortcode::parse_post_url;
use weibo_threads::storage::{SqliteStorage, Storage};
use weibo_threads::{CrawlError, MessageId};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMMENTS: &str = "/ajax/statuses/buildComments";
const POST_DETAILS: &str = "/ajax/statuses/show";
const AUTHOR: &str = "2397417584";

/// PmA6E1TGk
const POST_A: u64 = 5153820120452372;

/// Prnn7nRCg
const POST_B: u64 = 5165247015687648;

fn comment(id: &str, replies: u32) -> serde_json::Value {
    json!({
        "id": id.parse::<u64>().unwrap_or(0),
        "idstr": id,
        "created_at": "Tue Mar 04 21:05:11 +0800 2025",
        "user": {"id": 1001, "screen_name": format!("user-{}", id), "gender": "f"},
        "text_raw": format!("comment {}", id),
        "like_counts": 2,
        "total_number": replies,
        "source": "来自上海"
    })
}

fn page(items: Vec<serde_json::Value>, max_id: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ok": 1,
        "data": items,
        "max_id": max_id,
        "total_number": 0
    }))
}

fn client_for(server: &MockServer) -> WeiboClient {
    let request = RequestConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        ..RequestConfig::default()
    };
    WeiboClient::new(&request, 20).expect("Failed to build client")
}

fn options(max_attempts: u32) -> TraversalOptions {
    TraversalOptions {
        author_uid: Some(AUTHOR.to_string()),
        retry: RetryPolicy {
            max_attempts,
            initial_delay: Duration::ZERO,
            backoff_factor: 1.0,
            max_delay: Duration::ZERO,
        },
        pacer: Pacer::new(100, Duration::ZERO, Duration::ZERO),
    }
}

async fn drain(
    traversal: &mut CommentTraversal<'_, WeiboClient>,
) -> Vec<Result<CommentNode, CrawlError>> {
    let mut items = Vec::new();
    while let Some(item) = traversal.next().await {
        items.push(item);
    }
    items
}

/// Mounts a post with two root pages; the first root comment has replies
async fn mount_post(server: &MockServer, post: u64, prefix: &str) {
    let root = format!("{}1", prefix);
    let second_page_cursor = format!("{}00", prefix);

    // Cursor-specific mocks first so they win over the start-page mocks
    Mock::given(method("GET"))
        .and(path(COMMENTS))
        .and(query_param("id", post.to_string()))
        .and(query_param("max_id", second_page_cursor.as_str()))
        .respond_with(page(vec![comment(&format!("{}3", prefix), 0)], json!(0)))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(COMMENTS))
        .and(query_param("id", post.to_string()))
        .and(query_param("fetch_level", "0"))
        .and(query_param("uid", AUTHOR))
        .and(query_param("count", "20"))
        .respond_with(page(
            vec![comment(&root, 2), comment(&format!("{}2", prefix), 0)],
            json!(second_page_cursor.parse::<u64>().unwrap_or(0)),
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(COMMENTS))
        .and(query_param("id", root.as_str()))
        .and(query_param("fetch_level", "1"))
        .respond_with(page(
            vec![comment(&format!("{}11", prefix), 0), comment(&format!("{}12", prefix), 0)],
            json!("0"),
        ))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts the details of a post, looked up by short code
async fn mount_details(server: &MockServer, short_code: &str, post: u64) {
    Mock::given(method("GET"))
        .and(path(POST_DETAILS))
        .and(query_param("id", short_code))
        .and(query_param("isGetLongText", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "idstr": post.to_string(),
            "created_at": "Tue Mar 04 20:00:00 +0800 2025",
            "user": {"id": 2397417584u64, "profile_url": "/u/2397417584"},
            "text_raw": format!("post {}", short_code),
            "region_name": "发布于 北京",
            "pic_num": 1,
            "pic_ids": ["p1"],
            "pic_infos": {"p1": {"original": {"url": "https://wx1.sinaimg.cn/p1.jpg"}}},
            "comments_count": 5,
            "reposts_count": 1,
            "attitudes_count": 9
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_traversal_over_http() {
    let server = MockServer::start().await;
    mount_post(&server, POST_A, "9").await;

    let client = client_for(&server);
    let mut traversal = CommentTraversal::new(&client, MessageId(POST_A), options(1));

    let nodes: Vec<CommentNode> = drain(&mut traversal)
        .await
        .into_iter()
        .map(|r| r.expect("unexpected error"))
        .collect();

    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["91", "911", "912", "92", "93"]);

    assert_eq!(nodes[0].level, CommentLevel::Root);
    assert_eq!(nodes[1].level, CommentLevel::Child);
    assert_eq!(nodes[1].parent_id.as_deref(), Some("91"));
    assert_eq!(nodes[1].payload.created_at, "2025-03-04 21:05:11");
    assert_eq!(nodes[1].payload.source.as_deref(), Some("上海"));
    assert!(nodes.iter().all(|n| n.root_post_id == MessageId(POST_A)));

    assert_eq!(traversal.stats().pages_fetched, 3);
}

#[tokio::test]
async fn test_server_error_retried_then_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(COMMENTS))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut traversal = CommentTraversal::new(&client, MessageId(POST_A), options(3));

    let items = drain(&mut traversal).await;
    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(CrawlError::PageFetchFailed {
            context,
            cursor,
            source,
        }) => {
            assert_eq!(*context, CommentLevel::Root);
            assert!(cursor.is_start());
            assert_eq!(*source, PageError::Status(500));
        }
        other => panic!("expected a root page failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_login_page_is_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(COMMENTS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Sina Visitor System</body></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .fetch_page(&PageRequest {
            target_id: POST_A.to_string(),
            level: CommentLevel::Root,
            cursor: PageCursor::start(),
            author_uid: None,
        })
        .await;

    assert!(matches!(result, Err(PageError::MalformedBody(_))));
}

#[tokio::test]
async fn test_unexpected_shape_is_skipped_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(COMMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": 0, "msg": "busy"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut traversal = CommentTraversal::new(&client, MessageId(POST_A), options(3));

    assert!(drain(&mut traversal).await.is_empty());
    assert_eq!(traversal.stats().pages_skipped, 1);
}

#[tokio::test]
async fn test_malformed_item_keeps_following_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(COMMENTS))
        .and(query_param("max_id", "77"))
        .respond_with(page(vec![comment("2", 0)], json!(0)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(COMMENTS))
        .and(query_param("fetch_level", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"data":[{"idstr":"bad"}],"max_id":77}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut traversal = CommentTraversal::new(&client, MessageId(POST_A), options(1));

    let ids: Vec<String> = drain(&mut traversal)
        .await
        .into_iter()
        .map(|r| r.expect("unexpected error").id)
        .collect();

    assert_eq!(ids, vec!["2"]);
    assert_eq!(traversal.stats().items_skipped, 1);
    assert!(traversal.stats().is_lossy());
}

#[tokio::test]
async fn test_cursor_that_never_advances_terminates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(COMMENTS))
        .respond_with(page(vec![], json!(42)))
        .expect(1..=2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut traversal = CommentTraversal::new(&client, MessageId(POST_A), options(1));

    let items = tokio::time::timeout(Duration::from_secs(5), drain(&mut traversal))
        .await
        .expect("traversal did not terminate");
    assert!(items.is_empty());
    assert_eq!(traversal.stats().stalled_branches, 1);
}

#[tokio::test]
async fn test_fetch_post_details() {
    let server = MockServer::start().await;
    mount_details(&server, "PmA6E1TGk", POST_A).await;

    let client = client_for(&server);
    let post = parse_post_url(&format!("https://weibo.com/{}/PmA6E1TGk", AUTHOR)).unwrap();
    let details = client.fetch_post(&post).await.unwrap();

    assert_eq!(details.mid, POST_A.to_string());
    assert_eq!(details.author_url, "https://www.weibo.com/u/2397417584");
    assert_eq!(details.created_at, "2025-03-04 20:00:00");
    assert_eq!(details.region.as_deref(), Some("北京"));
    assert_eq!(details.pic_urls, vec!["https://wx1.sinaimg.cn/p1.jpg"]);
    assert_eq!(details.like_count, 9);
    assert_eq!(details.url, post.url);
}

#[tokio::test]
async fn test_fetch_screen_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ajax/profile/info"))
        .and(query_param("custom", AUTHOR))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": 1,
            "data": {"user": {"id": 2397417584u64, "screen_name": "新闻"}}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let name = client.fetch_screen_name(AUTHOR).await.unwrap();
    assert_eq!(name, "新闻");
}

#[tokio::test]
async fn test_batch_crawl_writes_csv_and_database() {
    let server = MockServer::start().await;
    mount_post(&server, POST_A, "5").await;
    mount_post(&server, POST_B, "7").await;
    mount_details(&server, "PmA6E1TGk", POST_A).await;
    mount_details(&server, "Prnn7nRCg", POST_B).await;

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("review_data.csv");
    let posts_path = dir.path().join("meta_data.csv");
    let db_path = dir.path().join("comments.db");

    let config = Config {
        crawler: CrawlerConfig {
            pacing_min_delay_ms: 0,
            pacing_max_delay_ms: 0,
            post_pause_min_ms: 0,
            post_pause_max_ms: 0,
            ..CrawlerConfig::default()
        },
        retry: RetryConfig {
            max_attempts: 1,
            initial_delay_ms: 0,
            backoff_factor: 1.0,
            max_delay_ms: 0,
        },
        request: RequestConfig {
            base_url: server.uri(),
            ..RequestConfig::default()
        },
        output: OutputConfig {
            csv_path: Some(csv_path.display().to_string()),
            database_path: Some(db_path.display().to_string()),
            posts_csv_path: Some(posts_path.display().to_string()),
            append: true,
        },
        input: InputConfig::default(),
    };

    let client = client_for(&server);
    let sinks = open_sinks(&config.output, "test-hash", false).unwrap();
    let mut coordinator = Coordinator::new(&client, &config, sinks);

    let urls = vec![
        format!("https://weibo.com/{}/PmA6E1TGk", AUTHOR),
        format!("https://weibo.com/{}/Prnn7nRCg?type=comment", AUTHOR),
    ];
    let summary = coordinator.run(&urls).await.expect("crawl failed");

    assert_eq!(summary.posts_completed, 2);
    assert_eq!(summary.root_comments, 6);
    assert_eq!(summary.child_comments, 4);
    assert_eq!(summary.details_failed, 0);
    assert!(summary.failures.is_empty());

    // CSV: one header and ten rows
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
    assert_eq!(lines.len(), 11);
    assert!(lines[0].starts_with("post_id,comment_id,parent_id,level"));
    assert!(lines[2].starts_with(&format!("{},511,51,child,", POST_A)));

    // Posts CSV: one header and one row per post
    let posts_csv = std::fs::read_to_string(&posts_path).unwrap();
    let lines: Vec<&str> = posts_csv.trim_start_matches('\u{feff}').lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with(&format!("{},2397417584,post PmA6E1TGk,", POST_A)));

    // Database: both posts and a completed run
    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_posts().unwrap(), 2);
    assert_eq!(storage.count_post_details().unwrap(), 2);
    let details = storage.get_post(&POST_B.to_string()).unwrap().unwrap();
    assert_eq!(details.text, "post Prnn7nRCg");
    assert_eq!(details.comments_count, 5);
    assert_eq!(storage.count_comments().unwrap(), 10);

    let records = storage.get_comments_for_post(MessageId(POST_B)).unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.comment_id.as_str()).collect();
    assert_eq!(ids, vec!["71", "711", "712", "72", "73"]);

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.comments_collected, 10);
}
