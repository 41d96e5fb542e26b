//! Comment tree traversal
//!
//! A [`CommentTraversal`] walks the two-level comment forest of one post.
//! Root pages are followed cursor by cursor; a root comment that reports
//! replies opens a child branch which is drained, page by page, before the
//! next root comment is handed out. The open branch lives in the traversal
//! object instead of on the call stack.

use crate::comment::{CommentLevel, CommentNode, PageCursor};
use crate::config::Config;
use crate::crawler::api::{CommentApi, CommentPage, PageError, PageRequest};
use crate::crawler::pacing::Pacer;
use crate::crawler::retry::RetryPolicy;
use crate::shortcode::MessageId;
use crate::state::{TraversalState, TraversalStats};
use crate::CrawlError;
use futures_util::Stream;
use std::collections::{HashSet, VecDeque};

/// Per-traversal settings
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    /// UID of the post author, passed to the API when known
    pub author_uid: Option<String>,

    pub retry: RetryPolicy,
    pub pacer: Pacer,
}

impl TraversalOptions {
    /// Builds options from the crawler and retry configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            author_uid: None,
            retry: RetryPolicy::from(&config.retry),
            pacer: Pacer::from_config(&config.crawler),
        }
    }

    pub fn with_author(mut self, uid: impl Into<String>) -> Self {
        self.author_uid = Some(uid.into());
        self
    }
}

/// Replies of one root comment still being drained
#[derive(Debug)]
struct ChildBranch {
    parent_id: String,
    buffer: VecDeque<CommentNode>,

    /// Cursor of the next page; None once the last page was fetched
    next_cursor: Option<PageCursor>,
}

type VisitKey = (CommentLevel, String, PageCursor);

fn visit_key(request: &PageRequest) -> VisitKey {
    (request.level, request.target_id.clone(), request.cursor.clone())
}

/// Outcome of one page request after retries
enum Fetched {
    Page(CommentPage),
    Skipped,
    Failed(CrawlError),
}

/// Single-pass traversal over the comments of one post
pub struct CommentTraversal<'a, A: CommentApi + ?Sized> {
    api: &'a A,
    post_id: MessageId,
    author_uid: Option<String>,
    retry: RetryPolicy,
    pacer: Pacer,
    state: TraversalState,

    /// Root comments of the current page not yet handed out
    root_buffer: VecDeque<CommentNode>,

    /// Cursor of the next root page; None once the last page was fetched
    root_cursor: Option<PageCursor>,

    child: Option<ChildBranch>,

    /// Every (level, target, cursor) requested so far
    visited: HashSet<VisitKey>,

    stats: TraversalStats,
}

impl<'a, A: CommentApi + ?Sized> CommentTraversal<'a, A> {
    /// Creates a traversal positioned before the first root page
    ///
    /// No request is issued until [`next`](Self::next) is called.
    pub fn new(api: &'a A, post_id: MessageId, options: TraversalOptions) -> Self {
        Self {
            api,
            post_id,
            author_uid: options.author_uid,
            retry: options.retry,
            pacer: options.pacer,
            state: TraversalState::FetchingRootPage,
            root_buffer: VecDeque::new(),
            root_cursor: Some(PageCursor::start()),
            child: None,
            visited: HashSet::new(),
            stats: TraversalStats::default(),
        }
    }

    pub fn post_id(&self) -> MessageId {
        self.post_id
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    pub fn stats(&self) -> &TraversalStats {
        &self.stats
    }

    /// Returns the next comment, or None once the traversal is done
    ///
    /// A `PageFetchFailed` error for a child page abandons only that branch;
    /// calling `next` again continues with the following root comment. A
    /// root page failure ends the traversal.
    pub async fn next(&mut self) -> Option<Result<CommentNode, CrawlError>> {
        loop {
            if self.state.is_terminal() {
                return None;
            }

            if self.child.is_some() {
                if let Some(item) = self.advance_child().await {
                    return Some(item);
                }
                continue;
            }

            if let Some(node) = self.root_buffer.pop_front() {
                if node.has_children() {
                    self.open_child_branch(node.id.clone());
                }
                return Some(Ok(self.emit(node).await));
            }

            let Some(cursor) = self.root_cursor.take() else {
                self.transition(TraversalState::Done);
                return None;
            };

            match self
                .fetch(CommentLevel::Root, self.post_id.to_string(), cursor)
                .await
            {
                Fetched::Page(page) => {
                    let post_id = self.post_id;
                    self.root_cursor = page.next_cursor;
                    self.root_buffer.extend(page.items.into_iter().map(|raw| {
                        CommentNode::from_raw(raw, post_id, CommentLevel::Root, None)
                    }));
                }
                Fetched::Skipped => {}
                Fetched::Failed(err) => {
                    self.stats.failed_branches += 1;
                    self.transition(TraversalState::Done);
                    return Some(Err(err));
                }
            }
        }
    }

    /// Converts the traversal into a stream of comments
    pub fn into_stream(self) -> impl Stream<Item = Result<CommentNode, CrawlError>> + 'a
    where
        A: 'a,
    {
        futures_util::stream::unfold(self, |mut traversal| async move {
            traversal.next().await.map(|item| (item, traversal))
        })
    }

    /// Makes progress on the open child branch
    ///
    /// Returns an item to hand out, or None when the caller should loop.
    async fn advance_child(&mut self) -> Option<Result<CommentNode, CrawlError>> {
        let branch = self.child.as_mut()?;

        if let Some(node) = branch.buffer.pop_front() {
            return Some(Ok(self.emit(node).await));
        }

        let Some(cursor) = branch.next_cursor.take() else {
            self.close_child_branch();
            return None;
        };
        let parent_id = branch.parent_id.clone();

        match self.fetch(CommentLevel::Child, parent_id.clone(), cursor).await {
            Fetched::Page(page) => {
                let post_id = self.post_id;
                if let Some(branch) = self.child.as_mut() {
                    branch.next_cursor = page.next_cursor;
                    branch.buffer.extend(page.items.into_iter().map(|raw| {
                        CommentNode::from_raw(
                            raw,
                            post_id,
                            CommentLevel::Child,
                            Some(parent_id.clone()),
                        )
                    }));
                }
                None
            }
            Fetched::Skipped => {
                self.close_child_branch();
                None
            }
            Fetched::Failed(err) => {
                tracing::error!("Abandoning replies of comment {}: {}", parent_id, err);
                self.stats.failed_branches += 1;
                self.close_child_branch();
                Some(Err(err))
            }
        }
    }

    /// Requests one page under the retry policy
    async fn fetch(
        &mut self,
        level: CommentLevel,
        target_id: String,
        cursor: PageCursor,
    ) -> Fetched {
        let request = PageRequest {
            target_id,
            level,
            cursor,
            author_uid: self.author_uid.clone(),
        };
        let label = format!(
            "{} page of {} at cursor {}",
            level, request.target_id, request.cursor
        );

        let api = self.api;
        let req = &request;
        match self.retry.run(&label, move || api.fetch_page(req)).await {
            Ok(mut page) => {
                self.stats.pages_fetched += 1;
                if page.skipped_items > 0 {
                    tracing::warn!(
                        "Dropped {} malformed comments from {}",
                        page.skipped_items,
                        label
                    );
                    self.stats.items_skipped += page.skipped_items as u64;
                }
                if self.is_stalled(&request, &page) {
                    tracing::warn!("Cursor stopped advancing on {}; ending branch", label);
                    self.stats.stalled_branches += 1;
                    page.next_cursor = None;
                }
                self.visited.insert(visit_key(&request));
                Fetched::Page(page)
            }
            Err(e @ PageError::UnexpectedResponseShape(_)) => {
                tracing::warn!("Skipping {}: {}", label, e);
                self.stats.pages_skipped += 1;
                Fetched::Skipped
            }
            Err(source) => Fetched::Failed(CrawlError::PageFetchFailed {
                context: level,
                cursor: request.cursor.clone(),
                source,
            }),
        }
    }

    /// Returns true if following `page` would not make progress
    ///
    /// That is the case when its cursor points at a page this traversal
    /// already requested, or when an empty page still claims a successor.
    fn is_stalled(&self, request: &PageRequest, page: &CommentPage) -> bool {
        let Some(next) = &page.next_cursor else {
            return false;
        };
        let empty = page.items.is_empty() && page.skipped_items == 0;
        empty
            || *next == request.cursor
            || self
                .visited
                .contains(&(request.level, request.target_id.clone(), next.clone()))
    }

    /// Counts and paces a comment on its way out
    async fn emit(&mut self, node: CommentNode) -> CommentNode {
        self.stats.record_comment(node.level);
        if self.pacer.tick().await {
            self.stats.pauses += 1;
        }
        node
    }

    fn open_child_branch(&mut self, parent_id: String) {
        self.child = Some(ChildBranch {
            parent_id,
            buffer: VecDeque::new(),
            next_cursor: Some(PageCursor::start()),
        });
        self.transition(TraversalState::FetchingChildPage);
    }

    fn close_child_branch(&mut self) {
        self.child = None;
        self.transition(TraversalState::FetchingRootPage);
    }

    fn transition(&mut self, next: TraversalState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid traversal transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!("Traversal of {}: {} -> {}", self.post_id, self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::RawComment;
    use crate::crawler::api::parse_comment_page;
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    type PageKey = (String, u8, Option<String>);

    /// In-memory comment API keyed by (target, level, cursor)
    #[derive(Default)]
    struct StubApi {
        responses: HashMap<PageKey, Result<CommentPage, PageError>>,
        calls: Mutex<Vec<PageRequest>>,
    }

    impl StubApi {
        fn page(
            mut self,
            target: &str,
            level: CommentLevel,
            cursor: Option<&str>,
            items: Vec<RawComment>,
            next: Option<&str>,
        ) -> Self {
            self.responses.insert(
                key(target, level, cursor),
                Ok(CommentPage {
                    items,
                    next_cursor: next.map(PageCursor::after),
                    skipped_items: 0,
                }),
            );
            self
        }

        /// Registers a raw response body, parsed the way the HTTP client parses it
        fn body(
            mut self,
            target: &str,
            level: CommentLevel,
            cursor: Option<&str>,
            body: &str,
        ) -> Self {
            self.responses
                .insert(key(target, level, cursor), parse_comment_page(body));
            self
        }

        fn error(
            mut self,
            target: &str,
            level: CommentLevel,
            cursor: Option<&str>,
            error: PageError,
        ) -> Self {
            self.responses.insert(key(target, level, cursor), Err(error));
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn calls_for(&self, target: &str, level: CommentLevel) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.target_id == target && r.level == level)
                .count()
        }
    }

    #[async_trait]
    impl CommentApi for StubApi {
        async fn fetch_page(&self, request: &PageRequest) -> Result<CommentPage, PageError> {
            self.calls.lock().unwrap().push(request.clone());
            let key = key(
                &request.target_id,
                request.level,
                request.cursor.max_id(),
            );
            self.responses
                .get(&key)
                .cloned()
                .unwrap_or(Err(PageError::Status(404)))
        }
    }

    fn key(target: &str, level: CommentLevel, cursor: Option<&str>) -> PageKey {
        (target.to_string(), level.fetch_level(), cursor.map(str::to_string))
    }

    fn raw(id: &str, replies: u32) -> RawComment {
        serde_json::from_value(json!({
            "idstr": id,
            "created_at": "Tue Mar 04 21:05:11 +0800 2025",
            "user": {"id": 42, "screen_name": "user", "gender": "m"},
            "text_raw": format!("comment {}", id),
            "like_counts": 1,
            "total_number": replies
        }))
        .unwrap()
    }

    fn options(max_attempts: u32) -> TraversalOptions {
        TraversalOptions {
            author_uid: Some("2397417584".to_string()),
            retry: RetryPolicy {
                max_attempts,
                initial_delay: Duration::ZERO,
                backoff_factor: 1.0,
                max_delay: Duration::ZERO,
            },
            pacer: Pacer::new(100, Duration::ZERO, Duration::ZERO),
        }
    }

    const POST: u64 = 5153820120452372;

    fn post() -> String {
        POST.to_string()
    }

    /// Two root pages; r1 has two child pages, r3 one, r2 none
    fn tree_api() -> StubApi {
        StubApi::default()
            .page(&post(), CommentLevel::Root, None, vec![raw("r1", 3), raw("r2", 0)], Some("p2"))
            .page(&post(), CommentLevel::Root, Some("p2"), vec![raw("r3", 1)], None)
            .page("r1", CommentLevel::Child, None, vec![raw("c11", 0), raw("c12", 0)], Some("c1p2"))
            .page("r1", CommentLevel::Child, Some("c1p2"), vec![raw("c13", 0)], None)
            .page("r3", CommentLevel::Child, None, vec![raw("c31", 0)], None)
    }

    async fn drain<A: CommentApi>(
        traversal: &mut CommentTraversal<'_, A>,
    ) -> Vec<Result<CommentNode, CrawlError>> {
        let mut items = Vec::new();
        while let Some(item) = traversal.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_children_drained_before_next_root() {
        let api = tree_api();
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(1));

        let nodes: Vec<CommentNode> = drain(&mut traversal)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

        assert_eq!(ids, vec!["r1", "c11", "c12", "c13", "r2", "r3", "c31"]);
        assert_eq!(api.call_count(), 5);
        assert_eq!(traversal.state(), TraversalState::Done);
    }

    #[tokio::test]
    async fn test_levels_and_parents() {
        let api = tree_api();
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(1));

        for node in drain(&mut traversal).await.into_iter().map(|r| r.unwrap()) {
            assert_eq!(node.root_post_id, MessageId(POST));
            match node.level {
                CommentLevel::Root => {
                    assert!(node.id.starts_with('r'));
                    assert_eq!(node.parent_id, None);
                }
                CommentLevel::Child => {
                    let parent = node.parent_id.as_deref().unwrap();
                    assert_eq!(&node.id[1..2], &parent[1..2]);
                }
            }
        }

        let stats = traversal.stats();
        assert_eq!(stats.root_comments, 3);
        assert_eq!(stats.child_comments, 4);
        assert_eq!(stats.pages_fetched, 5);
        assert_eq!(stats.failed_branches, 0);
    }

    #[tokio::test]
    async fn test_every_node_exactly_once() {
        let api = tree_api();
        let traversal = CommentTraversal::new(&api, MessageId(POST), options(1));

        let mut ids: Vec<String> = traversal
            .into_stream()
            .map(|r| r.unwrap().id)
            .collect()
            .await;
        let total = ids.len();
        ids.sort();
        ids.dedup();

        assert_eq!(total, 7);
        assert_eq!(ids.len(), 7);
    }

    #[tokio::test]
    async fn test_author_uid_and_cursor_sent() {
        let api = tree_api();
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(1));
        drain(&mut traversal).await;

        let calls = api.calls.lock().unwrap();
        assert!(calls.iter().all(|r| r.author_uid.as_deref() == Some("2397417584")));
        assert!(calls[0].cursor.is_start());
        assert_eq!(calls[0].level, CommentLevel::Root);
        assert_eq!(calls[1].target_id, "r1");
        assert_eq!(calls[2].cursor, PageCursor::after("c1p2"));
    }

    #[tokio::test]
    async fn test_single_page_issues_one_request() {
        let api = StubApi::default().page(
            &post(),
            CommentLevel::Root,
            None,
            vec![raw("r1", 0), raw("r2", 0)],
            None,
        );
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(3));

        let items = drain(&mut traversal).await;
        assert_eq!(items.len(), 2);
        assert_eq!(api.call_count(), 1);
        assert_eq!(traversal.state(), TraversalState::Done);

        assert!(traversal.next().await.is_none());
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_request_before_first_next() {
        let api = tree_api();
        let traversal = CommentTraversal::new(&api, MessageId(POST), options(1));

        assert_eq!(traversal.state(), TraversalState::FetchingRootPage);
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_state_follows_branch() {
        let api = tree_api();
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(1));

        let first = traversal.next().await.unwrap().unwrap();
        assert_eq!(first.id, "r1");
        assert_eq!(traversal.state(), TraversalState::FetchingChildPage);

        for _ in 0..3 {
            traversal.next().await.unwrap().unwrap();
        }
        let r2 = traversal.next().await.unwrap().unwrap();
        assert_eq!(r2.id, "r2");
        assert_eq!(traversal.state(), TraversalState::FetchingRootPage);
    }

    #[tokio::test]
    async fn test_child_failure_keeps_emitted_and_continues() {
        let api = StubApi::default()
            .page(&post(), CommentLevel::Root, None, vec![raw("r1", 5), raw("r2", 0)], None)
            .page("r1", CommentLevel::Child, None, vec![raw("c11", 0)], Some("c1p2"))
            .error("r1", CommentLevel::Child, Some("c1p2"), PageError::Status(500));
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(3));

        let items = drain(&mut traversal).await;
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].as_ref().unwrap().id, "r1");
        assert_eq!(items[1].as_ref().unwrap().id, "c11");
        match &items[2] {
            Err(CrawlError::PageFetchFailed {
                context,
                cursor,
                source,
            }) => {
                assert_eq!(*context, CommentLevel::Child);
                assert_eq!(*cursor, PageCursor::after("c1p2"));
                assert_eq!(*source, PageError::Status(500));
            }
            other => panic!("expected child failure, got {:?}", other),
        }
        assert_eq!(items[3].as_ref().unwrap().id, "r2");

        // three attempts at the failing cursor, one at the first child page
        assert_eq!(api.calls_for("r1", CommentLevel::Child), 4);
        assert_eq!(traversal.stats().failed_branches, 1);
    }

    #[tokio::test]
    async fn test_root_failure_ends_traversal() {
        let api = StubApi::default()
            .page(&post(), CommentLevel::Root, None, vec![raw("r1", 0)], Some("p2"))
            .error(&post(), CommentLevel::Root, Some("p2"), PageError::Transport("reset".into()));
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(2));

        assert_eq!(traversal.next().await.unwrap().unwrap().id, "r1");
        match traversal.next().await {
            Some(Err(CrawlError::PageFetchFailed { context, cursor, .. })) => {
                assert_eq!(context, CommentLevel::Root);
                assert_eq!(cursor, PageCursor::after("p2"));
            }
            other => panic!("expected root failure, got {:?}", other),
        }
        assert!(traversal.next().await.is_none());
        assert_eq!(traversal.state(), TraversalState::Done);
        assert_eq!(api.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unexpected_shape_skips_page() {
        let api = StubApi::default()
            .page(&post(), CommentLevel::Root, None, vec![raw("r1", 2), raw("r2", 0)], None)
            .error(
                "r1",
                CommentLevel::Child,
                None,
                PageError::UnexpectedResponseShape("missing data".into()),
            );
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(3));

        let ids: Vec<String> = drain(&mut traversal)
            .await
            .into_iter()
            .map(|r| r.unwrap().id)
            .collect();

        assert_eq!(ids, vec!["r1", "r2"]);
        assert_eq!(api.calls_for("r1", CommentLevel::Child), 1);
        assert_eq!(traversal.stats().pages_skipped, 1);
    }

    #[tokio::test]
    async fn test_malformed_root_body_is_fetch_failure() {
        let api = StubApi::default().error(
            &post(),
            CommentLevel::Root,
            None,
            PageError::MalformedBody("expected value".into()),
        );
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(1));

        assert!(matches!(
            traversal.next().await,
            Some(Err(CrawlError::PageFetchFailed { .. }))
        ));
        assert!(traversal.next().await.is_none());
    }

    #[tokio::test]
    async fn test_pacing_counts_pauses() {
        let api = tree_api();
        let mut opts = options(1);
        opts.pacer = Pacer::new(2, Duration::ZERO, Duration::ZERO);
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), opts);

        drain(&mut traversal).await;
        assert_eq!(traversal.stats().pauses, 3);
    }

    #[tokio::test]
    async fn test_malformed_item_keeps_following_cursor() {
        let api = StubApi::default()
            .body(
                &post(),
                CommentLevel::Root,
                None,
                r#"{"data": [{"idstr": "bad"}], "max_id": 77}"#,
            )
            .page(&post(), CommentLevel::Root, Some("77"), vec![raw("r2", 0)], None);
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(1));

        let ids: Vec<String> = drain(&mut traversal)
            .await
            .into_iter()
            .map(|r| r.unwrap().id)
            .collect();

        assert_eq!(ids, vec!["r2"]);
        assert_eq!(api.call_count(), 2);
        assert_eq!(traversal.stats().items_skipped, 1);
        assert_eq!(traversal.stats().pages_fetched, 2);
        assert!(traversal.stats().is_lossy());
    }

    #[tokio::test]
    async fn test_repeated_cursor_ends_branch() {
        let api = StubApi::default()
            .page(&post(), CommentLevel::Root, None, vec![raw("r1", 0)], Some("42"))
            .page(&post(), CommentLevel::Root, Some("42"), vec![raw("r2", 0)], Some("42"));
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(1));

        let items = drain(&mut traversal).await;
        assert_eq!(items.len(), 2);
        assert_eq!(api.call_count(), 2);
        assert_eq!(traversal.stats().stalled_branches, 1);
        assert_eq!(traversal.state(), TraversalState::Done);
    }

    #[tokio::test]
    async fn test_cursor_cycle_ends_branch() {
        let api = StubApi::default()
            .page(&post(), CommentLevel::Root, None, vec![raw("r1", 2)], None)
            .page("r1", CommentLevel::Child, None, vec![raw("c11", 0)], Some("a"))
            .page("r1", CommentLevel::Child, Some("a"), vec![raw("c12", 0)], Some("b"))
            .page("r1", CommentLevel::Child, Some("b"), vec![raw("c13", 0)], Some("a"));
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(1));

        let ids: Vec<String> = drain(&mut traversal)
            .await
            .into_iter()
            .map(|r| r.unwrap().id)
            .collect();

        assert_eq!(ids, vec!["r1", "c11", "c12", "c13"]);
        assert_eq!(api.calls_for("r1", CommentLevel::Child), 3);
        assert_eq!(traversal.stats().stalled_branches, 1);
    }

    #[tokio::test]
    async fn test_empty_page_with_cursor_ends_branch() {
        let api = StubApi::default().page(&post(), CommentLevel::Root, None, vec![], Some("42"));
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), options(1));

        assert!(traversal.next().await.is_none());
        assert_eq!(api.call_count(), 1);
        assert_eq!(traversal.stats().stalled_branches, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_suspends_after_nth_comment() {
        let api = tree_api();
        let mut opts = options(1);
        opts.pacer = Pacer::new(2, Duration::from_secs(5), Duration::from_secs(5));
        let mut traversal = CommentTraversal::new(&api, MessageId(POST), opts);

        let start = tokio::time::Instant::now();
        assert_eq!(traversal.next().await.unwrap().unwrap().id, "r1");
        assert!(start.elapsed() < Duration::from_secs(5));

        assert_eq!(traversal.next().await.unwrap().unwrap().id, "c11");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(6));
        assert_eq!(traversal.stats().pauses, 1);

        assert_eq!(traversal.next().await.unwrap().unwrap().id, "c12");
        assert!(start.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_fresh_traversal_starts_over() {
        let api = tree_api();

        let mut first = CommentTraversal::new(&api, MessageId(POST), options(1));
        let a = drain(&mut first).await.len();
        let mut second = CommentTraversal::new(&api, MessageId(POST), options(1));
        let b = drain(&mut second).await.len();

        assert_eq!(a, b);
        assert_eq!(api.call_count(), 10);
    }
}
