/// Traversal state definitions
///
/// This module defines the phases a comment traversal moves through.
use crate::comment::CommentLevel;
use std::fmt;

/// Represents the current phase of a comment traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalState {
    /// Working through pages of root comments
    FetchingRootPage,

    /// Draining the replies of one root comment
    FetchingChildPage,

    /// No further requests will be issued
    Done,
}

impl TraversalState {
    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Checks if a transition from this state to another is valid
    ///
    /// # Valid Transitions
    ///
    /// - FetchingRootPage → FetchingChildPage, Done
    /// - FetchingChildPage → FetchingRootPage, Done
    /// - Done → (none)
    pub fn can_transition_to(&self, next: TraversalState) -> bool {
        use TraversalState::*;

        matches!(
            (self, next),
            (FetchingRootPage, FetchingChildPage)
                | (FetchingRootPage, Done)
                | (FetchingChildPage, FetchingRootPage)
                | (FetchingChildPage, Done)
        )
    }
}

impl fmt::Display for TraversalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FetchingRootPage => "fetching_root_page",
            Self::FetchingChildPage => "fetching_child_page",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Counters accumulated by a single traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Root comments emitted
    pub root_comments: u64,

    /// Child comments emitted
    pub child_comments: u64,

    /// Pages successfully fetched and parsed
    pub pages_fetched: u64,

    /// Pages dropped because the response lacked expected fields
    pub pages_skipped: u64,

    /// Comment items dropped because they lacked required fields
    pub items_skipped: u64,

    /// Branches ended because the cursor stopped advancing
    pub stalled_branches: u64,

    /// Branches abandoned after exhausting retries
    pub failed_branches: u64,

    /// Pacing pauses taken
    pub pauses: u64,
}

impl TraversalStats {
    /// Total comments emitted at any level
    pub fn total_comments(&self) -> u64 {
        self.root_comments + self.child_comments
    }

    /// Returns true if any page, item or branch was lost to a bad response
    pub fn is_lossy(&self) -> bool {
        self.pages_skipped > 0 || self.items_skipped > 0 || self.stalled_branches > 0
    }

    /// Records one emitted comment at the given level
    pub fn record_comment(&mut self, level: CommentLevel) {
        match level {
            CommentLevel::Root => self.root_comments += 1,
            CommentLevel::Child => self.child_comments += 1,
        }
    }
}
