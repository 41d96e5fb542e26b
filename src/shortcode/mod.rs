//! Short code handling for Weibo-Threads
//!
//! This module turns the last path segment of a Weibo post URL into the
//! numeric message ID (mid) that the comment API expects.

mod decoder;
mod post_url;

use std::fmt;

// Re-export main functions
pub use decoder::{decode, ALPHABET};
pub use post_url::{parse_post_url, PostRef};

/// Canonical numeric identifier of a Weibo post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Returns the raw numeric value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
