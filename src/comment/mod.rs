//! Comment model
//!
//! This module defines the records produced by a comment traversal and the
//! raw API items they are built from.

mod raw;

pub use raw::{RawComment, RawUser};

pub(crate) use raw::{clean_source, format_created_at, id_string};

use crate::shortcode::MessageId;
use std::fmt;

/// Depth of a comment in the two-level comment forest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentLevel {
    /// A direct reply to the post
    Root,

    /// A reply to a root comment (deeper replies are flattened here)
    Child,
}

impl CommentLevel {
    /// Value of the `fetch_level` API parameter for this level
    pub fn fetch_level(&self) -> u8 {
        match self {
            Self::Root => 0,
            Self::Child => 1,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Child => "child",
        }
    }
}

impl fmt::Display for CommentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Opaque pagination token (`max_id`)
///
/// The start cursor requests the first page of a branch. Terminal values
/// returned by the API are never turned into a cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PageCursor(Option<String>);

impl PageCursor {
    /// Cursor for the first page of a branch
    pub fn start() -> Self {
        Self(None)
    }

    /// Cursor continuing after the given `max_id`
    pub fn after(max_id: impl Into<String>) -> Self {
        Self(Some(max_id.into()))
    }

    /// Returns true for the first-page cursor
    pub fn is_start(&self) -> bool {
        self.0.is_none()
    }

    /// The `max_id` value to send, if any
    pub fn max_id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Interprets a response `max_id`, returning None for terminal values
    ///
    /// `0`, `"0"`, `""`, `null` and anything that is neither a number nor a
    /// string all mean "no further pages".
    pub fn from_response(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => {
                let s = n.to_string();
                (s != "0").then(|| Self::after(s))
            }
            serde_json::Value::String(s) => {
                let s = s.trim();
                (!s.is_empty() && s != "0").then(|| Self::after(s))
            }
            _ => None,
        }
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(max_id) => f.write_str(max_id),
            None => f.write_str("start"),
        }
    }
}

/// Gender reported on the comment author's profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// Maps the API's `m` / `f` codes; anything else is unknown
    pub fn from_api(code: Option<&str>) -> Self {
        match code {
            Some("m") => Self::Male,
            Some("f") => Self::Female,
            _ => Self::Unknown,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Pass-through fields of a comment
#[derive(Debug, Clone, PartialEq)]
pub struct CommentPayload {
    pub author_id: String,
    pub author_name: String,
    pub gender: Gender,

    /// Creation time as `%Y-%m-%d %H:%M:%S` (raw API text if unparseable)
    pub created_at: String,

    pub text: String,
    pub like_count: u64,

    /// Client the comment was posted from, without the `来自` prefix
    pub source: Option<String>,
}

/// One comment in the flattened traversal output
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub id: String,

    /// Root comment this reply belongs to; None for root comments
    pub parent_id: Option<String>,

    pub root_post_id: MessageId,
    pub level: CommentLevel,

    /// Replies reported at fetch time; only used to decide whether to descend
    pub child_count: u32,

    pub payload: CommentPayload,
}

impl CommentNode {
    /// Builds a node from a raw API item
    pub fn from_raw(
        raw: RawComment,
        root_post_id: MessageId,
        level: CommentLevel,
        parent_id: Option<String>,
    ) -> Self {
        let payload = CommentPayload {
            author_id: raw.user.id,
            author_name: raw.user.screen_name,
            gender: Gender::from_api(raw.user.gender.as_deref()),
            created_at: format_created_at(&raw.created_at),
            text: raw.text_raw,
            like_count: raw.like_counts,
            source: raw.source.as_deref().and_then(clean_source),
        };

        let parent_id = match level {
            CommentLevel::Root => None,
            CommentLevel::Child => parent_id,
        };

        Self {
            id: raw.idstr,
            parent_id,
            root_post_id,
            level,
            child_count: raw.total_number,
            payload,
        }
    }

    /// Returns true if the traversal should descend into this comment
    pub fn has_children(&self) -> bool {
        self.level == CommentLevel::Root && self.child_count > 0
    }
}
