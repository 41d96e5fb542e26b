use chrono::DateTime;
use serde::{Deserialize, Deserializer};

/// Format of `created_at` in API responses, e.g. `Tue Mar 04 21:05:11 +0800 2025`
const API_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Format of `created_at` in emitted comments
const OUTPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One comment item as returned by the comment API
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    #[serde(deserialize_with = "id_string")]
    pub idstr: String,

    pub created_at: String,
    pub user: RawUser,

    #[serde(default)]
    pub text_raw: String,

    #[serde(default)]
    pub like_counts: u64,

    /// Number of direct replies
    #[serde(default)]
    pub total_number: u32,

    #[serde(default)]
    pub source: Option<String>,
}

/// Author block of a comment item
#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    #[serde(deserialize_with = "id_string")]
    pub id: String,

    #[serde(default)]
    pub screen_name: String,

    #[serde(default)]
    pub gender: Option<String>,
}

/// Accepts IDs sent either as JSON numbers or strings
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(u64),
        Str(String),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}

/// Reformats an API timestamp, keeping the raw text if it does not parse
pub(crate) fn format_created_at(raw: &str) -> String {
    match DateTime::parse_from_str(raw, API_TIME_FORMAT) {
        Ok(dt) => dt.format(OUTPUT_TIME_FORMAT).to_string(),
        Err(e) => {
            tracing::debug!("Keeping unparsed timestamp {:?}: {}", raw, e);
            raw.to_string()
        }
    }
}

/// Strips the `来自` ("from") prefix of a source label
pub(crate) fn clean_source(raw: &str) -> Option<String> {
    let cleaned = raw.replace("来自", "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
