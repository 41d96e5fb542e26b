//! Post details
//!
//! The record collected for a post itself (text, counters, attached media),
//! next to its comments. Built from the `statuses/show` response.

use crate::comment::{format_created_at, id_string};
use crate::crawler::PageError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Site root that profile paths are relative to
const PROFILE_BASE: &str = "https://www.weibo.com";

/// Prefix of the region label, e.g. `发布于 上海` ("posted in")
const REGION_PREFIX: &str = "发布于";

/// Details of one post
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostDetails {
    /// Message ID
    pub mid: String,

    /// UID of the author
    pub author_id: String,

    /// Profile URL of the author
    pub author_url: String,

    /// The post URL the details were requested for
    pub url: String,

    /// Full text, long posts included
    pub text: String,

    /// `YYYY-MM-DD HH:MM:SS` in the poster's timezone
    pub created_at: String,

    /// Region label with its prefix removed
    pub region: Option<String>,

    /// Number of attached pictures as reported by the API
    pub pic_count: u32,

    pub pic_urls: Vec<String>,
    pub video_urls: Vec<String>,

    pub comments_count: u64,
    pub reposts_count: u64,
    pub like_count: u64,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    #[serde(deserialize_with = "id_string")]
    idstr: String,

    created_at: String,
    user: RawPostUser,

    #[serde(default)]
    text_raw: String,

    #[serde(default)]
    region_name: Option<String>,

    #[serde(default)]
    pic_num: u32,

    #[serde(default)]
    pic_ids: Vec<String>,

    #[serde(default)]
    pic_infos: BTreeMap<String, Value>,

    #[serde(default)]
    mix_media_info: Option<RawMixMedia>,

    #[serde(default)]
    page_info: Option<RawPageInfo>,

    #[serde(default)]
    comments_count: u64,

    #[serde(default)]
    reposts_count: u64,

    #[serde(default)]
    attitudes_count: u64,
}

#[derive(Debug, Deserialize)]
struct RawPostUser {
    #[serde(deserialize_with = "id_string")]
    id: String,

    #[serde(default)]
    profile_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMixMedia {
    #[serde(default)]
    items: Vec<RawMediaItem>,
}

#[derive(Debug, Deserialize)]
struct RawMediaItem {
    #[serde(rename = "type", default)]
    kind: String,

    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct RawPageInfo {
    #[serde(default)]
    object_type: Option<String>,

    #[serde(default)]
    short_url: Option<String>,
}

/// Parses a `statuses/show` response body
///
/// A body that is not JSON is a [`PageError::MalformedBody`]; JSON that is not
/// a post (a deleted post, an error object) is a
/// [`PageError::UnexpectedResponseShape`].
///
/// # Arguments
///
/// * `body` - The response body
/// * `url` - The post URL, recorded on the details
pub fn parse_post_details(body: &str, url: &str) -> Result<PostDetails, PageError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| PageError::MalformedBody(e.to_string()))?;
    let raw = RawPost::deserialize(value)
        .map_err(|e| PageError::UnexpectedResponseShape(format!("not a post: {}", e)))?;

    let (pic_urls, video_urls) = media_urls(&raw);
    let author_url = match raw.user.profile_url.as_deref() {
        Some(path) if path.starts_with("http") => path.to_string(),
        Some(path) if !path.is_empty() => format!("{}{}", PROFILE_BASE, path),
        _ => format!("{}/u/{}", PROFILE_BASE, raw.user.id),
    };

    Ok(PostDetails {
        mid: raw.idstr,
        author_id: raw.user.id,
        author_url,
        url: url.to_string(),
        text: raw.text_raw,
        created_at: format_created_at(&raw.created_at),
        region: raw.region_name.as_deref().and_then(clean_region),
        pic_count: raw.pic_num,
        pic_urls,
        video_urls,
        comments_count: raw.comments_count,
        reposts_count: raw.reposts_count,
        like_count: raw.attitudes_count,
    })
}

/// Picture and video URLs of a post
///
/// Mixed media posts list both kinds in `mix_media_info`. Otherwise pictures
/// come from `pic_infos` (in `pic_ids` order) and a video from `page_info`.
fn media_urls(raw: &RawPost) -> (Vec<String>, Vec<String>) {
    let mut pics = Vec::new();
    let mut videos = Vec::new();

    if let Some(mix) = &raw.mix_media_info {
        for item in &mix.items {
            let (target, pointer) = match item.kind.as_str() {
                "pic" => (&mut pics, "/original/url"),
                "video" => (&mut videos, "/media_info/h5_url"),
                _ => continue,
            };
            if let Some(url) = item.data.pointer(pointer).and_then(Value::as_str) {
                target.push(url.to_string());
            }
        }
        return (pics, videos);
    }

    let mut ids: Vec<&String> = raw
        .pic_ids
        .iter()
        .filter(|id| raw.pic_infos.contains_key(*id))
        .collect();
    for id in raw.pic_infos.keys() {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    pics.extend(
        ids.into_iter()
            .filter_map(|id| raw.pic_infos.get(id))
            .filter_map(|info| info.pointer("/original/url"))
            .filter_map(Value::as_str)
            .map(str::to_string),
    );

    if let Some(page) = &raw.page_info {
        if page.object_type.as_deref() == Some("video") {
            if let Some(url) = page.short_url.as_deref().filter(|u| !u.is_empty()) {
                videos.push(url.to_string());
            }
        }
    }

    (pics, videos)
}

fn clean_region(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_start_matches(REGION_PREFIX).trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
