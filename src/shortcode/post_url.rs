use crate::shortcode::{decode, MessageId};
use crate::{CrawlError, UrlError};
use url::Url;

/// A post located by its URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    /// The original URL
    pub url: String,

    /// UID of the post author (second to last path segment)
    pub author_uid: String,

    /// The short code (last path segment)
    pub short_code: String,

    /// The decoded message ID
    pub mid: MessageId,
}

/// Parses a Weibo post URL into its author UID and message ID
///
/// Accepts URLs of the form `https://weibo.com/<uid>/<short-code>`, with or
/// without a `www.` prefix, a query string, a fragment or a trailing slash.
///
/// # Arguments
///
/// * `url_str` - The post URL
///
/// # Returns
///
/// * `Ok(PostRef)` - The author UID, short code and decoded mid
/// * `Err(CrawlError::Url)` - The URL is malformed or lacks the two segments
/// * `Err(CrawlError::InvalidShortCode)` - The last segment is not base62
///
/// # Examples
///
/// ```
/// use weibo_threads::shortcode::parse_post_url;
///
/// let post = parse_post_url("https://www.weibo.com/2397417584/PmA6E1TGk?type=comment").unwrap();
/// assert_eq!(post.author_uid, "2397417584");
/// assert_eq!(post.mid.get(), 5153820120452372);
/// ```
pub fn parse_post_url(url_str: &str) -> Result<PostRef, CrawlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()).into());
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default();

    let (author_uid, short_code) = match segments.as_slice() {
        [.., uid, code] => (*uid, *code),
        _ => return Err(UrlError::MissingSegments(url_str.to_string()).into()),
    };

    let mid = decode(short_code)?;

    Ok(PostRef {
        url: url_str.trim().to_string(),
        author_uid: author_uid.to_string(),
        short_code: short_code.to_string(),
        mid,
    })
}
