use crate::shortcode::MessageId;
use crate::ShortCodeError;

/// The base62 alphabet used by Weibo short codes: digits, lowercase, uppercase
pub const ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Characters per short code segment
const SEGMENT_LEN: usize = 4;

/// Decimal digits each non-leading segment occupies in the message ID
const SEGMENT_DIGITS: usize = 7;

/// Decodes a Weibo short code into its message ID
///
/// # Decoding Steps
///
/// 1. Split the code into 4-character segments, counting from the end, so
///    only the leading segment may be shorter
/// 2. Decode every segment as a base62 number
/// 3. Render each segment in decimal, zero-padding all but the leading one
///    to 7 digits
/// 4. Concatenate and parse the result as a base-10 integer
///
/// # Arguments
///
/// * `short_code` - The short code, e.g. the `PmA6E1TGk` of
///   `https://weibo.com/2397417584/PmA6E1TGk`
///
/// # Returns
///
/// * `Ok(MessageId)` - The decoded message ID
/// * `Err(ShortCodeError)` - The code is empty, contains a non-base62
///   character, or is too long for a 64-bit ID
///
/// # Examples
///
/// ```
/// use weibo_threads::shortcode::{decode, MessageId};
///
/// assert_eq!(decode("PmA6E1TGk").unwrap(), MessageId(5153820120452372));
/// ```
pub fn decode(short_code: &str) -> Result<MessageId, ShortCodeError> {
    if short_code.is_empty() {
        return Err(ShortCodeError::Empty);
    }

    let digits = short_code
        .chars()
        .enumerate()
        .map(|(position, character)| {
            charset_index(character)
                .ok_or(ShortCodeError::InvalidCharacter {
                    character,
                    position,
                })
        })
        .collect::<Result<Vec<u64>, _>>()?;

    let leading_len = match digits.len() % SEGMENT_LEN {
        0 => SEGMENT_LEN,
        n => n,
    };

    let mut decimal = decode_segment(&digits[..leading_len]).to_string();
    for segment in digits[leading_len..].chunks(SEGMENT_LEN) {
        decimal.push_str(&format!(
            "{:0width$}",
            decode_segment(segment),
            width = SEGMENT_DIGITS
        ));
    }

    decimal
        .parse::<u64>()
        .map(MessageId)
        .map_err(|_| ShortCodeError::Overflow(short_code.to_string()))
}

/// Maps a character to its position in the base62 alphabet
fn charset_index(c: char) -> Option<u64> {
    let index = match c {
        '0'..='9' => c as u64 - '0' as u64,
        'a'..='z' => c as u64 - 'a' as u64 + 10,
        'A'..='Z' => c as u64 - 'A' as u64 + 36,
        _ => return None,
    };
    Some(index)
}

/// Decodes up to four base62 digits (most significant first)
fn decode_segment(digits: &[u64]) -> u64 {
    digits.iter().fold(0, |acc, d| acc * 62 + d)
}
