//! Fuzzy string comparison used by the default matchers

use std::borrow::Cow;

use serde_json::Value;

/// Strip a leading `http://` or `https://` and a following `www.`
///
/// Scheme and `www.` differences between a recording and a live call are
/// never significant.
#[must_use]
pub fn remove_url_prefix(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    rest.strip_prefix("www.").unwrap_or(rest)
}

/// Approximate equality tolerant of encoding and formatting noise
///
/// Rules, in order:
/// 1. Two absent values are similar. An absent value is similar only to a
///    blank string, and whitespace-only strings count as blank, so
///    `is_similar(None, Some("  "))` holds even though `"  "` is not empty.
/// 2. Identical strings are similar.
/// 3. If both sides are JSON documents, their parsed values are compared
///    (key order and insignificant whitespace are ignored).
/// 4. Otherwise both sides are percent-decoded, whitespace runs collapsed
///    to one space, and the results compared.
#[must_use]
pub fn is_similar(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (None, Some(value)) | (Some(value), None) => value.trim().is_empty(),
        (Some(a), Some(b)) => {
            if a == b {
                return true;
            }

            if let (Some(left), Some(right)) = (parse_json(a), parse_json(b)) {
                return left == right;
            }

            canonical_text(a) == canonical_text(b)
        }
    }
}

fn parse_json(value: &str) -> Option<Value> {
    serde_json::from_str(value).ok()
}

fn canonical_text(value: &str) -> String {
    let decoded = urlencoding::decode(value).unwrap_or(Cow::Borrowed(value));
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
