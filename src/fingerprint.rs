//! Stable identifiers for recorded requests

use sha2::{Digest, Sha256};

use crate::profile::RecordedRequest;
use crate::similarity::remove_url_prefix;

/// Compute the identity of a recorded request
///
/// The identifier covers:
/// 1. Method (uppercase normalized)
/// 2. URL (scheme and `www.` stripped)
///
/// Body and headers are deliberately left out: requests that differ only in
/// payload are the same logical call recurring in a profile.
#[must_use]
pub fn request_id(request: &RecordedRequest) -> String {
    hex::encode(fingerprint(&request.method, &request.url))
}

/// SHA-256 over the length-prefixed method and URL
#[must_use]
pub fn fingerprint(method: &str, url: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();

    let method = method.trim().to_uppercase();
    hasher.update((method.len() as u32).to_le_bytes());
    hasher.update(method.as_bytes());

    let url = remove_url_prefix(url.trim());
    hasher.update((url.len() as u32).to_le_bytes());
    hasher.update(url.as_bytes());

    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_request() -> RecordedRequest {
        RecordedRequest::new("GET", "http://api.test/x")
    }

    #[test]
    fn test_id_deterministic() {
        let request = test_request();
        assert_eq!(request_id(&request), request_id(&request));
        assert_eq!(request_id(&request).len(), 64);
    }

    #[test]
    fn test_id_ignores_body_and_headers() {
        let plain = RecordedRequest::new("POST", "/login");
        let with_payload = RecordedRequest::new("POST", "/login")
            .with_content(r#"{"user":"a"}"#)
            .with_header("Authorization", "token");

        assert_eq!(request_id(&plain), request_id(&with_payload));
    }

    #[test]
    fn test_id_different_methods() {
        let get = RecordedRequest::new("GET", "/a");
        let post = RecordedRequest::new("POST", "/a");

        assert_ne!(request_id(&get), request_id(&post));
    }

    #[test]
    fn test_id_different_urls() {
        let a = RecordedRequest::new("GET", "/a");
        let b = RecordedRequest::new("GET", "/b");

        assert_ne!(request_id(&a), request_id(&b));
    }

    #[test]
    fn test_id_method_case_insensitive() {
        let lower = RecordedRequest::new("get", "/a");
        let upper = RecordedRequest::new("GET", "/a");

        assert_eq!(request_id(&lower), request_id(&upper));
    }

    #[test]
    fn test_length_prefix_separates_fields() {
        assert_ne!(fingerprint("GE", "T/a"), fingerprint("GET", "/a"));
    }

    proptest! {
        #[test]
        fn prop_same_method_and_url_same_id(
            method in "[A-Z]{3,7}",
            url in "[a-z/.:]{0,24}",
            body_a in ".{0,16}",
            body_b in ".{0,16}",
        ) {
            let a = RecordedRequest::new(method.clone(), url.clone()).with_content(body_a);
            let b = RecordedRequest::new(method, url).with_content(body_b).with_header("X", "1");
            prop_assert_eq!(request_id(&a), request_id(&b));
        }
    }
}
