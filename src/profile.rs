//! Recorded profile data model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header map used throughout recordings (sorted by name)
pub type Headers = BTreeMap<String, String>;

/// A request captured while recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    /// Full request URL as recorded
    pub url: String,
    /// HTTP method (e.g., "GET", "POST")
    pub method: String,
    /// Request body, if one was sent
    #[serde(default)]
    pub content: Option<String>,
    /// Request headers
    #[serde(default)]
    pub headers: Headers,
}

/// A response captured while recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedResponse {
    /// Response body
    #[serde(default)]
    pub content: Option<String>,
    /// Response headers
    #[serde(default)]
    pub headers: Headers,
    /// HTTP status code
    pub status_code: u16,
}

/// One recorded request/response exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// Recorded request
    pub request: RecordedRequest,
    /// Recorded response
    pub response: RecordedResponse,
}

impl RecordedRequest {
    /// Create a request with no body and no headers
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            content: None,
            headers: Headers::new(),
        }
    }

    /// Set the body
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl RecordedResponse {
    /// Create a response with the given status and body
    #[must_use]
    pub fn new(status_code: u16, content: Option<String>) -> Self {
        Self {
            content,
            headers: Headers::new(),
            status_code,
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl ProfileEntry {
    /// Pair a request with its response
    #[must_use]
    pub fn new(request: RecordedRequest, response: RecordedResponse) -> Self {
        Self { request, response }
    }
}
