//! Live intercepted calls and their normalization

use serde::{Deserialize, Serialize};

use crate::profile::Headers;

/// Options attached to a live call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// HTTP method, if the caller set one
    #[serde(default)]
    pub method: Option<String>,
    /// Request body
    #[serde(default)]
    pub body: Option<String>,
    /// Request headers
    #[serde(default)]
    pub headers: Headers,
}

/// A single combined request descriptor (URL plus options)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Target URL
    pub url: String,
    /// Method, body and headers
    #[serde(flatten)]
    pub options: RequestOptions,
}

/// An intercepted outbound call, in either calling convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveCall {
    /// One descriptor carrying URL and options together
    Combined(RequestDescriptor),
    /// URL plus an optional, separate options object
    Split(String, Option<RequestOptions>),
}

/// A live call resolved to one shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCall {
    /// Target URL (empty when the caller supplied none)
    pub url: String,
    /// Options; `None` for a bare URL call
    pub options: Option<RequestOptions>,
}

impl LiveCall {
    /// A bare URL call with no options
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Split(url.into(), None)
    }

    /// A URL call with options
    #[must_use]
    pub fn with_options(url: impl Into<String>, options: RequestOptions) -> Self {
        Self::Split(url.into(), Some(options))
    }

    /// Resolve to `{url, options}` regardless of calling convention
    #[must_use]
    pub fn normalize(&self) -> NormalizedCall {
        match self {
            Self::Combined(descriptor) => NormalizedCall {
                url: descriptor.url.clone(),
                options: Some(descriptor.options.clone()),
            },
            Self::Split(url, options) => NormalizedCall {
                url: url.clone(),
                options: options.clone(),
            },
        }
    }
}

impl RequestOptions {
    /// Options with only a method set
    #[must_use]
    pub fn method(method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            ..Self::default()
        }
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
