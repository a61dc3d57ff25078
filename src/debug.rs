//! Debug reporting of match and no-match events
//!
//! Records are handed to a [`DebugChannel`]. Submission is best effort:
//! failures are logged and never reach the matching decision.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::{self, BoxFuture, FutureExt};
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::live_call::NormalizedCall;
use crate::profile::{Headers, RecordedResponse};
use crate::{Result, TundraError};

/// Path on the debug listener that receives records
pub const DEBUG_PATH: &str = "/requests";

/// Upper bound for one submission
pub const SUBMIT_TIMEOUT_MS: u64 = 2000;

/// Description of one live call and the response chosen for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugRecord {
    /// Live call URL
    pub url: String,
    /// Live call method
    pub method: Option<String>,
    /// Live call headers
    pub headers: Headers,
    /// Live call body
    pub body: Option<String>,
    /// Headers of the recorded response
    pub response_headers: Headers,
    /// Status of the recorded response
    pub response_status: Option<u16>,
    /// Body of the recorded response
    pub response_body: Option<String>,
    /// Whether a recorded request matched
    pub matched: bool,
}

impl DebugRecord {
    /// Assemble a record from a live call and a response template
    ///
    /// `template` is `None` when there is no recorded response to describe.
    #[must_use]
    pub fn new(call: &NormalizedCall, template: Option<&RecordedResponse>, matched: bool) -> Self {
        let options = call.options.as_ref();

        Self {
            url: call.url.clone(),
            method: options.and_then(|o| o.method.clone()),
            headers: options.map(|o| o.headers.clone()).unwrap_or_default(),
            body: options.and_then(|o| o.body.clone()),
            response_headers: template.map(|r| r.headers.clone()).unwrap_or_default(),
            response_status: template.map(|r| r.status_code),
            response_body: template.and_then(|r| r.content.clone()),
            matched,
        }
    }
}

/// Transport for debug records
pub trait DebugChannel: Send + Sync {
    /// Submit one record
    ///
    /// Work done before the returned future is polled happens even when the
    /// caller has no runtime to drive the future.
    fn submit(&self, record: DebugRecord) -> BoxFuture<'static, Result<()>>;
}

/// Posts records as JSON to a listener over HTTP
#[derive(Clone)]
pub struct HttpDebugChannel {
    client: Client<HttpConnector, Full<Bytes>>,
    host: String,
    port: u16,
}

impl HttpDebugChannel {
    /// Channel to `localhost:<port>`
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self::with_host("localhost", port)
    }

    /// Channel to an explicit host
    #[must_use]
    pub fn with_host(host: impl Into<String>, port: u16) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .build_http();

        Self {
            client,
            host: host.into(),
            port,
        }
    }

    /// Full URL records are posted to
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}{DEBUG_PATH}", self.host, self.port)
    }
}

impl DebugChannel for HttpDebugChannel {
    fn submit(&self, record: DebugRecord) -> BoxFuture<'static, Result<()>> {
        let client = self.client.clone();
        let endpoint = self.endpoint();
        let port = self.port;

        async move {
            let failed = |reason: String| TundraError::DebugSubmission { port, reason };

            let uri = endpoint
                .parse::<Uri>()
                .map_err(|e| failed(format!("Invalid URI '{endpoint}': {e}")))?;
            let payload = serde_json::to_vec(&record)?;

            let request = Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(payload)))
                .map_err(|e| failed(format!("Failed to build request: {e}")))?;

            let response = tokio::time::timeout(
                Duration::from_millis(SUBMIT_TIMEOUT_MS),
                client.request(request),
            )
            .await
            .map_err(|_| failed("timed out".to_string()))?
            .map_err(|e| failed(format!("Request failed: {e}")))?;

            let status = response.status();
            response
                .into_body()
                .collect()
                .await
                .map_err(|e| failed(format!("Failed to read response body: {e}")))?;

            if !status.is_success() {
                return Err(failed(format!("listener answered {status}")));
            }

            debug!("Submitted debug record for {} to {}", record.url, endpoint);
            Ok(())
        }
        .boxed()
    }
}

/// Keeps records in memory, for harnesses that inspect them directly
#[derive(Debug, Default)]
pub struct MemoryChannel {
    records: Mutex<Vec<DebugRecord>>,
}

impl MemoryChannel {
    /// Create an empty channel
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records submitted so far
    #[must_use]
    pub fn records(&self) -> Vec<DebugRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DebugChannel for MemoryChannel {
    fn submit(&self, record: DebugRecord) -> BoxFuture<'static, Result<()>> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        future::ready(Ok(())).boxed()
    }
}

/// Hands records to a channel and swallows failures
#[derive(Clone, Default)]
pub struct DebugReporter {
    channel: Option<Arc<dyn DebugChannel>>,
}

impl DebugReporter {
    /// Reporter backed by a channel
    #[must_use]
    pub fn new(channel: Arc<dyn DebugChannel>) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    /// Reporter posting to `localhost:<port>`
    #[must_use]
    pub fn http(port: u16) -> Self {
        Self::new(Arc::new(HttpDebugChannel::new(port)))
    }

    /// Reporter that drops every record
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether records go anywhere
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    /// Submit without waiting for the outcome
    ///
    /// The submission runs on the current tokio runtime. Without one it is
    /// skipped.
    pub fn report_detached(&self, record: DebugRecord) {
        let Some(channel) = &self.channel else {
            return;
        };

        let url = record.url.clone();
        let submission = channel.submit(record);

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = submission.await {
                        warn!("Debug submission for {} failed: {}", url, e);
                    }
                });
            }
            Err(_) => {
                debug!("No async runtime, skipping debug submission for {}", url);
            }
        }
    }

    /// Submit and wait for the outcome, logging any failure
    pub async fn report(&self, record: DebugRecord) {
        let Some(channel) = &self.channel else {
            return;
        };

        let url = record.url.clone();
        if let Err(e) = channel.submit(record).await {
            warn!("Debug submission for {} failed: {}", url, e);
        }
    }
}
