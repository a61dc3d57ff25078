//! Matching engine: decides whether a live call fits a recorded request

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{DimensionMatcher, MatchingConfig};
use crate::debug::{DebugRecord, DebugReporter};
use crate::live_call::{LiveCall, NormalizedCall};
use crate::profile::{Headers, RecordedRequest, RecordedResponse};
use crate::similarity::{is_similar, remove_url_prefix};

type Predicate = Arc<dyn Fn(&LiveCall) -> bool + Send + Sync>;
type MatchHook = Arc<dyn Fn(&LiveCall) + Send + Sync>;

/// Predicate registered with the interceptor for one recorded exchange
///
/// The predicate is side-effect free. The match hook runs only once the
/// interceptor has committed the call to this matcher's route.
#[derive(Clone)]
pub struct Matcher {
    predicate: Predicate,
    on_match: Option<MatchHook>,
}

impl Matcher {
    /// Matcher from a bare predicate
    pub fn new(predicate: impl Fn(&LiveCall) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Arc::new(predicate),
            on_match: None,
        }
    }

    /// Run `hook` for every call committed to this matcher
    #[must_use]
    pub fn on_match(mut self, hook: impl Fn(&LiveCall) + Send + Sync + 'static) -> Self {
        self.on_match = Some(Arc::new(hook));
        self
    }

    /// Whether the call fits
    pub fn matches(&self, call: &LiveCall) -> bool {
        (self.predicate)(call)
    }

    /// Signal that the call was answered by this matcher's route
    pub fn notify(&self, call: &LiveCall) {
        if let Some(hook) = &self.on_match {
            hook(call);
        }
    }
}

/// Per-dimension result of comparing a live call to a recorded request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    /// URL dimension
    pub url: bool,
    /// Method dimension
    pub method: bool,
    /// Body dimension
    pub body: bool,
    /// Header dimension
    pub headers: bool,
}

impl MatchOutcome {
    /// All four dimensions hold
    #[must_use]
    pub fn matched(&self) -> bool {
        self.url && self.method && self.body && self.headers
    }
}

/// Build the matcher for one recorded request/response pair
///
/// Once a call is committed to the route, and debugging is enabled, a
/// record describing the live call and `response` is handed to `reporter`
/// without waiting on it.
#[must_use]
pub fn build_matcher(
    config: Arc<MatchingConfig>,
    request: RecordedRequest,
    response: RecordedResponse,
    reporter: DebugReporter,
) -> Matcher {
    let predicate = {
        let config = Arc::clone(&config);
        let request = request.clone();
        move |call: &LiveCall| evaluate(&config, &request, &call.normalize()).matched()
    };

    Matcher::new(predicate).on_match(move |call: &LiveCall| {
        let call = call.normalize();
        debug!(
            "Matched {} {} -> {}",
            request.method, call.url, response.status_code
        );

        if config.debugging_enabled {
            reporter.report_detached(DebugRecord::new(&call, Some(&response), true));
        }
    })
}

/// Compare a normalized live call to a recorded request on all dimensions
///
/// A call without options only has its URL compared; method, body and
/// headers hold vacuously and their custom matchers are not consulted.
#[must_use]
pub fn evaluate(
    config: &MatchingConfig,
    request: &RecordedRequest,
    call: &NormalizedCall,
) -> MatchOutcome {
    let url = check(
        config.url_matcher.as_ref(),
        Some(request.url.as_str()),
        Some(call.url.as_str()),
        || {
            is_similar(
                Some(remove_url_prefix(&request.url)),
                Some(remove_url_prefix(&call.url)),
            )
        },
    );

    let Some(options) = &call.options else {
        return MatchOutcome {
            url,
            method: true,
            body: true,
            headers: true,
        };
    };

    // Omitted headers are dropped before any comparison, custom or default
    let recorded_headers = canonical_headers(&request.headers, config);
    let live_headers = canonical_headers(&options.headers, config);

    let method = check(
        config.method_matcher.as_ref(),
        Some(request.method.as_str()),
        options.method.as_deref(),
        || options.method.as_deref() == Some(request.method.as_str()),
    );

    let body = check(
        config.body_matcher.as_ref(),
        request.content.as_deref(),
        options.body.as_deref(),
        || is_similar(request.content.as_deref(), options.body.as_deref()),
    );

    let headers = check(
        config.headers_matcher.as_ref(),
        Some(recorded_headers.as_str()),
        Some(live_headers.as_str()),
        || is_similar(Some(recorded_headers.as_str()), Some(live_headers.as_str())),
    );

    MatchOutcome {
        url,
        method,
        body,
        headers,
    }
}

/// Serialize headers, minus omitted names, to sorted-key JSON
///
/// Header names are lowercased so recordings and live calls compare equal
/// whatever casing their HTTP stacks used.
#[must_use]
pub fn canonical_headers(headers: &Headers, config: &MatchingConfig) -> String {
    let kept: Map<String, Value> = headers
        .iter()
        .filter(|(name, _)| !config.is_omitted(name))
        .map(|(name, value)| (name.to_ascii_lowercase(), Value::String(value.clone())))
        .collect();

    Value::Object(kept).to_string()
}

fn check(
    custom: Option<&DimensionMatcher>,
    recorded: Option<&str>,
    live: Option<&str>,
    default: impl Fn() -> bool,
) -> bool {
    match custom {
        Some(matcher) => matcher(recorded, live, &default),
        None => default(),
    }
}
