//! In-process interception of outbound calls
//!
//! Routes are tried in registration order. The first route that is not
//! exhausted and whose predicate holds answers the call. Calls no route
//! answers go to the fallback.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::live_call::LiveCall;
use crate::matcher::Matcher;
use crate::profile::{Headers, RecordedResponse};

/// Handler for calls no route answers
pub type Fallback = Arc<dyn Fn(LiveCall) -> BoxFuture<'static, ()> + Send + Sync>;

/// Response served for a matched call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Option<String>,
}

impl From<&RecordedResponse> for MockResponse {
    fn from(response: &RecordedResponse) -> Self {
        Self {
            status: response.status_code,
            headers: response.headers.clone(),
            body: response.content.clone(),
        }
    }
}

/// Registration options for a route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Route name, used for inspection and logs
    pub name: String,
    /// Maximum number of calls answered; `None` is unlimited
    pub repeat: Option<usize>,
}

struct Route {
    name: String,
    predicate: Matcher,
    response: MockResponse,
    repeat: Option<usize>,
    hits: AtomicUsize,
}

impl Route {
    fn is_exhausted(&self) -> bool {
        self.repeat
            .is_some_and(|limit| self.hits.load(Ordering::Relaxed) >= limit)
    }

    /// Count a hit unless the limit was reached in the meantime
    fn try_claim(&self) -> bool {
        self.hits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |hits| match self.repeat {
                Some(limit) if hits >= limit => None,
                _ => Some(hits + 1),
            })
            .is_ok()
    }
}

/// Registry of routes plus a shared fallback
#[derive(Default)]
pub struct Interceptor {
    routes: Vec<Route>,
    fallback: Option<Fallback>,
    unmatched: AtomicUsize,
}

impl Interceptor {
    /// Create an empty interceptor
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all routes, the fallback and counters
    pub fn reset(&mut self) {
        self.routes.clear();
        self.fallback = None;
        self.unmatched.store(0, Ordering::Relaxed);
    }

    /// Register a route after all existing ones
    pub fn mock(&mut self, matcher: Matcher, response: MockResponse, options: RouteOptions) {
        debug!(
            "Registering route '{}' (repeat: {:?})",
            options.name, options.repeat
        );

        self.routes.push(Route {
            name: options.name,
            predicate: matcher,
            response,
            repeat: options.repeat,
            hits: AtomicUsize::new(0),
        });
    }

    /// Install the fallback, replacing any previous one
    pub fn catch(&mut self, fallback: Fallback) {
        self.fallback = Some(fallback);
    }

    /// Answer a call from the first matching route
    ///
    /// Returns `None` after running the fallback when no route matches.
    pub async fn handle(&self, call: &LiveCall) -> Option<MockResponse> {
        if let Some(response) = self.find(call) {
            return Some(response);
        }

        self.unmatched.fetch_add(1, Ordering::Relaxed);
        if let Some(fallback) = &self.fallback {
            fallback(call.clone()).await;
        }

        None
    }

    fn find(&self, call: &LiveCall) -> Option<MockResponse> {
        let route = self
            .routes
            .iter()
            .filter(|route| !route.is_exhausted())
            .find(|route| route.predicate.matches(call) && route.try_claim())?;

        route.predicate.notify(call);
        Some(route.response.clone())
    }

    /// Number of registered routes
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Names of registered routes in registration order
    pub fn route_names(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|route| route.name.as_str())
    }

    /// Calls answered by routes with the given name
    #[must_use]
    pub fn calls(&self, name: &str) -> usize {
        self.routes
            .iter()
            .filter(|route| route.name == name)
            .map(|route| route.hits.load(Ordering::Relaxed))
            .sum()
    }

    /// Calls that reached the fallback since the last reset
    #[must_use]
    pub fn unmatched_count(&self) -> usize {
        self.unmatched.load(Ordering::Relaxed)
    }

    /// Whether a fallback is installed
    #[must_use]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}
