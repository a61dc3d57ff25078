//! Replay entry point: wires a profile into an interceptor

use std::sync::Arc;

use futures_util::future::FutureExt;
use tracing::{debug, info, warn};

use crate::config::MatchingConfig;
use crate::debug::{DebugRecord, DebugReporter};
use crate::interceptor::{Fallback, Interceptor, MockResponse, RouteOptions};
use crate::live_call::LiveCall;
use crate::matcher::build_matcher;
use crate::profile::{ProfileEntry, RecordedResponse};
use crate::repeat::RepeatMap;

/// Register a profile with an interceptor
///
/// Resets `interceptor`, builds the repeat map over the whole profile, then
/// registers one route per entry in profile order plus a shared fallback.
/// Identities recorded more than once get routes that answer a single call
/// each, so successive calls receive successive recorded responses.
///
/// Returns the repeat map after every entry has been processed.
pub fn replay(
    interceptor: &mut Interceptor,
    profile: &[ProfileEntry],
    config: MatchingConfig,
    reporter: DebugReporter,
) -> RepeatMap {
    interceptor.reset();

    let config = Arc::new(config);
    let (repeat_map, states) = RepeatMap::build_sequence(profile);

    for (entry, state) in profile.iter().zip(states) {
        let options = RouteOptions {
            name: format!(
                "{} {} #{}",
                entry.request.method, entry.request.url, state.invocations
            ),
            repeat: state.is_repeated().then_some(1),
        };

        interceptor.mock(
            build_matcher(
                Arc::clone(&config),
                entry.request.clone(),
                entry.response.clone(),
                reporter.clone(),
            ),
            MockResponse::from(&entry.response),
            options,
        );
    }

    let template = profile.last().map(|entry| entry.response.clone());
    interceptor.catch(fallback_handler(config, reporter, template));

    info!(
        "Replaying {} recorded requests ({} distinct)",
        profile.len(),
        repeat_map.len()
    );

    repeat_map
}

/// Handler for calls that match no recorded request
///
/// With debugging enabled, the call is reported as unmatched using
/// `template` for the response fields, and the handler waits for the
/// submission. The diagnostic is emitted either way.
#[must_use]
pub fn fallback_handler(
    config: Arc<MatchingConfig>,
    reporter: DebugReporter,
    template: Option<RecordedResponse>,
) -> Fallback {
    Arc::new(move |call: LiveCall| {
        let debugging = config.debugging_enabled;
        let reporter = reporter.clone();
        let template = template.clone();

        async move {
            let call = call.normalize();

            if debugging {
                reporter
                    .report(DebugRecord::new(&call, template.as_ref(), false))
                    .await;
            }

            warn!("Unable to match request: {}", call.url);
        }
        .boxed()
    })
}

/// Owns an interceptor loaded with one profile at a time
#[derive(Default)]
pub struct Replayer {
    interceptor: Interceptor,
    repeat_map: RepeatMap,
}

impl Replayer {
    /// Create a replayer with nothing loaded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a profile, reporting to `localhost:<debug_port>` when enabled
    pub fn load(&mut self, profile: &[ProfileEntry], config: MatchingConfig) -> &RepeatMap {
        let reporter = if config.debugging_enabled {
            DebugReporter::http(config.debug_port)
        } else {
            DebugReporter::disabled()
        };

        self.load_with_reporter(profile, config, reporter)
    }

    /// Load a profile with an explicit reporter
    pub fn load_with_reporter(
        &mut self,
        profile: &[ProfileEntry],
        config: MatchingConfig,
        reporter: DebugReporter,
    ) -> &RepeatMap {
        debug!("Loading profile with {} entries", profile.len());
        self.repeat_map = replay(&mut self.interceptor, profile, config, reporter);
        &self.repeat_map
    }

    /// Answer a live call from the loaded profile
    pub async fn handle(&self, call: &LiveCall) -> Option<MockResponse> {
        self.interceptor.handle(call).await
    }

    /// Forget the loaded profile
    pub fn reset(&mut self) {
        self.interceptor.reset();
        self.repeat_map = RepeatMap::default();
    }

    /// The underlying interceptor
    #[must_use]
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Repeat map of the loaded profile
    #[must_use]
    pub fn repeat_map(&self) -> &RepeatMap {
        &self.repeat_map
    }
}
