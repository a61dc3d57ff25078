//! hyper integration for replayed calls
//!
//! Lets a harness that already speaks hyper feed intercepted requests to a
//! [`Replayer`](crate::replay::Replayer) and serve the chosen response.

mod http;

pub use http::{into_hyper_response, live_call_from_request, read_body};

/// Default request body limit
pub const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;
