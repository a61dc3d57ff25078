//! Tundra - replay recorded HTTP profiles during tests
//!
//! Live outbound calls are matched against recorded requests on URL, method,
//! body and headers, and answered with the recorded response.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod debug;
pub mod error;
pub mod fingerprint;
pub mod interceptor;
pub mod live_call;
pub mod logging;
pub mod matcher;
pub mod network;
pub mod profile;
pub mod repeat;
pub mod replay;
pub mod similarity;

pub use config::{MatchingConfig, ReplaySettings};
pub use error::{Result, TundraError};
pub use interceptor::{Interceptor, MockResponse};
pub use live_call::{LiveCall, RequestOptions};
pub use profile::{ProfileEntry, RecordedRequest, RecordedResponse};
pub use replay::{replay, Replayer};
