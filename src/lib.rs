//! Client-side core of the job application tracker.
/// Per-user directories for config and logs.
pub mod app_dirs;
/// Service endpoint and timeout settings.
pub mod config;
/// Upcoming interview and follow-up alerts.
pub mod deadlines;
/// HTTP calls to the tracker service.
pub mod gateway;
pub(crate) mod http_client;
pub(crate) mod jobs;
/// Tracing subscriber setup.
pub mod logging;
/// Application records and request payloads.
pub mod model;
/// Shared credential state.
pub mod session;
/// Cached application list and stats.
pub mod store;
/// Display-ready view structs.
pub mod view;
