//! Logging facilities for Trellis.
//!
//! Trellis uses the `tracing` crate for instrumentation and never installs a
//! subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("trellis=debug,trellis_core::dispatch=trace")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "trellis_core";
    /// Dispatcher (UI-thread executor) target.
    pub const DISPATCH: &str = "trellis_core::dispatch";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Property system target.
    pub const PROPERTY: &str = "trellis_core::property";
    /// Selection adapter target.
    pub const PICKER: &str = "trellis::picker";
    /// Observable collection target.
    pub const COLLECTION: &str = "trellis::collection";
    /// Background producer target.
    pub const FEED: &str = "trellis::feed";
    /// Performance spans.
    pub const PERF: &str = "trellis::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to time list rebuilds and delta application.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span for `operation`.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::debug_span!(target: "trellis::perf", "perf", operation);
        Self {
            span: span.entered(),
        }
    }
}
