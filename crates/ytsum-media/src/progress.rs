//! Progress reporting.
//!
//! Stages report human-readable status through [`ProgressSink`]; how (or
//! whether) it is rendered is up to the implementation.

use tracing::info;

/// Narrow status-update sink.
///
/// Called from the process line reader task, hence `Send + Sync`.
pub trait ProgressSink: Send + Sync {
    /// Report a new status line.
    fn update(&self, status: &str);

    /// Clear any rendered state once a run is over.
    fn clear(&self) {}
}

/// Sink that reports through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn update(&self, status: &str) {
        info!(target: "ytsum::progress", "{}", status);
    }
}

/// Sink that drops every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn update(&self, _status: &str) {}
}

/// Sink that forwards every update to a closure.
pub struct FnProgress<F>(pub F);

impl<F> ProgressSink for FnProgress<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn update(&self, status: &str) {
        (self.0)(status)
    }
}
