use serde::{Deserialize, Serialize};

/// What a dispatch does when its context is done while handlers are still running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Forward the context and keep waiting for every handler.
    #[default]
    AwaitAll,
    /// Abort unfinished handlers and report them as aborted.
    AbortOnCancel,
}

/// Dispatcher settings
///
/// # Example
///
/// ```yaml
/// dispatcher:
///   cancel_policy: abort_on_cancel
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default)]
    pub cancel_policy: CancelPolicy,
}

impl DispatcherConfig {
    pub fn with_cancel_policy(mut self, cancel_policy: CancelPolicy) -> Self {
        self.cancel_policy = cancel_policy;
        self
    }
}
