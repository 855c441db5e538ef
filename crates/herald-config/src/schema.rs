use herald_core::DispatcherConfig;
use herald_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

/// Main Herald configuration
///
/// Configuration is loaded from (in priority order):
/// 1. `herald.jsonc` - JSON with comments
/// 2. `herald.json` - Standard JSON
/// 3. `herald.yml` / `herald.yaml` - YAML format
///
/// Also checks hidden variants (`.herald.*`) and `~/.config/herald/` for global config.
///
/// # Example
///
/// ```yaml
/// dispatcher:
///   cancel_policy: await_all
/// telemetry:
///   level: debug
///   json_output: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// Delivery settings for the event dispatcher
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Log level and output format
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
