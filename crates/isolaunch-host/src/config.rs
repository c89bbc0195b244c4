//! Host configuration for the launch coordinator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration shared by every coordinator instance a host creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Whether to reserve a local debug-stub endpoint before launch and
    /// report the selected port. When false the reservation step is
    /// skipped entirely and no port is ever reported.
    #[serde(default)]
    pub enable_debug_stub: bool,

    /// Fixed debug-stub port. `None` lets the OS pick a free port.
    #[serde(default)]
    pub debug_stub_port: Option<u16>,

    /// Host-computed verdict of the crash-throttling policy. When true,
    /// requests that opted into crash throttling are refused up front.
    /// The counting and reset policy behind this verdict lives in the
    /// host, not here.
    #[serde(default)]
    pub crash_budget_exhausted: bool,

    /// Minimum interval between keepalive messages forwarded from the
    /// isolated process. Tunable so tests can shrink it.
    #[serde(default = "default_keepalive_throttle")]
    #[serde(with = "humantime_serde")]
    pub keepalive_throttle: Duration,
}

fn default_keepalive_throttle() -> Duration {
    Duration::from_secs(30)
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            enable_debug_stub: false,
            debug_stub_port: None,
            crash_budget_exhausted: false,
            keepalive_throttle: default_keepalive_throttle(),
        }
    }
}

impl HostConfig {
    /// Enables debug-stub reservation, optionally on a fixed port.
    #[must_use]
    pub const fn with_debug_stub(mut self, port: Option<u16>) -> Self {
        self.enable_debug_stub = true;
        self.debug_stub_port = port;
        self
    }

    /// Sets the crash-budget verdict.
    #[must_use]
    pub const fn with_crash_budget_exhausted(mut self, exhausted: bool) -> Self {
        self.crash_budget_exhausted = exhausted;
        self
    }

    /// Overrides the keepalive throttle interval (testing hook).
    #[must_use]
    pub const fn with_keepalive_throttle(mut self, interval: Duration) -> Self {
        self.keepalive_throttle = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert!(!config.enable_debug_stub);
        assert!(config.debug_stub_port.is_none());
        assert!(!config.crash_budget_exhausted);
        assert_eq!(config.keepalive_throttle, Duration::from_secs(30));
    }

    #[test]
    fn test_builders() {
        let config = HostConfig::default()
            .with_debug_stub(Some(4014))
            .with_crash_budget_exhausted(true)
            .with_keepalive_throttle(Duration::from_millis(50));
        assert!(config.enable_debug_stub);
        assert_eq!(config.debug_stub_port, Some(4014));
        assert!(config.crash_budget_exhausted);
        assert_eq!(config.keepalive_throttle, Duration::from_millis(50));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: HostConfig = serde_json::from_str("{}").unwrap();
        assert!(!config.enable_debug_stub);
        assert_eq!(config.keepalive_throttle, Duration::from_secs(30));

        let config: HostConfig =
            serde_json::from_str(r#"{"enable_debug_stub":true,"keepalive_throttle":"1s"}"#)
                .unwrap();
        assert!(config.enable_debug_stub);
        assert_eq!(config.keepalive_throttle, Duration::from_secs(1));
    }
}
