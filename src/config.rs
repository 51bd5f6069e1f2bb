//! # Host configuration.
//!
//! [`HostConfig`] defines the backpressure policy thresholds, the monitor
//! cadence, and the shutdown drain grace.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use logvisor::HostConfig;
//!
//! let mut cfg = HostConfig::default();
//! cfg.short_circuit_delay = Duration::from_millis(100);
//! cfg.recovery_delay = Duration::from_millis(100);
//!
//! // The effective recovery threshold never exceeds the short-circuit one.
//! assert!(cfg.recovery_threshold() <= cfg.short_circuit_delay);
//! ```

use std::time::Duration;

/// Configuration for the dispatch host.
///
/// Controls when a lagging plugin is flagged as buffering, when it is cut
/// off permanently, how often the monitor checks, and how long shutdown
/// waits for queues to drain.
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Oldest-undelivered-line age after which a plugin is short-circuited.
    pub short_circuit_delay: Duration,
    /// Oldest-undelivered-line age after which a plugin is flagged as buffering.
    pub recovery_delay: Duration,
    /// How often the monitor samples each plugin's queue.
    pub monitor_interval: Duration,
    /// Maximum time to wait for queues to drain and plugins to finalize after `finish`.
    pub drain_grace: Duration,
}

impl Default for HostConfig {
    /// Provides a default configuration:
    /// - `short_circuit_delay = 30s`
    /// - `recovery_delay = 1s`
    /// - `monitor_interval = 250ms`
    /// - `drain_grace = 60s`
    fn default() -> Self {
        Self {
            short_circuit_delay: Duration::from_secs(30),
            recovery_delay: Duration::from_secs(1),
            monitor_interval: Duration::from_millis(250),
            drain_grace: Duration::from_secs(60),
        }
    }
}

impl HostConfig {
    /// Effective buffering threshold: `recovery_delay`, clamped so it never
    /// exceeds [`HostConfig::short_circuit_delay`].
    pub fn recovery_threshold(&self) -> Duration {
        self.recovery_delay.min(self.short_circuit_delay)
    }

    /// Effective monitor interval (minimum 1ms, so a zeroed config cannot
    /// spin the monitor loop).
    pub fn tick_interval(&self) -> Duration {
        self.monitor_interval.max(Duration::from_millis(1))
    }
}
