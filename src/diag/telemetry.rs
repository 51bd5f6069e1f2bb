//! # Countable anomaly telemetry.
//!
//! Parsers and the host record anomalies (count mismatches, unexpected
//! ordering, caught panics) as `(area, event)` keyed values. Recording is
//! fire-and-forget: it never blocks the line hot path and never fails into
//! the caller.
//!
//! ## Rules
//! - `aggregate = true` appends the value under the key (counting usage).
//! - `aggregate = false` replaces the value under the key (last write wins).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

/// Contract for a telemetry sink.
///
/// Implementations must be cheap and infallible from the caller's point of
/// view; batching and shipping happen behind the trait.
pub trait TelemetryCollector: Send + Sync {
    /// Records one value under `(area, event)`.
    fn record(&self, area: &str, event: &str, value: Value, aggregate: bool);
}

/// In-memory telemetry collector.
///
/// Groups recorded values by `(area, event)` for inspection in tests or for
/// batch publishing at the end of a run.
#[derive(Default)]
pub struct TelemetryStore {
    entries: Mutex<HashMap<(String, String), Vec<Value>>>,
}

impl TelemetryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(String, String), Vec<Value>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a copy of the values recorded under `(area, event)`.
    pub fn values(&self, area: &str, event: &str) -> Vec<Value> {
        self.entries()
            .get(&(area.to_string(), event.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of values recorded under `(area, event)`.
    pub fn count(&self, area: &str, event: &str) -> usize {
        self.values(area, event).len()
    }

    /// Returns true if anything was recorded under `(area, event)`.
    pub fn has(&self, area: &str, event: &str) -> bool {
        self.count(area, event) > 0
    }
}

impl TelemetryCollector for TelemetryStore {
    fn record(&self, area: &str, event: &str, value: Value, aggregate: bool) {
        let mut entries = self.entries();
        let slot = entries
            .entry((area.to_string(), event.to_string()))
            .or_default();
        if !aggregate {
            slot.clear();
        }
        slot.push(value);
    }
}
