//! # Leveled trace logging seam.
//!
//! [`TraceLogger`] is the contract every component logs through. Hosts and
//! plugins never call a logging framework directly; they call the logger
//! they were constructed with. This keeps diagnostic routing a composition
//! decision and makes the verbatim operability strings assertable in tests.
//!
//! Two implementations ship with the crate:
//! - [`TracingLogger`]: forwards to the `tracing` macros (production).
//! - [`MemoryLogger`]: captures lines into a vector (tests, inspection).

use std::sync::{Mutex, MutexGuard};

/// Severity of a trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLevel {
    /// High-volume diagnostics (per-tick backlog reports and similar).
    Verbose,
    /// Normal operational messages.
    Info,
    /// Degraded but recoverable conditions.
    Warning,
    /// Failures that dropped data or disabled a component.
    Error,
}

/// Contract for leveled diagnostic output.
///
/// Implementations must be cheap and non-blocking; they are called from
/// delivery workers and the monitor tick.
pub trait TraceLogger: Send + Sync {
    /// High-volume diagnostics.
    fn verbose(&self, text: &str);
    /// Normal operational messages.
    fn info(&self, text: &str);
    /// Degraded but recoverable conditions.
    fn warning(&self, text: &str);
    /// Failures that dropped data or disabled a component.
    fn error(&self, text: &str);
}

/// Forwards trace lines to the `tracing` macros.
///
/// Verbose maps to `debug!` so a default subscriber filter of `info` hides
/// the per-tick backlog chatter.
#[derive(Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Creates a new forwarding logger.
    pub fn new() -> Self {
        Self
    }
}

impl TraceLogger for TracingLogger {
    fn verbose(&self, text: &str) {
        tracing::debug!("{text}");
    }

    fn info(&self, text: &str) {
        tracing::info!("{text}");
    }

    fn warning(&self, text: &str) {
        tracing::warn!("{text}");
    }

    fn error(&self, text: &str) {
        tracing::error!("{text}");
    }
}

/// Captures trace lines in memory.
///
/// Used by tests to assert on the verbatim diagnostic strings, and by
/// embedders that want to ship a host's diagnostics somewhere after the run.
#[derive(Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(TraceLevel, String)>>,
}

impl MemoryLogger {
    /// Creates a new empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    fn lines(&self) -> MutexGuard<'_, Vec<(TraceLevel, String)>> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a copy of every captured line, in order, without levels.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines().iter().map(|(_, text)| text.clone()).collect()
    }

    /// Returns a copy of every captured line at the given level.
    pub fn at_level(&self, level: TraceLevel) -> Vec<String> {
        self.lines()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Returns true if any captured line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, text)| text.contains(needle))
    }

    /// Number of captured lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|(_, text)| text.contains(needle))
            .count()
    }
}

impl TraceLogger for MemoryLogger {
    fn verbose(&self, text: &str) {
        self.lines().push((TraceLevel::Verbose, text.to_string()));
    }

    fn info(&self, text: &str) {
        self.lines().push((TraceLevel::Info, text.to_string()));
    }

    fn warning(&self, text: &str) {
        self.lines().push((TraceLevel::Warning, text.to_string()));
    }

    fn error(&self, text: &str) {
        self.lines().push((TraceLevel::Error, text.to_string()));
    }
}
