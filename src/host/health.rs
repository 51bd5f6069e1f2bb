use std::time::Duration;

use serde::Serialize;

/// Backpressure classification of one plugin, written only by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PluginState {
    /// Keeping up with the stream.
    Healthy,
    /// Lagging beyond the recovery threshold; still receiving lines.
    Buffering,
    /// Cut off after sustained lag. Terminal: no further lines, no finalize.
    ShortCircuited,
}

/// Point-in-time view of one plugin's delivery queue.
#[derive(Debug, Clone, Serialize)]
pub struct PluginHealth {
    /// Undelivered lines waiting in the plugin's queue.
    pub queue_depth: usize,
    /// Age of the oldest undelivered line; `None` when the queue is empty.
    pub oldest_line_age: Option<Duration>,
    /// Current backpressure classification.
    pub state: PluginState,
}
