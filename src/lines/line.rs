//! # A single log line with its ingestion order.

use serde::Serialize;

/// One line of console output, stamped with its ingestion order.
///
/// Created by [`LineBus::publish`](crate::lines::LineBus::publish) and shared
/// as `Arc<LogLine>` across subscriber queues. Immutable once created; `seq`
/// is the only ordering authority, handlers must never reorder.
#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    /// Strictly increasing per bus, starting at 1.
    pub seq: u64,
    /// The raw line text, without a trailing newline.
    pub text: String,
}

impl LogLine {
    /// Creates a new line.
    pub fn new(seq: u64, text: impl Into<String>) -> Self {
        Self {
            seq,
            text: text.into(),
        }
    }
}
