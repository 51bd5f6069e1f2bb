//! # Private FIFO delivery queue for one subscription.
//!
//! Each subscription owns one [`DeliveryQueue`]. The producer side pushes
//! timestamped lines; the delivery worker pops them one at a time. The queue
//! carries the enqueue instant of every item so the monitor can read the age
//! of the oldest undelivered line as a single snapshot.
//!
//! ## Rules
//! - `close()`: no more pushes; the worker drains what is queued, then ends.
//! - `discard()`: drops the backlog and ends the worker without draining.
//! - Both are terminal and idempotent; pushes after either are dropped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::lines::LogLine;

/// What the delivery worker got from the queue.
pub(crate) enum Dequeued {
    /// Next line to hand to the handler.
    Line(Arc<LogLine>),
    /// Queue closed and fully drained; run the end-of-stream hook.
    Closed,
    /// Queue discarded; stop without the end-of-stream hook.
    Discarded,
}

struct Queued {
    line: Arc<LogLine>,
    enqueued_at: Instant,
}

#[derive(Default)]
struct Inner {
    items: VecDeque<Queued>,
    closed: bool,
    discarded: bool,
}

/// Unbounded FIFO with a single consumer and snapshotable depth/age.
pub(crate) struct DeliveryQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl DeliveryQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            notify: Notify::new(),
        }
    }

    /// Enqueues a line. Dropped silently once the queue is closed or discarded.
    pub(crate) async fn push(&self, line: Arc<LogLine>) {
        let mut inner = self.inner.lock().await;
        if inner.closed || inner.discarded {
            return;
        }
        inner.items.push_back(Queued {
            line,
            enqueued_at: Instant::now(),
        });
        drop(inner);
        self.notify.notify_one();
    }

    /// Waits for the next line, or for a terminal state.
    pub(crate) async fn dequeue(&self) -> Dequeued {
        loop {
            {
                let mut inner = self.inner.lock().await;
                if inner.discarded {
                    return Dequeued::Discarded;
                }
                if let Some(item) = inner.items.pop_front() {
                    return Dequeued::Line(item.line);
                }
                if inner.closed {
                    return Dequeued::Closed;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Stops intake; queued lines still get delivered.
    pub(crate) async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        drop(inner);
        self.notify.notify_one();
    }

    /// Stops intake and drops the backlog.
    pub(crate) async fn discard(&self) {
        let mut inner = self.inner.lock().await;
        inner.discarded = true;
        inner.items.clear();
        drop(inner);
        self.notify.notify_one();
    }

    /// Depth and oldest-undelivered age, read under one lock acquisition.
    pub(crate) async fn stats(&self) -> (usize, Option<Duration>) {
        let inner = self.inner.lock().await;
        let depth = inner.items.len();
        let age = inner.items.front().map(|q| q.enqueued_at.elapsed());
        (depth, age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(seq: u64) -> Arc<LogLine> {
        Arc::new(LogLine::new(seq, format!("line {seq}")))
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let q = DeliveryQueue::new();
        q.push(line(1)).await;
        q.push(line(2)).await;

        match q.dequeue().await {
            Dequeued::Line(l) => assert_eq!(l.seq, 1),
            _ => panic!("expected a line"),
        }
        match q.dequeue().await {
            Dequeued::Line(l) => assert_eq!(l.seq, 2),
            _ => panic!("expected a line"),
        }
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let q = DeliveryQueue::new();
        q.push(line(1)).await;
        q.close().await;
        q.push(line(2)).await; // dropped

        assert!(matches!(q.dequeue().await, Dequeued::Line(l) if l.seq == 1));
        assert!(matches!(q.dequeue().await, Dequeued::Closed));
    }

    #[tokio::test]
    async fn test_discard_drops_backlog() {
        let q = DeliveryQueue::new();
        q.push(line(1)).await;
        q.discard().await;

        assert!(matches!(q.dequeue().await, Dequeued::Discarded));
        assert_eq!(q.stats().await.0, 0);
    }

    #[tokio::test]
    async fn test_stats_reflect_backlog() {
        let q = DeliveryQueue::new();
        assert_eq!(q.stats().await, (0, None));

        q.push(line(1)).await;
        q.push(line(2)).await;
        let (depth, age) = q.stats().await;
        assert_eq!(depth, 2);
        assert!(age.is_some());
    }
}
