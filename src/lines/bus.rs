//! # Fan-out bus for a single line stream.
//!
//! [`LineBus`] accepts lines from one producer and delivers a copy to every
//! registered [`LineHandler`], each behind a private FIFO queue with its own
//! delivery worker.
//!
//! ## Rules
//! - **Sequence authority**: `publish` assigns the sequence number; every
//!   handler observes lines in that order.
//! - **Registration cutoff**: a handler subscribed after a `publish` call
//!   never sees that line.
//! - **Completion**: `complete()` closes all queues, waits for workers to
//!   drain and run their end-of-stream hooks, and reports the first abnormal
//!   ending. It is idempotent and has no timeout of its own; owners needing
//!   a bound wrap it (the host wraps it in its drain grace).
//! - **Abandon**: drops a subscription's backlog and stops waiting for its
//!   worker; an in-flight handler call is never interrupted, only orphaned.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{BusError, SubscriptionError};
use crate::lines::handler::LineHandler;
use crate::lines::line::LogLine;

use super::queue::{DeliveryQueue, Dequeued};

/// Opaque identity of one subscription, valid only for the bus that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// One registered handler: its queue and its delivery worker.
struct BusSubscription {
    id: SubscriptionId,
    name: &'static str,
    queue: Arc<DeliveryQueue>,
    worker: JoinHandle<Result<(), SubscriptionError>>,
}

#[derive(Default)]
struct BusState {
    subs: Vec<BusSubscription>,
    next_seq: u64,
    next_id: u64,
    completed: bool,
}

/// Single-producer broadcast of a line stream to isolated subscribers.
pub struct LineBus {
    state: Mutex<BusState>,
}

impl LineBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BusState::default()),
        }
    }

    /// Registers a handler and spawns its delivery worker.
    ///
    /// The worker consumes the private queue one line at a time, catching
    /// panics so a faulty handler ends only its own subscription. On a bus
    /// that already completed, the subscription ends immediately (the
    /// end-of-stream hook still runs, with no lines before it).
    pub async fn subscribe<H: LineHandler>(&self, handler: H) -> SubscriptionId {
        let queue = Arc::new(DeliveryQueue::new());
        let name = handler.name();
        let worker = spawn_delivery_worker(handler, Arc::clone(&queue));

        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        if state.completed {
            queue.close().await;
        }
        state.subs.push(BusSubscription {
            id,
            name,
            queue,
            worker,
        });
        id
    }

    /// Publishes one line to every live subscription.
    ///
    /// Assigns the next sequence number (starting at 1) and returns it. The
    /// queues are unbounded, so the call finishes as soon as every queue has
    /// taken the line.
    pub async fn publish(&self, text: impl Into<String>) -> Result<u64, BusError> {
        let mut state = self.state.lock().await;
        if state.completed {
            return Err(BusError::Completed);
        }
        state.next_seq += 1;
        let line = Arc::new(LogLine::new(state.next_seq, text));
        for sub in &state.subs {
            sub.queue.push(Arc::clone(&line)).await;
        }
        Ok(line.seq)
    }

    /// Gracefully removes one subscription: closes its queue, lets the
    /// worker drain, and awaits it. Unknown ids are a no-op.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError> {
        let Some(sub) = self.take_subscription(id).await else {
            return Ok(());
        };
        sub.queue.close().await;
        join_worker(sub.name, sub.worker).await
    }

    /// Forcefully removes one subscription: drops its backlog and detaches
    /// its worker without awaiting it. Unknown ids are a no-op.
    pub async fn abandon(&self, id: SubscriptionId) {
        if let Some(sub) = self.take_subscription(id).await {
            sub.queue.discard().await;
            // Dropping the JoinHandle detaches the worker; a handler stuck
            // mid-call keeps running unobserved until process exit.
            drop(sub.worker);
        }
    }

    /// Ends the stream: closes every remaining queue, waits for every worker
    /// to drain and run its end-of-stream hook, and returns the first
    /// abnormal ending. Safe to call twice; the second call returns `Ok`.
    pub async fn complete(&self) -> Result<(), BusError> {
        let subs = {
            let mut state = self.state.lock().await;
            state.completed = true;
            std::mem::take(&mut state.subs)
        };

        for sub in &subs {
            sub.queue.close().await;
        }

        let mut first_err = None;
        for sub in subs {
            if let Err(err) = join_worker(sub.name, sub.worker).await {
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Queue depth and oldest-undelivered age for one subscription, read as
    /// a single snapshot. `None` for unknown or removed ids.
    pub async fn subscription_stats(&self, id: SubscriptionId) -> Option<(usize, Option<Duration>)> {
        let queue = {
            let state = self.state.lock().await;
            state
                .subs
                .iter()
                .find(|s| s.id == id)
                .map(|s| Arc::clone(&s.queue))
        };
        match queue {
            Some(q) => Some(q.stats().await),
            None => None,
        }
    }

    async fn take_subscription(&self, id: SubscriptionId) -> Option<BusSubscription> {
        let mut state = self.state.lock().await;
        let idx = state.subs.iter().position(|s| s.id == id)?;
        Some(state.subs.remove(idx))
    }
}

impl Default for LineBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one subscription: pop, handle, repeat; panics are caught so they end
/// only this subscription. On an abnormal ending the backlog is discarded so
/// the dead subscription stops accumulating lines.
fn spawn_delivery_worker<H: LineHandler>(
    handler: H,
    queue: Arc<DeliveryQueue>,
) -> JoinHandle<Result<(), SubscriptionError>> {
    tokio::spawn(async move {
        let mut handler = handler;
        loop {
            match queue.dequeue().await {
                Dequeued::Line(line) => {
                    let fut = handler.on_line(line.as_ref());
                    match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            queue.discard().await;
                            return Err(err);
                        }
                        Err(payload) => {
                            queue.discard().await;
                            return Err(SubscriptionError::HandlerPanicked {
                                info: panic_message(payload),
                            });
                        }
                    }
                }
                Dequeued::Closed => {
                    let fut = handler.on_complete();
                    return match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        Ok(res) => res,
                        Err(payload) => Err(SubscriptionError::HandlerPanicked {
                            info: panic_message(payload),
                        }),
                    };
                }
                Dequeued::Discarded => return Ok(()),
            }
        }
    })
}

async fn join_worker(
    name: &'static str,
    worker: JoinHandle<Result<(), SubscriptionError>>,
) -> Result<(), BusError> {
    match worker.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(BusError::Subscription {
            subscription: name.to_string(),
            source,
        }),
        Err(_join) => Err(BusError::Subscription {
            subscription: name.to_string(),
            source: SubscriptionError::HandlerPanicked {
                info: "delivery worker panicked".to_string(),
            },
        }),
    }
}

/// Best-effort text for a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
