//! # Line broadcast: one producer, N isolated subscribers.
//!
//! This module provides [`LineBus`], the fan-out primitive used twice in the
//! pipeline: once by the host to feed plugins, and once inside the
//! test-result plugin to feed parsers.
//!
//! ## Architecture
//! ```text
//! publish(text)
//!     │  assigns seq, wraps in Arc<LogLine>
//!     ├──► [queue 1] ──► worker 1 ──► handler1.on_line()
//!     │    (unbounded)       └──────► panic → SubscriptionError
//!     ├──► [queue 2] ──► worker 2 ──► handler2.on_line()
//!     └──► [queue N] ──► worker N ──► handlerN.on_line()
//!
//! complete()
//!     └──► close every queue ──► workers drain ──► handler.on_complete()
//! ```
//!
//! ## Rules
//! - **Per-subscriber FIFO**: each handler sees lines in sequence order,
//!   exactly once.
//! - **No cross-subscriber coupling**: handler A may process line N while B
//!   is still on N-500.
//! - **Isolation**: a failing or panicking handler ends only its own
//!   subscription; siblings keep receiving.
//! - **Unbounded queues**: the bus never drops a line for a live
//!   subscription; bounding memory is the owner's job (the host does it by
//!   abandoning short-circuited subscriptions).

mod bus;
mod handler;
mod line;
mod queue;

pub use bus::{LineBus, SubscriptionId};
pub use handler::LineHandler;
pub use line::LogLine;

pub(crate) use bus::panic_message;
