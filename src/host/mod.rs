//! # Dispatch host: plugin lifecycle, fan-out, and backpressure.
//!
//! [`LogPluginHost`] owns a [`LineBus`](crate::LineBus), attaches one
//! delivery worker per initialized plugin, and polices lag with a monitor
//! task.
//!
//! ## Backpressure policy
//! The monitor samples each plugin's queue every tick and classifies it by
//! the age of the oldest undelivered line:
//! ```text
//! Healthy ── age > recovery threshold ──► Buffering ── depth == 0 ──► Healthy
//!    │                                        │
//!    └────────── age > short-circuit delay ───┴──► ShortCircuited (terminal)
//! ```
//! A short-circuited plugin's queue is discarded and its worker abandoned;
//! it receives no further lines and no finalize call.
//!
//! ## Rules
//! - A plugin that declines or fails `initialize` is excluded with a
//!   warning; the host keeps running.
//! - Line-processing errors are traced once per plugin; delivery continues.
//! - `finish()` stops intake; `run()` drains the bus and runs finalize hooks
//!   under [`HostConfig::drain_grace`](crate::HostConfig), reporting the
//!   plugins still busy when the grace expires.

mod dispatch;
mod health;
mod runner;

pub use dispatch::LogPluginHost;
pub use health::{PluginHealth, PluginState};
