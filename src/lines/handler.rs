//! # Subscriber contract for the line bus.
//!
//! `LineHandler` is the extension point for consuming a line stream. Each
//! handler is driven by a dedicated worker loop fed by a private FIFO queue
//! owned by the [`LineBus`](crate::lines::LineBus).
//!
//! ## Contract
//! - Implementations may be slow; they never block the publisher nor other
//!   handlers, only their own queue grows.
//! - Methods take `&mut self`: the worker owns its handler exclusively, so
//!   stateful handlers (parsers) need no interior mutability.
//! - Returning `Err` ends the subscription; sibling subscriptions keep
//!   running and the owner learns about it from `complete()`.

use async_trait::async_trait;

use crate::error::SubscriptionError;
use crate::lines::LogLine;

/// Contract for line consumers.
///
/// Called from a subscription-dedicated worker task, one line at a time, in
/// sequence order.
#[async_trait]
pub trait LineHandler: Send + 'static {
    /// Handles a single line.
    async fn on_line(&mut self, line: &LogLine) -> Result<(), SubscriptionError>;

    /// Runs once after the last line, when the queue closed normally.
    ///
    /// Not called when the subscription is abandoned.
    async fn on_complete(&mut self) -> Result<(), SubscriptionError> {
        Ok(())
    }

    /// Human-readable name (for logs and `complete()` error reports).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
