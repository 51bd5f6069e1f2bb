use async_trait::async_trait;

use crate::error::PluginError;
use crate::lines::LogLine;

/// One consumer of the host's line stream.
///
/// Methods take `&mut self`: the host gives each plugin a dedicated delivery
/// worker, so implementations can hold plain mutable state.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use logvisor::{LogLine, LogPlugin, PluginError};
///
/// struct LineCounter {
///     seen: usize,
/// }
///
/// #[async_trait]
/// impl LogPlugin for LineCounter {
///     fn name(&self) -> &'static str {
///         "line-counter"
///     }
///
///     async fn process_line(&mut self, _line: &LogLine) -> Result<(), PluginError> {
///         self.seen += 1;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait LogPlugin: Send + 'static {
    /// Stable name used in diagnostics and health lookups.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// One-time setup before any line is delivered.
    ///
    /// Return `Ok(true)` to participate in the run, `Ok(false)` to decline
    /// (the host skips this plugin without treating it as a failure). Errors
    /// and panics also exclude the plugin, with a warning.
    async fn initialize(&mut self) -> Result<bool, PluginError> {
        Ok(true)
    }

    /// Called once per line, in publish order.
    async fn process_line(&mut self, line: &LogLine) -> Result<(), PluginError>;

    /// Called once after the last line, unless the plugin was
    /// short-circuited.
    async fn finalize(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}
