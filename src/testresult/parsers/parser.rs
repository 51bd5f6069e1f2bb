use crate::lines::LogLine;

/// A framework-specific test-output state machine.
///
/// Parsers are sequential: each one is owned by a single delivery worker and
/// consumes the stream line by line through `&mut self`. They assemble
/// [`TestRun`](crate::TestRun)s and hand them to the shared
/// [`TestRunManager`](crate::TestRunManager); they never publish directly.
///
/// Panics thrown from `parse` are caught at the subscription boundary: the
/// line is dropped, `reset` is called, and the stream continues.
pub trait TestResultParser: Send + 'static {
    /// Stable parser name; doubles as the telemetry area.
    fn name(&self) -> &'static str;

    /// Parser version, part of the run identity.
    fn version(&self) -> &'static str;

    /// Identity stamped on every run this parser produces.
    fn uri(&self) -> String {
        format!("{}/{}", self.name(), self.version())
    }

    /// Consumes one line, advancing the state machine.
    fn parse(&mut self, line: &LogLine);

    /// End of stream: force-publish a run holding data, drop an untouched
    /// one silently.
    fn finish(&mut self);

    /// Returns to a clean initial state after a caught panic. The run under
    /// construction is lost.
    fn reset(&mut self);
}
