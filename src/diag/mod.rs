//! # Diagnostic seams: trace logging and telemetry.
//!
//! Every component in this crate receives its diagnostic sinks explicitly at
//! construction; there is no global logger lookup. The two seams are:
//!
//! - [`TraceLogger`]: leveled, human-readable diagnostics. Ships with
//!   [`TracingLogger`] (forwards to the `tracing` macros) and
//!   [`MemoryLogger`] (captures lines for inspection).
//! - [`TelemetryCollector`]: countable anomaly records keyed by
//!   `(area, event)`. Ships with [`TelemetryStore`] (in-memory, groupable).

mod telemetry;
mod trace;

pub use telemetry::{TelemetryCollector, TelemetryStore};
pub use trace::{MemoryLogger, TraceLevel, TraceLogger, TracingLogger};
