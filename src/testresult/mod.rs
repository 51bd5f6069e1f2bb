//! # Test-result scanning.
//!
//! Everything between raw log lines and published test runs:
//!
//! ```text
//!                    ┌────────────────────────────────────────────┐
//!                    │            TestResultLogPlugin             │
//!   host line ──────►│  ParserGateway ──► parsers ──► manager ────┼──► publisher
//!                    │  (inner fan-out)   (mocha,     (validate,  │
//!                    │                     python)     upload)    │
//!                    └────────────────────────────────────────────┘
//! ```
//!
//! Parsers are synchronous state machines; the gateway runs each behind its
//! own queue and panic boundary. The manager validates finished runs and
//! uploads them without blocking the stream.

mod gateway;
mod manager;
mod model;
mod plugin;
mod publisher;
mod registry;

pub mod parsers;

pub use manager::TestRunManager;
pub use model::{TestOutcome, TestResult, TestRun, TestRunSummary};
pub use plugin::TestResultLogPlugin;
pub use publisher::{MemoryPublisher, TestRunPublisher};
pub use registry::ParserRegistry;
