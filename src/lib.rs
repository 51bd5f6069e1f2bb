//! # logvisor
//!
//! **Logvisor** is a live log-processing pipeline for build agents.
//!
//! It fans one console stream out to isolated plugins, polices their lag
//! with a backpressure monitor, and ships with a plugin that scans the
//! stream for test results and publishes the runs it finds. The crate is
//! designed as a building block for agents that must watch their own output
//! without ever slowing it down.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                     ┌─────────────────────────────────────────────┐
//!  enqueue(line) ────►│  LogPluginHost                              │
//!  finish()      ────►│  - LineBus (sequence-stamped fan-out)       │
//!                     │  - QueueMonitor (depth/age per plugin)      │
//!                     │  - drain grace (bounds drain and finalize)  │
//!                     └───────┬──────────────┬──────────────┬───────┘
//!                             ▼              ▼              ▼
//!                     ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//!                     │ queue+worker│ │ queue+worker│ │ queue+worker│
//!                     │ PluginRunner│ │ PluginRunner│ │ PluginRunner│
//!                     └──────┬──────┘ └──────┬──────┘ └──────┬──────┘
//!                            ▼               ▼               ▼
//!                        LogPlugin       LogPlugin   TestResultLogPlugin
//!                                                            │
//!                                   ┌────────────────────────┴─────┐
//!                                   │ ParserGateway (inner fan-out)│
//!                                   │   MochaParser, PythonParser  │
//!                                   │     └──► TestRunManager ─────┼──► TestRunPublisher
//!                                   └──────────────────────────────┘
//! ```
//!
//! ### Backpressure
//! ```text
//! every monitor tick, for every attached plugin:
//!
//!   ├─► (depth, oldest age) = snapshot of its private queue
//!   │
//!   ├─► oldest age > short_circuit_delay ──► ShortCircuited
//!   │       - backlog discarded, worker detached, finalize skipped
//!   │       - terminal: the plugin is never watched again
//!   │
//!   ├─► Healthy   and oldest age > recovery threshold ──► Buffering (warn)
//!   └─► Buffering and depth == 0                      ──► Healthy   (info)
//! ```
//!
//! A slow plugin only ever grows its own queue; the producer and the other
//! plugins never wait for it.
//!
//! ## Features
//! | Area             | Description                                                     | Key types / traits                                                |
//! |------------------|-----------------------------------------------------------------|-------------------------------------------------------------------|
//! | **Fan-out**      | One producer, isolated per-plugin queues, ordered delivery.     | [`LineBus`], [`LineHandler`], [`LogLine`]                         |
//! | **Plugins**      | Async consumers with initialize/process/finalize lifecycle.     | [`LogPlugin`], [`LogPluginHost`]                                  |
//! | **Backpressure** | Lag detection, recovery, and short-circuiting of stuck plugins. | [`HostConfig`], [`PluginHealth`], [`PluginState`]                 |
//! | **Test results** | Reporter-format parsers and validated run publishing.           | [`TestResultLogPlugin`], [`ParserRegistry`], [`TestRunPublisher`] |
//! | **Diagnostics**  | Injected trace logging and countable telemetry.                 | [`TraceLogger`], [`TelemetryCollector`]                           |
//! | **Errors**       | Typed errors for the host, bus, plugins, and publishing.        | [`HostError`], [`BusError`], [`PluginError`]                      |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//!
//! use logvisor::{
//!     HostConfig, LogPlugin, LogPluginHost, MemoryPublisher, TelemetryStore,
//!     TestResultLogPlugin, TracingLogger,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tracing_subscriber::fmt().with_env_filter("info").init();
//!
//!     let logger = Arc::new(TracingLogger::new());
//!     let telemetry = Arc::new(TelemetryStore::new());
//!     let publisher = Arc::new(MemoryPublisher::new());
//!
//!     let plugins: Vec<Box<dyn LogPlugin>> = vec![Box::new(TestResultLogPlugin::new(
//!         publisher.clone(),
//!         logger.clone(),
//!         telemetry.clone(),
//!     ))];
//!     let host = Arc::new(LogPluginHost::new(
//!         HostConfig::default(),
//!         plugins,
//!         logger,
//!         telemetry,
//!     ));
//!
//!     // Attach plugins before the first line so nothing is missed, then
//!     // let run() supervise the stream on its own task.
//!     host.initialize_all().await;
//!     let supervisor = tokio::spawn({
//!         let host = host.clone();
//!         async move { host.run().await }
//!     });
//!
//!     host.enqueue("  ✓ adds numbers (12ms)").await;
//!     host.enqueue("  1 passing (12ms)").await;
//!     host.enqueue("").await;
//!     host.finish();
//!     supervisor.await??;
//!
//!     assert_eq!(publisher.count(), 1);
//!     Ok(())
//! }
//! ```
mod config;
mod diag;
mod error;
mod host;
mod lines;
mod plugins;
mod testresult;

// ---- Public re-exports ----

pub use config::HostConfig;
pub use diag::{
    MemoryLogger, TelemetryCollector, TelemetryStore, TraceLevel, TraceLogger, TracingLogger,
};
pub use error::{BusError, HostError, PluginError, PublishError, SubscriptionError};
pub use host::{LogPluginHost, PluginHealth, PluginState};
pub use lines::{LineBus, LineHandler, LogLine, SubscriptionId};
pub use plugins::LogPlugin;
pub use testresult::parsers::{MochaParser, PythonParser, TestResultParser};
pub use testresult::{
    MemoryPublisher, ParserRegistry, TestOutcome, TestResult, TestResultLogPlugin, TestRun,
    TestRunManager, TestRunPublisher, TestRunSummary,
};
