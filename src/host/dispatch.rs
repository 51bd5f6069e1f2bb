//! # LogPluginHost: the pipeline's front door.
//!
//! One host per monitored output stream. The producer calls
//! [`LogPluginHost::enqueue`] once per line and [`LogPluginHost::finish`]
//! after the last one; [`LogPluginHost::run`] supervises delivery from start
//! to drained.
//!
//! ```text
//! enqueue(text) ──► LineBus ──► [queue per plugin] ──► PluginRunner ──► plugin
//!                      ▲
//!   monitor tick ──────┘  samples depth/age, applies the backpressure policy
//!
//! finish() ──► run(): bus.complete() under drain_grace ──► finalize hooks
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::json;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::HostConfig;
use crate::diag::{TelemetryCollector, TraceLogger};
use crate::error::HostError;
use crate::lines::{panic_message, LineBus, SubscriptionId};
use crate::plugins::LogPlugin;

use super::health::{PluginHealth, PluginState};
use super::runner::PluginRunner;

/// Telemetry area for host-level records.
const TELEMETRY_AREA: &str = "LogPluginHost";

/// One attached plugin as the host tracks it.
struct RunnerEntry {
    name: &'static str,
    sub: SubscriptionId,
    state: PluginState,
    finalized: Arc<AtomicBool>,
}

/// Fans a line stream out to plugins and polices their lag.
///
/// Intended use: construct, hand lines to [`enqueue`](Self::enqueue) while
/// [`run`](Self::run) is pending (typically on its own task), call
/// [`finish`](Self::finish) after the last line, and await `run` for the
/// drain outcome. `run` is a consume-once operation; a host is not reused
/// for a second stream.
pub struct LogPluginHost {
    cfg: HostConfig,
    bus: Arc<LineBus>,
    pending: Mutex<Vec<Box<dyn LogPlugin>>>,
    runners: Arc<RwLock<Vec<RunnerEntry>>>,
    logger: Arc<dyn TraceLogger>,
    telemetry: Arc<dyn TelemetryCollector>,
    finished: AtomicBool,
    finish_signal: Notify,
}

impl LogPluginHost {
    /// Creates a host over the given plugin set and diagnostic sinks.
    pub fn new(
        cfg: HostConfig,
        plugins: Vec<Box<dyn LogPlugin>>,
        logger: Arc<dyn TraceLogger>,
        telemetry: Arc<dyn TelemetryCollector>,
    ) -> Self {
        Self {
            cfg,
            bus: Arc::new(LineBus::new()),
            pending: Mutex::new(plugins),
            runners: Arc::new(RwLock::new(Vec::new())),
            logger,
            telemetry,
            finished: AtomicBool::new(false),
            finish_signal: Notify::new(),
        }
    }

    /// Runs every plugin's `initialize` hook concurrently and attaches the
    /// survivors to the bus.
    ///
    /// A plugin that returns `Ok(false)`, errors, or panics is excluded with
    /// a log line; the host keeps running with the rest. Attached plugins
    /// start consuming immediately, so lines enqueued right after this call
    /// are never missed. Safe to call twice; the second call is a no-op.
    pub async fn initialize_all(&self) {
        let plugins: Vec<Box<dyn LogPlugin>> = {
            let mut pending = self.pending.lock().await;
            pending.drain(..).collect()
        };
        if plugins.is_empty() {
            return;
        }

        let outcomes = futures::future::join_all(plugins.into_iter().map(|mut plugin| async {
            let init = std::panic::AssertUnwindSafe(plugin.initialize())
                .catch_unwind()
                .await;
            (plugin, init)
        }))
        .await;

        for (plugin, init) in outcomes {
            let name = plugin.name();
            match init {
                Ok(Ok(true)) => self.attach(plugin).await,
                Ok(Ok(false)) => {
                    self.logger
                        .info(&format!("Plugin '{name}' declined to run."));
                }
                Ok(Err(err)) => {
                    self.logger
                        .warning(&format!("Plugin '{name}' failed to initialize: {err}"));
                }
                Err(payload) => {
                    self.logger.warning(&format!(
                        "Plugin '{name}' panicked during initialize: {}",
                        panic_message(payload)
                    ));
                }
            }
        }
    }

    /// Accepts one line from the producer.
    ///
    /// Lines arriving after [`finish`](Self::finish) are dropped with a
    /// verbose trace; the producer contract is not an error surface.
    pub async fn enqueue(&self, text: impl Into<String>) {
        if self.finished.load(Ordering::SeqCst) {
            self.logger.verbose("Line received after finish was dropped.");
            return;
        }
        if let Err(err) = self.bus.publish(text).await {
            self.logger.verbose(&format!("Line dropped: {err}"));
        }
    }

    /// Stops intake and signals [`run`](Self::run) to begin the drain.
    /// Idempotent; the second call does nothing.
    pub fn finish(&self) {
        if !self.finished.swap(true, Ordering::SeqCst) {
            self.finish_signal.notify_one();
        }
    }

    /// Supervises the stream from initialization to drained.
    ///
    /// Ensures [`initialize_all`](Self::initialize_all) has run, spawns the
    /// backpressure monitor, waits for the finish signal, then completes the
    /// bus under [`HostConfig::drain_grace`]: queues drain and every plugin
    /// that was not short-circuited runs its finalize hook. Finalize errors
    /// are logged, never propagated. When the grace expires first, the
    /// still-busy plugins are reported in
    /// [`HostError::DrainGraceExceeded`] and their workers are left behind
    /// rather than force-killed mid-call.
    pub async fn run(&self) -> Result<(), HostError> {
        self.initialize_all().await;

        let cancel = CancellationToken::new();
        let monitor = self.spawn_monitor(cancel.clone());

        self.wait_for_finish().await;

        let grace = self.cfg.drain_grace;
        let drained = tokio::time::timeout(grace, self.bus.complete()).await;
        cancel.cancel();
        let _ = monitor.await;

        match drained {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                self.logger
                    .warning(&format!("Drain finished with a failed subscription: {err}"));
                Ok(())
            }
            Err(_) => {
                let stuck = self.stuck_plugins().await;
                self.logger.error(&format!(
                    "Drain grace {grace:?} exceeded; still busy: {stuck:?}"
                ));
                Err(HostError::DrainGraceExceeded { grace, stuck })
            }
        }
    }

    /// Snapshot of one plugin's backpressure health, keyed by plugin name.
    /// `None` for unknown or excluded plugins.
    pub async fn health(&self, name: &str) -> Option<PluginHealth> {
        let (sub, state) = {
            let runners = self.runners.read().await;
            let entry = runners.iter().find(|r| r.name == name)?;
            (entry.sub, entry.state)
        };
        let (queue_depth, oldest_line_age) = self
            .bus
            .subscription_stats(sub)
            .await
            .unwrap_or((0, None));
        Some(PluginHealth {
            queue_depth,
            oldest_line_age,
            state,
        })
    }

    /// Wraps the plugin in a runner and subscribes it.
    async fn attach(&self, plugin: Box<dyn LogPlugin>) {
        let name = plugin.name();
        let finalized = Arc::new(AtomicBool::new(false));
        let runner = PluginRunner::new(plugin, Arc::clone(&self.logger), Arc::clone(&finalized));
        let sub = self.bus.subscribe(runner).await;
        self.runners.write().await.push(RunnerEntry {
            name,
            sub,
            state: PluginState::Healthy,
            finalized,
        });
        self.logger.verbose(&format!("Plugin '{name}' is consuming."));
    }

    async fn wait_for_finish(&self) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        self.finish_signal.notified().await;
    }

    /// Spawns the backpressure monitor; it samples every queue each tick
    /// until cancelled.
    fn spawn_monitor(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let monitor = QueueMonitor {
            bus: Arc::clone(&self.bus),
            runners: Arc::clone(&self.runners),
            buffering_after: self.cfg.recovery_threshold(),
            short_circuit_after: self.cfg.short_circuit_delay,
            logger: Arc::clone(&self.logger),
            telemetry: Arc::clone(&self.telemetry),
        };
        let tick = self.cfg.tick_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => monitor.tick().await,
                }
            }
        })
    }

    /// Plugins that neither finalized nor were short-circuited; reported
    /// when the drain grace expires.
    async fn stuck_plugins(&self) -> Vec<String> {
        let runners = self.runners.read().await;
        runners
            .iter()
            .filter(|r| {
                r.state != PluginState::ShortCircuited && !r.finalized.load(Ordering::SeqCst)
            })
            .map(|r| r.name.to_string())
            .collect()
    }
}

/// Per-tick sampling state shared with the monitor task.
struct QueueMonitor {
    bus: Arc<LineBus>,
    runners: Arc<RwLock<Vec<RunnerEntry>>>,
    buffering_after: Duration,
    short_circuit_after: Duration,
    logger: Arc<dyn TraceLogger>,
    telemetry: Arc<dyn TelemetryCollector>,
}

impl QueueMonitor {
    /// Samples every non-short-circuited plugin and applies the policy.
    ///
    /// The short-circuit check runs first: with equal thresholds a plugin
    /// goes straight to short-circuited rather than pausing at buffering.
    async fn tick(&self) {
        let watched: Vec<(&'static str, SubscriptionId, PluginState)> = {
            let runners = self.runners.read().await;
            runners
                .iter()
                .filter(|r| r.state != PluginState::ShortCircuited)
                .map(|r| (r.name, r.sub, r.state))
                .collect()
        };

        for (name, sub, state) in watched {
            let Some((depth, age)) = self.bus.subscription_stats(sub).await else {
                continue;
            };
            if depth > 0 {
                self.logger
                    .verbose(&format!("{name}: Pending process {depth} log lines."));
            }

            let oldest = age.unwrap_or(Duration::ZERO);
            if oldest > self.short_circuit_after {
                self.short_circuit(name, sub, depth, oldest).await;
                continue;
            }

            match state {
                PluginState::Healthy if oldest > self.buffering_after => {
                    self.set_state(sub, PluginState::Buffering).await;
                    self.logger
                        .warning(&format!("'{name}' has too many buffered outputs."));
                }
                PluginState::Buffering if depth == 0 => {
                    self.set_state(sub, PluginState::Healthy).await;
                    self.logger
                        .info(&format!("'{name}' has cleared out buffered outputs."));
                }
                _ => {}
            }
        }
    }

    /// Cuts a plugin off permanently: discards its backlog, detaches its
    /// worker, and records the event.
    async fn short_circuit(&self, name: &'static str, sub: SubscriptionId, depth: usize, age: Duration) {
        self.set_state(sub, PluginState::ShortCircuited).await;
        self.bus.abandon(sub).await;
        self.logger
            .warning(&format!("Plugin '{name}' has been short circuited"));
        self.telemetry.record(
            TELEMETRY_AREA,
            "PluginShortCircuited",
            json!({
                "plugin": name,
                "queue_depth": depth,
                "oldest_line_age_ms": age.as_millis() as u64,
            }),
            true,
        );
    }

    async fn set_state(&self, sub: SubscriptionId, state: PluginState) {
        let mut runners = self.runners.write().await;
        if let Some(entry) = runners.iter_mut().find(|r| r.sub == sub) {
            entry.state = state;
        }
    }
}
