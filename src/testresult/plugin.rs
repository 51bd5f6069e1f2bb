//! # Test-result plugin.
//!
//! Bridges the plugin host to the parser pipeline: every line the host
//! delivers is fanned out to the registered parsers, and finalize closes
//! the pipeline and waits out the in-flight publishes.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;

use crate::diag::{TelemetryCollector, TraceLogger};
use crate::error::PluginError;
use crate::lines::{panic_message, LogLine};
use crate::plugins::LogPlugin;
use crate::testresult::gateway::ParserGateway;
use crate::testresult::manager::TestRunManager;
use crate::testresult::publisher::TestRunPublisher;
use crate::testresult::registry::ParserRegistry;

/// Scans a log stream for test results and publishes the runs it finds.
pub struct TestResultLogPlugin {
    registry: ParserRegistry,
    manager: Arc<TestRunManager>,
    logger: Arc<dyn TraceLogger>,
    telemetry: Arc<dyn TelemetryCollector>,
    gateway: Option<ParserGateway>,
}

impl TestResultLogPlugin {
    /// Creates the plugin with every built-in parser.
    pub fn new(
        publisher: Arc<dyn TestRunPublisher>,
        logger: Arc<dyn TraceLogger>,
        telemetry: Arc<dyn TelemetryCollector>,
    ) -> Self {
        Self::with_registry(
            ParserRegistry::with_default_parsers(),
            publisher,
            logger,
            telemetry,
        )
    }

    /// Creates the plugin with a caller-picked parser set.
    pub fn with_registry(
        registry: ParserRegistry,
        publisher: Arc<dyn TestRunPublisher>,
        logger: Arc<dyn TraceLogger>,
        telemetry: Arc<dyn TelemetryCollector>,
    ) -> Self {
        let manager = Arc::new(TestRunManager::new(publisher, logger.clone()));
        Self {
            registry,
            manager,
            logger,
            telemetry,
            gateway: None,
        }
    }
}

#[async_trait]
impl LogPlugin for TestResultLogPlugin {
    fn name(&self) -> &'static str {
        "TestResultLogPlugin"
    }

    /// Builds the parsers and the inner fan-out. Declines when there is
    /// nothing to run or a parser cannot be constructed.
    async fn initialize(&mut self) -> Result<bool, PluginError> {
        if self.registry.is_empty() {
            self.logger
                .info("TestResultLogPlugin : No parsers are registered; declining to run.");
            return Ok(false);
        }
        let parsers = match catch_unwind(AssertUnwindSafe(|| {
            self.registry
                .build_all(&self.manager, &self.logger, &self.telemetry)
        })) {
            Ok(parsers) => parsers,
            Err(payload) => {
                self.logger.error(&format!(
                    "TestResultLogPlugin : A parser factory panicked during construction: {}",
                    panic_message(payload)
                ));
                return Ok(false);
            }
        };
        self.gateway = Some(ParserGateway::new(parsers, &self.logger, &self.telemetry).await);
        Ok(true)
    }

    async fn process_line(&mut self, line: &LogLine) -> Result<(), PluginError> {
        if let Some(gateway) = &self.gateway {
            gateway
                .process(&line.text)
                .await
                .map_err(|err| PluginError::Process {
                    error: err.to_string(),
                })?;
        }
        Ok(())
    }

    /// Closes the parser pipeline, then waits for every in-flight publish.
    async fn finalize(&mut self) -> Result<(), PluginError> {
        let completed = match &self.gateway {
            Some(gateway) => gateway.complete().await,
            None => Ok(()),
        };
        self.manager.drain().await;
        completed.map_err(|err| PluginError::Finalize {
            error: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{MemoryLogger, TelemetryStore};
    use crate::testresult::publisher::MemoryPublisher;

    struct Fixture {
        plugin: TestResultLogPlugin,
        publisher: Arc<MemoryPublisher>,
        logger: Arc<MemoryLogger>,
    }

    fn fixture_with(registry: ParserRegistry) -> Fixture {
        let publisher = Arc::new(MemoryPublisher::new());
        let logger = Arc::new(MemoryLogger::new());
        let plugin = TestResultLogPlugin::with_registry(
            registry,
            publisher.clone(),
            logger.clone(),
            Arc::new(TelemetryStore::new()),
        );
        Fixture {
            plugin,
            publisher,
            logger,
        }
    }

    async fn feed(plugin: &mut TestResultLogPlugin, lines: &[&str]) {
        for (i, text) in lines.iter().enumerate() {
            plugin
                .process_line(&LogLine::new((i + 1) as u64, *text))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_scans_a_stream_end_to_end() {
        let mut f = fixture_with(ParserRegistry::with_default_parsers());
        assert!(f.plugin.initialize().await.unwrap());

        feed(
            &mut f.plugin,
            &["  ✓ adds numbers (3ms)", "  1 passing (3ms)", ""],
        )
        .await;
        f.plugin.finalize().await.unwrap();

        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].parser_uri, "MochaTestResultParser/1.0");
        assert_eq!(runs[0].passed.len(), 1);
        assert_eq!(runs[0].passed[0].name, "adds numbers");
    }

    #[tokio::test]
    async fn test_empty_registry_declines_to_run() {
        let mut f = fixture_with(ParserRegistry::new());
        assert!(!f.plugin.initialize().await.unwrap());
        assert!(f.logger.contains("No parsers are registered"));
    }

    #[tokio::test]
    async fn test_panicking_parser_factory_declines_to_run() {
        let mut registry = ParserRegistry::new();
        registry.register(|_, _, _| panic!("bad factory"));
        let mut f = fixture_with(registry);

        assert!(!f.plugin.initialize().await.unwrap());
        assert!(f.logger.contains("parser factory panicked"));
    }

    #[tokio::test]
    async fn test_finalize_without_initialize_is_quiet() {
        let mut f = fixture_with(ParserRegistry::with_default_parsers());
        f.plugin.finalize().await.unwrap();
        assert_eq!(f.publisher.count(), 0);
    }
}
