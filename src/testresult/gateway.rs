//! # Parser fan-out.
//!
//! Parsers consume the same stream the plugin does, so the gateway reuses
//! the line bus for its own inner fan-out: one subscription per parser,
//! each with a private queue and worker.
//!
//! ## Rules
//! - A panic in `parse` is caught, logged, and answered with `reset`; the
//!   parser stays subscribed and sees the next line with fresh state.
//! - A panic in `finish` or `reset` is caught and logged; nothing else.
//! - Parsers never end their subscription; a broken one keeps getting
//!   lines and keeps being reset.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::diag::{TelemetryCollector, TraceLogger};
use crate::error::{BusError, SubscriptionError};
use crate::lines::{panic_message, LineBus, LineHandler, LogLine};
use crate::testresult::parsers::TestResultParser;

/// Runs one parser behind a panic boundary.
struct ParserSubscriber {
    parser: Box<dyn TestResultParser>,
    logger: Arc<dyn TraceLogger>,
    telemetry: Arc<dyn TelemetryCollector>,
}

#[async_trait]
impl LineHandler for ParserSubscriber {
    async fn on_line(&mut self, line: &LogLine) -> Result<(), SubscriptionError> {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.parser.parse(line))) {
            let info = panic_message(payload);
            self.logger.error(&format!(
                "Parser '{}' panicked on line {}: {info}",
                self.parser.name(),
                line.seq
            ));
            self.telemetry.record(
                self.parser.name(),
                "ParseException",
                json!({ "line": line.seq, "info": info }),
                true,
            );
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.parser.reset())) {
                self.logger.error(&format!(
                    "Parser '{}' panicked during reset: {}",
                    self.parser.name(),
                    panic_message(payload)
                ));
            }
        }
        Ok(())
    }

    async fn on_complete(&mut self) -> Result<(), SubscriptionError> {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.parser.finish())) {
            self.logger.error(&format!(
                "Parser '{}' panicked during finish: {}",
                self.parser.name(),
                panic_message(payload)
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.parser.name()
    }
}

/// Fans one line stream out to a set of parsers.
pub(crate) struct ParserGateway {
    bus: LineBus,
}

impl ParserGateway {
    pub(crate) async fn new(
        parsers: Vec<Box<dyn TestResultParser>>,
        logger: &Arc<dyn TraceLogger>,
        telemetry: &Arc<dyn TelemetryCollector>,
    ) -> Self {
        let bus = LineBus::new();
        for parser in parsers {
            bus.subscribe(ParserSubscriber {
                parser,
                logger: Arc::clone(logger),
                telemetry: Arc::clone(telemetry),
            })
            .await;
        }
        Self { bus }
    }

    pub(crate) async fn process(&self, text: &str) -> Result<u64, BusError> {
        self.bus.publish(text).await
    }

    /// Closes the inner stream and waits for every parser to drain and run
    /// `finish`.
    pub(crate) async fn complete(&self) -> Result<(), BusError> {
        self.bus.complete().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{MemoryLogger, TelemetryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    struct PanicOnTrigger {
        trigger: &'static str,
        seen: Arc<StdMutex<Vec<String>>>,
        resets: Arc<AtomicUsize>,
    }

    impl TestResultParser for PanicOnTrigger {
        fn name(&self) -> &'static str {
            "PanicOnTrigger"
        }

        fn version(&self) -> &'static str {
            "1.0"
        }

        fn parse(&mut self, line: &LogLine) {
            if line.text == self.trigger {
                panic!("tripped");
            }
            self.seen.lock().unwrap().push(line.text.clone());
        }

        fn finish(&mut self) {}

        fn reset(&mut self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Tracker {
        seen: Arc<StdMutex<Vec<String>>>,
    }

    impl TestResultParser for Tracker {
        fn name(&self) -> &'static str {
            "Tracker"
        }

        fn version(&self) -> &'static str {
            "1.0"
        }

        fn parse(&mut self, line: &LogLine) {
            self.seen.lock().unwrap().push(line.text.clone());
        }

        fn finish(&mut self) {
            self.seen.lock().unwrap().push("finished".to_string());
        }

        fn reset(&mut self) {}
    }

    #[tokio::test]
    async fn test_panicking_parser_is_reset_and_keeps_consuming() {
        let logger = Arc::new(MemoryLogger::new());
        let telemetry = Arc::new(TelemetryStore::new());
        let panicky_seen = Arc::new(StdMutex::new(Vec::new()));
        let resets = Arc::new(AtomicUsize::new(0));
        let sibling_seen = Arc::new(StdMutex::new(Vec::new()));

        let parsers: Vec<Box<dyn TestResultParser>> = vec![
            Box::new(PanicOnTrigger {
                trigger: "boom",
                seen: panicky_seen.clone(),
                resets: resets.clone(),
            }),
            Box::new(Tracker {
                seen: sibling_seen.clone(),
            }),
        ];
        let logger_dyn: Arc<dyn TraceLogger> = logger.clone();
        let telemetry_dyn: Arc<dyn TelemetryCollector> = telemetry.clone();
        let gateway = ParserGateway::new(parsers, &logger_dyn, &telemetry_dyn).await;

        gateway.process("a").await.unwrap();
        gateway.process("boom").await.unwrap();
        gateway.process("b").await.unwrap();
        gateway.complete().await.unwrap();

        assert_eq!(*panicky_seen.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(resets.load(Ordering::SeqCst), 1);
        assert_eq!(
            *sibling_seen.lock().unwrap(),
            vec!["a", "boom", "b", "finished"]
        );
        assert!(logger.contains("Parser 'PanicOnTrigger' panicked on line 2"));
        assert_eq!(telemetry.count("PanicOnTrigger", "ParseException"), 1);
    }

    #[tokio::test]
    async fn test_complete_runs_finish_once() {
        let logger: Arc<dyn TraceLogger> = Arc::new(MemoryLogger::new());
        let telemetry: Arc<dyn TelemetryCollector> = Arc::new(TelemetryStore::new());
        let seen = Arc::new(StdMutex::new(Vec::new()));

        let parsers: Vec<Box<dyn TestResultParser>> =
            vec![Box::new(Tracker { seen: seen.clone() })];
        let gateway = ParserGateway::new(parsers, &logger, &telemetry).await;

        gateway.process("x").await.unwrap();
        gateway.complete().await.unwrap();
        gateway.complete().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["x", "finished"]);
        assert!(gateway.process("late").await.is_err());
    }
}
