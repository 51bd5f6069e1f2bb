//! # Parser registry.
//!
//! Holds factories rather than parser instances so each log stream gets its
//! own freshly-constructed state machines.

use std::sync::Arc;

use crate::diag::{TelemetryCollector, TraceLogger};
use crate::testresult::manager::TestRunManager;
use crate::testresult::parsers::{MochaParser, PythonParser, TestResultParser};

type ParserFactory = Box<
    dyn Fn(
            Arc<TestRunManager>,
            Arc<dyn TraceLogger>,
            Arc<dyn TelemetryCollector>,
        ) -> Box<dyn TestResultParser>
        + Send
        + Sync,
>;

/// A set of parser factories to attach to a log stream.
pub struct ParserRegistry {
    factories: Vec<ParserFactory>,
}

impl ParserRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Creates a registry with every built-in parser registered.
    pub fn with_default_parsers() -> Self {
        let mut registry = Self::new();
        registry.register(|manager, logger, telemetry| {
            Box::new(MochaParser::new(manager, logger, telemetry)) as Box<dyn TestResultParser>
        });
        registry.register(|manager, logger, telemetry| {
            Box::new(PythonParser::new(manager, logger, telemetry)) as Box<dyn TestResultParser>
        });
        registry
    }

    /// Registers a factory for one parser.
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn(
                Arc<TestRunManager>,
                Arc<dyn TraceLogger>,
                Arc<dyn TelemetryCollector>,
            ) -> Box<dyn TestResultParser>
            + Send
            + Sync
            + 'static,
    {
        self.factories.push(Box::new(factory));
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Builds one instance of every registered parser.
    pub fn build_all(
        &self,
        manager: &Arc<TestRunManager>,
        logger: &Arc<dyn TraceLogger>,
        telemetry: &Arc<dyn TelemetryCollector>,
    ) -> Vec<Box<dyn TestResultParser>> {
        self.factories
            .iter()
            .map(|factory| factory(manager.clone(), logger.clone(), telemetry.clone()))
            .collect()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{MemoryLogger, TelemetryStore};
    use crate::lines::LogLine;
    use crate::testresult::publisher::MemoryPublisher;

    struct NullParser;

    impl TestResultParser for NullParser {
        fn name(&self) -> &'static str {
            "NullParser"
        }

        fn version(&self) -> &'static str {
            "1.0"
        }

        fn parse(&mut self, _line: &LogLine) {}

        fn finish(&mut self) {}

        fn reset(&mut self) {}
    }

    fn deps() -> (
        Arc<TestRunManager>,
        Arc<dyn TraceLogger>,
        Arc<dyn TelemetryCollector>,
    ) {
        let logger = Arc::new(MemoryLogger::new());
        let manager = Arc::new(TestRunManager::new(
            Arc::new(MemoryPublisher::new()),
            logger.clone(),
        ));
        (manager, logger, Arc::new(TelemetryStore::new()))
    }

    #[test]
    fn test_default_registry_builds_every_builtin_parser() {
        let registry = ParserRegistry::with_default_parsers();
        assert_eq!(registry.len(), 2);

        let (manager, logger, telemetry) = deps();
        let parsers = registry.build_all(&manager, &logger, &telemetry);
        let names: Vec<&str> = parsers.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["MochaTestResultParser", "PythonTestResultParser"]);
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ParserRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registered_factory_is_built() {
        let mut registry = ParserRegistry::new();
        registry.register(|_, _, _| Box::new(NullParser) as Box<dyn TestResultParser>);

        let (manager, logger, telemetry) = deps();
        let parsers = registry.build_all(&manager, &logger, &telemetry);
        assert_eq!(parsers.len(), 1);
        assert_eq!(parsers[0].name(), "NullParser");
        assert_eq!(parsers[0].uri(), "NullParser/1.0");
    }
}
