//! # Run manager: validation gate in front of the publisher.
//!
//! Parsers hand completed [`TestRun`]s to a shared [`TestRunManager`]. The
//! manager validates counts synchronously, then uploads on a spawned task so
//! the parsing hot path never waits on the network.
//!
//! ## Validation rules
//! - no summary at all: the run is logged and dropped
//! - `total_tests` smaller than passed + failed: recomputed from the totals
//! - a summary count that contradicts its detailed list: the list is
//!   cleared, the summary count wins

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use crate::diag::TraceLogger;
use crate::error::PublishError;

use super::model::TestRun;
use super::publisher::TestRunPublisher;

/// One upload still in flight, joined by [`TestRunManager::drain`].
struct PendingPublish {
    parser_uri: String,
    run_id: u32,
    task: JoinHandle<Result<(), PublishError>>,
}

/// Validates completed runs and forwards them to the injected publisher.
pub struct TestRunManager {
    publisher: Arc<dyn TestRunPublisher>,
    logger: Arc<dyn TraceLogger>,
    inflight: Mutex<Vec<PendingPublish>>,
}

impl TestRunManager {
    pub fn new(publisher: Arc<dyn TestRunPublisher>, logger: Arc<dyn TraceLogger>) -> Self {
        Self {
            publisher,
            logger,
            inflight: Mutex::new(Vec::new()),
        }
    }

    /// Validates `run` and starts its upload.
    ///
    /// Synchronous so parsers can call it mid-line; must run inside a tokio
    /// runtime (the upload is spawned). A run without a summary is dropped
    /// here with an error log.
    pub fn publish(&self, mut run: TestRun) {
        let Some(mut summary) = run.summary.take() else {
            self.logger.error(&format!(
                "Test run {} from '{}' has no summary; dropping it.",
                run.run_id, run.parser_uri
            ));
            return;
        };

        if summary.total_tests < summary.total_failed + summary.total_passed {
            summary.total_tests =
                summary.total_passed + summary.total_failed + summary.total_skipped;
            self.logger.verbose(&format!(
                "Test run {}: total test count was lower than the outcome counts; recomputed as {}.",
                run.run_id, summary.total_tests
            ));
        }
        if summary.total_passed != run.passed.len() {
            self.logger.warning(&format!(
                "Test run {}: summary reports {} passed but {} were recorded; discarding the passed list.",
                run.run_id,
                summary.total_passed,
                run.passed.len()
            ));
            run.passed.clear();
        }
        if summary.total_failed != run.failed.len() {
            self.logger.warning(&format!(
                "Test run {}: summary reports {} failed but {} were recorded; discarding the failed list.",
                run.run_id,
                summary.total_failed,
                run.failed.len()
            ));
            run.failed.clear();
        }
        run.summary = Some(summary);

        let publisher = Arc::clone(&self.publisher);
        let parser_uri = run.parser_uri.clone();
        let run_id = run.run_id;
        let task = tokio::spawn(async move { publisher.publish(run).await });
        self.inflight().push(PendingPublish {
            parser_uri,
            run_id,
            task,
        });
    }

    /// Joins every outstanding upload, logging each failure with the run's
    /// identity. Called from the plugin's finalize.
    pub async fn drain(&self) {
        let pending: Vec<PendingPublish> = std::mem::take(&mut *self.inflight());
        for publish in pending {
            match publish.task.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => self.logger.warning(&format!(
                    "Failed to publish test run {} from '{}': {err}",
                    publish.run_id, publish.parser_uri
                )),
                Err(_) => self.logger.warning(&format!(
                    "Publish task for test run {} from '{}' panicked.",
                    publish.run_id, publish.parser_uri
                )),
            }
        }
    }

    fn inflight(&self) -> MutexGuard<'_, Vec<PendingPublish>> {
        self.inflight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemoryLogger;
    use crate::testresult::model::{TestOutcome, TestResult, TestRunSummary};
    use crate::testresult::publisher::MemoryPublisher;
    use async_trait::async_trait;
    use std::time::Duration;

    fn passed(name: &str) -> TestResult {
        TestResult::new(name, TestOutcome::Passed, Duration::ZERO)
    }

    fn failed(name: &str) -> TestResult {
        TestResult::new(name, TestOutcome::Failed, Duration::ZERO)
    }

    fn manager() -> (TestRunManager, Arc<MemoryPublisher>, Arc<MemoryLogger>) {
        let publisher = Arc::new(MemoryPublisher::new());
        let logger = Arc::new(MemoryLogger::new());
        let manager = TestRunManager::new(publisher.clone(), logger.clone());
        (manager, publisher, logger)
    }

    #[tokio::test]
    async fn test_run_without_summary_is_dropped() {
        let (manager, publisher, logger) = manager();
        let mut run = TestRun::new("p/1.0", 1);
        run.passed.push(passed("a"));

        manager.publish(run);
        manager.drain().await;

        assert_eq!(publisher.count(), 0);
        assert!(logger.contains("has no summary"));
    }

    #[tokio::test]
    async fn test_undercounted_total_tests_is_recomputed() {
        let (manager, publisher, _logger) = manager();
        let mut run = TestRun::new("p/1.0", 1);
        run.passed.push(passed("a"));
        run.passed.push(passed("b"));
        run.summary = Some(TestRunSummary {
            total_tests: 1,
            total_passed: 2,
            total_failed: 0,
            total_skipped: 1,
            total_execution_time: Duration::ZERO,
        });

        manager.publish(run);
        manager.drain().await;

        let runs = publisher.runs();
        assert_eq!(runs.len(), 1);
        let summary = runs[0].summary.as_ref().unwrap();
        assert_eq!(summary.total_tests, 3);
        assert_eq!(runs[0].passed.len(), 2);
    }

    #[tokio::test]
    async fn test_mismatched_passed_count_clears_only_that_list() {
        let (manager, publisher, logger) = manager();
        let mut run = TestRun::new("p/1.0", 7);
        run.passed.push(passed("a"));
        run.failed.push(failed("b"));
        run.summary = Some(TestRunSummary {
            total_tests: 4,
            total_passed: 3,
            total_failed: 1,
            total_skipped: 0,
            total_execution_time: Duration::ZERO,
        });

        manager.publish(run);
        manager.drain().await;

        let runs = publisher.runs();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].passed.is_empty());
        assert_eq!(runs[0].failed.len(), 1);
        assert!(logger.contains("discarding the passed list"));
    }

    #[tokio::test]
    async fn test_mismatched_failed_count_clears_only_that_list() {
        let (manager, publisher, logger) = manager();
        let mut run = TestRun::new("p/1.0", 2);
        run.passed.push(passed("a"));
        run.failed.push(failed("b"));
        run.failed.push(failed("c"));
        run.summary = Some(TestRunSummary {
            total_tests: 3,
            total_passed: 1,
            total_failed: 1,
            total_skipped: 0,
            total_execution_time: Duration::ZERO,
        });

        manager.publish(run);
        manager.drain().await;

        let runs = publisher.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].passed.len(), 1);
        assert!(runs[0].failed.is_empty());
        assert!(logger.contains("discarding the failed list"));
    }

    #[tokio::test]
    async fn test_drain_logs_publish_failures() {
        struct RejectingPublisher;

        #[async_trait]
        impl TestRunPublisher for RejectingPublisher {
            async fn publish(&self, _run: TestRun) -> Result<(), PublishError> {
                Err(PublishError::Upload {
                    error: "backend unavailable".to_string(),
                })
            }
        }

        let logger = Arc::new(MemoryLogger::new());
        let manager = TestRunManager::new(Arc::new(RejectingPublisher), logger.clone());
        let run = TestRun::with_empty_summary("p/1.0", 3);

        manager.publish(run);
        manager.drain().await;

        assert!(logger.contains("Failed to publish test run 3 from 'p/1.0'"));
    }
}
