use std::time::Duration;

use serde::Serialize;

/// Outcome of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestOutcome {
    /// Test ran and succeeded (includes expected failures).
    Passed,
    /// Test ran and failed or errored.
    Failed,
    /// Test was skipped or marked pending.
    Skipped,
}

/// One test case as scraped from the log.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    /// Test name as printed by the framework.
    pub name: String,
    /// Scraped outcome.
    pub outcome: TestOutcome,
    /// Per-test execution time; zero when the framework does not print one.
    pub execution_time: Duration,
}

impl TestResult {
    pub fn new(name: impl Into<String>, outcome: TestOutcome, execution_time: Duration) -> Self {
        Self {
            name: name.into(),
            outcome,
            execution_time,
        }
    }
}

/// Aggregate counts for one run, filled in as summary lines are matched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestRunSummary {
    pub total_tests: usize,
    pub total_passed: usize,
    pub total_failed: usize,
    pub total_skipped: usize,
    pub total_execution_time: Duration,
}

impl TestRunSummary {
    /// True while no summary line has contributed anything yet.
    pub fn is_empty(&self) -> bool {
        self.total_tests == 0
            && self.total_passed == 0
            && self.total_failed == 0
            && self.total_skipped == 0
            && self.total_execution_time.is_zero()
    }
}

/// One test suite execution assembled from the log stream.
///
/// Owned exclusively by the parser that is building it; handed off by value
/// to the run manager on publish and never touched again.
#[derive(Debug, Clone, Serialize)]
pub struct TestRun {
    /// Identity of the producing parser, `<name>/<version>`.
    pub parser_uri: String,
    /// Parser-scoped run counter.
    pub run_id: u32,
    pub passed: Vec<TestResult>,
    pub failed: Vec<TestResult>,
    pub skipped: Vec<TestResult>,
    /// `None` until a summary line is parsed; Mocha-style parsers start
    /// with a zero-filled summary instead.
    pub summary: Option<TestRunSummary>,
}

impl TestRun {
    /// A run with no summary yet (Python-unittest style).
    pub fn new(parser_uri: impl Into<String>, run_id: u32) -> Self {
        Self {
            parser_uri: parser_uri.into(),
            run_id,
            passed: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            summary: None,
        }
    }

    /// A run carrying a zero-filled summary from the start (Mocha style).
    pub fn with_empty_summary(parser_uri: impl Into<String>, run_id: u32) -> Self {
        let mut run = Self::new(parser_uri, run_id);
        run.summary = Some(TestRunSummary::default());
        run
    }

    /// True once any case was recorded or any summary line contributed.
    /// Untouched runs are dropped silently at end of stream.
    pub fn has_data(&self) -> bool {
        if !self.passed.is_empty() || !self.failed.is_empty() || !self.skipped.is_empty() {
            return true;
        }
        match &self.summary {
            Some(summary) => !summary.is_empty(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_runs_have_no_data() {
        assert!(!TestRun::new("p/1.0", 1).has_data());
        assert!(!TestRun::with_empty_summary("p/1.0", 1).has_data());
    }

    #[test]
    fn test_recorded_case_counts_as_data() {
        let mut run = TestRun::new("p/1.0", 1);
        run.passed.push(TestResult::new(
            "alpha",
            TestOutcome::Passed,
            Duration::ZERO,
        ));
        assert!(run.has_data());
    }

    #[test]
    fn test_summary_contribution_counts_as_data() {
        let mut run = TestRun::with_empty_summary("p/1.0", 1);
        if let Some(summary) = run.summary.as_mut() {
            summary.total_passed = 3;
        }
        assert!(run.has_data());
    }
}
