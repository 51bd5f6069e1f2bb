//! # Mocha spec-reporter state machine.
//!
//! Scrapes test runs out of mocha's `spec` reporter output. One log stream
//! can hold many runs; the machine cycles:
//!
//! ```text
//! ExpectingTestResults ──passed summary──► ExpectingTestRunSummary
//!         ▲                                        │ failed summary
//!         │                                        ▼
//!         └────────── publish ◄──────── ExpectingStackTraces
//! ```
//!
//! ## Rules
//! - Case and summary lines carry one-or-more two-space indents; anything
//!   else is noise.
//! - Failed cases are numbered; an ordinal restarting at 1 means a new run
//!   began and the current one is published (or discarded if it never
//!   reached a summary).
//! - After the failed summary, mocha repeats one numbered header per failure
//!   above its stack trace; those headers are consumed, not recorded.
//! - The run id advances only when a run is actually published.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::json;

use crate::diag::{TelemetryCollector, TraceLogger};
use crate::lines::LogLine;
use crate::testresult::manager::TestRunManager;
use crate::testresult::model::{TestOutcome, TestResult, TestRun};

use super::parser::TestResultParser;

const NAME: &str = "MochaTestResultParser";
const VERSION: &str = "1.0";

static PASSED_CASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:  )+(?:✓|√) (?P<name>.*?)(?: \((?P<time>[0-9]+)(?P<unit>ms|s|m|h)\))?$")
        .expect("valid pattern")
});
static FAILED_CASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:  )+(?P<ordinal>[1-9][0-9]*)\) (?P<name>.*)$").expect("valid pattern")
});
static PENDING_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:  )+- (?P<name>.*)$").expect("valid pattern"));
static PASSED_SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:  )+(?P<passed>0|[1-9][0-9]*) passing \((?P<time>[0-9]+)(?P<unit>ms|s|m|h)\)$")
        .expect("valid pattern")
});
static FAILED_SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:  )+(?P<failed>[1-9][0-9]*) failing$").expect("valid pattern")
});
static PENDING_SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:  )+(?P<pending>[1-9][0-9]*) pending$").expect("valid pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MochaState {
    ExpectingTestResults,
    ExpectingTestRunSummary,
    ExpectingStackTraces,
}

/// Per-run bookkeeping; rebuilt from scratch on every reset.
struct MochaContext {
    run: TestRun,
    /// Lines left before an armed expectation must match; 0 = disarmed.
    armed_lines: usize,
    /// What the armed expectation waits for, quoted in the give-up log line.
    armed_expectation: &'static str,
    last_failed_ordinal: usize,
    stack_traces_to_skip: usize,
}

impl MochaContext {
    fn new(run_id: u32) -> Self {
        Self {
            run: TestRun::with_empty_summary(format!("{NAME}/{VERSION}"), run_id),
            armed_lines: 0,
            armed_expectation: "",
            last_failed_ordinal: 0,
            stack_traces_to_skip: 0,
        }
    }
}

/// Parser for mocha's `spec` reporter.
pub struct MochaParser {
    manager: Arc<TestRunManager>,
    logger: Arc<dyn TraceLogger>,
    telemetry: Arc<dyn TelemetryCollector>,
    state: MochaState,
    ctx: MochaContext,
    run_id: u32,
}

impl MochaParser {
    pub fn new(
        manager: Arc<TestRunManager>,
        logger: Arc<dyn TraceLogger>,
        telemetry: Arc<dyn TelemetryCollector>,
    ) -> Self {
        logger.info("MochaTestResultParser : Starting mocha test result scan.");
        telemetry.record(NAME, "Initialize", json!(true), false);
        Self {
            manager,
            logger,
            telemetry,
            state: MochaState::ExpectingTestResults,
            ctx: MochaContext::new(1),
            run_id: 1,
        }
    }

    fn parse_text(&mut self, text: &str, seq: u64) {
        let matched = match self.state {
            MochaState::ExpectingTestResults => self.try_expecting_results(text, seq),
            MochaState::ExpectingTestRunSummary => self.try_expecting_summary(text, seq),
            MochaState::ExpectingStackTraces => self.try_expecting_stack_traces(text, seq),
        };
        if matched {
            return;
        }
        match self.ctx.armed_lines {
            0 => {}
            1 => {
                let what = self.ctx.armed_expectation;
                self.publish_and_reset(&format!(
                    "was expecting {what} before line {seq} but no matches occurred"
                ));
            }
            _ => self.ctx.armed_lines -= 1,
        }
    }

    fn try_expecting_results(&mut self, text: &str, seq: u64) -> bool {
        if let Some(caps) = PASSED_CASE.captures(text) {
            self.record_passed(&caps);
            return true;
        }
        if let Some(caps) = FAILED_CASE.captures(text) {
            if self.failed_case_in_results(&caps, seq) {
                return true;
            }
        }
        if let Some(caps) = PENDING_CASE.captures(text) {
            self.record_pending(&caps);
            return true;
        }
        if let Some(caps) = PASSED_SUMMARY.captures(text) {
            self.handle_passed_summary(&caps, seq);
            return true;
        }
        false
    }

    fn try_expecting_summary(&mut self, text: &str, seq: u64) -> bool {
        if let Some(caps) = PENDING_SUMMARY.captures(text) {
            self.handle_pending_summary(&caps, seq);
            return true;
        }
        if let Some(caps) = FAILED_SUMMARY.captures(text) {
            self.handle_failed_summary(&caps, seq);
            return true;
        }
        if let Some(caps) = PASSED_CASE.captures(text) {
            self.publish_and_reset("a test result appeared while waiting for the run summary");
            self.record_passed(&caps);
            return true;
        }
        if let Some(caps) = FAILED_CASE.captures(text) {
            if self.failed_case_in_summary(&caps, seq) {
                return true;
            }
        }
        if let Some(caps) = PENDING_CASE.captures(text) {
            self.record_pending(&caps);
            return true;
        }
        if let Some(caps) = PASSED_SUMMARY.captures(text) {
            self.telemetry.record(
                NAME,
                "SummaryWithNoTestCases",
                json!({ "line": seq, "run_id": self.ctx.run.run_id }),
                true,
            );
            self.publish_and_reset("a passed summary appeared with no test cases since the last one");
            self.handle_passed_summary(&caps, seq);
            return true;
        }
        false
    }

    fn try_expecting_stack_traces(&mut self, text: &str, seq: u64) -> bool {
        if FAILED_CASE.is_match(text) && self.skip_stack_trace_header() {
            return true;
        }
        if let Some(caps) = PASSED_CASE.captures(text) {
            self.telemetry.record(
                NAME,
                "ExpectingStackTracesButFoundPassedTest",
                json!({ "line": seq }),
                true,
            );
            self.publish_and_reset("a passed test appeared while skipping stack traces");
            self.record_passed(&caps);
            return true;
        }
        if let Some(caps) = PENDING_CASE.captures(text) {
            self.telemetry.record(
                NAME,
                "ExpectingStackTracesButFoundPendingTest",
                json!({ "line": seq }),
                true,
            );
            self.publish_and_reset("a pending test appeared while skipping stack traces");
            self.record_pending(&caps);
            return true;
        }
        if let Some(caps) = PASSED_SUMMARY.captures(text) {
            self.publish_and_reset("a passed summary appeared while skipping stack traces");
            self.handle_passed_summary(&caps, seq);
            return true;
        }
        false
    }

    /// Failed case while collecting results. The ordinal must continue the
    /// sequence; a restart at 1 splits the stream into a new run, anything
    /// else out of order is noise.
    fn failed_case_in_results(&mut self, caps: &Captures<'_>, seq: u64) -> bool {
        let Ok(ordinal) = caps["ordinal"].parse::<usize>() else {
            return false;
        };
        if ordinal != self.ctx.last_failed_ordinal + 1 {
            self.telemetry.record(
                NAME,
                "UnexpectedFailedTestCaseNumber",
                json!({ "line": seq, "ordinal": ordinal }),
                true,
            );
            if ordinal != 1 {
                return false;
            }
            self.publish_and_reset("a failed test case numbered 1 appeared mid-run");
        }
        self.ctx.last_failed_ordinal += 1;
        self.record_failed(caps);
        true
    }

    /// Failed case between the passed summary and the failed summary: only
    /// an ordinal of 1 is meaningful, and it means a new run began.
    fn failed_case_in_summary(&mut self, caps: &Captures<'_>, seq: u64) -> bool {
        let Ok(ordinal) = caps["ordinal"].parse::<usize>() else {
            return false;
        };
        if ordinal != 1 {
            self.telemetry.record(
                NAME,
                "UnexpectedFailedTestCaseNumber",
                json!({ "line": seq, "ordinal": ordinal }),
                true,
            );
            return false;
        }
        self.publish_and_reset("a failed test case numbered 1 appeared while waiting for the run summary");
        self.ctx.last_failed_ordinal += 1;
        self.record_failed(caps);
        true
    }

    /// Numbered stack-trace header after the failed summary: consumed, not
    /// recorded. Exhausting the expected count completes the run.
    fn skip_stack_trace_header(&mut self) -> bool {
        if self.ctx.stack_traces_to_skip == 0 {
            return false;
        }
        self.ctx.stack_traces_to_skip -= 1;
        if self.ctx.stack_traces_to_skip == 0 {
            self.publish_and_reset("all stack traces for the run were skipped");
        }
        true
    }

    fn handle_passed_summary(&mut self, caps: &Captures<'_>, seq: u64) {
        let total_passed = caps["passed"].parse::<usize>().unwrap_or(0);
        self.ctx.armed_lines = 1;
        self.ctx.armed_expectation = "failed/pending tests summary";
        self.ctx.last_failed_ordinal = 0;
        if let Some(summary) = self.ctx.run.summary.as_mut() {
            summary.total_passed = total_passed;
            summary.total_execution_time = scaled_duration(&caps["time"], &caps["unit"]);
        }
        self.state = MochaState::ExpectingTestRunSummary;
        if total_passed != self.ctx.run.passed.len() {
            self.telemetry.record(
                NAME,
                "PassedSummaryMismatch",
                json!({
                    "line": seq,
                    "expected": total_passed,
                    "recorded": self.ctx.run.passed.len(),
                }),
                true,
            );
        }
    }

    fn handle_failed_summary(&mut self, caps: &Captures<'_>, seq: u64) {
        let total_failed = caps["failed"].parse::<usize>().unwrap_or(0);
        self.ctx.armed_lines = 0;
        self.ctx.stack_traces_to_skip = total_failed;
        if let Some(summary) = self.ctx.run.summary.as_mut() {
            summary.total_failed = total_failed;
        }
        self.state = MochaState::ExpectingStackTraces;
        if total_failed != self.ctx.run.failed.len() {
            self.telemetry.record(
                NAME,
                "FailedSummaryMismatch",
                json!({
                    "line": seq,
                    "expected": total_failed,
                    "recorded": self.ctx.run.failed.len(),
                }),
                true,
            );
        }
    }

    fn handle_pending_summary(&mut self, caps: &Captures<'_>, seq: u64) {
        let total_pending = caps["pending"].parse::<usize>().unwrap_or(0);
        self.ctx.armed_lines = 1;
        self.ctx.armed_expectation = "failed tests summary";
        if let Some(summary) = self.ctx.run.summary.as_mut() {
            summary.total_skipped = total_pending;
        }
        if total_pending != self.ctx.run.skipped.len() {
            self.telemetry.record(
                NAME,
                "PendingSummaryMismatch",
                json!({
                    "line": seq,
                    "expected": total_pending,
                    "recorded": self.ctx.run.skipped.len(),
                }),
                true,
            );
        }
    }

    fn record_passed(&mut self, caps: &Captures<'_>) {
        let time = match (caps.name("time"), caps.name("unit")) {
            (Some(time), Some(unit)) => scaled_duration(time.as_str(), unit.as_str()),
            _ => Duration::ZERO,
        };
        self.ctx.run.passed.push(TestResult::new(
            caps["name"].to_string(),
            TestOutcome::Passed,
            time,
        ));
    }

    fn record_failed(&mut self, caps: &Captures<'_>) {
        self.ctx.run.failed.push(TestResult::new(
            caps["name"].to_string(),
            TestOutcome::Failed,
            Duration::ZERO,
        ));
    }

    fn record_pending(&mut self, caps: &Captures<'_>) {
        self.ctx.run.skipped.push(TestResult::new(
            caps["name"].to_string(),
            TestOutcome::Skipped,
            Duration::ZERO,
        ));
    }

    /// Closes out the current run and starts a fresh context.
    ///
    /// Anomalies are recorded first. A run still waiting for its passed
    /// summary is discarded (nothing trustworthy to publish); otherwise the
    /// run goes to the manager and the run id advances.
    fn publish_and_reset(&mut self, reason: &str) {
        self.logger
            .info(&format!("MochaTestResultParser : Resetting the parser: {reason}."));
        self.telemetry.record(
            NAME,
            "AttemptPublishAndResetParser",
            json!({ "run_id": self.ctx.run.run_id }),
            true,
        );

        let run_id = self.ctx.run.run_id;
        let has_passed = !self.ctx.run.passed.is_empty();
        let has_failed = !self.ctx.run.failed.is_empty();
        let has_skipped = !self.ctx.run.skipped.is_empty();
        let (summary_failed, summary_skipped) = match &self.ctx.run.summary {
            Some(summary) => (summary.total_failed, summary.total_skipped),
            None => (0, 0),
        };

        if has_failed && summary_failed == 0 {
            self.telemetry.record(
                NAME,
                "FailedTestCasesFoundButNoFailedSummary",
                json!({ "run_id": run_id }),
                true,
            );
        }
        if has_skipped && summary_skipped == 0 {
            self.telemetry.record(
                NAME,
                "PendingTestCasesFoundButNoPendingSummary",
                json!({ "run_id": run_id }),
                true,
            );
        }

        match self.state {
            MochaState::ExpectingTestResults => {
                if has_passed {
                    self.telemetry.record(
                        NAME,
                        "PassedTestCasesFoundButNoPassedSummary",
                        json!({ "run_id": run_id }),
                        true,
                    );
                }
                self.ctx = MochaContext::new(self.run_id);
            }
            _ => {
                let old = std::mem::replace(&mut self.ctx, MochaContext::new(self.run_id + 1));
                self.manager.publish(old.run);
                self.run_id += 1;
            }
        }
        self.state = MochaState::ExpectingTestResults;
    }
}

impl TestResultParser for MochaParser {
    fn name(&self) -> &'static str {
        NAME
    }

    fn version(&self) -> &'static str {
        VERSION
    }

    fn parse(&mut self, line: &LogLine) {
        self.parse_text(&line.text, line.seq);
    }

    fn finish(&mut self) {
        if self.ctx.run.has_data() {
            self.telemetry.record(
                NAME,
                "ForcePublishAtEndOfStream",
                json!({ "run_id": self.ctx.run.run_id }),
                true,
            );
            self.logger
                .info("MochaTestResultParser : Publishing the partial run left at end of stream.");
            let old = std::mem::replace(&mut self.ctx, MochaContext::new(self.run_id + 1));
            self.manager.publish(old.run);
            self.run_id += 1;
        } else {
            self.ctx = MochaContext::new(self.run_id);
        }
        self.state = MochaState::ExpectingTestResults;
    }

    fn reset(&mut self) {
        self.logger
            .verbose("MochaTestResultParser : Resetting; the run under construction is lost.");
        self.ctx = MochaContext::new(self.run_id);
        self.state = MochaState::ExpectingTestResults;
    }
}

fn scaled_duration(value: &str, unit: &str) -> Duration {
    let Ok(value) = value.parse::<u64>() else {
        return Duration::ZERO;
    };
    match unit {
        "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        "h" => Duration::from_secs(value.saturating_mul(3600)),
        _ => Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{MemoryLogger, TelemetryStore};
    use crate::testresult::publisher::MemoryPublisher;

    struct Fixture {
        parser: MochaParser,
        manager: Arc<TestRunManager>,
        publisher: Arc<MemoryPublisher>,
        logger: Arc<MemoryLogger>,
        telemetry: Arc<TelemetryStore>,
    }

    fn fixture() -> Fixture {
        let publisher = Arc::new(MemoryPublisher::new());
        let logger = Arc::new(MemoryLogger::new());
        let telemetry = Arc::new(TelemetryStore::new());
        let manager = Arc::new(TestRunManager::new(publisher.clone(), logger.clone()));
        let parser = MochaParser::new(manager.clone(), logger.clone(), telemetry.clone());
        Fixture {
            parser,
            manager,
            publisher,
            logger,
            telemetry,
        }
    }

    fn feed(parser: &mut MochaParser, lines: &[&str]) {
        for (i, text) in lines.iter().enumerate() {
            parser.parse(&LogLine::new((i + 1) as u64, *text));
        }
    }

    #[tokio::test]
    async fn test_single_run_with_all_summaries() {
        let mut f = fixture();
        feed(
            &mut f.parser,
            &[
                "  ✓ adds numbers (12ms)",
                "  1) subtracts numbers",
                "  - multiplies numbers",
                "",
                "  1 passing (12ms)",
                "  1 pending",
                "  1 failing",
                "  1) subtracts numbers:",
            ],
        );
        f.manager.drain().await;

        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.parser_uri, "MochaTestResultParser/1.0");
        assert_eq!(run.run_id, 1);
        assert_eq!(run.passed.len(), 1);
        assert_eq!(run.passed[0].name, "adds numbers");
        assert_eq!(run.passed[0].execution_time, Duration::from_millis(12));
        assert_eq!(run.failed.len(), 1);
        assert_eq!(run.skipped.len(), 1);
        let summary = run.summary.as_ref().unwrap();
        assert_eq!(summary.total_passed, 1);
        assert_eq!(summary.total_failed, 1);
        assert_eq!(summary.total_skipped, 1);
        assert_eq!(summary.total_tests, 3);
        assert_eq!(summary.total_execution_time, Duration::from_millis(12));
    }

    #[tokio::test]
    async fn test_passed_summary_mismatch_records_telemetry_and_list_is_trimmed() {
        let mut f = fixture();
        feed(
            &mut f.parser,
            &["  ✓ only one (2ms)", "  3 passing (2s)", ""],
        );
        f.manager.drain().await;

        assert!(f.telemetry.has(NAME, "PassedSummaryMismatch"));
        assert!(f
            .logger
            .contains("was expecting failed/pending tests summary before line 3"));
        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].passed.is_empty());
        let summary = runs[0].summary.as_ref().unwrap();
        assert_eq!(summary.total_passed, 3);
        assert_eq!(summary.total_execution_time, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_failed_ordinal_restarting_at_one_splits_runs() {
        let mut f = fixture();
        feed(
            &mut f.parser,
            &[
                "  1) alpha",
                "  2) beta",
                "  1) gamma",
                "  0 passing (1ms)",
                "  1 failing",
                "  1) gamma:",
            ],
        );
        f.manager.drain().await;

        assert!(f.telemetry.has(NAME, "UnexpectedFailedTestCaseNumber"));
        assert!(f
            .telemetry
            .has(NAME, "FailedTestCasesFoundButNoFailedSummary"));
        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id, 1);
        assert_eq!(runs[0].failed.len(), 1);
        assert_eq!(runs[0].failed[0].name, "gamma");
    }

    #[tokio::test]
    async fn test_out_of_sequence_ordinal_is_noise() {
        let mut f = fixture();
        feed(
            &mut f.parser,
            &["  1) alpha", "  5) not next", "  0 passing (1ms)", "  1 failing", "  1) alpha:"],
        );
        f.manager.drain().await;

        assert_eq!(
            f.telemetry.count(NAME, "UnexpectedFailedTestCaseNumber"),
            1
        );
        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].failed.len(), 1);
        assert_eq!(runs[0].failed[0].name, "alpha");
    }

    #[tokio::test]
    async fn test_two_complete_runs_increment_run_id() {
        let mut f = fixture();
        feed(
            &mut f.parser,
            &[
                "  ✓ first (1ms)",
                "  1 passing (1ms)",
                "",
                "  √ second (2ms)",
                "  1 passing (2ms)",
                "",
            ],
        );
        f.manager.drain().await;

        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_id, 1);
        assert_eq!(runs[0].passed[0].name, "first");
        assert_eq!(runs[1].run_id, 2);
        assert_eq!(runs[1].passed[0].name, "second");
    }

    #[tokio::test]
    async fn test_passed_case_while_expecting_summary_starts_new_run() {
        let mut f = fixture();
        feed(
            &mut f.parser,
            &[
                "  ✓ first (1ms)",
                "  1 passing (1ms)",
                "  ✓ second (3ms)",
                "  1 passing (3ms)",
                "",
            ],
        );
        f.manager.drain().await;

        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].passed[0].name, "first");
        assert_eq!(runs[1].passed[0].name, "second");
    }

    #[tokio::test]
    async fn test_passed_case_while_skipping_stack_traces_starts_new_run() {
        let mut f = fixture();
        feed(
            &mut f.parser,
            &[
                "  1) broken",
                "  0 passing (1ms)",
                "  1 failing",
                "  ✓ healthy (1ms)",
                "  1 passing (1ms)",
                "",
            ],
        );
        f.manager.drain().await;

        assert!(f
            .telemetry
            .has(NAME, "ExpectingStackTracesButFoundPassedTest"));
        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].failed.len(), 1);
        assert_eq!(runs[1].passed.len(), 1);
    }

    #[tokio::test]
    async fn test_second_passed_summary_without_cases() {
        let mut f = fixture();
        feed(
            &mut f.parser,
            &["  ✓ first (1ms)", "  1 passing (1ms)", "  2 passing (5ms)", ""],
        );
        f.manager.drain().await;

        assert!(f.telemetry.has(NAME, "SummaryWithNoTestCases"));
        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].passed.len(), 1);
        assert!(runs[1].passed.is_empty());
        assert_eq!(runs[1].summary.as_ref().unwrap().total_passed, 2);
    }

    #[tokio::test]
    async fn test_force_publish_at_end_of_stream() {
        let mut f = fixture();
        feed(&mut f.parser, &["  ✓ only (5ms)"]);
        f.parser.finish();
        f.manager.drain().await;

        assert!(f.telemetry.has(NAME, "ForcePublishAtEndOfStream"));
        assert_eq!(f.publisher.count(), 1);

        f.parser.finish();
        f.manager.drain().await;
        assert_eq!(f.publisher.count(), 1);
    }

    #[tokio::test]
    async fn test_untouched_run_is_dropped_silently_at_finish() {
        let mut f = fixture();
        f.parser.finish();
        f.manager.drain().await;

        assert_eq!(f.publisher.count(), 0);
        assert!(!f.telemetry.has(NAME, "ForcePublishAtEndOfStream"));
    }

    #[tokio::test]
    async fn test_unindented_lines_are_noise() {
        let mut f = fixture();
        feed(
            &mut f.parser,
            &["✓ no indent", "npm WARN something", "  ✓ real (1ms)", "  1 passing (1ms)", ""],
        );
        f.manager.drain().await;

        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].passed.len(), 1);
        assert_eq!(runs[0].passed[0].name, "real");
    }

    #[tokio::test]
    async fn test_case_with_summary_is_published_intact_at_end_of_stream() {
        let mut f = fixture();
        feed(&mut f.parser, &["  ✓ test a", "  1 passing (10ms)"]);
        f.parser.finish();
        f.manager.drain().await;

        let runs = f.publisher.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].passed.len(), 1);
        assert_eq!(runs[0].passed[0].name, "test a");
        let summary = runs[0].summary.as_ref().unwrap();
        assert_eq!(summary.total_passed, 1);
        assert_eq!(summary.total_tests, 1);
        assert_eq!(summary.total_execution_time, Duration::from_millis(10));
    }
}
