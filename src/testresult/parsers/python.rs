//! # Python unittest reporter state machine.
//!
//! Scrapes runs out of `unittest` verbose output:
//!
//! ```text
//! ExpectingTestResults ──FAIL:/ERROR:──► ExpectingFailedResults
//!          │                                     │
//!          │ Ran N tests in T                    │ Ran N tests in T
//!          ▼                                     ▼
//!      ExpectingSummary ◄────────────────────────┘
//!          │ OK / FAILED (...)
//!          ▼
//!        publish
//! ```
//!
//! ## Rules
//! - Blank lines are ignored in every state.
//! - A result line with an unrecognized outcome is held as a partial result;
//!   a following bare `ok` completes it as passed.
//! - A new result line while failures are being collected means the summary
//!   never arrived; the run is reset and the line reparsed.
//! - The run id advances on every reset, published or not.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::diag::{TelemetryCollector, TraceLogger};
use crate::lines::LogLine;
use crate::testresult::manager::TestRunManager;
use crate::testresult::model::{TestOutcome, TestResult, TestRun, TestRunSummary};

use super::parser::TestResultParser;

const NAME: &str = "PythonTestResultParser";
const VERSION: &str = "1.0";

static RESULT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>.+) \.\.\. (?P<outcome>.*)$").expect("valid pattern"));
static PASSED_OUTCOME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^(ok|expected failure)|( (ok|expected failure)))$").expect("valid pattern")
});
static SKIPPED_OUTCOME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^skipped").expect("valid pattern"));
static FAILED_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(FAIL|ERROR) ?: ?(?P<name>.+)$").expect("valid pattern"));
static SUMMARY_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Ran (?P<total>[0-9]+) tests? in (?P<sec>[0-9]+)(\.(?P<ms>[0-9]+))?s$")
        .expect("valid pattern")
});
static SUMMARY_OUTCOME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(OK|FAILED) ?(\((?P<meta>.*)\))?$").expect("valid pattern"));
static META_FAILURES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"failures=(?P<count>[0-9]+)").expect("valid pattern"));
static META_ERRORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"errors=(?P<count>[0-9]+)").expect("valid pattern"));
static META_SKIPPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"skipped=(?P<count>[0-9]+)").expect("valid pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PythonState {
    ExpectingTestResults,
    ExpectingFailedResults,
    ExpectingSummary,
}

/// Per-run bookkeeping; rebuilt from scratch on every reset.
struct PythonContext {
    run: TestRun,
    /// A result line whose outcome was not recognized, waiting for a bare
    /// continuation such as `ok` on the next line.
    partial: Option<TestResult>,
}

impl PythonContext {
    fn new(run_id: u32) -> Self {
        Self {
            run: TestRun::new(format!("{NAME}/{VERSION}"), run_id),
            partial: None,
        }
    }
}

/// Parser for python's `unittest` verbose reporter.
pub struct PythonParser {
    manager: Arc<TestRunManager>,
    logger: Arc<dyn TraceLogger>,
    telemetry: Arc<dyn TelemetryCollector>,
    state: PythonState,
    ctx: PythonContext,
    run_id: u32,
}

impl PythonParser {
    pub fn new(
        manager: Arc<TestRunManager>,
        logger: Arc<dyn TraceLogger>,
        telemetry: Arc<dyn TelemetryCollector>,
    ) -> Self {
        logger.info("PythonTestResultParser : Starting python test result scan.");
        telemetry.record(NAME, "Initialize", json!(true), false);
        Self {
            manager,
            logger,
            telemetry,
            state: PythonState::ExpectingTestResults,
            ctx: PythonContext::new(1),
            run_id: 1,
        }
    }

    fn parse_text(&mut self, text: &str, seq: u64) {
        if text.trim().is_empty() {
            return;
        }
        // A reset asks for the line to be reparsed in the fresh state; the
        // fresh state never resets again, so one retry is the ceiling.
        for _ in 0..2 {
            if !self.step(text, seq) {
                return;
            }
        }
    }

    /// Runs one state-machine step. Returns true when the machine reset and
    /// the same line must be fed through again.
    fn step(&mut self, text: &str, seq: u64) -> bool {
        match self.state {
            PythonState::ExpectingTestResults => {
                if self.try_test_result(text) {
                    return false;
                }
                if self.try_failed_header(text) {
                    return false;
                }
                self.try_summary_count(text, seq);
                false
            }
            PythonState::ExpectingFailedResults => {
                if self.try_failed_header(text) {
                    return false;
                }
                if self.try_summary_count(text, seq) {
                    return false;
                }
                if RESULT_LINE.is_match(text) {
                    self.logger.error(&format!(
                        "PythonTestResultParser : Expecting a failed result or the run summary \
                         but found a new test result at line {seq}."
                    ));
                    self.telemetry.record(
                        NAME,
                        "SummaryOrFailedTestsNotFound",
                        json!({ "run_id": self.ctx.run.run_id }),
                        true,
                    );
                    self.begin_new_run();
                    return true;
                }
                false
            }
            PythonState::ExpectingSummary => {
                if self.try_summary_outcome(text, seq) {
                    self.logger.info(&format!(
                        "PythonTestResultParser : Publishing test run {} at line {seq}.",
                        self.ctx.run.run_id
                    ));
                    let old = self.begin_new_run();
                    self.manager.publish(old.run);
                    return false;
                }
                self.begin_new_run();
                true
            }
        }
    }

    /// Handles `<name> ... <outcome>` lines and partial-result continuations.
    fn try_test_result(&mut self, text: &str) -> bool {
        let Some(caps) = RESULT_LINE.captures(text) else {
            return self.try_complete_partial(text);
        };
        let name = caps["name"].trim();
        if name.is_empty() {
            return false;
        }
        self.ctx.partial = None;
        let outcome = caps["outcome"].trim();
        if PASSED_OUTCOME.is_match(outcome) {
            self.ctx
                .run
                .passed
                .push(TestResult::new(name, TestOutcome::Passed, Duration::ZERO));
            return true;
        }
        if SKIPPED_OUTCOME.is_match(outcome) {
            self.ctx
                .run
                .skipped
                .push(TestResult::new(name, TestOutcome::Skipped, Duration::ZERO));
            return true;
        }
        self.ctx.partial = Some(TestResult::new(name, TestOutcome::Passed, Duration::ZERO));
        true
    }

    fn try_complete_partial(&mut self, text: &str) -> bool {
        if self.ctx.partial.is_none() || !PASSED_OUTCOME.is_match(text) {
            return false;
        }
        if let Some(result) = self.ctx.partial.take() {
            self.ctx.run.passed.push(result);
        }
        true
    }

    fn try_failed_header(&mut self, text: &str) -> bool {
        let Some(caps) = FAILED_HEADER.captures(text) else {
            return false;
        };
        let name = caps["name"].trim();
        if name.is_empty() {
            return false;
        }
        self.ctx.partial = None;
        self.ctx
            .run
            .failed
            .push(TestResult::new(name, TestOutcome::Failed, Duration::ZERO));
        self.state = PythonState::ExpectingFailedResults;
        true
    }

    fn try_summary_count(&mut self, text: &str, seq: u64) -> bool {
        let Some(caps) = SUMMARY_COUNT.captures(text) else {
            return false;
        };
        let total_tests = caps["total"].parse::<usize>().unwrap_or(0);
        let secs = caps["sec"].parse::<u64>().unwrap_or(0);
        // The fraction digits are read as written, so `1.2s` contributes 2ms.
        let millis = caps
            .name("ms")
            .map_or(0, |m| m.as_str().parse::<u64>().unwrap_or(0));
        self.ctx.partial = None;
        self.ctx.run.summary = Some(TestRunSummary {
            total_tests,
            total_execution_time: Duration::from_secs(secs) + Duration::from_millis(millis),
            ..TestRunSummary::default()
        });
        self.logger.info(&format!(
            "PythonTestResultParser : Found the test count and time summary at line {seq}."
        ));
        self.state = PythonState::ExpectingSummary;
        true
    }

    /// Parses the terminal `OK`/`FAILED (...)` line and fills in the outcome
    /// counts. The passed count is derived; the reporter never prints it.
    fn try_summary_outcome(&mut self, text: &str, seq: u64) -> bool {
        let run_id = self.ctx.run.run_id;
        let Some(summary) = self.ctx.run.summary.as_mut() else {
            self.logger.error(&format!(
                "PythonTestResultParser : The run summary went missing before line {seq}."
            ));
            self.telemetry.record(
                NAME,
                "TestRunSummaryCorrupted",
                json!({ "run_id": run_id }),
                true,
            );
            return false;
        };
        let Some(caps) = SUMMARY_OUTCOME.captures(text) else {
            self.logger.error(&format!(
                "PythonTestResultParser : Expected the outcome summary but found something else \
                 at line {seq}."
            ));
            self.telemetry.record(
                NAME,
                "TestOutcomeSummaryNotFound",
                json!({ "run_id": run_id }),
                true,
            );
            return false;
        };
        let meta = caps.name("meta").map_or("", |m| m.as_str());
        if let Some(count) = META_FAILURES.captures(meta) {
            summary.total_failed = count["count"].parse().unwrap_or(0);
        }
        if let Some(count) = META_ERRORS.captures(meta) {
            summary.total_failed += count["count"].parse::<usize>().unwrap_or(0);
        }
        if let Some(count) = META_SKIPPED.captures(meta) {
            summary.total_skipped = count["count"].parse().unwrap_or(0);
        }
        summary.total_passed = summary
            .total_tests
            .saturating_sub(summary.total_failed + summary.total_skipped);
        true
    }

    /// Swaps in a fresh context under the next run id and returns the old
    /// one. Callers publish or drop the returned run.
    fn begin_new_run(&mut self) -> PythonContext {
        self.run_id += 1;
        let fresh = PythonContext::new(self.run_id);
        self.state = PythonState::ExpectingTestResults;
        std::mem::replace(&mut self.ctx, fresh)
    }
}

impl TestResultParser for PythonParser {
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
                .info("PythonTestResultParser : Publishing the partial run left at end of stream.");
            let old = self.begin_new_run();
            self.manager.publish(old.run);
        } else {
            self.begin_new_run();
        }
    }

    fn reset(&mut self) {
        self.logger
            .verbose("PythonTestResultParser : Resetting; the run under construction is lost.");
        self.begin_new_run();
    }
}
