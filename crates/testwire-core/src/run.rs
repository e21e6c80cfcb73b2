//! Run-state vocabulary and aggregated results
//!
//! The protocol core delivers events in arrival order and enforces nothing;
//! these types give the aggregating listener the state machine and summary
//! shape it needs to make sense of that order.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Whole-run lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    /// No `testing-started` observed yet
    NotStarted,
    /// Between `testing-started` and `testing-finished`
    Running,
    /// `testing-finished` observed
    Finished,
}

/// Outcome of a single test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
    Ignored,
}

/// One completed test, as recorded by the aggregator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRecord {
    pub name: String,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_millis: Option<u64>,
    /// Failure message from the `message` attribute, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregated results of one run, suitable for display or JSON export
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub phase: RunPhase,
    pub tests_started: usize,
    pub passed: usize,
    pub failed: usize,
    pub ignored: usize,
    pub suites: usize,
    pub unknown_events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Local>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Local>>,
    pub tests: Vec<TestRecord>,
    /// Ordering violations and other non-fatal oddities observed in the stream
    pub diagnostics: Vec<String>,
}

impl RunSummary {
    /// True when the run finished and no test failed
    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Finished && self.failed == 0
    }

    /// Wall-clock run duration, when both endpoints were observed
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(phase: RunPhase, failed: usize) -> RunSummary {
        RunSummary {
            phase,
            tests_started: 3,
            passed: 3 - failed,
            failed,
            ignored: 0,
            suites: 1,
            unknown_events: 0,
            started_at: None,
            finished_at: None,
            tests: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_success_requires_finished_phase() {
        assert!(summary(RunPhase::Finished, 0).is_success());
        assert!(!summary(RunPhase::Running, 0).is_success());
        assert!(!summary(RunPhase::Finished, 1).is_success());
    }

    #[test]
    fn test_duration_needs_both_endpoints() {
        let mut s = summary(RunPhase::Finished, 0);
        assert!(s.duration().is_none());

        let start = Local::now();
        s.started_at = Some(start);
        s.finished_at = Some(start + chrono::Duration::milliseconds(1500));
        assert_eq!(s.duration(), Some(chrono::Duration::milliseconds(1500)));
    }
}
