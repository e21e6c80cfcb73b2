//! Built-in listeners: run aggregation and live notification
//!
//! The protocol core delivers events in exact arrival order and enforces
//! nothing; [`RunAggregator`] is the listener that imposes the whole-run
//! state machine (`NotStarted -> Running -> Finished`), pairs test
//! start/finish events by name, and turns the stream into a
//! [`RunSummary`]. Violations are recorded as diagnostics, never errors:
//! a misbehaving runner should degrade the report, not kill the stream.

use std::collections::HashSet;

use chrono::{DateTime, Local};

use testwire_core::prelude::*;
use testwire_core::{EventKind, RunPhase, RunSummary, TestEvent, TestRecord, Verdict};

use crate::dispatch::EventListener;

/// Aggregates a run's events into counts, per-test records, and
/// ordering diagnostics.
#[derive(Debug, Default)]
pub struct RunAggregator {
    phase: Option<RunPhase>,
    open_suites: Vec<String>,
    open_tests: HashSet<String>,
    tests_started: usize,
    suites: usize,
    unknown_events: usize,
    records: Vec<TestRecord>,
    diagnostics: Vec<String>,
    started_at: Option<DateTime<Local>>,
    finished_at: Option<DateTime<Local>>,
}

impl RunAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase.unwrap_or(RunPhase::NotStarted)
    }

    fn diagnose(&mut self, message: String) {
        debug!("run diagnostic: {}", message);
        self.diagnostics.push(message);
    }

    /// Name attribute of an event, with a stable fallback for events a
    /// runner emitted without one (itself worth a diagnostic).
    fn subject(&mut self, event: &TestEvent) -> String {
        match event.test_name() {
            Some(name) => name.to_string(),
            None => {
                self.diagnose(format!("{} event without a name attribute", event.kind()));
                "<unnamed>".to_string()
            }
        }
    }

    fn record(&mut self, event: &TestEvent, name: String, verdict: Verdict) {
        self.records.push(TestRecord {
            name,
            verdict,
            duration_millis: event.duration_millis(),
            message: event.attr("message").map(str::to_string),
        });
    }

    fn on_test_completed(&mut self, event: &TestEvent, verdict: Verdict) {
        let name = self.subject(event);
        if !self.open_tests.remove(&name) {
            self.diagnose(format!(
                "{} without a matching test-started: {}",
                event.kind(),
                name
            ));
        }
        self.record(event, name, verdict);
    }

    /// Snapshot of the aggregated state; callable at any point in the run
    pub fn summary(&self) -> RunSummary {
        let passed = self
            .records
            .iter()
            .filter(|r| r.verdict == Verdict::Passed)
            .count();
        let failed = self
            .records
            .iter()
            .filter(|r| r.verdict == Verdict::Failed)
            .count();
        let ignored = self
            .records
            .iter()
            .filter(|r| r.verdict == Verdict::Ignored)
            .count();

        RunSummary {
            phase: self.phase(),
            tests_started: self.tests_started,
            passed,
            failed,
            ignored,
            suites: self.suites,
            unknown_events: self.unknown_events,
            started_at: self.started_at,
            finished_at: self.finished_at,
            tests: self.records.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

impl EventListener for RunAggregator {
    fn on_event(&mut self, event: &TestEvent) -> Result<()> {
        // Events after testing-finished are still delivered to us; note
        // them, then process normally so late results are not lost.
        if self.phase() == RunPhase::Finished
            && event.kind() != &EventKind::TestingFinished
        {
            self.diagnose(format!("{} after testing-finished", event.kind()));
        }

        match event.kind() {
            EventKind::TestingStarted => {
                if self.phase.is_some() {
                    self.diagnose("duplicate testing-started".to_string());
                }
                self.phase = Some(RunPhase::Running);
                self.started_at.get_or_insert_with(Local::now);
            }
            EventKind::TestingFinished => {
                if self.phase.is_none() {
                    self.diagnose("testing-finished without testing-started".to_string());
                }
                self.phase = Some(RunPhase::Finished);
                self.finished_at.get_or_insert_with(Local::now);
            }
            EventKind::SuiteStarted => {
                let name = self.subject(event);
                self.open_suites.push(name);
                self.suites += 1;
            }
            EventKind::SuiteFinished => {
                let name = self.subject(event);
                match self.open_suites.pop() {
                    Some(open) if open == name => {}
                    Some(open) => self.diagnose(format!(
                        "suite-finished for {} while {} was open",
                        name, open
                    )),
                    None => {
                        self.diagnose(format!("suite-finished without suite-started: {}", name))
                    }
                }
            }
            EventKind::TestStarted => {
                if self.phase() == RunPhase::NotStarted {
                    self.diagnose("test-started before testing-started".to_string());
                }
                let name = self.subject(event);
                if !self.open_tests.insert(name.clone()) {
                    self.diagnose(format!("test-started twice without finishing: {}", name));
                }
                self.tests_started += 1;
            }
            EventKind::TestFinished => self.on_test_completed(event, Verdict::Passed),
            EventKind::TestFailed => self.on_test_completed(event, Verdict::Failed),
            EventKind::TestIgnored => {
                // Ignored tests are typically never started; record directly
                let name = self.subject(event);
                self.open_tests.remove(&name);
                self.record(event, name, Verdict::Ignored);
            }
            EventKind::Unknown(name) => {
                debug!("unknown event kind: {}", name);
                self.unknown_events += 1;
            }
        }

        Ok(())
    }
}

/// Live notifier: logs each event as it arrives.
///
/// Stands in for an IDE's notification surface; anything heavier than a
/// log line belongs in the consumer's own background execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl EventListener for LogNotifier {
    fn on_event(&mut self, event: &TestEvent) -> Result<()> {
        match event.kind() {
            EventKind::TestFailed => warn!("{}", event.summary()),
            EventKind::Unknown(_) => debug!("{}", event.summary()),
            _ => info!("{}", event.summary()),
        }
        Ok(())
    }
}
