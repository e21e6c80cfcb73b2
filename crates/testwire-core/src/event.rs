//! Test event model
//!
//! A [`TestEvent`] is the typed form of one protocol frame: a kind resolved
//! from the frame's `name` field plus a string-to-string attribute map.
//! [`EventKind`] keeps the set of well-known names closed and exhaustively
//! matchable while still accepting names introduced by newer runners via
//! the `Unknown` fallback.

use std::collections::HashMap;
use std::fmt;

/// The category of event a [`TestEvent`] represents.
///
/// The known variants map one-to-one onto the canonical wire names; any
/// other name resolves to `Unknown`, which preserves the original string
/// so the event stays routable and displayable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The whole run has started
    TestingStarted,
    /// The whole run has finished
    TestingFinished,
    SuiteStarted,
    SuiteFinished,
    TestStarted,
    TestFinished,
    TestFailed,
    TestIgnored,
    /// An event name this build does not know about
    Unknown(String),
}

impl EventKind {
    /// Resolve a wire name to a kind.
    ///
    /// Total and pure: the same name always yields an equal kind, and
    /// names outside the catalog yield `Unknown(name)` rather than an error.
    pub fn resolve(name: &str) -> Self {
        match name {
            "testing-started" => EventKind::TestingStarted,
            "testing-finished" => EventKind::TestingFinished,
            "suite-started" => EventKind::SuiteStarted,
            "suite-finished" => EventKind::SuiteFinished,
            "test-started" => EventKind::TestStarted,
            "test-finished" => EventKind::TestFinished,
            "test-failed" => EventKind::TestFailed,
            "test-ignored" => EventKind::TestIgnored,
            _ => EventKind::Unknown(name.to_string()),
        }
    }

    /// The canonical wire name. For `Unknown` this is the preserved
    /// original name, so encoding is the exact inverse of resolution.
    pub fn canonical_name(&self) -> &str {
        match self {
            EventKind::TestingStarted => "testing-started",
            EventKind::TestingFinished => "testing-finished",
            EventKind::SuiteStarted => "suite-started",
            EventKind::SuiteFinished => "suite-finished",
            EventKind::TestStarted => "test-started",
            EventKind::TestFinished => "test-finished",
            EventKind::TestFailed => "test-failed",
            EventKind::TestIgnored => "test-ignored",
            EventKind::Unknown(name) => name,
        }
    }

    /// Check if this kind is part of the closed catalog
    pub fn is_known(&self) -> bool {
        !matches!(self, EventKind::Unknown(_))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// One decoded protocol frame.
///
/// Immutable after construction: the kind is resolved once at decode time
/// and the attribute map is owned, sharing no state with the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct TestEvent {
    kind: EventKind,
    attributes: HashMap<String, String>,
}

impl TestEvent {
    pub fn new(kind: EventKind, attributes: HashMap<String, String>) -> Self {
        Self { kind, attributes }
    }

    /// An event with no attributes (e.g. `testing-started`)
    pub fn bare(kind: EventKind) -> Self {
        Self::new(kind, HashMap::new())
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Look up a single attribute value
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// The `name` attribute: the test or suite identifier most events carry
    pub fn test_name(&self) -> Option<&str> {
        self.attr("name")
    }

    /// The `duration` attribute in milliseconds, if present and numeric
    pub fn duration_millis(&self) -> Option<u64> {
        self.attr("duration")?.trim().parse().ok()
    }

    /// Get a human-readable summary of this event
    pub fn summary(&self) -> String {
        match self.test_name() {
            Some(name) => format!("{}: {}", self.kind, name),
            None => self.kind.to_string(),
        }
    }
}
