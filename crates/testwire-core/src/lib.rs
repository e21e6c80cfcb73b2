//! # testwire-core - Core Domain Types
//!
//! Foundation crate for testwire. Provides the test event model, run-state
//! vocabulary, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Events (`event`)
//! - [`TestEvent`] - An immutable event decoded from a runner's output stream
//! - [`EventKind`] - Closed set of well-known event kinds plus an
//!   `Unknown(name)` fallback; [`EventKind::resolve`] is the catalog lookup
//!
//! ### Run State (`run`)
//! - [`RunPhase`] - Whole-run lifecycle (NotStarted, Running, Finished)
//! - [`Verdict`] - Per-test outcome (Passed, Failed, Ignored)
//! - [`TestRecord`], [`RunSummary`] - Aggregated results for display/export
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum (protocol, listener, IO)
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use testwire_core::prelude::*;
//! ```

pub mod error;
pub mod event;
pub mod logging;
pub mod run;

/// Prelude for common imports used throughout all testwire crates
pub mod prelude {
    pub use super::error::{Error, Result};
    pub use tracing::{debug, error, info, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result};
pub use event::{EventKind, TestEvent};
pub use run::{RunPhase, RunSummary, TestRecord, Verdict};
