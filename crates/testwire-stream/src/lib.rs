//! # testwire-stream - Protocol Layer
//!
//! The wire protocol for relaying test-execution events through a runner's
//! interleaved text output, and the machinery around it.
//!
//! Depends on [`testwire_core`] for the event model and error handling.
//!
//! ## Public API
//!
//! ### Codec (`codec`)
//! - [`encode()`] / [`decode()`] - Stateless conversion between
//!   [`TestEvent`]s and `@@<{...}>` wire frames
//!
//! ### Demuxing (`demux`)
//! - [`Demuxer`] - Push-style line scanner separating frames from plain output
//! - [`DemuxIter`] / [`demux_lines()`] - Lazy iterator over a line source
//! - [`demux_reader()`] - Drive a demuxer from an async buffered reader
//! - [`StreamItem`] - Ordered output: message, passthrough, or malformed frame
//!
//! ### Dispatch (`dispatch`)
//! - [`Dispatcher`] - Ordered, failure-isolated fan-out to listeners
//! - [`EventListener`] - Trait implemented by event consumers
//!
//! ### Built-in Listeners (`collector`)
//! - [`RunAggregator`] - Collects events into a `RunSummary`
//! - [`LogNotifier`] - Logs events as they arrive

pub mod codec;
pub mod collector;
pub mod demux;
pub mod dispatch;

// Public API re-exports
pub use codec::{decode, encode, MESSAGE_END, MESSAGE_START};
pub use collector::{LogNotifier, RunAggregator};
pub use demux::{demux_lines, demux_reader, DemuxIter, Demuxer, StreamItem};
pub use dispatch::{Dispatcher, EventListener, ListenerFailure, ListenerId, PublishReport};
/// Re-exported from `testwire_core` for convenience. Canonical import:
/// `testwire_core::TestEvent`.
pub use testwire_core::{EventKind, TestEvent};
