//! Stream demuxer: separates protocol frames from plain runner output
//!
//! The codec is stateless; everything incremental lives here. [`Demuxer`]
//! is a push-style line scanner suited to async readers, and [`DemuxIter`]
//! wraps any line iterator into a lazy, ordered sequence of
//! [`StreamItem`]s. Ordering is preserved exactly: decoding and emission
//! for one line complete before the next line is examined.

use std::collections::VecDeque;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use testwire_core::prelude::*;
use testwire_core::TestEvent;

use crate::codec::{self, MESSAGE_END, MESSAGE_START};

/// Maximum lines to buffer for a frame split across writes before giving
/// up and flushing the buffer as passthrough
const MAX_FRAME_LINES: usize = 64;

/// One item of demuxed stream output, in arrival order
#[derive(Debug)]
pub enum StreamItem {
    /// A decoded protocol frame
    Message(TestEvent),
    /// A line that is not a protocol frame, forwarded unchanged
    Passthrough(String),
    /// An envelope whose payload could not be decoded; the scan continues
    MalformedFrame { text: String, error: Error },
}

/// Push-style demuxer.
///
/// Feed lines in arrival order, then drain items with [`next_item`].
/// Call [`finish`] once the source is exhausted so a trailing partial
/// frame is flushed. One instance per stream; independent streams must
/// use independent instances.
///
/// [`next_item`]: Demuxer::next_item
/// [`finish`]: Demuxer::finish
#[derive(Debug, Default)]
pub struct Demuxer {
    pending: VecDeque<StreamItem>,
    /// Lines of a frame split across writes; empty when not assembling
    partial: Vec<String>,
}

impl Demuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan one line, queueing the items it produces
    pub fn feed_line(&mut self, line: String) {
        if !self.partial.is_empty() {
            self.feed_continuation(line);
            return;
        }

        match codec::decode(&line) {
            Ok(Some(event)) => self.pending.push_back(StreamItem::Message(event)),
            Ok(None) => {
                if line.starts_with(MESSAGE_START) {
                    // Start marker without terminator: the frame was split
                    // across writes. Buffer until a terminating line arrives.
                    trace!("buffering partial frame: {}", line);
                    self.partial.push(line);
                } else {
                    self.pending.push_back(StreamItem::Passthrough(line));
                }
            }
            Err(error) => {
                warn!("malformed frame: {} ({})", error, line);
                self.pending
                    .push_back(StreamItem::MalformedFrame { text: line, error });
            }
        }
    }

    /// Handle a line while a partial frame is being assembled
    fn feed_continuation(&mut self, line: String) {
        if line.starts_with(MESSAGE_START) {
            // A new frame opened before the buffered one terminated: the
            // buffer can never complete, so flush it and start over.
            warn!(
                "new frame opened while assembling; flushing {} buffered lines as passthrough",
                self.partial.len()
            );
            self.flush_partial();
            self.feed_line(line);
            return;
        }

        self.partial.push(line);

        if self.partial.last().is_some_and(|l| l.ends_with(MESSAGE_END)) {
            let text = self.partial.join("\n");
            self.partial.clear();
            match codec::decode(&text) {
                Ok(Some(event)) => self.pending.push_back(StreamItem::Message(event)),
                // Unreachable given the start/end checks, but harmless
                Ok(None) => self.pending.push_back(StreamItem::Passthrough(text)),
                Err(error) => {
                    warn!("malformed frame after reassembly: {}", error);
                    self.pending
                        .push_back(StreamItem::MalformedFrame { text, error });
                }
            }
        } else if self.partial.len() >= MAX_FRAME_LINES {
            warn!(
                "partial frame exceeded {} lines without terminator; flushing as passthrough",
                MAX_FRAME_LINES
            );
            self.flush_partial();
        }
    }

    /// Flush buffered partial-frame lines as passthrough, in original order
    fn flush_partial(&mut self) {
        for line in self.partial.drain(..) {
            self.pending.push_back(StreamItem::Passthrough(line));
        }
    }

    /// Signal end of source, flushing any incomplete partial frame
    pub fn finish(&mut self) {
        if !self.partial.is_empty() {
            debug!(
                "source ended with {} unterminated frame lines",
                self.partial.len()
            );
            self.flush_partial();
        }
    }

    /// Drain the next queued item
    pub fn next_item(&mut self) -> Option<StreamItem> {
        self.pending.pop_front()
    }
}

/// Lazy iterator adapter over a line source.
///
/// Finite iff the source is finite; not restartable. Dropping it
/// mid-stream stops scanning without consuming the rest of the source,
/// whose lifetime stays with the caller.
#[derive(Debug)]
pub struct DemuxIter<I> {
    source: I,
    demux: Demuxer,
    source_done: bool,
}

impl<I> DemuxIter<I>
where
    I: Iterator<Item = String>,
{
    pub fn new(source: I) -> Self {
        Self {
            source,
            demux: Demuxer::new(),
            source_done: false,
        }
    }
}

impl<I> Iterator for DemuxIter<I>
where
    I: Iterator<Item = String>,
{
    type Item = StreamItem;

    fn next(&mut self) -> Option<StreamItem> {
        loop {
            if let Some(item) = self.demux.next_item() {
                return Some(item);
            }
            if self.source_done {
                return None;
            }
            match self.source.next() {
                Some(line) => self.demux.feed_line(line),
                None => {
                    self.demux.finish();
                    self.source_done = true;
                }
            }
        }
    }
}

/// Demux a line source into a lazy item sequence
pub fn demux_lines<I>(source: I) -> DemuxIter<I::IntoIter>
where
    I: IntoIterator<Item = String>,
{
    DemuxIter::new(source.into_iter())
}

/// Drive a [`Demuxer`] from an async buffered reader, handing each item to
/// `on_item` in arrival order. Returns when the reader is exhausted.
pub async fn demux_reader<R, F>(reader: R, mut on_item: F) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(StreamItem),
{
    let mut lines = reader.lines();
    let mut demux = Demuxer::new();

    while let Some(line) = lines.next_line().await? {
        trace!("line: {}", line);
        demux.feed_line(line);
        while let Some(item) = demux.next_item() {
            on_item(item);
        }
    }

    demux.finish();
    while let Some(item) = demux.next_item() {
        on_item(item);
    }

    Ok(())
}
