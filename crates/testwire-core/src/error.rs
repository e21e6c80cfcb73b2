//! Error types for the testwire crates

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types organized by layer
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An envelope was present but its payload could not be decoded.
    ///
    /// Raised by the codec, caught by the demuxer and surfaced as a
    /// malformed-frame item rather than aborting the scan.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// A registered listener failed while handling an event.
    ///
    /// Collected by the dispatcher; never stops delivery to the
    /// remaining listeners.
    #[error("listener error: {message}")]
    Listener { message: String },
}

impl Error {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn listener(message: impl Into<String>) -> Self {
        Self::Listener {
            message: message.into(),
        }
    }

    /// Check if this error leaves the stream usable.
    ///
    /// Protocol and listener errors are per-frame/per-listener; only IO
    /// failures end the scan.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Protocol { .. } | Error::Listener { .. })
    }
}
