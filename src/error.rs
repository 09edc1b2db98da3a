//! BITLOG - Error Types
//! Defines the error hierarchy for the log-structured storage engine.

use thiserror::Error;

use crate::engine::EngineState;

/// Custom Result type for the BitLog engine.
pub type Result<T> = std::result::Result<T, BitLogError>;

/// Error types for the BitLog storage engine.
///
/// A missing key is not an error: `BitLog::get` returns `Ok(None)`.
#[derive(Error, Debug)]
pub enum BitLogError {
    /// I/O errors from the data file, including short reads.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entity could not be serialized.
    #[error("Encode error: {0}")]
    Encode(String),

    /// A payload could not be decoded into an entity.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// A frame read was requested at or past the end of the log.
    #[error("Offset {offset} is at or beyond the end of the log")]
    Eof { offset: u64 },

    /// Replay stopped on a malformed frame.
    #[error("Recovery failed at offset {offset}: {source}")]
    Recovery {
        offset: u64,
        #[source]
        source: Box<BitLogError>,
    },

    /// The engine does not accept requests in its current state.
    #[error("Engine not ready (state: {0:?})")]
    NotReady(EngineState),

    /// `recover()` was called while a recovery was already running.
    #[error("Recovery already in progress")]
    RecoveryInProgress,

    /// Keys must be non-empty.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The write worker has been shut down.
    #[error("Write worker closed")]
    WorkerClosed,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BitLogError {
    /// True for errors that mean the log content itself is damaged:
    /// short reads, undecodable payloads and aborted recoveries.
    pub fn is_corruption(&self) -> bool {
        match self {
            BitLogError::CorruptRecord(_) | BitLogError::Recovery { .. } => true,
            BitLogError::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
