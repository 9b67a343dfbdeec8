use thiserror::Error;

use crate::channels::selection::ChannelSetError;
use crate::cue::cue::CueNumber;
use crate::engine::EngineState;

/// Errors returned to whoever drives the console.
///
/// None of these leave the engine half-modified: a command either applies
/// completely or not at all.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Malformed operator entry.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cue {0} does not exist")]
    NotFound(CueNumber),

    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: EngineState,
    },

    #[error("show file error: {0}")]
    Persistence(String),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl From<ChannelSetError> for ConsoleError {
    fn from(err: ChannelSetError) -> Self {
        ConsoleError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
