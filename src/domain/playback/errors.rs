//! Playback Context - Errors

use thiserror::Error;

use super::SessionState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    #[error("session already finished ({0})")]
    Finished(SessionState),
}
