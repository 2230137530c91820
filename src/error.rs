use thiserror::Error;

use crate::game::Phase;

/// Errors raised by the game session state machine.
///
/// None of these are fatal: a rejected input leaves the session exactly as it
/// was before the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("illegal move {mv}: {reason}")]
    IllegalMoveRejected { mv: String, reason: &'static str },

    #[error("cannot {action} while the session is {phase}")]
    InvalidPhaseAction { action: &'static str, phase: Phase },

    #[error("no draw offer is pending from the opponent")]
    NoPendingOffer,

    #[error("remote update rejected: {0}")]
    RemoteRejected(String),

    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

impl SessionError {
    pub(crate) fn illegal(mv: impl ToString, reason: &'static str) -> Self {
        SessionError::IllegalMoveRejected {
            mv: mv.to_string(),
            reason,
        }
    }
}

/// Errors from the external chess-playing engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("engine protocol error: {0}")]
    Protocol(String),

    #[error("engine suggested an unreadable move: {0}")]
    BadMove(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Unavailable(err.to_string())
    }
}

/// Errors from the relay channel between peers.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("peer link is disconnected")]
    Disconnected,

    #[error("Session is full")]
    SessionFull,

    #[error("failed to encode relay message: {0}")]
    Encode(#[from] serde_json::Error),
}
