use actix::Message;

use crate::error::EngineError;
use crate::game::config::EngineSettings;
use crate::game::moves::Move;

/// Identifies the position a suggestion was asked for. A reply is only
/// usable while the session is still in the same epoch at the same ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuggestionTicket {
    pub epoch: u64,
    pub ply: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub ticket: SuggestionTicket,
    pub fen: String,
    pub settings: EngineSettings,
}

/// Answer to a [`SuggestionRequest`]; `Ok(None)` means the engine had no move.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct SuggestionReply {
    pub ticket: SuggestionTicket,
    pub result: Result<Option<Move>, EngineError>,
}

/// Outbound half of the engine exchange. Replies come back asynchronously
/// as [`SuggestionReply`] and re-enter the session as ordinary input.
pub trait EngineBridge {
    fn request(&mut self, request: SuggestionRequest) -> Result<(), EngineError>;
}
