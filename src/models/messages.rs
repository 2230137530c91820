use actix::Message;
use serde::{Deserialize, Serialize};

/// Game-level messages exchanged between peers through the relay.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayMessage {
    /// Full current state; sent by a peer starting a session and replayed by
    /// the relay to late joiners.
    Init { fen: String },
    /// Position after a locally committed move, plus the move itself in
    /// compact notation when the sender has it.
    Move {
        fen: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uci: Option<String>,
    },
    Reset,
    Resign,
    DrawOffer,
    DrawAccept,
}

impl RelayMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayMessage::Init { .. } => "init",
            RelayMessage::Move { .. } => "move",
            RelayMessage::Reset => "reset",
            RelayMessage::Resign => "resign",
            RelayMessage::DrawOffer => "draw_offer",
            RelayMessage::DrawAccept => "draw_accept",
        }
    }
}

/// Frames the relay itself sends to a connection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    PeerJoined,
    PeerLeft,
    Error { message: String },
}

/// Anything a connected client may receive.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Inbound {
    Game(RelayMessage),
    Control(ControlMessage),
}

/// Serialized frame pushed to a WebSocket connection actor
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct Deliver(pub String);
