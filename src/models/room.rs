use log::{debug, info, warn};
use serde::Serialize;

use crate::error::RelayError;
use crate::models::messages::{ControlMessage, RelayMessage};

pub const ROOM_CAPACITY: usize = 2;

/// A frame addressed to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub to: String,
    pub frame: String,
}

impl Envelope {
    fn new(to: &str, message: &impl Serialize) -> Result<Self, RelayError> {
        Ok(Envelope {
            to: to.to_string(),
            frame: serde_json::to_string(message)?,
        })
    }
}

/// Relay bookkeeping for one session id: who is connected and the last
/// position snapshot seen. The relay never interprets game rules.
#[derive(Debug, Default)]
pub struct Room {
    members: Vec<String>,
    snapshot: Option<String>,
}

impl Room {
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Admit a connection. The joiner is brought up to date with the last
    /// snapshot and the other member is told someone arrived.
    pub fn join(&mut self, id: &str) -> Result<Vec<Envelope>, RelayError> {
        if self.members.len() >= ROOM_CAPACITY {
            warn!("Refusing {}: room already has {} members", id, self.members.len());
            return Err(RelayError::SessionFull);
        }

        let mut out = Vec::new();
        if let Some(fen) = &self.snapshot {
            out.push(Envelope::new(id, &RelayMessage::Init { fen: fen.clone() })?);
        }
        for member in &self.members {
            out.push(Envelope::new(member, &ControlMessage::PeerJoined)?);
        }
        self.members.push(id.to_string());
        info!("Connection {} joined ({} members)", id, self.members.len());
        Ok(out)
    }

    pub fn leave(&mut self, id: &str) -> Result<Vec<Envelope>, RelayError> {
        let before = self.members.len();
        self.members.retain(|member| member != id);
        if self.members.len() == before {
            return Ok(Vec::new());
        }
        info!("Connection {} left ({} members)", id, self.members.len());
        self.members
            .iter()
            .map(|member| Envelope::new(member, &ControlMessage::PeerLeft))
            .collect()
    }

    /// Forward a text frame from `from` to every other member, keeping the
    /// snapshot current. Unreadable frames are answered with an error to the
    /// sender only.
    pub fn route(&mut self, from: &str, text: &str) -> Result<Vec<Envelope>, RelayError> {
        if !self.members.iter().any(|member| member == from) {
            warn!("Dropping frame from non-member {}", from);
            return Ok(Vec::new());
        }

        let message = match serde_json::from_str::<RelayMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Invalid frame from {}: {}", from, e);
                let error = ControlMessage::Error {
                    message: format!("Invalid message format: {}", e),
                };
                return Ok(vec![Envelope::new(from, &error)?]);
            }
        };

        match &message {
            RelayMessage::Init { fen } | RelayMessage::Move { fen, .. } => {
                self.snapshot = Some(fen.clone());
            }
            RelayMessage::Reset => self.snapshot = None,
            _ => {}
        }
        debug!("Forwarding {} from {}", message.kind(), from);

        Ok(self
            .members
            .iter()
            .filter(|member| member.as_str() != from)
            .map(|member| Envelope {
                to: member.clone(),
                frame: text.to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    fn decode<T: serde::de::DeserializeOwned>(envelope: &Envelope) -> T {
        serde_json::from_str(&envelope.frame).unwrap()
    }

    #[test]
    fn first_joiner_gets_nothing() {
        let mut room = Room::default();
        assert!(room.join("a").unwrap().is_empty());
        assert_eq!(room.members(), ["a".to_string()]);
    }

    #[test]
    fn second_joiner_announced_to_first() {
        let mut room = Room::default();
        room.join("a").unwrap();
        let out = room.join("b").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, "a");
        assert_eq!(decode::<ControlMessage>(&out[0]), ControlMessage::PeerJoined);
    }

    #[test]
    fn late_joiner_receives_snapshot() {
        let mut room = Room::default();
        room.join("a").unwrap();
        let frame = serde_json::to_string(&RelayMessage::Move {
            fen: FEN.into(),
            uci: Some("e2e4".into()),
        })
        .unwrap();
        assert!(room.route("a", &frame).unwrap().is_empty());
        assert_eq!(room.snapshot(), Some(FEN));

        let out = room.join("b").unwrap();
        assert_eq!(out[0].to, "b");
        assert_eq!(decode::<RelayMessage>(&out[0]), RelayMessage::Init { fen: FEN.into() });
        assert_eq!(out[1].to, "a");
    }

    #[test]
    fn third_joiner_refused() {
        let mut room = Room::default();
        room.join("a").unwrap();
        room.join("b").unwrap();
        let err = room.join("c").unwrap_err();
        assert!(matches!(err, RelayError::SessionFull));
        assert_eq!(err.to_string(), "Session is full");
        assert_eq!(room.members().len(), 2);
    }

    #[test]
    fn frames_go_to_the_other_member_only() {
        let mut room = Room::default();
        room.join("a").unwrap();
        room.join("b").unwrap();
        let out = room.route("b", r#"{"type":"resign"}"#).unwrap();
        assert_eq!(
            out,
            vec![Envelope {
                to: "a".into(),
                frame: r#"{"type":"resign"}"#.into()
            }]
        );
    }

    #[test]
    fn reset_clears_snapshot() {
        let mut room = Room::default();
        room.join("a").unwrap();
        room.route("a", &format!(r#"{{"type":"init","fen":"{}"}}"#, FEN)).unwrap();
        room.route("a", r#"{"type":"reset"}"#).unwrap();
        assert_eq!(room.snapshot(), None);
    }

    #[test]
    fn bad_frame_answered_to_sender() {
        let mut room = Room::default();
        room.join("a").unwrap();
        room.join("b").unwrap();
        let out = room.route("a", r#"{"type":"teleport"}"#).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, "a");
        assert!(matches!(decode::<ControlMessage>(&out[0]), ControlMessage::Error { .. }));
    }

    #[test]
    fn leaving_notifies_remaining_member() {
        let mut room = Room::default();
        room.join("a").unwrap();
        room.join("b").unwrap();
        let out = room.leave("a").unwrap();
        assert_eq!(out[0].to, "b");
        assert_eq!(decode::<ControlMessage>(&out[0]), ControlMessage::PeerLeft);

        assert!(room.leave("a").unwrap().is_empty());
        room.leave("b").unwrap();
        assert!(room.is_empty());
    }
}
