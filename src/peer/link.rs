use actix::Recipient;
use log::debug;

use crate::error::RelayError;
use crate::models::{Deliver, RelayMessage};

/// Outbound channel from one peer's session to the other participant.
pub trait PeerLink {
    fn send(&mut self, message: &RelayMessage) -> Result<(), RelayError>;
}

/// A link with nobody on the other end; every send fails.
#[derive(Debug, Default)]
pub struct Disconnected;

impl PeerLink for Disconnected {
    fn send(&mut self, message: &RelayMessage) -> Result<(), RelayError> {
        debug!("Dropping {} message: no peer link", message.kind());
        Err(RelayError::Disconnected)
    }
}

/// Serializes messages and pushes them to an actix recipient, typically the
/// actor that owns the WebSocket to the relay.
pub struct RecipientLink {
    recipient: Recipient<Deliver>,
}

impl RecipientLink {
    pub fn new(recipient: Recipient<Deliver>) -> Self {
        RecipientLink { recipient }
    }
}

impl PeerLink for RecipientLink {
    fn send(&mut self, message: &RelayMessage) -> Result<(), RelayError> {
        let frame = serde_json::to_string(message)?;
        self.recipient
            .try_send(Deliver(frame))
            .map_err(|_| RelayError::Disconnected)
    }
}
