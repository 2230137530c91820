use actix::Addr;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::RelayError;
use crate::models::room::{Envelope, Room};
use crate::models::Deliver;
use crate::websocket::RelayConnection;

/// Application state shared between connections
#[derive(Default)]
pub struct AppState {
    pub rooms: Mutex<HashMap<String, Room>>,
    pub connections: Mutex<HashMap<String, Addr<RelayConnection>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    pub fn register(&self, id: &str, addr: Addr<RelayConnection>) {
        let mut connections = lock(&self.connections);
        connections.insert(id.to_string(), addr);
        info!("Total active connections: {}", connections.len());
    }

    pub fn unregister(&self, id: &str) {
        let mut connections = lock(&self.connections);
        connections.remove(id);
        info!("Total active connections: {}", connections.len());
    }

    pub fn join(&self, session_id: &str, id: &str) -> Result<(), RelayError> {
        let envelopes = lock(&self.rooms)
            .entry(session_id.to_string())
            .or_default()
            .join(id);
        match envelopes {
            Ok(envelopes) => {
                self.dispatch(envelopes);
                Ok(())
            }
            Err(e) => {
                self.drop_if_empty(session_id);
                Err(e)
            }
        }
    }

    pub fn leave(&self, session_id: &str, id: &str) {
        let envelopes = {
            let mut rooms = lock(&self.rooms);
            let Some(room) = rooms.get_mut(session_id) else {
                return;
            };
            let envelopes = room.leave(id);
            if room.is_empty() {
                info!("No more players in session {}. Cleaning up.", session_id);
                rooms.remove(session_id);
            }
            envelopes
        };
        match envelopes {
            Ok(envelopes) => self.dispatch(envelopes),
            Err(e) => warn!("Could not notify session {}: {}", session_id, e),
        }
    }

    pub fn route(&self, session_id: &str, from: &str, text: &str) {
        let envelopes = match lock(&self.rooms).get_mut(session_id) {
            Some(room) => room.route(from, text),
            None => {
                warn!("No room found for session {}", session_id);
                return;
            }
        };
        match envelopes {
            Ok(envelopes) => self.dispatch(envelopes),
            Err(e) => warn!("Could not route frame in session {}: {}", session_id, e),
        }
    }

    fn drop_if_empty(&self, session_id: &str) {
        let mut rooms = lock(&self.rooms);
        if rooms.get(session_id).map_or(false, Room::is_empty) {
            rooms.remove(session_id);
        }
    }

    fn dispatch(&self, envelopes: Vec<Envelope>) {
        let connections = lock(&self.connections);
        for envelope in envelopes {
            match connections.get(&envelope.to) {
                Some(addr) => addr.do_send(Deliver(envelope.frame)),
                None => warn!("Connection {} not found", envelope.to),
            }
        }
    }
}
