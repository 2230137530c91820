pub mod app_state;
pub mod messages;
pub mod room;

// Re-export important types
pub use app_state::AppState;
pub use messages::*;
pub use room::{Envelope, Room, ROOM_CAPACITY};
