pub mod clock;
pub mod config;
pub mod intake;
pub mod moves;
pub mod negotiation;
pub mod outcome;
pub mod promotion;
pub mod rules;
pub mod session;
pub mod utils;

pub use config::{EngineSettings, Opponent, SessionConfig, TrustPolicy};
pub use moves::{Move, MoveRecord};
pub use outcome::{DrawReason, Outcome};
pub use session::{GameSession, MoveOutcome, Phase, SessionNotice, SessionView};
