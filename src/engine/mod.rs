pub mod actor;
pub mod bridge;
pub mod uci;

pub use actor::{ActorEngineBridge, EngineActor, SuggestMove};
pub use bridge::{EngineBridge, SuggestionReply, SuggestionRequest, SuggestionTicket};
pub use uci::UciEngine;
