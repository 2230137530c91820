use actix::prelude::*;
use log::{debug, warn};

use crate::engine::bridge::{EngineBridge, SuggestionReply, SuggestionRequest};
use crate::engine::uci::UciEngine;
use crate::error::EngineError;
use crate::game::config::EngineSettings;
use crate::game::moves::Move;

/// Blocking engine worker; start it with `SyncArbiter::start`.
pub struct EngineActor {
    engine: UciEngine,
}

impl EngineActor {
    pub fn new(engine: UciEngine) -> Self {
        EngineActor { engine }
    }
}

impl Actor for EngineActor {
    type Context = SyncContext<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        debug!("Engine worker started for {}", self.engine.path().display());
    }
}

/// One-off search, answered directly to the caller.
#[derive(Message, Debug)]
#[rtype(result = "Result<Option<Move>, EngineError>")]
pub struct SuggestMove {
    pub fen: String,
    pub settings: EngineSettings,
}

impl Handler<SuggestMove> for EngineActor {
    type Result = Result<Option<Move>, EngineError>;

    fn handle(&mut self, msg: SuggestMove, _: &mut Self::Context) -> Self::Result {
        self.engine.best_move(&msg.fen, &msg.settings)
    }
}

/// Ticketed search whose answer is pushed to `reply_to`.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Suggest {
    pub request: SuggestionRequest,
    pub reply_to: Recipient<SuggestionReply>,
}

impl Handler<Suggest> for EngineActor {
    type Result = ();

    fn handle(&mut self, msg: Suggest, _: &mut Self::Context) {
        let SuggestionRequest { ticket, fen, settings } = msg.request;
        let result = self.engine.best_move(&fen, &settings);
        if let Err(e) = &result {
            warn!("Engine search failed for {}: {}", fen, e);
        }
        msg.reply_to.do_send(SuggestionReply { ticket, result });
    }
}

/// [`EngineBridge`] backed by an [`EngineActor`] pool.
pub struct ActorEngineBridge {
    engine: Addr<EngineActor>,
    reply_to: Recipient<SuggestionReply>,
}

impl ActorEngineBridge {
    pub fn new(engine: Addr<EngineActor>, reply_to: Recipient<SuggestionReply>) -> Self {
        ActorEngineBridge { engine, reply_to }
    }
}

impl EngineBridge for ActorEngineBridge {
    fn request(&mut self, request: SuggestionRequest) -> Result<(), EngineError> {
        debug!("Requesting engine move for ticket {:?}", request.ticket);
        self.engine
            .try_send(Suggest {
                request,
                reply_to: self.reply_to.clone(),
            })
            .map_err(|e| EngineError::Unavailable(format!("engine queue: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bridge::SuggestionTicket;
    use std::sync::{Arc, Mutex};

    fn missing_engine() -> Addr<EngineActor> {
        SyncArbiter::start(1, || EngineActor::new(UciEngine::new("/nonexistent/engine-binary")))
    }

    struct Collector(Arc<Mutex<Vec<SuggestionReply>>>);

    impl Actor for Collector {
        type Context = Context<Self>;
    }

    impl Handler<SuggestionReply> for Collector {
        type Result = ();

        fn handle(&mut self, msg: SuggestionReply, _: &mut Self::Context) {
            self.0.lock().unwrap().push(msg);
        }
    }

    #[actix_rt::test]
    async fn direct_search_reports_unavailable_engine() {
        let engine = missing_engine();
        let result = engine
            .send(SuggestMove {
                fen: "8/8/8/8/8/8/8/K6k w - - 0 1".into(),
                settings: EngineSettings::default(),
            })
            .await
            .unwrap();
        assert!(matches!(result, Err(EngineError::Unavailable(_))));
    }

    #[actix_rt::test]
    async fn bridged_search_replies_with_ticket() {
        let replies = Arc::new(Mutex::new(Vec::new()));
        let collector = Collector(replies.clone()).start();
        let mut bridge = ActorEngineBridge::new(missing_engine(), collector.recipient());

        let ticket = SuggestionTicket { epoch: 4, ply: 7 };
        bridge
            .request(SuggestionRequest {
                ticket,
                fen: "8/8/8/8/8/8/8/K6k w - - 0 1".into(),
                settings: EngineSettings::default(),
            })
            .unwrap();

        for _ in 0..50 {
            if !replies.lock().unwrap().is_empty() {
                break;
            }
            actix_rt::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        let replies = replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].ticket, ticket);
        assert!(replies[0].result.is_err());
    }
}
