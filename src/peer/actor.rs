use std::time::Duration;

use actix::prelude::*;
use chess::{Piece, Square};
use log::{debug, info, warn};

use crate::engine::actor::{ActorEngineBridge, EngineActor};
use crate::engine::bridge::SuggestionReply;
use crate::error::SessionError;
use crate::game::config::SessionConfig;
use crate::game::session::{GameSession, SessionNotice, SessionView};
use crate::models::{ControlMessage, Inbound, RelayMessage};
use crate::peer::link::PeerLink;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Local player actions.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
#[rtype(result = "Result<(), SessionError>")]
pub enum PeerCommand {
    Start,
    Move {
        origin: Square,
        destination: Square,
        promotion: Option<Piece>,
    },
    Promote(Piece),
    CancelPromotion,
    Resign,
    OfferDraw,
    AcceptDraw,
    Reset,
}

/// Text frame received from the relay.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct RemoteFrame(pub String);

#[derive(Message, Debug)]
#[rtype(result = "SessionView")]
pub struct GetView;

#[derive(Message, Debug)]
#[rtype(result = "Vec<SessionNotice>")]
pub struct TakeNotices;

/// Drives one [`GameSession`]: clock ticks, engine replies, relay frames and
/// local commands all arrive here as messages and run one at a time.
pub struct PeerActor {
    session: GameSession,
    engine: Option<Addr<EngineActor>>,
    tick_interval: Duration,
}

impl PeerActor {
    pub fn new(config: SessionConfig, link: Box<dyn PeerLink>) -> Self {
        PeerActor {
            session: GameSession::new(config, link),
            engine: None,
            tick_interval: TICK_INTERVAL,
        }
    }

    pub fn with_engine(mut self, engine: Addr<EngineActor>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    fn handle_relay(&mut self, message: RelayMessage) {
        let kind = message.kind();
        if let Err(e) = self.session.handle_remote(message) {
            warn!("Ignoring remote {} message: {}", kind, e);
        }
    }
}

impl Actor for PeerActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        if let Some(engine) = self.engine.clone() {
            let bridge = ActorEngineBridge::new(engine, ctx.address().recipient());
            self.session.attach_engine(Box::new(bridge));
        }
        ctx.run_interval(self.tick_interval, |act, _| {
            if let Some(outcome) = act.session.tick() {
                info!("Clock expired: {}", outcome);
            }
        });
        info!("Peer started as {:?}", self.session.config().orientation);
    }
}

impl Handler<PeerCommand> for PeerActor {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: PeerCommand, _: &mut Self::Context) -> Self::Result {
        debug!("Peer command {:?}", msg);
        match msg {
            PeerCommand::Start => self.session.start(),
            PeerCommand::Move {
                origin,
                destination,
                promotion,
            } => self
                .session
                .submit_move(origin, destination, promotion)
                .map(|_| ()),
            PeerCommand::Promote(piece) => self.session.choose_promotion(piece).map(|_| ()),
            PeerCommand::CancelPromotion => self.session.cancel_promotion(),
            PeerCommand::Resign => self.session.resign().map(|_| ()),
            PeerCommand::OfferDraw => self.session.offer_draw().map(|_| ()),
            PeerCommand::AcceptDraw => self.session.accept_draw().map(|_| ()),
            PeerCommand::Reset => {
                self.session.reset();
                Ok(())
            }
        }
    }
}

impl Handler<RemoteFrame> for PeerActor {
    type Result = ();

    fn handle(&mut self, msg: RemoteFrame, _: &mut Self::Context) {
        match serde_json::from_str::<Inbound>(&msg.0) {
            Ok(Inbound::Game(message)) => self.handle_relay(message),
            Ok(Inbound::Control(ControlMessage::PeerJoined)) => info!("Opponent joined the session"),
            Ok(Inbound::Control(ControlMessage::PeerLeft)) => info!("Opponent left the session"),
            Ok(Inbound::Control(ControlMessage::Error { message })) => {
                warn!("Relay reported an error: {}", message)
            }
            Err(e) => warn!("Unreadable relay frame: {}", e),
        }
    }
}

impl Handler<SuggestionReply> for PeerActor {
    type Result = ();

    fn handle(&mut self, msg: SuggestionReply, _: &mut Self::Context) {
        if let Err(e) = self.session.receive_suggestion(msg) {
            warn!("Engine suggestion rejected: {}", e);
        }
    }
}

impl Handler<GetView> for PeerActor {
    type Result = MessageResult<GetView>;

    fn handle(&mut self, _: GetView, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.view())
    }
}

impl Handler<TakeNotices> for PeerActor {
    type Result = MessageResult<TakeNotices>;

    fn handle(&mut self, _: TakeNotices, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.take_notices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::uci::UciEngine;
    use crate::game::config::{EngineSettings, Opponent};
    use crate::models::Deliver;
    use crate::peer::link::{Disconnected, RecipientLink};
    use chess::Color;
    use std::sync::{Arc, Mutex};

    struct Frames(Arc<Mutex<Vec<String>>>);

    impl Actor for Frames {
        type Context = Context<Self>;
    }

    impl Handler<Deliver> for Frames {
        type Result = ();

        fn handle(&mut self, msg: Deliver, _: &mut Self::Context) {
            self.0.lock().unwrap().push(msg.0);
        }
    }

    fn hotseat() -> SessionConfig {
        SessionConfig {
            opponent: Opponent::Hotseat,
            ..SessionConfig::default()
        }
    }

    async fn settle() {
        actix_rt::time::sleep(Duration::from_millis(100)).await;
    }

    #[actix_rt::test]
    async fn commands_drive_the_session() {
        let peer = PeerActor::new(hotseat(), Box::new(Disconnected)).start();
        peer.send(PeerCommand::Start).await.unwrap().unwrap();
        peer.send(PeerCommand::Move {
            origin: Square::E2,
            destination: Square::E4,
            promotion: None,
        })
        .await
        .unwrap()
        .unwrap();

        let err = peer
            .send(PeerCommand::Move {
                origin: Square::E2,
                destination: Square::E4,
                promotion: None,
            })
            .await
            .unwrap();
        assert!(err.is_err());

        let view = peer.send(GetView).await.unwrap();
        assert_eq!(view.moves, vec!["e2e4".to_string()]);
        assert_eq!(view.side_to_move, "black");
    }

    #[actix_rt::test]
    async fn ticks_run_the_clock_out() {
        let config = SessionConfig {
            time_control_secs: 2,
            ..hotseat()
        };
        let peer = PeerActor::new(config, Box::new(Disconnected))
            .with_tick_interval(Duration::from_millis(10))
            .start();
        peer.send(PeerCommand::Start).await.unwrap().unwrap();
        settle().await;

        let view = peer.send(GetView).await.unwrap();
        assert_eq!(view.phase, "over");
        assert_eq!(view.white_secs, 0);
        assert_eq!(view.black_secs, 2);
        assert_eq!(view.outcome.as_deref(), Some("Opponent wins, on time"));
    }

    #[actix_rt::test]
    async fn relay_frames_flow_both_ways() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let outbox = Frames(frames.clone()).start();
        let config = SessionConfig {
            orientation: Color::Black,
            ..SessionConfig::default()
        };
        let peer = PeerActor::new(config, Box::new(RecipientLink::new(outbox.recipient()))).start();

        let init = r#"{"type":"init","fen":"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"}"#;
        peer.send(RemoteFrame(init.into())).await.unwrap();
        peer.send(RemoteFrame(r#"{"type":"peer_joined"}"#.into())).await.unwrap();
        peer.send(RemoteFrame("not json".into())).await.unwrap();
        peer.send(PeerCommand::Move {
            origin: Square::E7,
            destination: Square::E5,
            promotion: None,
        })
        .await
        .unwrap()
        .unwrap();
        settle().await;

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        let sent: RelayMessage = serde_json::from_str(&frames[0]).unwrap();
        assert!(matches!(sent, RelayMessage::Move { uci: Some(ref uci), .. } if uci == "e7e5"));
    }

    #[actix_rt::test]
    async fn failed_engine_becomes_a_notice() {
        let engine = SyncArbiter::start(1, || EngineActor::new(UciEngine::new("/nonexistent/engine-binary")));
        let config = SessionConfig {
            orientation: Color::Black,
            opponent: Opponent::Engine(EngineSettings::default()),
            ..SessionConfig::default()
        };
        let peer = PeerActor::new(config, Box::new(Disconnected))
            .with_engine(engine)
            .start();
        peer.send(PeerCommand::Start).await.unwrap().unwrap();
        settle().await;

        let notices = peer.send(TakeNotices).await.unwrap();
        assert!(matches!(notices.as_slice(), [SessionNotice::EngineUnavailable(_)]));
        let view = peer.send(GetView).await.unwrap();
        assert_eq!(view.phase, "active");
    }
}
