//! The per-peer game session state machine.
//!
//! A [`GameSession`] exclusively owns the position, the clocks, the move
//! history and the negotiation state. Every input (local action, relay
//! message, clock tick, engine reply) runs to completion before the next one
//! is processed; none of them mutates anything when it is rejected.

use std::fmt;

use chess::{Color, Piece, Square};
use log::{debug, info, warn};
use serde::Serialize;

use crate::engine::bridge::{EngineBridge, SuggestionReply, SuggestionRequest, SuggestionTicket};
use crate::error::SessionError;
use crate::game::clock::{Clock, Tick};
use crate::game::config::{Opponent, SessionConfig, TrustPolicy};
use crate::game::intake::{self, Intake, MoveSource};
use crate::game::moves::{captured_by, material_balance, Move, MoveRecord};
use crate::game::negotiation::{self, DrawOffer};
use crate::game::outcome::Outcome;
use crate::game::promotion::PendingPromotion;
use crate::game::rules::{ChessRules, RulesEngine};
use crate::game::utils::{color_name, piece_letter};
use crate::models::RelayMessage;
use crate::peer::link::PeerLink;

/// Top-level state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    AwaitingPromotionChoice(PendingPromotion),
    Over(Outcome),
}

impl Phase {
    /// Active or suspended on a promotion choice: the game is still going.
    fn in_play(&self) -> bool {
        matches!(self, Phase::Active | Phase::AwaitingPromotionChoice(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Active => "active",
            Phase::AwaitingPromotionChoice(_) => "awaiting_promotion_choice",
            Phase::Over(_) => "over",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of submitting a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Committed(MoveRecord),
    AwaitingPromotion(PendingPromotion),
}

/// Non-fatal conditions surfaced to whoever drives the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    EngineUnavailable(String),
    RelayDeliveryFailure(String),
    RemoteIgnored(String),
}

/// Serializable summary of a session for display or inspection.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionView {
    pub phase: &'static str,
    pub outcome: Option<String>,
    pub fen: String,
    pub orientation: &'static str,
    pub side_to_move: &'static str,
    pub in_check: bool,
    pub white_secs: u64,
    pub black_secs: u64,
    pub clock_running: Option<&'static str>,
    pub moves: Vec<String>,
    pub captured_by_white: Vec<char>,
    pub captured_by_black: Vec<char>,
    /// Material captured by the local side minus material it lost.
    pub material_balance: i32,
    pub pending_promotion: Option<String>,
    pub draw_offered_by: Option<&'static str>,
}

pub struct GameSession<R: RulesEngine = ChessRules> {
    config: SessionConfig,
    initial: R,
    rules: R,
    phase: Phase,
    history: Vec<MoveRecord>,
    clock: Clock,
    draw_offer: DrawOffer,
    epoch: u64,
    link: Box<dyn PeerLink>,
    engine: Option<Box<dyn EngineBridge>>,
    notices: Vec<SessionNotice>,
}

impl GameSession<ChessRules> {
    pub fn new(config: SessionConfig, link: Box<dyn PeerLink>) -> Self {
        Self::with_rules(config, ChessRules::new(), link)
    }
}

impl<R: RulesEngine> GameSession<R> {
    /// `rules` holds the starting arrangement every session and reset
    /// returns to.
    pub fn with_rules(config: SessionConfig, rules: R, link: Box<dyn PeerLink>) -> Self {
        GameSession {
            clock: Clock::new(config.time_control_secs),
            config,
            initial: rules.clone(),
            rules,
            phase: Phase::Idle,
            history: Vec::new(),
            draw_offer: DrawOffer::None,
            epoch: 0,
            link,
            engine: None,
            notices: Vec::new(),
        }
    }

    pub fn with_engine(mut self, engine: Box<dyn EngineBridge>) -> Self {
        self.attach_engine(engine);
        self
    }

    /// Install or replace the engine bridge on a live session.
    pub fn attach_engine(&mut self, engine: Box<dyn EngineBridge>) {
        self.engine = Some(engine);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Over(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        match self.phase {
            Phase::AwaitingPromotionChoice(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn draw_offer(&self) -> DrawOffer {
        self.draw_offer
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn position(&self) -> String {
        self.rules.serialize()
    }

    pub fn side_to_move(&self) -> Color {
        self.rules.side_to_move()
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Legal targets for the piece on `square`, for move hints.
    pub fn legal_destinations(&self, square: Square) -> Vec<Square> {
        self.rules.legal_destinations(square)
    }

    pub fn captured_by(&self, color: Color) -> Vec<Piece> {
        captured_by(&self.history, color)
    }

    pub fn take_notices(&mut self) -> Vec<SessionNotice> {
        std::mem::take(&mut self.notices)
    }

    /// The color acting for this peer right now.
    fn local_color(&self) -> Color {
        match self.config.opponent {
            Opponent::Hotseat => self.rules.side_to_move(),
            Opponent::Remote | Opponent::Engine(_) => self.config.orientation,
        }
    }

    fn current_ticket(&self) -> SuggestionTicket {
        SuggestionTicket {
            epoch: self.epoch,
            ply: self.history.len(),
        }
    }

    fn require_active(&self, action: &'static str) -> Result<(), SessionError> {
        match self.phase {
            Phase::Active => Ok(()),
            phase => Err(SessionError::InvalidPhaseAction { action, phase }),
        }
    }

    /// Idle -> Active with a fresh position and full clocks.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Idle {
            return Err(SessionError::InvalidPhaseAction {
                action: "start a session",
                phase: self.phase,
            });
        }
        self.clear_game();
        self.phase = Phase::Active;
        self.clock.start(self.rules.side_to_move());
        info!(
            "Session started as {} against {:?}",
            color_name(self.config.orientation),
            self.config.opponent
        );

        let fen = self.rules.serialize();
        self.broadcast(RelayMessage::Init { fen });
        self.request_engine_move();
        Ok(())
    }

    /// Any phase -> Idle, notifying the peer.
    pub fn reset(&mut self) {
        self.reset_local();
        self.broadcast(RelayMessage::Reset);
    }

    fn reset_local(&mut self) {
        self.clear_game();
        self.phase = Phase::Idle;
        info!("Session reset");
    }

    fn clear_game(&mut self) {
        self.rules = self.initial.clone();
        self.history.clear();
        self.clock.reset();
        self.draw_offer.clear();
        // Outstanding engine suggestions belong to the previous epoch
        self.epoch += 1;
    }

    /// Submit a move from the local player.
    pub fn submit_move(
        &mut self,
        origin: Square,
        destination: Square,
        promotion: Option<Piece>,
    ) -> Result<MoveOutcome, SessionError> {
        let mv = Move {
            origin,
            destination,
            promotion,
        };
        self.submit(mv, MoveSource::Human)
    }

    fn submit(&mut self, mv: Move, source: MoveSource) -> Result<MoveOutcome, SessionError> {
        self.require_active("move")?;
        let intake = intake::check_candidate(&self.rules, mv, source)?;

        let mover = self.rules.side_to_move();
        let allowed = match source {
            MoveSource::Human => self.config.local_controls(mover),
            MoveSource::Engine => self.config.engine_color() == Some(mover),
        };
        if !allowed {
            return Err(SessionError::illegal(mv, "it is not your turn"));
        }

        match intake {
            Intake::Ready(mv) => self.commit(mv).map(MoveOutcome::Committed),
            Intake::NeedsPromotion(pending) => {
                debug!("Awaiting promotion choice for {}{}", pending.origin, pending.destination);
                self.phase = Phase::AwaitingPromotionChoice(pending);
                self.clock.stop();
                Ok(MoveOutcome::AwaitingPromotion(pending))
            }
        }
    }

    /// Complete a suspended promotion with the chosen piece.
    pub fn choose_promotion(&mut self, piece: Piece) -> Result<MoveRecord, SessionError> {
        let Phase::AwaitingPromotionChoice(pending) = self.phase else {
            return Err(SessionError::InvalidPhaseAction {
                action: "choose a promotion piece",
                phase: self.phase,
            });
        };
        let mv = pending.with_choice(piece)?;
        self.commit(mv)
    }

    /// Abandon a suspended promotion; the position was never touched.
    pub fn cancel_promotion(&mut self) -> Result<(), SessionError> {
        if !matches!(self.phase, Phase::AwaitingPromotionChoice(_)) {
            return Err(SessionError::InvalidPhaseAction {
                action: "cancel a promotion",
                phase: self.phase,
            });
        }
        self.phase = Phase::Active;
        self.clock.start(self.rules.side_to_move());
        Ok(())
    }

    fn commit(&mut self, mv: Move) -> Result<MoveRecord, SessionError> {
        let record = intake::commit(&mut self.rules, mv, self.history.len() + 1)?;
        info!("{} played {}", color_name(record.mover), record.mv);
        self.broadcast(RelayMessage::Move {
            fen: record.fen_after.clone(),
            uci: Some(record.mv.to_string()),
        });
        self.settle(record.mover, Some(record.clone()));
        Ok(record)
    }

    /// Bookkeeping shared by local and remote moves once the position has
    /// changed.
    fn settle(&mut self, mover: Color, record: Option<MoveRecord>) {
        if let Some(record) = record {
            self.history.push(record);
        }
        self.phase = Phase::Active;
        self.clock.switch_after_move(mover);

        if self.rules.is_checkmate() {
            self.finish(Outcome::Checkmate { winner: mover });
        } else if let Some(reason) = self.rules.draw_reason() {
            self.finish(Outcome::Draw { reason });
        } else {
            self.request_engine_move();
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.phase = Phase::Over(outcome);
        self.clock.stop();
        self.draw_offer.clear();
        info!("Game over: {}", outcome);
    }

    /// Advance the running clock by one second.
    pub fn tick(&mut self) -> Option<Outcome> {
        if self.phase != Phase::Active {
            return None;
        }
        match self.clock.tick() {
            Tick::Flagged(color) => {
                let outcome = Outcome::Timeout { winner: !color };
                self.finish(outcome);
                Some(outcome)
            }
            Tick::Running(_) | Tick::Idle => None,
        }
    }

    /// Resign for the local side. Unilateral and final.
    pub fn resign(&mut self) -> Result<Outcome, SessionError> {
        self.require_active("resign")?;
        let outcome = negotiation::resignation(self.local_color());
        self.finish(outcome);
        self.broadcast(RelayMessage::Resign);
        Ok(outcome)
    }

    /// Offer a draw. Returns false when an offer is already pending.
    pub fn offer_draw(&mut self) -> Result<bool, SessionError> {
        self.require_active("offer a draw")?;
        let by = self.local_color();
        if !self.draw_offer.offer(by) {
            debug!("Draw offer already pending; ignoring");
            return Ok(false);
        }
        info!("{} offers a draw", color_name(by));
        self.broadcast(RelayMessage::DrawOffer);
        Ok(true)
    }

    /// Accept the opponent's outstanding draw offer.
    pub fn accept_draw(&mut self) -> Result<Outcome, SessionError> {
        self.require_active("accept a draw")?;
        if !self.draw_offer.is_open_for(self.local_color()) {
            return Err(SessionError::NoPendingOffer);
        }
        let outcome = negotiation::agreed_draw();
        self.finish(outcome);
        self.broadcast(RelayMessage::DrawAccept);
        Ok(outcome)
    }

    /// Apply a message that arrived from the other peer. A rejected message
    /// changes nothing and is also queued as a notice.
    pub fn handle_remote(&mut self, message: RelayMessage) -> Result<(), SessionError> {
        let kind = message.kind();
        debug!("Remote {} received in phase {}", kind, self.phase);
        let result = self.apply_remote(message);
        if let Err(e) = &result {
            self.notices
                .push(SessionNotice::RemoteIgnored(format!("{}: {}", kind, e)));
        }
        result
    }

    fn apply_remote(&mut self, message: RelayMessage) -> Result<(), SessionError> {
        match message {
            RelayMessage::Init { fen } => self.apply_init(&fen),
            RelayMessage::Move { fen, uci } => self.apply_remote_move(&fen, uci.as_deref()),
            RelayMessage::Reset => {
                self.reset_local();
                Ok(())
            }
            RelayMessage::Resign => {
                self.require_in_play("accept a remote resignation")?;
                self.finish(negotiation::resignation(!self.config.orientation));
                Ok(())
            }
            RelayMessage::DrawOffer => {
                self.require_in_play("receive a draw offer")?;
                // Offers that cross in flight each stay with their sender: both
                // peers then hold their own offer and neither can accept.
                if !self.draw_offer.offer(!self.config.orientation) {
                    debug!("Remote draw offer while one is pending; ignoring");
                }
                Ok(())
            }
            RelayMessage::DrawAccept => {
                self.require_in_play("receive a draw acceptance")?;
                if self.draw_offer.offered_by() != Some(self.config.orientation) {
                    return Err(SessionError::NoPendingOffer);
                }
                self.finish(negotiation::agreed_draw());
                Ok(())
            }
        }
    }

    fn require_in_play(&self, action: &'static str) -> Result<(), SessionError> {
        if self.phase.in_play() {
            Ok(())
        } else {
            Err(SessionError::InvalidPhaseAction {
                action,
                phase: self.phase,
            })
        }
    }

    fn apply_init(&mut self, fen: &str) -> Result<(), SessionError> {
        let mut rules = self.initial.clone();
        rules.load_position(fen)?;

        let resync = self.phase.in_play();
        self.rules = rules;
        self.history.clear();
        self.draw_offer.clear();
        self.epoch += 1;
        if !resync {
            self.clock.reset();
        }
        self.phase = Phase::Active;
        self.clock.start(self.rules.side_to_move());
        info!("Session synchronised from peer snapshot (resync: {})", resync);

        if self.rules.is_checkmate() {
            self.finish(Outcome::Checkmate {
                winner: !self.rules.side_to_move(),
            });
        } else if let Some(reason) = self.rules.draw_reason() {
            self.finish(Outcome::Draw { reason });
        }
        Ok(())
    }

    fn apply_remote_move(&mut self, fen: &str, uci: Option<&str>) -> Result<(), SessionError> {
        self.require_in_play("apply a remote move")?;
        let mover = self.rules.side_to_move();
        let (rules, record) = match self.config.trust {
            TrustPolicy::Trusting => self.trust_snapshot(fen, uci)?,
            TrustPolicy::Verifying => self.verify_snapshot(fen, uci)?,
        };
        self.rules = rules;
        self.settle(mover, record);
        Ok(())
    }

    /// Adopt the sender's FEN. When the move descriptor replays to the same
    /// placement the replayed position is kept so repetition tracking and
    /// history survive.
    fn trust_snapshot(&self, fen: &str, uci: Option<&str>) -> Result<(R, Option<MoveRecord>), SessionError> {
        if let Some(mv) = uci.and_then(|text| text.parse::<Move>().ok()) {
            let mut replay = self.rules.clone();
            if let Ok(record) = intake::commit(&mut replay, mv, self.history.len() + 1) {
                if same_placement(&record.fen_after, fen) {
                    return Ok((replay, Some(record)));
                }
            }
            warn!("Remote move {} does not reproduce the snapshot; trusting the snapshot", mv);
        }
        let mut loaded = self.initial.clone();
        loaded.load_position(fen)?;
        Ok((loaded, None))
    }

    /// Recompute the position from the move descriptor and accept the update
    /// only if it matches the sender's snapshot.
    fn verify_snapshot(&self, fen: &str, uci: Option<&str>) -> Result<(R, Option<MoveRecord>), SessionError> {
        let text = uci.ok_or_else(|| SessionError::RemoteRejected("move descriptor missing".into()))?;
        let mv: Move = text
            .parse()
            .map_err(|e: SessionError| SessionError::RemoteRejected(e.to_string()))?;
        let mover = self.rules.side_to_move();
        if self.config.local_controls(mover) {
            return Err(SessionError::RemoteRejected(format!(
                "{} moved out of turn",
                mv
            )));
        }
        let mut replay = self.rules.clone();
        let record = intake::commit(&mut replay, mv, self.history.len() + 1)
            .map_err(|e| SessionError::RemoteRejected(e.to_string()))?;
        if !same_placement(&record.fen_after, fen) {
            return Err(SessionError::RemoteRejected(format!(
                "snapshot does not match {}",
                mv
            )));
        }
        Ok((replay, Some(record)))
    }

    fn request_engine_move(&mut self) {
        let Opponent::Engine(settings) = self.config.opponent else {
            return;
        };
        if self.phase != Phase::Active || self.config.engine_color() != Some(self.rules.side_to_move()) {
            return;
        }
        let request = SuggestionRequest {
            ticket: self.current_ticket(),
            fen: self.rules.serialize(),
            settings,
        };
        let result = match self.engine.as_mut() {
            Some(engine) => engine.request(request).map_err(|e| e.to_string()),
            None => Err("no engine bridge configured".to_string()),
        };
        if let Err(reason) = result {
            warn!("Engine unavailable: {}", reason);
            self.notices.push(SessionNotice::EngineUnavailable(reason));
        }
    }

    /// Feed an engine suggestion back in. Stale or empty suggestions are
    /// discarded without effect.
    pub fn receive_suggestion(&mut self, reply: SuggestionReply) -> Result<Option<MoveRecord>, SessionError> {
        if reply.ticket != self.current_ticket() || self.phase != Phase::Active {
            debug!("Discarding stale engine suggestion {:?}", reply.ticket);
            return Ok(None);
        }
        match reply.result {
            Err(e) => {
                warn!("Engine failed to suggest a move: {}", e);
                self.notices.push(SessionNotice::EngineUnavailable(e.to_string()));
                Ok(None)
            }
            Ok(None) => {
                info!("Engine reports no move");
                Ok(None)
            }
            Ok(Some(mv)) => match self.submit(mv, MoveSource::Engine)? {
                MoveOutcome::Committed(record) => Ok(Some(record)),
                MoveOutcome::AwaitingPromotion(_) => Ok(None),
            },
        }
    }

    fn broadcast(&mut self, message: RelayMessage) {
        if self.config.opponent != Opponent::Remote {
            return;
        }
        if let Err(e) = self.link.send(&message) {
            warn!("Failed to relay {}: {}", message.kind(), e);
            self.notices
                .push(SessionNotice::RelayDeliveryFailure(e.to_string()));
        }
    }

    pub fn view(&self) -> SessionView {
        let letters = |color: Color| -> Vec<char> {
            self.captured_by(color).into_iter().map(piece_letter).collect()
        };
        SessionView {
            phase: self.phase.name(),
            outcome: self
                .outcome()
                .map(|outcome| outcome.describe_for(self.config.orientation)),
            fen: self.rules.serialize(),
            orientation: color_name(self.config.orientation),
            side_to_move: color_name(self.rules.side_to_move()),
            in_check: self.rules.is_check(),
            white_secs: self.clock.remaining(Color::White),
            black_secs: self.clock.remaining(Color::Black),
            clock_running: self.clock.running().map(color_name),
            moves: self.history.iter().map(|r| r.mv.to_string()).collect(),
            captured_by_white: letters(Color::White),
            captured_by_black: letters(Color::Black),
            material_balance: material_balance(&self.history, self.config.orientation),
            pending_promotion: self
                .pending_promotion()
                .map(|p| format!("{}{}", p.origin, p.destination)),
            draw_offered_by: self.draw_offer.offered_by().map(color_name),
        }
    }
}

/// Compare piece placement, side to move, castling and en passant, ignoring
/// the move counters.
fn same_placement(a: &str, b: &str) -> bool {
    a.split_whitespace().take(4).eq(b.split_whitespace().take(4))
}
