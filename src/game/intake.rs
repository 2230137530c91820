//! Candidate move checks, run before anything is committed.

use chess::Piece;

use crate::error::SessionError;
use crate::game::moves::{Move, MoveRecord};
use crate::game::promotion::{is_promotion_move, PendingPromotion};
use crate::game::rules::RulesEngine;
use crate::game::utils::is_promotion_piece;

/// Where a candidate move came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    /// Interactive input; an unspecified promotion suspends for a choice.
    Human,
    /// Non-interactive input; an unspecified promotion becomes a queen.
    Engine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intake {
    Ready(Move),
    NeedsPromotion(PendingPromotion),
}

/// Check a candidate against the current position without touching it.
pub fn check_candidate<R: RulesEngine>(
    rules: &R,
    mv: Move,
    source: MoveSource,
) -> Result<Intake, SessionError> {
    let side = rules.side_to_move();
    match rules.piece_on(mv.origin) {
        None => return Err(SessionError::illegal(mv, "no piece on the origin square")),
        Some((_, color)) if color != side => {
            return Err(SessionError::illegal(mv, "that piece does not belong to the side to move"))
        }
        Some(_) => {}
    }

    if !rules.legal_destinations(mv.origin).contains(&mv.destination) {
        return Err(SessionError::illegal(mv, "destination is not a legal target"));
    }

    if !is_promotion_move(rules, mv.origin, mv.destination) {
        return match mv.promotion {
            Some(_) => Err(SessionError::illegal(mv, "only a pawn on its last rank can promote")),
            None => Ok(Intake::Ready(mv)),
        };
    }

    match (mv.promotion, source) {
        (Some(piece), _) if !is_promotion_piece(piece) => Err(SessionError::illegal(
            mv,
            "pawns promote to queen, rook, bishop or knight",
        )),
        (Some(_), _) => Ok(Intake::Ready(mv)),
        (None, MoveSource::Engine) => Ok(Intake::Ready(mv.with_promotion(Piece::Queen))),
        (None, MoveSource::Human) => Ok(Intake::NeedsPromotion(PendingPromotion {
            origin: mv.origin,
            destination: mv.destination,
            color: side,
        })),
    }
}

/// Apply a checked move and build its history entry.
pub fn commit<R: RulesEngine>(rules: &mut R, mv: Move, ply: usize) -> Result<MoveRecord, SessionError> {
    let mover = rules.side_to_move();
    let result = rules
        .apply_move(mv)
        .ok_or_else(|| SessionError::illegal(mv, "rejected by the rules engine"))?;
    Ok(MoveRecord {
        ply,
        mv,
        mover,
        piece: result.piece,
        captured: result.captured,
        fen_after: rules.serialize(),
        digest: rules.digest(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules::ChessRules;
    use chess::{Color, Square};

    fn candidate(rules: &ChessRules, text: &str, source: MoveSource) -> Result<Intake, SessionError> {
        check_candidate(rules, text.parse().unwrap(), source)
    }

    #[test]
    fn accepts_ordinary_move() {
        let rules = ChessRules::new();
        assert_eq!(
            candidate(&rules, "g1f3", MoveSource::Human).unwrap(),
            Intake::Ready(Move::new(Square::G1, Square::F3))
        );
    }

    #[test]
    fn rejects_empty_origin_and_wrong_side() {
        let rules = ChessRules::new();
        assert!(candidate(&rules, "e4e5", MoveSource::Human).is_err());
        assert!(candidate(&rules, "e7e5", MoveSource::Human).is_err());
        assert!(candidate(&rules, "e2e5", MoveSource::Human).is_err());
    }

    #[test]
    fn rejects_promotion_piece_on_ordinary_move() {
        let rules = ChessRules::new();
        assert!(candidate(&rules, "e2e4q", MoveSource::Human).is_err());
    }

    #[test]
    fn human_promotion_without_piece_suspends() {
        let rules = ChessRules::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(
            candidate(&rules, "a7a8", MoveSource::Human).unwrap(),
            Intake::NeedsPromotion(PendingPromotion {
                origin: Square::A7,
                destination: Square::A8,
                color: Color::White,
            })
        );
    }

    #[test]
    fn engine_promotion_defaults_to_queen() {
        let rules = ChessRules::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let Intake::Ready(mv) = candidate(&rules, "a7a8", MoveSource::Engine).unwrap() else {
            panic!("engine promotion should be ready");
        };
        assert_eq!(mv.promotion, Some(Piece::Queen));
    }

    #[test]
    fn commit_records_capture() {
        let mut rules = ChessRules::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let record = commit(&mut rules, "e4d5".parse().unwrap(), 1).unwrap();
        assert_eq!(record.mover, Color::White);
        assert_eq!(record.piece, Piece::Pawn);
        assert_eq!(record.captured, Some(Piece::Pawn));
        assert_eq!(record.fen_after, rules.serialize());
    }

    #[test]
    fn failed_commit_leaves_position() {
        let mut rules = ChessRules::new();
        let before = rules.serialize();
        assert!(commit(&mut rules, "a7a8q".parse().unwrap(), 1).is_err());
        assert_eq!(rules.serialize(), before);
    }
}
