use chess::{Color, Piece, Square};

use crate::error::SessionError;
use crate::game::moves::Move;
use crate::game::rules::RulesEngine;
use crate::game::utils::{is_promotion_piece, last_rank};

/// Pieces a pawn may become.
pub const PROMOTION_CHOICES: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

/// A pawn move to the last rank suspended until a piece is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPromotion {
    pub origin: Square,
    pub destination: Square,
    pub color: Color,
}

impl PendingPromotion {
    /// The concrete move for a chosen piece.
    pub fn with_choice(&self, piece: Piece) -> Result<Move, SessionError> {
        let mv = Move::new(self.origin, self.destination).with_promotion(piece);
        if is_promotion_piece(piece) {
            Ok(mv)
        } else {
            Err(SessionError::illegal(mv, "pawns promote to queen, rook, bishop or knight"))
        }
    }
}

/// True when the piece on `origin` is a pawn heading for its last rank.
pub fn is_promotion_move<R: RulesEngine>(rules: &R, origin: Square, destination: Square) -> bool {
    matches!(
        rules.piece_on(origin),
        Some((Piece::Pawn, color)) if destination.get_rank() == last_rank(color)
    )
}
