use std::fmt;
use std::str::FromStr;

use chess::{ChessMove, Color, Piece, Square};

use crate::error::SessionError;
use crate::game::utils::{piece_letter, piece_value, promotion_from_letter};

/// A candidate move: origin, destination and an optional promotion piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub origin: Square,
    pub destination: Square,
    pub promotion: Option<Piece>,
}

impl Move {
    pub fn new(origin: Square, destination: Square) -> Self {
        Move {
            origin,
            destination,
            promotion: None,
        }
    }

    pub fn with_promotion(self, piece: Piece) -> Self {
        Move {
            promotion: Some(piece),
            ..self
        }
    }
}

impl From<Move> for ChessMove {
    fn from(mv: Move) -> Self {
        ChessMove::new(mv.origin, mv.destination, mv.promotion)
    }
}

impl From<ChessMove> for Move {
    fn from(mv: ChessMove) -> Self {
        Move {
            origin: mv.get_source(),
            destination: mv.get_dest(),
            promotion: mv.get_promotion(),
        }
    }
}

/// Compact notation: origin, destination, optional promotion letter (`e7e8q`).
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin, self.destination)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece_letter(piece))?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(SessionError::illegal(s, "not in compact notation"));
        }
        let origin = Square::from_str(&text[0..2])
            .map_err(|_| SessionError::illegal(s, "bad origin square"))?;
        let destination = Square::from_str(&text[2..4])
            .map_err(|_| SessionError::illegal(s, "bad destination square"))?;
        let promotion = match text[4..].chars().next() {
            Some(letter) => Some(
                promotion_from_letter(letter)
                    .ok_or_else(|| SessionError::illegal(s, "bad promotion piece"))?,
            ),
            None => None,
        };
        Ok(Move {
            origin,
            destination,
            promotion,
        })
    }
}

/// What the rules engine reports after applying a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    pub piece: Piece,
    pub captured: Option<Piece>,
}

/// One committed move in the append-only history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub ply: usize,
    pub mv: Move,
    pub mover: Color,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub fen_after: String,
    pub digest: u64,
}

/// Pieces each side has taken from the other so far.
pub fn captured_by(history: &[MoveRecord], color: Color) -> Vec<Piece> {
    history
        .iter()
        .filter(|record| record.mover == color)
        .filter_map(|record| record.captured)
        .collect()
}

/// Material won by `color` minus material won by its opponent.
pub fn material_balance(history: &[MoveRecord], color: Color) -> i32 {
    let won = |c: Color| -> i32 {
        captured_by(history, c)
            .into_iter()
            .map(|p| piece_value(p) as i32)
            .sum()
    };
    won(color) - won(!color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compact_notation() {
        let mv: Move = "e2e4".parse().unwrap();
        assert_eq!(mv.origin, Square::E2);
        assert_eq!(mv.destination, Square::E4);
        assert_eq!(mv.promotion, None);

        let promo: Move = "a7a8N".parse().unwrap();
        assert_eq!(promo.promotion, Some(Piece::Knight));
        assert_eq!(promo.to_string(), "a7a8n");
    }

    #[test]
    fn rejects_malformed_notation() {
        assert!("e2".parse::<Move>().is_err());
        assert!("e2e9".parse::<Move>().is_err());
        assert!("e7e8k".parse::<Move>().is_err());
        assert!("(none)".parse::<Move>().is_err());
    }

    #[test]
    fn material_balance_counts_both_sides() {
        let record = |ply, mover, captured| MoveRecord {
            ply,
            mv: Move::new(Square::A1, Square::A2),
            mover,
            piece: Piece::Rook,
            captured,
            fen_after: String::new(),
            digest: 0,
        };
        let history = vec![
            record(1, Color::White, Some(Piece::Knight)),
            record(2, Color::Black, Some(Piece::Pawn)),
            record(3, Color::White, None),
        ];
        assert_eq!(captured_by(&history, Color::White), vec![Piece::Knight]);
        assert_eq!(material_balance(&history, Color::White), 2);
        assert_eq!(material_balance(&history, Color::Black), -2);
    }
}
