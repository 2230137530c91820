//! Adapter over the `chess` crate.
//!
//! The session never decides legality itself; everything it needs to know
//! about chess goes through [`RulesEngine`].

use std::collections::HashMap;
use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square};

use crate::error::SessionError;
use crate::game::moves::{Move, MoveResult};
use crate::game::outcome::DrawReason;
use crate::game::utils::has_insufficient_material;

/// Legality, check and draw verdicts for a single position.
pub trait RulesEngine: Clone {
    /// Replace the current position with one parsed from FEN.
    fn load_position(&mut self, fen: &str) -> Result<(), SessionError>;

    /// Apply a move if it is legal; `None` leaves the position untouched.
    fn apply_move(&mut self, mv: Move) -> Option<MoveResult>;

    /// Destinations reachable from `square` by the side to move.
    fn legal_destinations(&self, square: Square) -> Vec<Square>;

    fn side_to_move(&self) -> Color;

    fn piece_on(&self, square: Square) -> Option<(Piece, Color)>;

    fn is_check(&self) -> bool;

    fn is_checkmate(&self) -> bool;

    fn draw_reason(&self) -> Option<DrawReason>;

    fn is_draw(&self) -> bool {
        self.draw_reason().is_some()
    }

    /// Complete six-field FEN.
    fn serialize(&self) -> String;

    fn digest(&self) -> u64;
}

/// Standard chess rules backed by [`chess::Board`], with the move counters
/// and repetition table the board type does not keep itself.
#[derive(Debug, Clone)]
pub struct ChessRules {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    repetitions: HashMap<u64, u8>,
}

impl Default for ChessRules {
    fn default() -> Self {
        Self::from_board(Board::default(), 0, 1)
    }
}

impl ChessRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fen(fen: &str) -> Result<Self, SessionError> {
        let mut rules = Self::default();
        rules.load_position(fen)?;
        Ok(rules)
    }

    fn from_board(board: Board, halfmove_clock: u32, fullmove_number: u32) -> Self {
        let mut repetitions = HashMap::new();
        repetitions.insert(board.get_hash(), 1);
        ChessRules {
            board,
            halfmove_clock,
            fullmove_number,
            repetitions,
        }
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }
}

impl RulesEngine for ChessRules {
    fn load_position(&mut self, fen: &str) -> Result<(), SessionError> {
        let board = Board::from_str(fen)
            .map_err(|e| SessionError::InvalidPosition(format!("{}: {}", fen, e)))?;
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let halfmove_clock = fields.get(4).and_then(|f| f.parse().ok()).unwrap_or(0);
        let fullmove_number = fields
            .get(5)
            .and_then(|f| f.parse().ok())
            .unwrap_or(1)
            .max(1);
        *self = Self::from_board(board, halfmove_clock, fullmove_number);
        Ok(())
    }

    fn apply_move(&mut self, mv: Move) -> Option<MoveResult> {
        let chess_move = ChessMove::from(mv);
        if !MoveGen::new_legal(&self.board).any(|m| m == chess_move) {
            return None;
        }

        let mover = self.board.side_to_move();
        let piece = self.board.piece_on(mv.origin)?;
        let mut captured = match self.board.color_on(mv.destination) {
            Some(color) if color != mover => self.board.piece_on(mv.destination),
            _ => None,
        };
        // En passant: a pawn changing file onto an empty square
        if captured.is_none()
            && piece == Piece::Pawn
            && mv.origin.get_file() != mv.destination.get_file()
        {
            captured = Some(Piece::Pawn);
        }

        self.board = self.board.make_move_new(chess_move);
        if piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if mover == Color::Black {
            self.fullmove_number += 1;
        }
        *self.repetitions.entry(self.board.get_hash()).or_insert(0) += 1;

        Some(MoveResult { piece, captured })
    }

    fn legal_destinations(&self, square: Square) -> Vec<Square> {
        let mut destinations: Vec<Square> = MoveGen::new_legal(&self.board)
            .filter(|m| m.get_source() == square)
            .map(|m| m.get_dest())
            .collect();
        // Promotions yield one move per piece for the same destination
        destinations.sort();
        destinations.dedup();
        destinations
    }

    fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    fn piece_on(&self, square: Square) -> Option<(Piece, Color)> {
        Some((self.board.piece_on(square)?, self.board.color_on(square)?))
    }

    fn is_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    fn draw_reason(&self) -> Option<DrawReason> {
        if self.board.status() == BoardStatus::Stalemate {
            Some(DrawReason::Stalemate)
        } else if has_insufficient_material(&self.board) {
            Some(DrawReason::InsufficientMaterial)
        } else if self.halfmove_clock >= 100 {
            Some(DrawReason::FiftyMoveRule)
        } else if self
            .repetitions
            .get(&self.board.get_hash())
            .is_some_and(|count| *count >= 3)
        {
            Some(DrawReason::ThreefoldRepetition)
        } else {
            None
        }
    }

    fn serialize(&self) -> String {
        let board_fen = self.board.to_string();
        let placement: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            placement.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    fn digest(&self) -> u64 {
        self.board.get_hash()
    }
}
