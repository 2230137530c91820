use chess::{Board, Color, Piece, Rank, Square, ALL_SQUARES};

/// Convert a chess color to its lowercase name
pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// Capitalised color name, used in outcome descriptions
pub fn color_title(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Parse "white"/"black" (case-insensitive)
pub fn color_from_name(name: &str) -> Option<Color> {
    match name.to_ascii_lowercase().as_str() {
        "white" | "w" => Some(Color::White),
        "black" | "b" => Some(Color::Black),
        _ => None,
    }
}

/// Lowercase letter used by compact move notation
pub fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}

/// Promotion piece from its letter; kings and pawns are never valid
pub fn promotion_from_letter(letter: char) -> Option<Piece> {
    match letter.to_ascii_lowercase() {
        'q' => Some(Piece::Queen),
        'r' => Some(Piece::Rook),
        'b' => Some(Piece::Bishop),
        'n' => Some(Piece::Knight),
        _ => None,
    }
}

pub fn is_promotion_piece(piece: Piece) -> bool {
    matches!(
        piece,
        Piece::Queen | Piece::Rook | Piece::Bishop | Piece::Knight
    )
}

/// Conventional material value of a piece
pub fn piece_value(piece: Piece) -> u32 {
    match piece {
        Piece::Pawn => 1,
        Piece::Knight | Piece::Bishop => 3,
        Piece::Rook => 5,
        Piece::Queen => 9,
        Piece::King => 0,
    }
}

/// The rank a pawn of this color promotes on
pub fn last_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

fn is_light_square(square: Square) -> bool {
    (square.get_rank().to_index() + square.get_file().to_index()) % 2 == 1
}

#[derive(Default)]
struct SideMaterial {
    pawns: u8,
    knights: u8,
    bishops: u8,
    rooks: u8,
    queens: u8,
    light_bishop: bool,
    dark_bishop: bool,
}

impl SideMaterial {
    fn bare_king(&self) -> bool {
        self.pawns + self.knights + self.bishops + self.rooks + self.queens == 0
    }

    fn single_minor(&self) -> bool {
        self.pawns == 0
            && self.rooks == 0
            && self.queens == 0
            && self.knights + self.bishops == 1
    }

    fn single_bishop(&self) -> bool {
        self.single_minor() && self.bishops == 1
    }
}

/// Check if the board has insufficient material for checkmate
pub fn has_insufficient_material(board: &Board) -> bool {
    let mut white = SideMaterial::default();
    let mut black = SideMaterial::default();

    for square in ALL_SQUARES {
        let (Some(piece), Some(color)) = (board.piece_on(square), board.color_on(square)) else {
            continue;
        };
        let side = match color {
            Color::White => &mut white,
            Color::Black => &mut black,
        };
        match piece {
            Piece::Pawn => side.pawns += 1,
            Piece::Knight => side.knights += 1,
            Piece::Bishop => {
                side.bishops += 1;
                if is_light_square(square) {
                    side.light_bishop = true;
                } else {
                    side.dark_bishop = true;
                }
            }
            Piece::Rook => side.rooks += 1,
            Piece::Queen => side.queens += 1,
            Piece::King => {}
        }
    }

    // King vs king, or a lone minor piece against a bare king
    if (white.bare_king() && (black.bare_king() || black.single_minor()))
        || (black.bare_king() && white.single_minor())
    {
        return true;
    }

    // Opposing bishops confined to the same square color
    white.single_bishop()
        && black.single_bishop()
        && ((white.light_bishop && black.light_bishop) || (white.dark_bishop && black.dark_bishop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).expect("valid fen")
    }

    #[test]
    fn bare_kings_are_insufficient() {
        assert!(has_insufficient_material(&board("8/8/4k3/8/8/3K4/8/8 w - - 0 1")));
    }

    #[test]
    fn king_and_knight_is_insufficient() {
        assert!(has_insufficient_material(&board("8/8/4k3/8/8/3K4/6N1/8 w - - 0 1")));
    }

    #[test]
    fn king_and_rook_is_sufficient() {
        assert!(!has_insufficient_material(&board("8/8/4k3/8/8/3K4/6R1/8 w - - 0 1")));
    }

    #[test]
    fn same_colored_bishops_are_insufficient() {
        // c1 and f8 are both dark squares
        assert!(has_insufficient_material(&board("5b2/8/4k3/8/8/3K4/8/2B5 w - - 0 1")));
        // c1 dark, c8 light
        assert!(!has_insufficient_material(&board("2b5/8/4k3/8/8/3K4/8/2B5 w - - 0 1")));
    }

    #[test]
    fn starting_position_is_sufficient() {
        assert!(!has_insufficient_material(&Board::default()));
    }

    #[test]
    fn promotion_letters() {
        assert_eq!(promotion_from_letter('Q'), Some(Piece::Queen));
        assert_eq!(promotion_from_letter('n'), Some(Piece::Knight));
        assert_eq!(promotion_from_letter('k'), None);
        assert_eq!(color_from_name("Black"), Some(Color::Black));
    }
}
