use std::fmt;

use chess::Color;

use crate::game::utils::color_title;

/// Why a game ended in a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
    Agreement,
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DrawReason::Stalemate => "stalemate",
            DrawReason::InsufficientMaterial => "insufficient material",
            DrawReason::FiftyMoveRule => "the fifty-move rule",
            DrawReason::ThreefoldRepetition => "threefold repetition",
            DrawReason::Agreement => "agreement",
        };
        f.write_str(text)
    }
}

/// Terminal result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Draw { reason: DrawReason },
    Resignation { winner: Color },
    Timeout { winner: Color },
}

impl Outcome {
    pub fn winner(&self) -> Option<Color> {
        match *self {
            Outcome::Checkmate { winner }
            | Outcome::Resignation { winner }
            | Outcome::Timeout { winner } => Some(winner),
            Outcome::Draw { .. } => None,
        }
    }

    fn method(&self) -> &'static str {
        match self {
            Outcome::Checkmate { .. } => "by checkmate",
            Outcome::Resignation { .. } => "by resignation",
            Outcome::Timeout { .. } => "on time",
            Outcome::Draw { .. } => "",
        }
    }

    /// Viewer-relative description, e.g. "You win by resignation".
    pub fn describe_for(&self, viewer: Color) -> String {
        match (self, self.winner()) {
            (Outcome::Draw { reason }, _) => format!("Draw by {}", reason),
            (Outcome::Timeout { .. }, Some(winner)) if winner == viewer => "You win, on time".into(),
            (Outcome::Timeout { .. }, Some(_)) => "Opponent wins, on time".into(),
            (_, Some(winner)) if winner == viewer => format!("You win {}", self.method()),
            (_, _) => format!("Opponent wins {}", self.method()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Draw { reason } => write!(f, "Draw by {}", reason),
            Outcome::Timeout { winner } => write!(f, "{} wins, on time", color_title(*winner)),
            Outcome::Checkmate { winner } | Outcome::Resignation { winner } => {
                write!(f, "{} wins {}", color_title(*winner), self.method())
            }
        }
    }
}
