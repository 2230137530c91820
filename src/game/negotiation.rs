use chess::Color;

use crate::game::outcome::{DrawReason, Outcome};

/// Outstanding draw offer, if any. Offers never expire on their own; they
/// are cleared by acceptance, the end of the game, or a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawOffer {
    #[default]
    None,
    Pending { by: Color },
}

impl DrawOffer {
    /// Record an offer. Returns false when one is already pending, in which
    /// case nothing changes.
    pub fn offer(&mut self, by: Color) -> bool {
        if self.is_pending() {
            return false;
        }
        *self = DrawOffer::Pending { by };
        true
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, DrawOffer::Pending { .. })
    }

    pub fn offered_by(&self) -> Option<Color> {
        match *self {
            DrawOffer::Pending { by } => Some(by),
            DrawOffer::None => None,
        }
    }

    /// Whether `acceptor` has an offer from the other side to accept.
    pub fn is_open_for(&self, acceptor: Color) -> bool {
        matches!(*self, DrawOffer::Pending { by } if by != acceptor)
    }

    pub fn clear(&mut self) {
        *self = DrawOffer::None;
    }
}

pub fn resignation(loser: Color) -> Outcome {
    Outcome::Resignation { winner: !loser }
}

pub fn agreed_draw() -> Outcome {
    Outcome::Draw {
        reason: DrawReason::Agreement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_offers_are_idempotent() {
        let mut offer = DrawOffer::default();
        assert!(offer.offer(Color::White));
        assert!(!offer.offer(Color::White));
        assert!(!offer.offer(Color::Black));
        assert_eq!(offer.offered_by(), Some(Color::White));
    }

    #[test]
    fn only_the_other_side_may_accept() {
        let mut offer = DrawOffer::default();
        assert!(!offer.is_open_for(Color::Black));
        offer.offer(Color::White);
        assert!(offer.is_open_for(Color::Black));
        assert!(!offer.is_open_for(Color::White));
        offer.clear();
        assert!(!offer.is_pending());
    }

    #[test]
    fn resignation_credits_the_other_side() {
        assert_eq!(resignation(Color::White).winner(), Some(Color::Black));
        assert_eq!(agreed_draw().winner(), None);
    }
}
