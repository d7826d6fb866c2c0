//! Move effects: the difference between the before and after feature sets,
//! oriented to the side that moved.

use serde::{Serialize, Serializer};
use shakmaty::{Color, Position};

use crate::features::FeatureSet;
use crate::position::PositionPair;

/// Boolean facts about the move itself, read off the position pair rather
/// than the feature sets.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MoveFlags {
    pub is_capture: bool,
    pub is_check: bool,
    pub is_promotion: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub is_insufficient_material: bool,
}

impl MoveFlags {
    pub fn of(pair: &PositionPair) -> Self {
        Self {
            is_capture: pair.mv.is_capture(),
            is_check: pair.after.is_check(),
            is_promotion: pair.mv.is_promotion(),
            is_checkmate: pair.after.is_checkmate(),
            is_stalemate: pair.after.is_stalemate(),
            is_insufficient_material: pair.after.is_insufficient_material(),
        }
    }
}

/// Castling rights that disappeared with this move, per side and wing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CastlingLost {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingLost {
    pub fn any_for(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside || self.white_queenside,
            Color::Black => self.black_kingside || self.black_queenside,
        }
    }
}

fn ser_color<S: Serializer>(color: &Color, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(match color {
        Color::White => "white",
        Color::Black => "black",
    })
}

/// Everything the classifier looks at. All signed quantities are from the
/// mover's perspective: positive is good for the side that just moved.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureDelta {
    #[serde(serialize_with = "ser_color")]
    pub mover: Color,
    #[serde(flatten)]
    pub flags: MoveFlags,

    /// Material balance (mover minus opponent) before and after.
    pub material_before: i32,
    pub material_after: i32,
    pub material_delta: i32,
    /// Value newly put en prise by this move. A balance delta of zero with
    /// a hung queen is still a lost queen waiting to happen.
    pub material_at_risk: i32,

    pub mobility_mover: i32,
    pub mobility_opponent: i32,
    pub center_mover: i32,
    pub center_opponent: i32,
    pub king_safety_mover: i32,
    pub pins_on_mover: i32,
    pub pins_on_opponent: i32,

    pub new_doubled: Vec<char>,
    pub new_isolated: Vec<char>,
    pub new_passed: Vec<String>,
    pub castling_lost: CastlingLost,
}

impl FeatureDelta {
    pub fn new(mover: Color, before: &FeatureSet, after: &FeatureSet, flags: MoveFlags) -> Self {
        let opponent = !mover;
        let balance =
            |f: &FeatureSet| f.material.get(mover) - f.material.get(opponent);
        let material_before = balance(before);
        let material_after = balance(after);

        let material_at_risk =
            (after.hanging.get(mover) - before.hanging.get(mover)).max(0);

        let mover_pawns_before = before.pawns.get(mover);
        let mover_pawns_after = after.pawns.get(mover);
        let new_in = |now: &[char], prior: &[char]| {
            now.iter().copied().filter(|f| !prior.contains(f)).collect::<Vec<_>>()
        };

        let lost = |color: Color, kingside: bool| {
            let (b, a) = (before.castling.get(color), after.castling.get(color));
            if kingside {
                b.kingside && !a.kingside
            } else {
                b.queenside && !a.queenside
            }
        };

        Self {
            mover,
            flags,
            material_before,
            material_after,
            material_delta: material_after - material_before,
            material_at_risk,
            mobility_mover: *after.mobility.get(mover) as i32
                - *before.mobility.get(mover) as i32,
            mobility_opponent: *after.mobility.get(opponent) as i32
                - *before.mobility.get(opponent) as i32,
            center_mover: *after.center_control.get(mover) as i32
                - *before.center_control.get(mover) as i32,
            center_opponent: *after.center_control.get(opponent) as i32
                - *before.center_control.get(opponent) as i32,
            king_safety_mover: after.king_safety.get(mover) - before.king_safety.get(mover),
            pins_on_mover: *after.pins.get(mover) as i32 - *before.pins.get(mover) as i32,
            pins_on_opponent: *after.pins.get(opponent) as i32
                - *before.pins.get(opponent) as i32,
            new_doubled: new_in(&mover_pawns_after.doubled, &mover_pawns_before.doubled),
            new_isolated: new_in(&mover_pawns_after.isolated, &mover_pawns_before.isolated),
            new_passed: mover_pawns_after
                .passed
                .iter()
                .filter(|sq| !mover_pawns_before.passed.contains(sq))
                .cloned()
                .collect(),
            castling_lost: CastlingLost {
                white_kingside: lost(Color::White, true),
                white_queenside: lost(Color::White, false),
                black_kingside: lost(Color::Black, true),
                black_queenside: lost(Color::Black, false),
            },
        }
    }

    /// Material outcome once newly hung pieces are assumed lost.
    pub fn net_material(&self) -> i32 {
        self.material_delta - self.material_at_risk
    }
}

/// Extract both feature sets and fold them into a delta.
pub fn delta_for(pair: &PositionPair) -> (FeatureSet, FeatureSet, FeatureDelta) {
    let before = crate::features::extract(&pair.before);
    let after = crate::features::extract(&pair.after);
    let flags = MoveFlags::of(pair);
    let delta = FeatureDelta::new(pair.mover, &before, &after, flags);
    (before, after, delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(fen: &str, mv: &str) -> FeatureDelta {
        let pair = PositionPair::new(fen, mv).unwrap();
        delta_for(&pair).2
    }

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_quiet_opening_move() {
        let d = delta(START_FEN, "e4");
        assert!(!d.flags.is_capture && !d.flags.is_check);
        assert_eq!(d.material_delta, 0);
        assert_eq!(d.material_at_risk, 0);
        assert!(d.center_mover > 0);
        assert!(d.mobility_mover > 0);
    }

    #[test]
    fn test_capture_raises_material_balance() {
        // Scandinavian: exd5 wins a pawn for the moment
        let d = delta(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
            "exd5",
        );
        assert!(d.flags.is_capture);
        assert_eq!(d.material_delta, 1);
    }

    #[test]
    fn test_hanging_queen_counts_as_at_risk() {
        // Qh5 with the black knight already on f6 and nothing guarding h5
        let d = delta(
            "rnbqkb1r/pppppppp/5n2/8/4P3/3P4/PPP2PPP/RNBQKBNR w KQkq - 0 1",
            "Qh5",
        );
        assert_eq!(d.material_delta, 0);
        assert_eq!(d.material_at_risk, 9);
        assert_eq!(d.net_material(), -9);
    }

    #[test]
    fn test_black_perspective_is_oriented() {
        // Black captures a hanging white pawn; balance improves for Black
        let d = delta(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 2",
            "dxe4",
        );
        assert_eq!(d.mover, shakmaty::Color::Black);
        assert_eq!(d.material_delta, 1);
    }

    #[test]
    fn test_king_move_loses_both_castling_rights() {
        let d = delta(
            "rnbqkbnr/pppppppp/8/8/8/4P3/PPPP1PPP/RNBQKBNR w KQkq - 0 1",
            "Ke2",
        );
        assert!(d.castling_lost.white_kingside);
        assert!(d.castling_lost.white_queenside);
        assert!(!d.castling_lost.black_kingside);
        assert!(d.castling_lost.any_for(shakmaty::Color::White));
    }

    #[test]
    fn test_rook_move_loses_one_wing() {
        let d = delta(
            "rnbqkbnr/pppppppp/8/8/8/7P/PPPPPPP1/RNBQKBNR w KQkq - 0 1",
            "Rh2",
        );
        assert!(d.castling_lost.white_kingside);
        assert!(!d.castling_lost.white_queenside);
    }

    #[test]
    fn test_checkmate_flags() {
        // Fool's mate
        let d = delta(
            "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2",
            "Qh4#",
        );
        assert!(d.flags.is_check);
        assert!(d.flags.is_checkmate);
        assert!(!d.flags.is_stalemate);
    }

    #[test]
    fn test_stalemate_flags() {
        let d = delta("k7/8/8/8/8/8/2Q5/K7 w - - 0 1", "Qc7");
        assert!(d.flags.is_stalemate);
        assert!(!d.flags.is_check);
    }

    #[test]
    fn test_new_doubled_pawns_reported() {
        // bxc3 doubles white's c-pawns
        let d = delta(
            "rnbqkbnr/pppp1ppp/8/8/8/2n5/PPPPPPPP/R1BQKBNR w KQkq - 0 3",
            "bxc3",
        );
        assert_eq!(d.new_doubled, vec!['c']);
    }
}
