//! Feature extraction: positional metrics computed from a single board.
//!
//! Every metric here is a pure function of the position. Extraction never
//! fails; degenerate boards produce boundary values (zeros, empty lists).

use serde::Serialize;
use shakmaty::{attacks, Bitboard, Chess, Color, File, Position, Rank, Role, Square};

/// Conventional piece values in pawn units.
pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 1,
        Role::Knight => 3,
        Role::Bishop => 3,
        Role::Rook => 5,
        Role::Queen => 9,
        Role::King => 0,
    }
}

/// d4, e4, d5, e5.
const CENTER: Bitboard = Bitboard(0x0000_0018_1800_0000);

/// A metric measured for both sides of the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BySide<T> {
    pub white: T,
    pub black: T,
}

impl<T> BySide<T> {
    pub fn get(&self, color: Color) -> &T {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// Pawn structure defects and assets for one side. Doubled and isolated
/// pawns are reported per file, passed pawns per square.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PawnStructure {
    pub doubled: Vec<char>,
    pub isolated: Vec<char>,
    pub passed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CastlingRights {
    pub kingside: bool,
    pub queenside: bool,
}

/// The full positional fingerprint of one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSet {
    /// Total piece value per side, king excluded.
    pub material: BySide<i32>,
    /// Legal move count per side. The side not to move is measured on a
    /// turn-swapped copy; if the swap is impossible (that side is already
    /// giving check) the count is 0.
    pub mobility: BySide<u32>,
    /// Number of the four central squares each side attacks.
    pub center_control: BySide<u32>,
    /// Signed shelter score around each king. Higher is safer.
    pub king_safety: BySide<i32>,
    /// Value of the most valuable piece each side has en prise, 0 if none.
    pub hanging: BySide<i32>,
    pub pawns: BySide<PawnStructure>,
    /// Pieces absolutely pinned to each side's king.
    pub pins: BySide<u32>,
    pub castling: BySide<CastlingRights>,
}

/// Compute every metric for one position.
pub fn extract(pos: &Chess) -> FeatureSet {
    FeatureSet {
        material: BySide {
            white: material(pos, Color::White),
            black: material(pos, Color::Black),
        },
        mobility: mobility(pos),
        center_control: BySide {
            white: center_control(pos, Color::White),
            black: center_control(pos, Color::Black),
        },
        king_safety: BySide {
            white: king_safety(pos, Color::White),
            black: king_safety(pos, Color::Black),
        },
        hanging: BySide {
            white: hanging_value(pos, Color::White),
            black: hanging_value(pos, Color::Black),
        },
        pawns: BySide {
            white: pawn_structure(pos, Color::White),
            black: pawn_structure(pos, Color::Black),
        },
        pins: BySide {
            white: pin_count(pos, Color::White),
            black: pin_count(pos, Color::Black),
        },
        castling: BySide {
            white: castling_rights(pos, Color::White),
            black: castling_rights(pos, Color::Black),
        },
    }
}

fn material(pos: &Chess, color: Color) -> i32 {
    let board = pos.board();
    (board.by_color(color) & !board.by_role(Role::King))
        .into_iter()
        .filter_map(|sq| board.piece_at(sq))
        .map(|p| piece_value(p.role))
        .sum()
}

fn mobility(pos: &Chess) -> BySide<u32> {
    let to_move = pos.legal_moves().len() as u32;
    let waiting = pos
        .clone()
        .swap_turn()
        .map(|p| p.legal_moves().len() as u32)
        .unwrap_or(0);
    match pos.turn() {
        Color::White => BySide { white: to_move, black: waiting },
        Color::Black => BySide { white: waiting, black: to_move },
    }
}

fn center_control(pos: &Chess, color: Color) -> u32 {
    let board = pos.board();
    let occupied = board.occupied();
    CENTER
        .into_iter()
        .filter(|&sq| !board.attacks_to(sq, color, occupied).is_empty())
        .count() as u32
}

/// Shelter score for one king: attacked ring squares hurt, quiet escape
/// squares and pawn cover help, an open file next to the king hurts.
fn king_safety(pos: &Chess, color: Color) -> i32 {
    let board = pos.board();
    let Some(king) = board.king_of(color) else {
        return 0;
    };
    let occupied = board.occupied();
    let own_pawns = board.by_role(Role::Pawn) & board.by_color(color);
    let mut score = 0i32;

    for sq in attacks::king_attacks(king) {
        if !board.attacks_to(sq, !color, occupied).is_empty() {
            score -= 2;
        } else if !occupied.contains(sq) {
            score += 1;
        }
    }

    let forward: i32 = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    let king_file = king.file() as i32;
    let king_rank = king.rank() as i32;
    for df in -1..=1 {
        let file = king_file + df;
        if !(0..8).contains(&file) {
            continue;
        }
        let file = File::new(file as u32);
        // Pawn cover directly ahead of the king
        for dr in 1..=2 {
            let rank = king_rank + dr * forward;
            if (0..8).contains(&rank) {
                let sq = Square::from_coords(file, Rank::new(rank as u32));
                if own_pawns.contains(sq) {
                    score += 2;
                }
            }
        }
        if (own_pawns & Bitboard::from_file(file)).is_empty() {
            score -= 1;
        }
    }
    score
}

/// Value of the most valuable piece of `color` that is en prise: attacked
/// while undefended, or attacked by something cheaper than itself.
fn hanging_value(pos: &Chess, color: Color) -> i32 {
    let board = pos.board();
    let occupied = board.occupied();
    let mut worst = 0i32;

    for sq in board.by_color(color) & !board.by_role(Role::King) {
        let Some(piece) = board.piece_at(sq) else {
            continue;
        };
        let value = piece_value(piece.role);
        let attackers = board.attacks_to(sq, !color, occupied);
        if attackers.is_empty() {
            continue;
        }
        let defended = !board.attacks_to(sq, color, occupied).is_empty();
        let cheapest_attacker = attackers
            .into_iter()
            .filter_map(|a| board.piece_at(a))
            .filter(|p| p.role != Role::King)
            .map(|p| piece_value(p.role))
            .min();
        let en_prise = !defended || cheapest_attacker.is_some_and(|v| v < value);
        if en_prise && value > worst {
            worst = value;
        }
    }
    worst
}

fn pawn_structure(pos: &Chess, color: Color) -> PawnStructure {
    let board = pos.board();
    let own = board.by_role(Role::Pawn) & board.by_color(color);
    let enemy = board.by_role(Role::Pawn) & board.by_color(!color);
    let mut structure = PawnStructure::default();

    for file_idx in 0..8u32 {
        let file = File::new(file_idx);
        let on_file = own & Bitboard::from_file(file);
        if on_file.count() >= 2 {
            structure.doubled.push(file.char());
        }
        if on_file.is_empty() {
            continue;
        }
        let adjacent_own = adjacent_files(file_idx)
            .into_iter()
            .flatten()
            .any(|f| !(own & Bitboard::from_file(f)).is_empty());
        if !adjacent_own {
            structure.isolated.push(file.char());
        }
    }

    for sq in own {
        let rank = sq.rank() as i32;
        let mut blocked = false;
        for f in std::iter::once(Some(sq.file()))
            .chain(adjacent_files(sq.file() as u32))
            .flatten()
        {
            for enemy_sq in enemy & Bitboard::from_file(f) {
                let ahead = match color {
                    Color::White => (enemy_sq.rank() as i32) > rank,
                    Color::Black => (enemy_sq.rank() as i32) < rank,
                };
                if ahead {
                    blocked = true;
                }
            }
        }
        if !blocked {
            structure.passed.push(sq.to_string());
        }
    }
    structure
}

fn adjacent_files(file_idx: u32) -> [Option<File>; 2] {
    let lower = file_idx.checked_sub(1).map(File::new);
    let upper = if file_idx < 7 { Some(File::new(file_idx + 1)) } else { None };
    [lower, upper]
}

/// Pieces of `color` absolutely pinned to their own king: an enemy slider
/// aims at the king with exactly one piece of `color` between them.
fn pin_count(pos: &Chess, color: Color) -> u32 {
    let board = pos.board();
    let Some(king) = board.king_of(color) else {
        return 0;
    };
    let occupied = board.occupied();
    let enemy = board.by_color(!color);
    let queens = board.by_role(Role::Queen);
    let straight = (board.by_role(Role::Rook) | queens) & enemy;
    let diagonal = (board.by_role(Role::Bishop) | queens) & enemy;

    let snipers = (attacks::rook_attacks(king, Bitboard::EMPTY) & straight)
        | (attacks::bishop_attacks(king, Bitboard::EMPTY) & diagonal);

    let mut pins = 0;
    for sniper in snipers {
        let blockers = attacks::between(king, sniper) & occupied;
        if blockers.count() == 1 && !(blockers & board.by_color(color)).is_empty() {
            pins += 1;
        }
    }
    pins
}

fn castling_rights(pos: &Chess, color: Color) -> CastlingRights {
    let castles = pos.castles();
    CastlingRights {
        kingside: castles.has(color, shakmaty::CastlingSide::KingSide),
        queenside: castles.has(color, shakmaty::CastlingSide::QueenSide),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;
    use shakmaty::CastlingMode;

    fn position(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap()
    }

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_start_position_is_symmetric() {
        let features = extract(&position(START_FEN));
        assert_eq!(features.material.white, 39);
        assert_eq!(features.material.black, 39);
        assert_eq!(features.mobility.white, 20);
        assert_eq!(features.mobility.black, 20);
        assert_eq!(features.center_control.white, features.center_control.black);
        assert_eq!(features.king_safety.white, features.king_safety.black);
        assert_eq!(features.hanging.white, 0);
        assert_eq!(features.pins.white, 0);
        assert!(features.castling.white.kingside && features.castling.black.queenside);
    }

    #[test]
    fn test_e4_gains_center_control() {
        let before = extract(&position(START_FEN));
        let after = extract(&position(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
        ));
        // The e4 pawn now attacks d5, which nothing white touched before
        assert!(after.center_control.white > before.center_control.white);
    }

    #[test]
    fn test_stripped_pawn_shield_lowers_king_safety() {
        // Same kings, same black camp; the white f/g/h pawns are gone in
        // the second position, so only white's score may move
        let sheltered = extract(&position("6k1/5ppp/8/8/8/8/5PPP/6K1 w - - 0 1"));
        let exposed = extract(&position("6k1/5ppp/8/8/8/8/8/6K1 w - - 0 1"));
        assert!(exposed.king_safety.white < sheltered.king_safety.white);
        assert_eq!(exposed.king_safety.black, sheltered.king_safety.black);
    }

    #[test]
    fn test_undefended_attacked_queen_hangs() {
        // White queen on h5, black knight on f6 attacks it, nothing defends h5
        let pos = position("rnbqkb1r/pppppppp/5n2/7Q/8/8/PPPPPPPP/RNB1KBNR b KQkq - 0 1");
        let features = extract(&pos);
        assert_eq!(features.hanging.white, 9);
        assert_eq!(features.hanging.black, 0);
    }

    #[test]
    fn test_defended_piece_attacked_by_cheaper_still_hangs() {
        // Black pawn e5 attacks white knight d4; the knight is defended by
        // the queen down the open d-file but a pawn takes it profitably
        let pos = position("rnbqkbnr/pppp1ppp/8/4p3/3N4/8/PPP1PPPP/RNBQKB1R w KQkq - 0 1");
        let features = extract(&pos);
        assert_eq!(features.hanging.white, 3);
    }

    #[test]
    fn test_defended_pawn_is_not_hanging() {
        // After 1.e4 e5 both center pawns attack nothing of each other
        let pos = position("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        let features = extract(&pos);
        assert_eq!(features.hanging.white, 0);
        assert_eq!(features.hanging.black, 0);
    }

    #[test]
    fn test_doubled_and_isolated_pawns() {
        // White pawns c2 and c3 are doubled and isolated (no b- or d-pawns)
        let pos = position("k7/8/8/8/8/2P5/2P5/K7 w - - 0 1");
        let features = extract(&pos);
        assert_eq!(features.pawns.white.doubled, vec!['c']);
        assert_eq!(features.pawns.white.isolated, vec!['c']);
    }

    #[test]
    fn test_passed_pawn_detection() {
        // White a5 pawn has no black pawn on a or b files ahead of it
        let pos = position("k7/8/1p6/P7/8/8/8/K7 w - - 0 1");
        let features = extract(&pos);
        assert!(features.pawns.white.passed.is_empty());
        let pos = position("k7/8/8/P7/8/8/8/K7 w - - 0 1");
        let features = extract(&pos);
        assert_eq!(features.pawns.white.passed, vec!["a5".to_string()]);
    }

    #[test]
    fn test_absolute_pin_counted() {
        // Black bishop b4 pins the white knight c3 against the king e1;
        // the d-pawn has advanced so the diagonal behind the knight is open
        let pos = position(
            "rnbqk1nr/pppp1ppp/8/4p3/1b1P4/2N5/PPP1PPPP/R1BQKBNR w KQkq - 0 1",
        );
        let features = extract(&pos);
        assert_eq!(features.pins.white, 1);
        assert_eq!(features.pins.black, 0);
    }

    #[test]
    fn test_mobility_when_opponent_in_check() {
        // Black is in check, so the turn cannot be swapped to White;
        // White's count falls back to the boundary value
        let pos = position("rnbqkbnr/ppppp1pp/5p2/7Q/8/4P3/PPPP1PPP/RNB1KBNR b KQkq - 0 1");
        let features = extract(&pos);
        assert_eq!(features.mobility.white, 0);
        assert!(features.mobility.black > 0);
    }

    #[test]
    fn test_castling_rights_follow_fen() {
        let pos = position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w Kq - 0 1");
        let features = extract(&pos);
        assert!(features.castling.white.kingside);
        assert!(!features.castling.white.queenside);
        assert!(!features.castling.black.kingside);
        assert!(features.castling.black.queenside);
    }

    #[test]
    fn test_lone_kings_zeroes() {
        let features = extract(&position("k7/8/8/8/8/8/8/K7 w - - 0 1"));
        assert_eq!(features.material.white, 0);
        assert_eq!(features.material.black, 0);
        assert_eq!(features.hanging.white, 0);
        assert_eq!(features.pins.white, 0);
    }
}
