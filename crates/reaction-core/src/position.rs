//! Position model: FEN parsing, move normalization, before/after snapshots.

use serde::Serialize;
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};

use crate::error::AnalysisError;

/// The move under analysis, normalized to both notations. The UCI
/// coordinate form is canonical and used for internal comparisons and
/// logging; SAN is derived for display only.
#[derive(Debug, Clone, Serialize)]
pub struct MoveRecord {
    pub uci: String,
    pub san: String,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<char>,
}

/// Immutable snapshot of a position pair: the board before the move, the
/// validated move, and the board after it. Two positions exist per request
/// and neither is ever mutated.
#[derive(Debug, Clone)]
pub struct PositionPair {
    pub before: Chess,
    pub after: Chess,
    pub mv: Move,
    pub record: MoveRecord,
    /// Side that made the move (side to move in `before`).
    pub mover: Color,
}

impl PositionPair {
    pub fn new(fen: &str, move_str: &str) -> Result<Self, AnalysisError> {
        let fen: Fen = fen
            .parse()
            .map_err(|e| AnalysisError::InvalidPosition(format!("unparseable FEN: {e}")))?;
        let before: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| AnalysisError::InvalidPosition(format!("unreachable position: {e}")))?;

        let mv = parse_move(&before, move_str)?;
        let san = San::from_move(&before, mv).to_string();
        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        let mover = before.turn();

        let after = before
            .clone()
            .play(mv)
            .map_err(|_| AnalysisError::IllegalMove(format!("'{move_str}' is not legal here")))?;

        let record = MoveRecord {
            from: uci[0..2].to_string(),
            to: uci[2..4].to_string(),
            promotion: mv.promotion().map(|r| r.char()),
            uci,
            san,
        };

        Ok(Self {
            before,
            after,
            mv,
            record,
            mover,
        })
    }

    pub fn fen_before(&self) -> String {
        Fen::from_position(&self.before, EnPassantMode::Legal).to_string()
    }

    pub fn fen_after(&self) -> String {
        Fen::from_position(&self.after, EnPassantMode::Legal).to_string()
    }
}

/// Parse a move string against a position. SAN is tried first, then UCI,
/// matching the order players tend to type moves in.
pub fn parse_move(pos: &Chess, move_str: &str) -> Result<Move, AnalysisError> {
    if let Ok(san) = move_str.parse::<San>() {
        if let Ok(mv) = san.to_move(pos) {
            return Ok(mv);
        }
    }
    if let Ok(uci) = move_str.parse::<UciMove>() {
        if let Ok(mv) = uci.to_move(pos) {
            return Ok(mv);
        }
    }
    Err(AnalysisError::IllegalMove(format!(
        "'{move_str}' is not a legal SAN or UCI move in this position"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_parse_san_and_uci() {
        let pair_san = PositionPair::new(START_FEN, "Nf3").unwrap();
        let pair_uci = PositionPair::new(START_FEN, "g1f3").unwrap();
        assert_eq!(pair_san.record.uci, "g1f3");
        assert_eq!(pair_uci.record.san, "Nf3");
    }

    #[test]
    fn test_normalized_move_is_san() {
        let pair = PositionPair::new(START_FEN, "e2e4").unwrap();
        assert_eq!(pair.record.san, "e4");
        assert_eq!(pair.record.from, "e2");
        assert_eq!(pair.record.to, "e4");
        assert!(pair.record.promotion.is_none());
    }

    #[test]
    fn test_coordinate_round_trip() {
        // UCI -> SAN -> UCI must be lossless
        let pair = PositionPair::new(START_FEN, "g1f3").unwrap();
        let again = PositionPair::new(START_FEN, &pair.record.san).unwrap();
        assert_eq!(again.record.uci, "g1f3");
    }

    #[test]
    fn test_promotion_move() {
        let pair = PositionPair::new("8/P7/8/8/8/8/8/K6k w - - 0 1", "a8=Q").unwrap();
        assert_eq!(pair.record.uci, "a7a8q");
        assert_eq!(pair.record.promotion, Some('q'));
    }

    #[test]
    fn test_invalid_fen_rejected() {
        let err = PositionPair::new("not a fen", "e4").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPosition(_)));
    }

    #[test]
    fn test_missing_king_rejected() {
        let err =
            PositionPair::new("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w KQkq - 0 1", "e4")
                .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPosition(_)));
    }

    #[test]
    fn test_illegal_move_rejected() {
        // e5 is not reachable for White from the start
        let err = PositionPair::new(START_FEN, "e5").unwrap_err();
        assert!(matches!(err, AnalysisError::IllegalMove(_)));
    }

    #[test]
    fn test_garbage_move_rejected() {
        let err = PositionPair::new(START_FEN, "xyz123").unwrap_err();
        assert!(matches!(err, AnalysisError::IllegalMove(_)));
    }
}
