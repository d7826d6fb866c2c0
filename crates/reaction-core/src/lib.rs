//! Core move analysis: position model, feature extraction, classification
//! and reaction text. Everything in this crate is synchronous and pure;
//! engine integration lives in the `engine-bridge` crate.

pub mod classify;
pub mod delta;
pub mod engine_eval;
pub mod error;
pub mod features;
pub mod ml;
pub mod position;
pub mod reaction;

pub use classify::{classify, ClassificationResult, Label, Method, ReasonCode};
pub use delta::{delta_for, CastlingLost, FeatureDelta, MoveFlags};
pub use engine_eval::{EngineEvaluation, EngineSummary, Tone, ToneBands};
pub use error::AnalysisError;
pub use features::{extract, BySide, CastlingRights, FeatureSet, PawnStructure};
pub use ml::{BaselineModel, NoModel, Prediction, QualityModel};
pub use position::{parse_move, MoveRecord, PositionPair};
pub use reaction::{assemble, Reaction, ReactionTone};

use serde::Serialize;

/// Everything the engine-free pipeline produces for one move.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    #[serde(rename = "move")]
    pub record: MoveRecord,
    pub features_before: FeatureSet,
    pub features_after: FeatureSet,
    pub delta: FeatureDelta,
    pub classification: ClassificationResult,
    pub reaction: Reaction,
}

/// Run the whole pipeline without an engine: parse, extract, classify with
/// the baseline model, assemble the reaction.
pub fn explain(fen: &str, move_str: &str) -> Result<Explanation, AnalysisError> {
    let pair = PositionPair::new(fen, move_str)?;
    let (features_before, features_after, delta) = delta_for(&pair);
    let classification = classify(&delta, None, &BaselineModel);
    let reaction = assemble(&classification, None);
    Ok(Explanation {
        record: pair.record,
        features_before,
        features_after,
        delta,
        classification,
        reaction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_runs_end_to_end() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let explanation = explain(fen, "e4").unwrap();
        assert_eq!(explanation.record.san, "e4");
        assert!(!explanation.reaction.headline.is_empty());
        assert!(matches!(
            explanation.classification.label,
            Label::Good | Label::Neutral
        ));
    }

    #[test]
    fn test_explanation_serializes() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let explanation = explain(fen, "Nf3").unwrap();
        let json = serde_json::to_value(&explanation).unwrap();
        assert_eq!(json["move"]["uci"], "g1f3");
        assert_eq!(json["delta"]["mover"], "white");
        assert!(json["classification"]["label"].is_string());
    }
}
