//! Learned move-quality models. The trait keeps the classifier decoupled
//! from any particular model; the baseline implementation is a hand-tuned
//! linear scorer that stands in until a trained model ships.

use serde::Serialize;

use crate::classify::Label;
use crate::delta::FeatureDelta;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Prediction {
    pub label: Label,
    pub confidence: f64,
}

/// A model consulted when the rules are silent or need a confidence figure.
/// Returning `None` means the model abstains for this move.
pub trait QualityModel: Send + Sync {
    fn predict(&self, delta: &FeatureDelta) -> Option<Prediction>;
}

/// A model that never has an opinion. Used when model scoring is disabled.
pub struct NoModel;

impl QualityModel for NoModel {
    fn predict(&self, _delta: &FeatureDelta) -> Option<Prediction> {
        None
    }
}

/// Linear scorer over the same features the rules see. Scores start at an
/// indifferent 0.5 and shift toward 1.0 (strong) or 0.0 (weak).
pub struct BaselineModel;

impl QualityModel for BaselineModel {
    fn predict(&self, delta: &FeatureDelta) -> Option<Prediction> {
        let mut score = 0.5f64;

        if delta.flags.is_check {
            score += 0.15;
        }
        if delta.flags.is_promotion {
            score += 0.25;
        }
        if delta.flags.is_capture {
            score += match delta.material_delta {
                d if d > 0 => 0.2,
                0 => 0.05,
                _ => -0.15,
            };
        }
        if delta.king_safety_mover <= -3 {
            score -= 0.2;
        }
        if delta.mobility_mover >= 3 {
            score += 0.05;
        }

        let score = score.clamp(0.0, 1.0);
        let label = if score >= 0.7 {
            Label::Brilliant
        } else if score >= 0.55 {
            Label::Good
        } else if score >= 0.4 {
            Label::Neutral
        } else if score >= 0.25 {
            Label::Mistake
        } else {
            Label::Blunder
        };
        // Distance from indifference doubles as confidence
        let confidence = (0.5 + (score - 0.5).abs()).min(0.95);
        Some(Prediction { label, confidence })
    }
}
