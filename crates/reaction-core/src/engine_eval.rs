//! Engine evaluation summaries. The evaluations themselves come from an
//! external UCI engine; this module only folds a before/after pair into a
//! tone the classifier and reaction text can use.

use serde::Serialize;
use shakmaty::Color;

/// One engine evaluation of a single position. Scores are always from
/// White's perspective regardless of whose turn it was.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineEvaluation {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_centipawn: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mate_in: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_move: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

impl EngineEvaluation {
    pub fn unavailable() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Good,
    Neutral,
    Bad,
}

/// Centipawn thresholds separating the tones. A small gain is already
/// "good"; only a clearly losing swing is "bad".
#[derive(Debug, Clone, Copy)]
pub struct ToneBands {
    pub good_at: i32,
    pub bad_at: i32,
}

impl Default for ToneBands {
    fn default() -> Self {
        Self { good_at: 10, bad_at: -50 }
    }
}

/// Before/after evaluations folded to the mover's perspective.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSummary {
    pub available: bool,
    pub tone: Tone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_cp: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_cp: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_cp: Option<i32>,
}

impl EngineSummary {
    /// Compare the two evaluations from the mover's side. Mate lines
    /// dominate: delivering or walking into a forced mate overrides any
    /// centipawn arithmetic.
    pub fn from_evaluations(
        before: &EngineEvaluation,
        after: &EngineEvaluation,
        mover: Color,
        bands: ToneBands,
    ) -> Self {
        if !before.available || !after.available {
            return Self {
                available: false,
                tone: Tone::Neutral,
                delta_cp: None,
                before_cp: None,
                after_cp: None,
            };
        }

        let sign = match mover {
            Color::White => 1,
            Color::Black => -1,
        };
        let orient = |cp: Option<i32>| cp.map(|v| v * sign);
        let mate_for_mover = |m: Option<i32>| m.map(|v| v * sign);

        // Mate branch first
        let mate_before = mate_for_mover(before.mate_in);
        let mate_after = mate_for_mover(after.mate_in);
        if let Some(tone) = mate_tone(mate_before, mate_after) {
            return Self {
                available: true,
                tone,
                delta_cp: None,
                before_cp: orient(before.score_centipawn),
                after_cp: orient(after.score_centipawn),
            };
        }

        let before_cp = orient(before.score_centipawn);
        let after_cp = orient(after.score_centipawn);
        let delta_cp = match (before_cp, after_cp) {
            (Some(b), Some(a)) => Some(a - b),
            _ => None,
        };
        let tone = match delta_cp {
            Some(d) if d >= bands.good_at => Tone::Good,
            Some(d) if d <= bands.bad_at => Tone::Bad,
            _ => Tone::Neutral,
        };
        Self { available: true, tone, delta_cp, before_cp, after_cp }
    }
}

fn mate_tone(before: Option<i32>, after: Option<i32>) -> Option<Tone> {
    match (before, after) {
        // Still (or newly) mating, or no mate anywhere
        (_, Some(a)) if a > 0 => Some(Tone::Good),
        (_, Some(a)) if a < 0 => Some(Tone::Bad),
        // A forced mate for the mover evaporated
        (Some(b), None) if b > 0 => Some(Tone::Bad),
        // The mover escaped a mate against them
        (Some(b), None) if b < 0 => Some(Tone::Good),
        _ => None,
    }
}
