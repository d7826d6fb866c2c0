//! Rule-based move classification with optional model and engine input.

use serde::Serialize;

use crate::delta::FeatureDelta;
use crate::engine_eval::{EngineSummary, Tone};
use crate::ml::QualityModel;

/// Quality labels ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Brilliant,
    Good,
    Neutral,
    Inaccuracy,
    Dangerous,
    Mistake,
    Blunder,
}

impl Label {
    pub fn severity(self) -> u8 {
        match self {
            Label::Brilliant => 0,
            Label::Good => 1,
            Label::Neutral => 2,
            Label::Inaccuracy => 3,
            Label::Dangerous => 4,
            Label::Mistake => 5,
            Label::Blunder => 6,
        }
    }

    fn from_severity(severity: u8) -> Self {
        match severity {
            0 => Label::Brilliant,
            1 => Label::Good,
            2 => Label::Neutral,
            3 => Label::Inaccuracy,
            4 => Label::Dangerous,
            5 => Label::Mistake,
            _ => Label::Blunder,
        }
    }

    /// One step toward Brilliant.
    pub fn milder(self) -> Self {
        Self::from_severity(self.severity().saturating_sub(1))
    }

    /// One step toward Blunder.
    pub fn harsher(self) -> Self {
        Self::from_severity((self.severity() + 1).min(6))
    }
}

/// Machine-readable grounds for a classification. Serialized snake_case so
/// clients can key display strings off them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    DeliversCheckmate,
    Stalemate,
    InsufficientMaterial,
    LosesMaterial,
    WinsMaterial,
    EvenTrade,
    GivesCheck,
    Promotion,
    KingExposed,
    MobilityGain,
    MobilityLoss,
    RestrictsOpponent,
    CenterGain,
    CenterLoss,
    NewPassedPawn,
    DoubledPawns,
    IsolatedPawns,
    PinsOpponent,
    PinnedByOpponent,
    MoverLosesCastling,
    OpponentLosesCastling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Heuristic,
    Ml,
    Hybrid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub label: Label,
    pub confidence: f64,
    /// Ordered most significant first; tactical reasons precede positional.
    pub reasons: Vec<ReasonCode>,
    pub method: Method,
}

struct Rule {
    code: ReasonCode,
    /// Some rules only annotate and cast no vote on the label.
    vote: Option<Label>,
    applies: fn(&FeatureDelta) -> bool,
}

const fn rule(code: ReasonCode, vote: Option<Label>, applies: fn(&FeatureDelta) -> bool) -> Rule {
    Rule { code, vote, applies }
}

/// Tactical rules first, positional after. Ordering fixes both the reason
/// list and which label wins ties, so it must stay stable.
const RULES: &[Rule] = &[
    rule(ReasonCode::LosesMaterial, Some(Label::Blunder), |d| {
        d.net_material() <= -5
    }),
    rule(ReasonCode::LosesMaterial, Some(Label::Mistake), |d| {
        (-4..=-2).contains(&d.net_material())
    }),
    rule(ReasonCode::LosesMaterial, Some(Label::Inaccuracy), |d| {
        d.net_material() == -1
    }),
    rule(ReasonCode::WinsMaterial, Some(Label::Good), |d| {
        d.net_material() >= 1
    }),
    rule(ReasonCode::EvenTrade, None, |d| {
        d.flags.is_capture && d.net_material() == 0
    }),
    rule(ReasonCode::GivesCheck, Some(Label::Good), |d| d.flags.is_check),
    rule(ReasonCode::Promotion, Some(Label::Good), |d| d.flags.is_promotion),
    rule(ReasonCode::KingExposed, Some(Label::Dangerous), |d| {
        d.king_safety_mover <= -3
    }),
    rule(ReasonCode::MobilityGain, Some(Label::Good), |d| d.mobility_mover >= 3),
    rule(ReasonCode::MobilityLoss, Some(Label::Inaccuracy), |d| {
        d.mobility_mover <= -5
    }),
    rule(ReasonCode::RestrictsOpponent, Some(Label::Good), |d| {
        d.mobility_opponent <= -3
    }),
    rule(ReasonCode::CenterGain, Some(Label::Good), |d| d.center_mover >= 2),
    rule(ReasonCode::CenterLoss, None, |d| d.center_mover <= -2),
    rule(ReasonCode::NewPassedPawn, Some(Label::Good), |d| !d.new_passed.is_empty()),
    rule(ReasonCode::DoubledPawns, None, |d| !d.new_doubled.is_empty()),
    rule(ReasonCode::IsolatedPawns, None, |d| !d.new_isolated.is_empty()),
    rule(ReasonCode::PinsOpponent, None, |d| d.pins_on_opponent >= 1),
    rule(ReasonCode::PinnedByOpponent, None, |d| d.pins_on_mover >= 1),
    rule(ReasonCode::MoverLosesCastling, None, |d| {
        !d.flags.is_capture && d.castling_lost.any_for(d.mover)
    }),
    rule(ReasonCode::OpponentLosesCastling, None, |d| {
        d.castling_lost.any_for(!d.mover)
    }),
];

/// Classify one move from its feature delta, with an optional engine
/// summary and a quality model for tie-breaking.
///
/// Terminal outcomes short-circuit everything else. The engine, when
/// present, may shift the heuristic label by at most one severity step.
pub fn classify(
    delta: &FeatureDelta,
    engine: Option<&EngineSummary>,
    model: &dyn QualityModel,
) -> ClassificationResult {
    if delta.flags.is_checkmate {
        return ClassificationResult {
            label: Label::Brilliant,
            confidence: 1.0,
            reasons: vec![ReasonCode::DeliversCheckmate],
            method: Method::Heuristic,
        };
    }
    if delta.flags.is_stalemate {
        return ClassificationResult {
            label: Label::Neutral,
            confidence: 1.0,
            reasons: vec![ReasonCode::Stalemate],
            method: Method::Heuristic,
        };
    }
    if delta.flags.is_insufficient_material {
        return ClassificationResult {
            label: Label::Neutral,
            confidence: 1.0,
            reasons: vec![ReasonCode::InsufficientMaterial],
            method: Method::Heuristic,
        };
    }

    let mut reasons = Vec::new();
    let mut votes: Vec<Label> = Vec::new();
    for rule in RULES {
        if (rule.applies)(delta) {
            // The tiered material rules reuse one code; report it once
            if !reasons.contains(&rule.code) {
                reasons.push(rule.code);
            }
            if let Some(vote) = rule.vote {
                votes.push(vote);
            }
        }
    }

    let mut method = Method::Heuristic;
    let mut label = votes
        .iter()
        .copied()
        .max_by_key(|l| l.severity())
        .unwrap_or(Label::Neutral);

    let mut confidence = if votes.is_empty() {
        0.5
    } else {
        let agreeing = votes.iter().filter(|v| **v == label).count();
        0.5 + 0.4 * agreeing as f64 / votes.len() as f64
    };

    if reasons.is_empty() {
        // Nothing fired at all; let the model break the tie
        if let Some(p) = model.predict(delta) {
            label = p.label;
            confidence = p.confidence;
            method = Method::Ml;
        }
    } else if let Some(p) = model.predict(delta) {
        // Rules decided the label; the model refines confidence
        confidence = (confidence + p.confidence) / 2.0;
        method = Method::Hybrid;
    }

    if let Some(summary) = engine {
        if summary.available {
            label = match summary.tone {
                Tone::Good => label.milder(),
                Tone::Bad => label.harsher(),
                Tone::Neutral => label,
            };
        }
    }

    ClassificationResult { label, confidence, reasons, method }
}
