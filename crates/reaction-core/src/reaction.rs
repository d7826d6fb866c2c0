//! Turning a classification into human-readable text. Output is fully
//! deterministic: the same classification always yields the same words.

use serde::Serialize;

use crate::classify::{ClassificationResult, Label, ReasonCode};
use crate::engine_eval::EngineSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionTone {
    Positive,
    Neutral,
    Negative,
}

impl From<Label> for ReactionTone {
    fn from(label: Label) -> Self {
        match label {
            Label::Brilliant | Label::Good => ReactionTone::Positive,
            Label::Neutral => ReactionTone::Neutral,
            Label::Inaccuracy | Label::Dangerous | Label::Mistake | Label::Blunder => {
                ReactionTone::Negative
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reaction {
    pub headline: String,
    pub body: String,
    pub tone: ReactionTone,
}

fn lead(label: Label) -> &'static str {
    match label {
        Label::Brilliant => "Brilliant!",
        Label::Good => "Good move.",
        Label::Neutral => "Balanced move.",
        Label::Inaccuracy => "A small slip.",
        Label::Dangerous => "Careful, that looks risky.",
        Label::Mistake => "That looks like a mistake.",
        Label::Blunder => "Blunder!",
    }
}

/// Display phrase for each reason code. Total over the enum so a new code
/// cannot ship without words for it.
pub fn reason_phrase(code: ReasonCode) -> &'static str {
    match code {
        ReasonCode::DeliversCheckmate => "It delivers checkmate.",
        ReasonCode::Stalemate => "It ends the game in stalemate.",
        ReasonCode::InsufficientMaterial => {
            "Neither side has enough material left to win."
        }
        ReasonCode::LosesMaterial => "It gives up material.",
        ReasonCode::WinsMaterial => "It wins material.",
        ReasonCode::EvenTrade => "It trades evenly.",
        ReasonCode::GivesCheck => "It puts the enemy king in check.",
        ReasonCode::Promotion => "It promotes a pawn.",
        ReasonCode::KingExposed => "It leaves your king exposed.",
        ReasonCode::MobilityGain => "It opens up your pieces.",
        ReasonCode::MobilityLoss => "It cramps your own pieces.",
        ReasonCode::RestrictsOpponent => "It restricts the opponent's pieces.",
        ReasonCode::CenterGain => "It strengthens your grip on the center.",
        ReasonCode::CenterLoss => "It loosens your grip on the center.",
        ReasonCode::NewPassedPawn => "It creates a passed pawn.",
        ReasonCode::DoubledPawns => "It doubles your pawns.",
        ReasonCode::IsolatedPawns => "It isolates a pawn.",
        ReasonCode::PinsOpponent => "It pins an enemy piece.",
        ReasonCode::PinnedByOpponent => "It lets a piece get pinned.",
        ReasonCode::MoverLosesCastling => "It gives up castling rights.",
        ReasonCode::OpponentLosesCastling => "It strips the opponent's castling rights.",
    }
}

fn headline(label: Label, top: Option<ReasonCode>) -> String {
    match top {
        Some(code) => format!("{} {}", lead(label), reason_phrase(code)),
        None => lead(label).to_string(),
    }
}

/// Assemble the reaction: the headline carries the label and the most
/// significant reason, the body the remaining reasons and, when engine
/// scores exist, the evaluation swing in pawns.
pub fn assemble(result: &ClassificationResult, engine: Option<&EngineSummary>) -> Reaction {
    let headline = headline(result.label, result.reasons.first().copied());

    let mut parts: Vec<String> = result
        .reasons
        .iter()
        .skip(1)
        .map(|c| reason_phrase(*c).to_string())
        .collect();

    if let Some(summary) = engine {
        if let (Some(before), Some(after)) = (summary.before_cp, summary.after_cp) {
            parts.push(format!(
                "Engine: {:+.2} -> {:+.2} pawns.",
                before as f64 / 100.0,
                after as f64 / 100.0
            ));
        }
    }

    Reaction {
        headline,
        body: parts.join(" "),
        tone: ReactionTone::from(result.label),
    }
}
