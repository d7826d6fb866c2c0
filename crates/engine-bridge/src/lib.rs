//! Asynchronous analysis front end: runs the core pipeline and, when a UCI
//! engine is configured, folds its evaluations into the classification.
//!
//! `analyze` never fails at the call site. Input problems come back as a
//! structured error payload and engine trouble degrades to a heuristics-only
//! answer, so one wedged engine process cannot take the analysis down.

pub mod config;
pub mod error;
pub mod uci;

pub use config::BridgeConfig;
pub use error::BridgeError;
pub use uci::UciEngine;

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use reaction_core::{
    assemble, classify, delta_for, AnalysisError, BaselineModel, ClassificationResult,
    EngineEvaluation, EngineSummary, FeatureDelta, FeatureSet, MoveRecord, NoModel,
    PositionPair, Prediction, QualityModel, Reaction,
};

/// Grace period for a clean engine shutdown before it is killed.
const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Install the global tracing subscriber, honoring RUST_LOG with an `info`
/// default. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidPosition,
    IllegalMove,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<AnalysisError> for ErrorInfo {
    fn from(err: AnalysisError) -> Self {
        let kind = match err {
            AnalysisError::InvalidPosition(_) => ErrorKind::InvalidPosition,
            AnalysisError::IllegalMove(_) => ErrorKind::IllegalMove,
        };
        Self { kind, message: err.to_string() }
    }
}

/// What the engine contributed to this analysis, including why it did not
/// contribute when it could not.
#[derive(Debug, Clone, Serialize)]
pub struct EngineReport {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub before: EngineEvaluation,
    pub after: EngineEvaluation,
}

impl EngineReport {
    fn disabled(note: &str) -> Self {
        Self {
            enabled: false,
            note: Some(note.to_string()),
            before: EngineEvaluation::unavailable(),
            after: EngineEvaluation::unavailable(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisDetails {
    #[serde(rename = "move")]
    pub record: MoveRecord,
    pub features_before: FeatureSet,
    pub features_after: FeatureSet,
    pub delta: FeatureDelta,
    pub classification: ClassificationResult,
    pub engine: EngineReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_summary: Option<EngineSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_prediction: Option<Prediction>,
}

/// The complete analysis payload for one move.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_move: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction: Option<Reaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<AnalysisDetails>,
}

impl AnalyzeResponse {
    fn failure(error: ErrorInfo) -> Self {
        Self {
            ok: false,
            error: Some(error),
            normalized_move: None,
            reaction: None,
            details: None,
        }
    }
}

/// Analyze one move. Position or move problems come back in the payload
/// with `ok: false`; an unreachable or slow engine degrades the analysis
/// instead of failing it.
pub async fn analyze(fen: &str, move_str: &str, config: &BridgeConfig) -> AnalyzeResponse {
    let pair = match PositionPair::new(fen, move_str) {
        Ok(pair) => pair,
        Err(err) => {
            warn!(%err, "rejected analysis input");
            return AnalyzeResponse::failure(err.into());
        }
    };

    let (features_before, features_after, delta) = delta_for(&pair);

    let engine = evaluate_pair(&pair, config).await;
    let engine_summary = if engine.enabled {
        Some(EngineSummary::from_evaluations(
            &engine.before,
            &engine.after,
            pair.mover,
            config.tone_bands,
        ))
    } else {
        None
    };

    let model: &dyn QualityModel = if config.use_baseline_model {
        &BaselineModel
    } else {
        &NoModel
    };
    let ml_prediction = model.predict(&delta);

    let classification = classify(&delta, engine_summary.as_ref(), model);
    let reaction = assemble(&classification, engine_summary.as_ref());

    info!(
        mv = %pair.record.uci,
        label = ?classification.label,
        engine = engine.enabled,
        "analysis complete"
    );

    AnalyzeResponse {
        ok: true,
        error: None,
        normalized_move: Some(pair.record.san.clone()),
        reaction: Some(reaction),
        details: Some(AnalysisDetails {
            record: pair.record,
            features_before,
            features_after,
            delta,
            classification,
            engine,
            engine_summary,
            ml_prediction,
        }),
    }
}

/// Evaluate the positions before and after the move with a fresh engine
/// process. Any failure along the way disables the engine for this request
/// and is recorded in the report note.
async fn evaluate_pair(pair: &PositionPair, config: &BridgeConfig) -> EngineReport {
    let Some(path) = config.stockfish_path.as_deref() else {
        return EngineReport::disabled("engine not configured");
    };

    let mut engine = match UciEngine::spawn(path, config.startup_grace_ms).await {
        Ok(engine) => engine,
        Err(err) => {
            warn!(%err, path, "engine unavailable");
            return EngineReport::disabled(&format!("engine unavailable: {err}"));
        }
    };

    let budget = Duration::from_millis(config.eval_timeout_ms());
    let fen_before = pair.fen_before();
    let outcome =
        tokio::time::timeout(budget, engine.evaluate(&fen_before, pair.mover, config)).await;
    let before = match outcome {
        Ok(Ok(eval)) => eval,
        Ok(Err(err)) => {
            warn!(%err, "engine evaluation failed");
            shutdown(engine).await;
            return EngineReport::disabled(&format!("engine failed: {err}"));
        }
        Err(_) => {
            warn!("engine evaluation timed out");
            return EngineReport::disabled("engine timed out");
        }
    };

    let fen_after = pair.fen_after();
    let outcome =
        tokio::time::timeout(budget, engine.evaluate(&fen_after, !pair.mover, config)).await;
    let after = match outcome {
        Ok(Ok(eval)) => eval,
        Ok(Err(err)) => {
            warn!(%err, "engine evaluation failed");
            shutdown(engine).await;
            return EngineReport::disabled(&format!("engine failed: {err}"));
        }
        Err(_) => {
            warn!("engine evaluation timed out");
            return EngineReport::disabled("engine timed out");
        }
    };

    shutdown(engine).await;
    EngineReport { enabled: true, note: None, before, after }
}

async fn shutdown(mut engine: UciEngine) {
    // Drop kills the process if quit stalls
    let _ = tokio::time::timeout(QUIT_TIMEOUT, engine.quit()).await;
}
