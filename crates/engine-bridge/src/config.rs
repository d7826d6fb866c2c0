//! Bridge configuration from environment variables.

use std::env;

use tracing::info;

use reaction_core::ToneBands;

/// Upper bound on a single position search, applied whichever of depth or
/// movetime drives the engine.
const DEFAULT_SEARCH_BUDGET_MS: u64 = 30_000;

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Path to a UCI engine binary. `None` disables engine evaluation
    /// entirely; analysis then runs on heuristics alone.
    pub stockfish_path: Option<String>,

    /// Search depth per position.
    pub depth: u32,

    /// Fixed time per position in milliseconds. When nonzero it replaces
    /// the depth limit.
    pub movetime_ms: u64,

    /// How long to wait for the engine handshake before declaring it dead.
    pub startup_grace_ms: u64,

    /// Whether the baseline quality model participates in classification.
    pub use_baseline_model: bool,

    /// Centipawn thresholds for the engine tone.
    pub tone_bands: ToneBands,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            stockfish_path: None,
            depth: 12,
            movetime_ms: 0,
            startup_grace_ms: 1_500,
            use_baseline_model: true,
            tone_bands: ToneBands::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables. Everything has a
    /// default; an unset STOCKFISH_PATH simply disables the engine.
    pub fn from_env() -> Self {
        let stockfish_path = env::var("STOCKFISH_PATH").ok().filter(|p| !p.is_empty());

        let depth = env::var("STOCKFISH_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(12);

        let movetime_ms = env::var("STOCKFISH_MOVETIME_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let use_baseline_model = env::var("MOVE_QUALITY_MODEL")
            .map(|v| v != "off")
            .unwrap_or(true);

        info!(
            engine = stockfish_path.as_deref().unwrap_or("<disabled>"),
            depth, movetime_ms, use_baseline_model, "bridge config loaded"
        );

        Self {
            stockfish_path,
            depth,
            movetime_ms,
            use_baseline_model,
            ..Self::default()
        }
    }

    pub fn engine_configured(&self) -> bool {
        self.stockfish_path.is_some()
    }

    /// Wall-clock budget for one evaluation.
    pub fn eval_timeout_ms(&self) -> u64 {
        if self.movetime_ms > 0 {
            // The engine gets its movetime plus slack for I/O
            self.movetime_ms + 1_000
        } else {
            DEFAULT_SEARCH_BUDGET_MS
        }
    }
}
