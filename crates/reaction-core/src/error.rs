//! Analysis error types

use thiserror::Error;

/// Errors detected at the position-model boundary. They short-circuit the
/// pipeline before feature extraction runs.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The board encoding could not be parsed or describes an impossible
    /// position.
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// The move is well-formed but not legal here, or not parseable as SAN
    /// or UCI at all.
    #[error("Invalid move: {0}")]
    IllegalMove(String),
}
