//! Bridge error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Engine timed out: {0}")]
    Timeout(String),
}
