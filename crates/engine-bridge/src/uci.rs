//! UCI engine wrapper (async I/O over a child process).
//!
//! UCI engines report scores from the side to move; everything leaving this
//! module is normalized to White's perspective.

use std::time::Duration;

use shakmaty::Color;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use reaction_core::EngineEvaluation;

use crate::config::BridgeConfig;
use crate::error::BridgeError;

pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl UciEngine {
    /// Spawn the engine and run the UCI handshake. A process that does not
    /// answer within the startup grace period counts as unavailable.
    pub async fn spawn(path: &str, startup_grace_ms: u64) -> Result<Self, BridgeError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| BridgeError::Engine(format!("Failed to spawn engine: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| BridgeError::Engine("Engine stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| BridgeError::Engine("Engine stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        let grace = Duration::from_millis(startup_grace_ms);
        tokio::time::timeout(grace, engine.handshake())
            .await
            .map_err(|_| BridgeError::Timeout("Engine handshake timed out".into()))??;

        Ok(engine)
    }

    async fn handshake(&mut self) -> Result<(), BridgeError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;
        self.send("setoption name Threads value 1").await?;
        self.send("setoption name UCI_AnalyseMode value true").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        Ok(())
    }

    async fn send(&mut self, cmd: &str) -> Result<(), BridgeError> {
        debug!(cmd, "UCI <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| BridgeError::Engine(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| BridgeError::Engine(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), BridgeError> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| BridgeError::Engine(format!("Failed to read from engine: {e}")))?;
            if n == 0 {
                return Err(BridgeError::Engine("Engine closed its output".into()));
            }
            let trimmed = line.trim();
            debug!(line = trimmed, "UCI >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Evaluate one position. `turn` is the side to move in `fen`, used to
    /// normalize the score to White's perspective.
    pub async fn evaluate(
        &mut self,
        fen: &str,
        turn: Color,
        config: &BridgeConfig,
    ) -> Result<EngineEvaluation, BridgeError> {
        self.send(&format!("position fen {fen}")).await?;
        if config.movetime_ms > 0 {
            self.send(&format!("go movetime {}", config.movetime_ms)).await?;
        } else {
            self.send(&format!("go depth {}", config.depth)).await?;
        }

        let mut cp: Option<i32> = None;
        let mut mate: Option<i32> = None;
        let mut depth: Option<u32> = None;
        let mut best_move: Option<String> = None;

        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| BridgeError::Engine(format!("Failed to read from engine: {e}")))?;
            if n == 0 {
                return Err(BridgeError::Engine("Engine closed its output".into()));
            }
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                if let Some(v) = parse_token(trimmed, "cp") {
                    cp = Some(v);
                    mate = None;
                }
                if let Some(v) = parse_token(trimmed, "mate") {
                    mate = Some(v);
                    cp = None;
                }
                if let Some(v) = parse_token(trimmed, "depth") {
                    depth = Some(v as u32);
                }
            } else if trimmed.starts_with("bestmove") {
                let parts: Vec<&str> = trimmed.split_whitespace().collect();
                if parts.len() >= 2 && parts[1] != "(none)" {
                    best_move = Some(parts[1].to_string());
                }
                break;
            }
        }

        let sign = match turn {
            Color::White => 1,
            Color::Black => -1,
        };
        Ok(EngineEvaluation {
            available: true,
            score_centipawn: cp.map(|v| v * sign),
            mate_in: mate.map(|v| v * sign),
            best_move,
            depth,
        })
    }

    /// Send quit and wait for the process to exit.
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Parse the integer following a keyword in an info line.
fn parse_token(line: &str, key: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == key && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 12 seldepth 18 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_token(line, "cp"), Some(35));
        assert_eq!(parse_token(line, "depth"), Some(12));
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 12 score mate 3 nodes 100000 pv e2e4";
        assert_eq!(parse_token(line, "mate"), Some(3));
        assert_eq!(parse_token(line, "cp"), None);
    }

    #[test]
    fn test_parse_negative_mate() {
        let line = "info depth 12 score mate -2 nodes 100000 pv e2e4";
        assert_eq!(parse_token(line, "mate"), Some(-2));
    }

    #[test]
    fn test_parse_missing_value() {
        assert_eq!(parse_token("info score cp", "cp"), None);
        assert_eq!(parse_token("", "cp"), None);
    }
}
