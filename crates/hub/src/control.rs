//! Directional drive commands for the robot. Commands go through a
//! [`CommandTransport`]; the only transport shipped logs the move and acks it
//! without contacting any device.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    /// Parse a command word (case-insensitive, trims whitespace).
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(format!("unknown move command '{other}'")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Request body of `POST /api/move`.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub command: String,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Acknowledgement returned for an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub seq: u64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport could not deliver the command.
    Unavailable(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(why) => write!(f, "command transport unavailable: {why}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Something that can carry a move command to the robot.
pub trait CommandTransport: Send + Sync {
    fn send_move(&self, direction: Direction) -> Result<Ack, TransportError>;
}

/// Transport that only logs.  No device is contacted.
#[derive(Debug, Default)]
pub struct LoggingTransport {
    seq: AtomicU64,
}

impl LoggingTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommandTransport for LoggingTransport {
    fn send_move(&self, direction: Direction) -> Result<Ack, TransportError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(%direction, seq, "move (logged only, not transmitted)");
        Ok(Ack { seq, direction })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
