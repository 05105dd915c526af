//! Error taxonomy shared by the relay core and the service runtime.

use std::fmt;
use std::time::Duration;

/// Identifies one of the two WebSocket legs owned by a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Telephony,
    Agent,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Telephony => write!(f, "telephony"),
            Leg::Agent => write!(f, "agent"),
        }
    }
}

/// Failure to obtain or open the voice-agent connection.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    #[error("signed URL request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("signed URL endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("signed URL response could not be parsed: {0}")]
    MalformedBody(String),
    #[error("agent WebSocket handshake failed: {0}")]
    Handshake(String),
    #[error("agent connection setup timed out after {0:?}")]
    Timeout(Duration),
}

/// A single inbound frame that does not match the shape expected on its leg.
#[derive(Debug, thiserror::Error)]
pub enum MessageParseError {
    #[error("invalid {leg} frame: {source}")]
    Json {
        leg: Leg,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid base64 audio on {leg} leg: {source}")]
    Audio {
        leg: Leg,
        #[source]
        source: base64::DecodeError,
    },
    #[error("unexpected binary frame on {0} leg")]
    Binary(Leg),
}

/// A socket-level failure on one leg.
#[derive(Debug, thiserror::Error)]
#[error("{leg} transport error: {reason}")]
pub struct TransportError {
    pub leg: Leg,
    pub reason: String,
}

impl TransportError {
    pub fn new(leg: Leg, reason: impl fmt::Display) -> Self {
        Self {
            leg,
            reason: reason.to_string(),
        }
    }
}

/// Umbrella error for everything that can end or disturb a relay session.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    MessageParse(#[from] MessageParseError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
