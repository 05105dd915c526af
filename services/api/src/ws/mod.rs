//! WebSocket Relay
//!
//! This module contains the runtime half of a relay session:
//!
//! - `session`: accepts the telephony socket and runs the event loop that
//!   feeds both legs through the core `RelaySession` state machine.
//! - `agent`: authorizes and opens the socket to the voice agent.

pub mod agent;
pub mod session;

pub use session::ws_handler;
