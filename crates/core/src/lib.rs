//! Core of the telephony to voice-agent relay.
//!
//! Everything here is independent of the web server: wire types for both
//! legs, audio framing, the per-call relay state machine, and the agent
//! authorization client.

pub mod agent;
pub mod audio;
pub mod authorizer;
pub mod call_control;
pub mod error;
pub mod relay;
pub mod telephony;
