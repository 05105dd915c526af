//! Callbridge API Library Crate
//!
//! This library contains the web service around the relay core: configuration,
//! shared application state, HTTP handlers, the WebSocket relay runtime, and
//! routing. The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod ws;
