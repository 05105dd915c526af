//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the service clients
//! and settings every relay session draws from.

use crate::config::Config;
use callbridge_core::{
    audio::{AudioChunker, ZeroFrameSize},
    authorizer::{ElevenLabsAuthorizer, SessionAuthorizer},
};
use std::{sync::Arc, time::Duration};

/// The shared application state, created once at startup and passed to all handlers.
///
/// Nothing in here is mutable; per-call state lives in each session task.
#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<dyn SessionAuthorizer>,
    pub chunker: AudioChunker,
    pub agent_connect_timeout: Duration,
}

impl AppState {
    /// Builds the state for a configured service, backed by the ElevenLabs API.
    pub fn from_config(config: Config) -> Result<Self, ZeroFrameSize> {
        let authorizer = ElevenLabsAuthorizer::new(
            config.elevenlabs_api_base.clone(),
            config.elevenlabs_api_key.clone(),
            config.elevenlabs_agent_id.clone(),
        );
        Ok(Self {
            authorizer: Arc::new(authorizer),
            chunker: AudioChunker::new(config.audio_frame_size)?,
            agent_connect_timeout: config.agent_connect_timeout,
        })
    }
}
