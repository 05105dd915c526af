//! Wire format of the conversational voice agent socket (ElevenLabs ConvAI).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Events received from the voice agent.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    ConversationInitiationMetadata {
        #[serde(default)]
        conversation_initiation_metadata_event: Option<InitiationMetadata>,
    },
    Audio {
        audio_event: AudioEvent,
    },
    /// The caller talked over the agent; queued playback must be discarded.
    Interruption,
    Ping {
        #[serde(default)]
        ping_event: Option<PingEvent>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct InitiationMetadata {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub agent_output_audio_format: Option<String>,
    #[serde(default)]
    pub user_input_audio_format: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AudioEvent {
    pub audio_base_64: String,
    #[serde(default)]
    pub event_id: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PingEvent {
    #[serde(default)]
    pub event_id: Option<EventId>,
    #[serde(default)]
    pub ping_ms: Option<u64>,
}

/// Opaque ping identifier, echoed back verbatim in the pong.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum EventId {
    Number(u64),
    Text(String),
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventId::Number(n) => write!(f, "{n}"),
            EventId::Text(s) => f.write_str(s),
        }
    }
}

/// Frames sent to the voice agent.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AgentFrame {
    UserAudio(UserAudioChunk),
    Pong(Pong),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserAudioChunk {
    pub user_audio_chunk: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename = "pong")]
pub struct Pong {
    pub event_id: EventId,
}

impl AgentFrame {
    pub fn user_audio(payload: String) -> Self {
        AgentFrame::UserAudio(UserAudioChunk {
            user_audio_chunk: payload,
        })
    }

    pub fn pong(event_id: EventId) -> Self {
        AgentFrame::Pong(Pong { event_id })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
