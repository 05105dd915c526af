//! The relay session state machine.
//!
//! `RelaySession` owns everything a single call knows about itself (stream
//! identity, which legs are still open, lifecycle state) and turns inbound
//! events from either leg into an ordered list of [`Command`]s. It performs no
//! I/O: the runtime executes the commands against the real sockets, in order,
//! before feeding the session its next event.

use crate::{
    agent::{AgentEvent, AgentFrame},
    audio::{self, AudioChunker},
    error::{Leg, MessageParseError},
    telephony::{TelephonyEvent, TelephonyFrame},
};
use tracing::{debug, info, warn};

/// Lifecycle of a relay session. Transitions only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingAgentConnection,
    Active,
    Closing,
    Closed,
}

/// Why a session started closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    TelephonyStop,
    TelephonyClosed,
    TelephonyError,
    AgentClosed,
    AgentError,
    AuthorizationFailed,
}

impl CloseReason {
    fn telephony_gone(self) -> bool {
        matches!(self, CloseReason::TelephonyClosed | CloseReason::TelephonyError)
    }

    fn agent_gone(self) -> bool {
        matches!(self, CloseReason::AgentClosed | CloseReason::AgentError)
    }
}

/// A side effect the runtime must perform on behalf of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SendTelephony(TelephonyFrame),
    SendAgent(AgentFrame),
    CloseTelephony,
    CloseAgent,
}

/// Per-call relay state. One instance per telephony connection; never shared.
#[derive(Debug)]
pub struct RelaySession {
    state: SessionState,
    stream_sid: Option<String>,
    call_sid: Option<String>,
    chunker: AudioChunker,
    telephony_open: bool,
    agent_open: bool,
}

impl RelaySession {
    /// Creates the session for a freshly accepted telephony connection.
    pub fn new(chunker: AudioChunker) -> Self {
        Self {
            state: SessionState::AwaitingAgentConnection,
            stream_sid: None,
            call_sid: None,
            chunker,
            telephony_open: true,
            agent_open: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    pub fn call_sid(&self) -> Option<&str> {
        self.call_sid.as_deref()
    }

    /// True once the session has started closing.
    pub fn is_closing(&self) -> bool {
        matches!(self.state, SessionState::Closing | SessionState::Closed)
    }

    /// Records that the agent socket is open.
    ///
    /// If the session already started closing, the new socket is not adopted
    /// and the returned commands close it again.
    pub fn agent_connected(&mut self) -> Vec<Command> {
        match self.state {
            SessionState::AwaitingAgentConnection => {
                self.state = SessionState::Active;
                self.agent_open = true;
                info!("Agent connection open; session active.");
                Vec::new()
            }
            SessionState::Active => Vec::new(),
            SessionState::Closing | SessionState::Closed => vec![Command::CloseAgent],
        }
    }

    /// Parses and handles one text frame from the telephony leg.
    pub fn handle_telephony_text(
        &mut self,
        text: &str,
    ) -> Result<Vec<Command>, MessageParseError> {
        let event = serde_json::from_str::<TelephonyEvent>(text).map_err(|source| {
            MessageParseError::Json {
                leg: Leg::Telephony,
                source,
            }
        })?;
        self.handle_telephony_event(event)
    }

    pub fn handle_telephony_event(
        &mut self,
        event: TelephonyEvent,
    ) -> Result<Vec<Command>, MessageParseError> {
        if self.is_closing() {
            return Ok(Vec::new());
        }

        match event {
            TelephonyEvent::Start { start } => {
                match &self.stream_sid {
                    None => {
                        info!(
                            stream_sid = %start.stream_sid,
                            call_sid = ?start.call_sid,
                            "Telephony stream started."
                        );
                        self.stream_sid = Some(start.stream_sid);
                        self.call_sid = start.call_sid;
                    }
                    Some(current) if *current == start.stream_sid => {
                        debug!("Repeated start for the current stream.");
                    }
                    Some(current) => {
                        warn!(
                            current = %current,
                            ignored = %start.stream_sid,
                            "Ignoring start for a different stream."
                        );
                    }
                }
                Ok(Vec::new())
            }
            TelephonyEvent::Media { media } => {
                let audio = audio::decode_base64(&media.payload).map_err(|source| {
                    MessageParseError::Audio {
                        leg: Leg::Telephony,
                        source,
                    }
                })?;
                if !self.agent_open {
                    return Ok(Vec::new());
                }
                Ok(vec![Command::SendAgent(AgentFrame::user_audio(
                    audio::encode_base64(&audio),
                ))])
            }
            TelephonyEvent::Stop => {
                info!("Telephony stream stopped.");
                Ok(self.close(CloseReason::TelephonyStop))
            }
            TelephonyEvent::Connected | TelephonyEvent::Mark => Ok(Vec::new()),
            TelephonyEvent::Other => {
                debug!("Ignoring unrecognised telephony event.");
                Ok(Vec::new())
            }
        }
    }

    /// Parses and handles one text frame from the agent leg.
    pub fn handle_agent_text(&mut self, text: &str) -> Result<Vec<Command>, MessageParseError> {
        let event = serde_json::from_str::<AgentEvent>(text).map_err(|source| {
            MessageParseError::Json {
                leg: Leg::Agent,
                source,
            }
        })?;
        self.handle_agent_event(event)
    }

    pub fn handle_agent_event(
        &mut self,
        event: AgentEvent,
    ) -> Result<Vec<Command>, MessageParseError> {
        if self.is_closing() {
            return Ok(Vec::new());
        }

        match event {
            AgentEvent::ConversationInitiationMetadata {
                conversation_initiation_metadata_event,
            } => {
                let meta = conversation_initiation_metadata_event.unwrap_or_default();
                info!(
                    conversation_id = ?meta.conversation_id,
                    output_format = ?meta.agent_output_audio_format,
                    "Agent conversation initiated."
                );
                Ok(Vec::new())
            }
            AgentEvent::Audio { audio_event } => {
                let Some(stream_sid) = self.stream_sid.as_deref() else {
                    debug!("Dropping agent audio received before stream start.");
                    return Ok(Vec::new());
                };
                let audio = audio::decode_base64(&audio_event.audio_base_64).map_err(|source| {
                    MessageParseError::Audio {
                        leg: Leg::Agent,
                        source,
                    }
                })?;
                let mut commands = Vec::with_capacity(self.chunker.frame_count(audio.len()));
                commands.extend(self.chunker.chunk(&audio).map(|frame| {
                    Command::SendTelephony(TelephonyFrame::media(
                        stream_sid,
                        audio::encode_base64(frame),
                    ))
                }));
                Ok(commands)
            }
            AgentEvent::Interruption => {
                debug!("Agent interrupted; clearing telephony playback.");
                Ok(vec![Command::SendTelephony(TelephonyFrame::Clear {
                    stream_sid: self.stream_sid.clone(),
                })])
            }
            AgentEvent::Ping { ping_event } => {
                match ping_event.and_then(|ping| ping.event_id) {
                    Some(event_id) => Ok(vec![Command::SendAgent(AgentFrame::pong(event_id))]),
                    None => Ok(Vec::new()),
                }
            }
            AgentEvent::Other => Ok(Vec::new()),
        }
    }

    /// Moves the session into `Closing` and returns the close commands for
    /// whichever legs are still open. Calling it again is a no-op.
    pub fn close(&mut self, reason: CloseReason) -> Vec<Command> {
        if self.is_closing() {
            return Vec::new();
        }
        info!(?reason, "Closing relay session.");
        self.state = SessionState::Closing;

        if reason.telephony_gone() {
            self.telephony_open = false;
        }
        if reason.agent_gone() {
            self.agent_open = false;
        }

        let mut commands = Vec::with_capacity(2);
        if std::mem::take(&mut self.agent_open) {
            commands.push(Command::CloseAgent);
        }
        if std::mem::take(&mut self.telephony_open) {
            commands.push(Command::CloseTelephony);
        }
        commands
    }

    /// Marks teardown as complete. Only valid after `close`.
    pub fn finish(&mut self) {
        if self.state == SessionState::Closing {
            self.state = SessionState::Closed;
        }
    }
}
