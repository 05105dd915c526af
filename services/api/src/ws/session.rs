//! Drives one relay session: the telephony socket accepted on `/media-stream`
//! and the agent socket opened on its behalf.

use super::agent::{self, AgentSocket};
use crate::state::AppState;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use callbridge_core::{
    error::{Leg, MessageParseError, RelayError, TransportError},
    relay::{CloseReason, Command, RelaySession},
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use std::{collections::VecDeque, sync::Arc};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tracing::{debug, error, info, instrument, warn};

/// Axum handler to upgrade the telephony provider's connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

#[instrument(name = "relay_session", skip_all, fields(session_id, stream_sid, call_sid))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id: u32 = rand::random();
    tracing::Span::current().record("session_id", session_id);
    info!("Telephony connection accepted. Connecting to voice agent...");

    match run_relay(socket, &state).await {
        Ok(()) => info!("Relay session finished."),
        Err(e) => error!(error = %e, "Relay session terminated with error."),
    }
}

/// Both halves of a connection; the sink is taken once the leg is closed.
struct Legs {
    telephony_tx: Option<SplitSink<WebSocket, Message>>,
    agent_tx: Option<SplitSink<AgentSocket, WsMessage>>,
    agent_rx: Option<SplitStream<AgentSocket>>,
}

/// The main event loop for a relay session.
///
/// Events from the telephony socket, the pending agent connection and the
/// agent socket are merged into a single loop. Each event is handled to
/// completion, including sending every resulting frame, before the next one is
/// taken, so frames never interleave across events.
async fn run_relay(socket: WebSocket, state: &AppState) -> Result<(), RelayError> {
    let (telephony_tx, mut telephony_rx) = socket.split();
    let mut legs = Legs {
        telephony_tx: Some(telephony_tx),
        agent_tx: None,
        agent_rx: None,
    };
    let mut session = RelaySession::new(state.chunker);
    let mut outcome: Result<(), RelayError> = Ok(());

    let connect = agent::connect_agent(state.authorizer.as_ref(), state.agent_connect_timeout);
    tokio::pin!(connect);
    let mut connecting = true;

    while !session.is_closing() {
        let commands = tokio::select! {
            result = &mut connect, if connecting => {
                connecting = false;
                match result {
                    Ok(socket) => {
                        let (tx, rx) = socket.split();
                        legs.agent_tx = Some(tx);
                        legs.agent_rx = Some(rx);
                        session.agent_connected()
                    }
                    Err(e) => {
                        error!(error = %e, "Agent connection setup failed.");
                        outcome = Err(e.into());
                        session.close(CloseReason::AuthorizationFailed)
                    }
                }
            },
            msg = telephony_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let had_stream = session.stream_sid().is_some();
                    let commands = discard_invalid(session.handle_telephony_text(text.as_str()));
                    if !had_stream {
                        record_stream_identity(&session);
                    }
                    commands
                }
                Some(Ok(Message::Binary(_))) => {
                    discard_invalid(Err(MessageParseError::Binary(Leg::Telephony)))
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => Vec::new(),
                Some(Ok(Message::Close(_))) | None => peer_closed(
                    Command::CloseTelephony,
                    session.close(CloseReason::TelephonyClosed),
                ),
                Some(Err(e)) => {
                    warn!(error = %e, "Telephony socket error.");
                    outcome = Err(TransportError::new(Leg::Telephony, e).into());
                    peer_closed(Command::CloseTelephony, session.close(CloseReason::TelephonyError))
                }
            },
            msg = next_agent_message(&mut legs.agent_rx) => match msg {
                Some(Ok(WsMessage::Text(text))) => {
                    discard_invalid(session.handle_agent_text(text.as_str()))
                }
                Some(Ok(WsMessage::Binary(_))) => {
                    discard_invalid(Err(MessageParseError::Binary(Leg::Agent)))
                }
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                    Vec::new()
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    info!(?frame, "Voice agent closed the connection.");
                    peer_closed(Command::CloseAgent, session.close(CloseReason::AgentClosed))
                }
                None => peer_closed(Command::CloseAgent, session.close(CloseReason::AgentClosed)),
                Some(Err(e)) => {
                    warn!(error = %e, "Agent socket error.");
                    outcome = Err(TransportError::new(Leg::Agent, e).into());
                    peer_closed(Command::CloseAgent, session.close(CloseReason::AgentError))
                }
            },
        };

        if let Err(e) = execute(commands, &mut session, &mut legs).await {
            outcome = Err(e.into());
        }
    }

    session.finish();
    outcome
}

/// Applies commands in order. A failed send closes the session; frames still
/// queued behind it are dropped in favour of the close commands.
async fn execute(
    commands: Vec<Command>,
    session: &mut RelaySession,
    legs: &mut Legs,
) -> Result<(), TransportError> {
    let mut queue = VecDeque::from(commands);
    let mut failure = None;

    while let Some(command) = queue.pop_front() {
        if let Err(e) = apply(command, legs).await {
            warn!(error = %e, "Failed to deliver frame.");
            let reason = match e.leg {
                Leg::Telephony => {
                    legs.telephony_tx = None;
                    CloseReason::TelephonyError
                }
                Leg::Agent => {
                    legs.agent_tx = None;
                    CloseReason::AgentError
                }
            };
            queue.clear();
            queue.extend(session.close(reason));
            failure.get_or_insert(e);
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn apply(command: Command, legs: &mut Legs) -> Result<(), TransportError> {
    match command {
        Command::SendTelephony(frame) => {
            let Some(tx) = legs.telephony_tx.as_mut() else {
                return Ok(());
            };
            let text = frame
                .to_json()
                .map_err(|e| TransportError::new(Leg::Telephony, e))?;
            tx.send(Message::Text(text.into()))
                .await
                .map_err(|e| TransportError::new(Leg::Telephony, e))
        }
        Command::SendAgent(frame) => {
            let Some(tx) = legs.agent_tx.as_mut() else {
                debug!("Agent leg not open; dropping frame.");
                return Ok(());
            };
            let text = frame.to_json().map_err(|e| TransportError::new(Leg::Agent, e))?;
            tx.send(WsMessage::Text(text.into()))
                .await
                .map_err(|e| TransportError::new(Leg::Agent, e))
        }
        Command::CloseTelephony => {
            if let Some(mut tx) = legs.telephony_tx.take() {
                if let Err(e) = tx.close().await {
                    debug!(error = %e, "Telephony socket already gone.");
                }
            }
            Ok(())
        }
        Command::CloseAgent => {
            legs.agent_rx = None;
            if let Some(mut tx) = legs.agent_tx.take() {
                if let Err(e) = tx.close().await {
                    debug!(error = %e, "Agent socket already gone.");
                }
            }
            Ok(())
        }
    }
}

/// Puts `close_leg` ahead of the teardown so the leg whose peer went away
/// still completes its side of the closing handshake.
fn peer_closed(close_leg: Command, mut teardown: Vec<Command>) -> Vec<Command> {
    teardown.insert(0, close_leg);
    teardown
}

/// Logs and drops frames that could not be understood; the session carries on.
fn discard_invalid(result: Result<Vec<Command>, MessageParseError>) -> Vec<Command> {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "Discarding malformed frame.");
        Vec::new()
    })
}

fn record_stream_identity(session: &RelaySession) {
    let span = tracing::Span::current();
    if let Some(stream_sid) = session.stream_sid() {
        span.record("stream_sid", stream_sid);
    }
    if let Some(call_sid) = session.call_sid() {
        span.record("call_sid", call_sid);
    }
}

async fn next_agent_message(
    agent_rx: &mut Option<SplitStream<AgentSocket>>,
) -> Option<Result<WsMessage, tungstenite::Error>> {
    match agent_rx {
        Some(rx) => rx.next().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callbridge_core::audio::AudioChunker;

    #[test]
    fn test_peer_closed_leg_is_closed_first() {
        let mut session = RelaySession::new(AudioChunker::default());
        session.agent_connected();

        let commands = peer_closed(
            Command::CloseTelephony,
            session.close(CloseReason::TelephonyClosed),
        );
        assert_eq!(commands, vec![Command::CloseTelephony, Command::CloseAgent]);
    }

    #[test]
    fn test_peer_closed_after_teardown_still_closes_leg() {
        let mut session = RelaySession::new(AudioChunker::default());
        session.close(CloseReason::AuthorizationFailed);

        let commands = peer_closed(Command::CloseAgent, session.close(CloseReason::AgentClosed));
        assert_eq!(commands, vec![Command::CloseAgent]);
    }
}
