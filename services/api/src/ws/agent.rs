//! Opens the per-session WebSocket connection to the voice agent.

use callbridge_core::{authorizer::SessionAuthorizer, error::AuthorizationError};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::info;

pub type AgentSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Obtains a signed URL and completes the WebSocket handshake against it.
///
/// Both steps together are bounded by `timeout`; running out of time is
/// reported as [`AuthorizationError::Timeout`].
pub async fn connect_agent(
    authorizer: &dyn SessionAuthorizer,
    timeout: Duration,
) -> Result<AgentSocket, AuthorizationError> {
    let setup = async {
        let url = authorizer.signed_url().await?;
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| AuthorizationError::Handshake(e.to_string()))?;
        info!("Connected to voice agent.");
        Ok(socket)
    };

    tokio::time::timeout(timeout, setup)
        .await
        .map_err(|_| AuthorizationError::Timeout(timeout))?
}
