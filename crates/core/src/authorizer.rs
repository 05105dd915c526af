//! Signed Session Authorization
//!
//! Exchanges the static agent credentials for a short-lived, capability-scoped
//! WebSocket URL that a single relay session uses to reach the voice agent.

use crate::error::AuthorizationError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io";
const SIGNED_URL_PATH: &str = "/v1/convai/conversation/get_signed_url";

/// Defines the contract for anything that can hand out agent connection URLs.
///
/// The relay runtime only depends on this trait, so the HTTP-backed
/// implementation can be swapped for a fixed URL or a test double.
#[async_trait]
pub trait SessionAuthorizer: Send + Sync {
    /// Returns a WebSocket URL that is authorised for one agent conversation.
    async fn signed_url(&self) -> Result<String, AuthorizationError>;
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    signed_url: String,
}

/// Obtains signed URLs from the ElevenLabs conversational AI API.
pub struct ElevenLabsAuthorizer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    agent_id: String,
}

impl ElevenLabsAuthorizer {
    /// Creates an authorizer for `agent_id` using `api_key`.
    ///
    /// `api_base` is the scheme and host of the API without a trailing path,
    /// normally [`DEFAULT_API_BASE`].
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            agent_id: agent_id.into(),
        }
    }
}

#[async_trait]
impl SessionAuthorizer for ElevenLabsAuthorizer {
    async fn signed_url(&self) -> Result<String, AuthorizationError> {
        let response = self
            .client
            .get(format!("{}{}", self.api_base, SIGNED_URL_PATH))
            .query(&[("agent_id", self.agent_id.as_str())])
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthorizationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json::<SignedUrlResponse>()
            .await
            .map_err(|e| {
                if e.is_decode() {
                    AuthorizationError::MalformedBody(e.to_string())
                } else {
                    AuthorizationError::Request(e)
                }
            })?;
        debug!("Obtained signed agent URL.");
        Ok(parsed.signed_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_endpoint(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(SIGNED_URL_PATH))
            .and(query_param("agent_id", "agent-1"))
            .and(header("xi-api-key", "key-1"))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_signed_url_success() {
        let server = MockServer::start().await;
        mock_endpoint(
            &server,
            ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"signed_url": "wss://agent.example/convai?token=t"}),
            ),
        )
        .await;

        let authorizer =
            ElevenLabsAuthorizer::new(format!("{}/", server.uri()), "key-1", "agent-1");
        let url = authorizer.signed_url().await.unwrap();
        assert_eq!(url, "wss://agent.example/convai?token=t");
    }

    #[tokio::test]
    async fn test_signed_url_error_status() {
        let server = MockServer::start().await;
        mock_endpoint(&server, ResponseTemplate::new(401).set_body_string("invalid api key")).await;

        let authorizer = ElevenLabsAuthorizer::new(server.uri(), "key-1", "agent-1");
        match authorizer.signed_url().await {
            Err(AuthorizationError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signed_url_missing_field() {
        let server = MockServer::start().await;
        mock_endpoint(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"url": "wss://x"})),
        )
        .await;

        let authorizer = ElevenLabsAuthorizer::new(server.uri(), "key-1", "agent-1");
        assert!(matches!(
            authorizer.signed_url().await,
            Err(AuthorizationError::MalformedBody(_))
        ));
    }

    #[tokio::test]
    async fn test_signed_url_non_json_body() {
        let server = MockServer::start().await;
        mock_endpoint(&server, ResponseTemplate::new(200).set_body_string("<html>ok</html>")).await;

        let authorizer = ElevenLabsAuthorizer::new(server.uri(), "key-1", "agent-1");
        assert!(matches!(
            authorizer.signed_url().await,
            Err(AuthorizationError::MalformedBody(_))
        ));
    }

    #[tokio::test]
    async fn test_signed_url_unreachable() {
        let authorizer = ElevenLabsAuthorizer::new("http://127.0.0.1:1", "key-1", "agent-1");
        assert!(matches!(
            authorizer.signed_url().await,
            Err(AuthorizationError::Request(_))
        ));
    }
}
