use callbridge_core::{audio::DEFAULT_FRAME_SIZE, authorizer::DEFAULT_API_BASE};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub elevenlabs_api_key: String,
    pub elevenlabs_agent_id: String,
    pub elevenlabs_api_base: String,
    pub audio_frame_size: usize,
    pub agent_connect_timeout: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let elevenlabs_api_key = required_var("ELEVENLABS_API_KEY")?;
        let elevenlabs_agent_id = required_var("ELEVENLABS_AGENT_ID")?;
        let elevenlabs_api_base =
            std::env::var("ELEVENLABS_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let audio_frame_size =
            positive_var("AUDIO_FRAME_SIZE", DEFAULT_FRAME_SIZE as u64)? as usize;
        let agent_connect_timeout =
            Duration::from_secs(positive_var("AGENT_CONNECT_TIMEOUT_SECS", 10)?);

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            elevenlabs_api_key,
            elevenlabs_agent_id,
            elevenlabs_api_base,
            audio_frame_size,
            agent_connect_timeout,
            log_level,
        })
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name.to_string())),
    }
}

fn positive_var(name: &str, default: u64) -> Result<u64, ConfigError> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}
