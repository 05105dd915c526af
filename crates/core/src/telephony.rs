//! Wire format of the telephony media stream (Twilio Media Streams).

use serde::{Deserialize, Serialize};

/// Events received from the telephony provider over the `/media-stream` socket.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyEvent {
    /// First message on a new socket, before the stream is set up.
    Connected,
    /// The stream has started; carries the stream identifier.
    Start { start: StreamStart },
    /// One frame of caller audio.
    Media { media: MediaPayload },
    /// Playback of a previously sent mark has completed.
    Mark,
    /// The stream has ended.
    Stop,
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamStart {
    pub stream_sid: String,
    #[serde(default)]
    pub call_sid: Option<String>,
}

/// Base64 encoded audio, shared by inbound and outbound media frames.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MediaPayload {
    pub payload: String,
}

/// Frames sent back to the telephony provider.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyFrame {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: MediaPayload,
    },
    /// Discards any audio the provider has buffered for playback.
    Clear {
        #[serde(rename = "streamSid", skip_serializing_if = "Option::is_none")]
        stream_sid: Option<String>,
    },
}

impl TelephonyFrame {
    pub fn media(stream_sid: impl Into<String>, payload: String) -> Self {
        TelephonyFrame::Media {
            stream_sid: stream_sid.into(),
            media: MediaPayload { payload },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
