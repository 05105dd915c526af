//! Call-control document returned to the telephony provider on an inbound call.

/// Path of the WebSocket endpoint the provider streams call audio to.
pub const MEDIA_STREAM_PATH: &str = "/media-stream";

const STREAM_DIRECTION: &str = "both";
const STREAM_MEDIA_FORMAT: &str = "audio/x-mulaw;rate=8000";

/// Builds the TwiML document that connects the call to a bidirectional media
/// stream at `wss://<host>/media-stream`.
pub fn media_stream_document(host: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <Connect>
    <Stream url="wss://{host}{path}">
      <Parameter name="direction" value="{direction}" />
      <Parameter name="mediaFormat" value="{format}" />
    </Stream>
  </Connect>
</Response>"#,
        host = html_escape::encode_double_quoted_attribute(host),
        path = MEDIA_STREAM_PATH,
        direction = STREAM_DIRECTION,
        format = STREAM_MEDIA_FORMAT,
    )
}
