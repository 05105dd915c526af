//! Audio framing and base64 helpers for the telephony and agent legs.
//!
//! Audio is never transcoded here: payloads are opaque encoded bytes that are
//! only decoded from base64 to be split into bounded frames.

use base64::Engine;
use std::num::NonZeroUsize;

/// Frame size for 8 kHz, 8-bit mono mu-law at a 40 ms cadence.
pub const DEFAULT_FRAME_SIZE: usize = 320;

const DEFAULT_FRAME: NonZeroUsize = NonZeroUsize::new(DEFAULT_FRAME_SIZE).unwrap();

/// Returned when a chunker is asked to produce zero-length frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("audio frame size must be greater than zero")]
pub struct ZeroFrameSize;

/// Splits decoded audio buffers into fixed-size frames.
///
/// Every frame except possibly the last is exactly `frame_size` bytes long,
/// and the frames cover the input in order with no gaps or overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioChunker {
    frame_size: NonZeroUsize,
}

impl AudioChunker {
    pub fn new(frame_size: usize) -> Result<Self, ZeroFrameSize> {
        NonZeroUsize::new(frame_size)
            .map(|frame_size| Self { frame_size })
            .ok_or(ZeroFrameSize)
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size.get()
    }

    /// Returns the frames of `bytes` in order. An empty buffer yields no frames.
    pub fn chunk<'a>(&self, bytes: &'a [u8]) -> std::slice::Chunks<'a, u8> {
        bytes.chunks(self.frame_size.get())
    }

    /// Number of frames `chunk` yields for a buffer of `len` bytes.
    pub fn frame_count(&self, len: usize) -> usize {
        len.div_ceil(self.frame_size.get())
    }
}

impl Default for AudioChunker {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME,
        }
    }
}

pub fn decode_base64(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD.decode(payload)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
