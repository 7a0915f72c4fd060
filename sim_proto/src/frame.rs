//! Incremental frame decoding.
//!
//! Bytes arrive in arbitrary pieces. [`FrameDecoder`] keeps whatever has not
//! yet formed a full frame (including a UTF-8 sequence cut in half) and hands
//! back decoded chunks in the order their frames were completed.

use serde::Serialize;
use thiserror::Error;

use crate::StreamChunk;

pub const FRAME_DELIMITER: &str = "\n\n";
/// Prefix written in front of every encoded payload.
pub const DATA_PREFIX: &str = "data: ";
const DATA_FIELD: &str = "data:";
const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame payload '{preview}': {source}")]
    Payload {
        preview: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// Non-empty frames split off the buffer.
    pub frames: usize,
    /// Chunks handed to the caller.
    pub chunks: usize,
    /// Frames that were not `data:` frames.
    pub skipped: usize,
    pub malformed: usize,
    /// Chunks decoded after the stream's `complete` and thrown away.
    pub after_complete: usize,
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    text: String,
    pending_bytes: Vec<u8>,
    completed: bool,
    stats: DecodeStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        self.pending_bytes.extend_from_slice(bytes);
        loop {
            match std::str::from_utf8(&self.pending_bytes) {
                Ok(text) => {
                    self.text.push_str(text);
                    self.pending_bytes.clear();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.pending_bytes[..valid]));
                    match err.error_len() {
                        // Sequence cut at the end of this read; wait for more bytes.
                        None => {
                            self.pending_bytes.drain(..valid);
                            break;
                        }
                        Some(invalid) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.pending_bytes.drain(..valid + invalid);
                        }
                    }
                }
            }
        }
        self.drain_frames()
    }

    pub fn push_str(&mut self, text: &str) -> Vec<StreamChunk> {
        self.text.push_str(text);
        self.drain_frames()
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn buffered_len(&self) -> usize {
        self.text.len() + self.pending_bytes.len()
    }

    /// Ends the stream. A trailing partial frame is dropped, not decoded.
    pub fn finish(self) -> DecodeStats {
        let leftover = self.text.trim().len() + self.pending_bytes.len();
        if leftover > 0 {
            tracing::debug!(
                target: "policy_sim::proto",
                bytes = leftover,
                "frame.partial_discarded"
            );
        }
        self.stats
    }

    fn drain_frames(&mut self) -> Vec<StreamChunk> {
        if self.text.contains('\r') {
            self.text = self.text.replace("\r\n", "\n");
        }

        let mut chunks = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.text[consumed..].find(FRAME_DELIMITER) {
            let frame = self.text[consumed..consumed + offset].trim_start_matches('\n');
            consumed += offset + FRAME_DELIMITER.len();
            if frame.trim().is_empty() {
                continue;
            }
            self.stats.frames += 1;
            match decode_frame(frame) {
                Ok(Some(chunk)) if self.completed => {
                    self.stats.after_complete += 1;
                    tracing::debug!(
                        target: "policy_sim::proto",
                        kind = chunk.kind(),
                        "frame.dropped_after_complete"
                    );
                }
                Ok(Some(chunk)) => {
                    self.completed = chunk.is_complete();
                    self.stats.chunks += 1;
                    chunks.push(chunk);
                }
                Ok(None) => {
                    self.stats.skipped += 1;
                    tracing::trace!(target: "policy_sim::proto", "frame.skipped=non_data");
                }
                Err(err) => {
                    self.stats.malformed += 1;
                    tracing::warn!(
                        target: "policy_sim::proto",
                        error = %err,
                        malformed = self.stats.malformed,
                        "frame.malformed"
                    );
                }
            }
        }
        self.text.drain(..consumed);
        chunks
    }
}

/// Decodes one frame (delimiter already removed).
///
/// Frames that do not start with `data:` yield `Ok(None)`. Multiple `data:`
/// lines are joined with newlines; other lines in the frame are ignored.
pub fn decode_frame(frame: &str) -> Result<Option<StreamChunk>, FrameError> {
    let frame = frame.trim_start_matches(['\n', '\r']);
    if !frame.starts_with(DATA_FIELD) {
        return Ok(None);
    }
    let payload = frame
        .lines()
        .filter_map(|line| line.strip_prefix(DATA_FIELD))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest).trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join("\n");
    if payload.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&payload)
        .map(Some)
        .map_err(|source| FrameError::Payload {
            preview: payload.chars().take(PREVIEW_CHARS).collect(),
            source,
        })
}

pub fn encode_frame(chunk: &StreamChunk) -> serde_json::Result<String> {
    let json = serde_json::to_string(chunk)?;
    Ok(format!("{DATA_PREFIX}{json}{FRAME_DELIMITER}"))
}
