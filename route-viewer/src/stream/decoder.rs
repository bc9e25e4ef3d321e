//! Line-buffered frame decoder.

use futures::{Stream, StreamExt};
use tracing::debug;

use super::error::{FrameError, StreamError, TransportError};
use super::event::StreamEvent;

/// Prefix that marks a line as a frame. Other lines are padding.
pub const FRAME_PREFIX: &str = "data: ";

/// How much of a bad frame to keep in the error.
const FRAME_EXCERPT_CHARS: usize = 200;

/// Push bytes in, pull events out.
///
/// Lines are split on `\n` before any text decoding, so a multi-byte
/// character straddling two chunks decodes the same as if it had arrived
/// whole. A trailing partial line is held until more bytes arrive and is
/// dropped by [`FrameDecoder::finish`].
///
/// Each byte is searched for a newline once, however many chunks a long
/// frame arrives in.
///
/// A frame that fails to parse is reported once. After that the decoder is
/// spent: further input is ignored and no more events are produced.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Start of the first line not yet returned.
    consumed: usize,
    /// Bytes before this offset are known to hold no unconsumed newline.
    scanned: usize,
    spent: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of the stream.
    pub fn push(&mut self, chunk: &[u8]) {
        if !self.spent {
            self.buffer.extend_from_slice(chunk);
        }
    }

    /// Next complete event in arrival order, if one is buffered.
    pub fn next_event(&mut self) -> Option<Result<StreamEvent, FrameError>> {
        if self.spent {
            return None;
        }

        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let start = self.consumed;
            let newline = self.scanned + offset;
            self.consumed = newline + 1;
            self.scanned = self.consumed;

            let parsed = {
                let line = String::from_utf8_lossy(&self.buffer[start..newline]);
                line.strip_prefix(FRAME_PREFIX).map(|payload| {
                    serde_json::from_str::<StreamEvent>(payload).map_err(|e| FrameError {
                        message: e.to_string(),
                        frame: payload.chars().take(FRAME_EXCERPT_CHARS).collect(),
                    })
                })
            };

            match parsed {
                None => continue,
                Some(Ok(event)) => return Some(Ok(event)),
                Some(Err(e)) => {
                    self.spent = true;
                    self.clear();
                    return Some(Err(e));
                }
            }
        }

        // No complete line left: drop consumed lines and remember how far we looked.
        self.buffer.drain(..self.consumed);
        self.consumed = 0;
        self.scanned = self.buffer.len();
        None
    }

    /// Drain every complete event currently buffered.
    pub fn drain_events(&mut self) -> Vec<Result<StreamEvent, FrameError>> {
        std::iter::from_fn(|| self.next_event()).collect()
    }

    /// Whether a malformed frame has ended decoding.
    pub fn is_spent(&self) -> bool {
        self.spent
    }

    /// Number of bytes held back waiting for a newline.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len() - self.consumed
    }

    /// End of stream: discard any incomplete trailing line.
    ///
    /// Returns the number of bytes discarded.
    pub fn finish(&mut self) -> usize {
        let discarded = self.pending_bytes();
        if discarded > 0 {
            debug!(bytes = discarded, "discarding incomplete trailing frame");
        }
        self.clear();
        discarded
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.consumed = 0;
        self.scanned = 0;
    }
}

/// Turn a byte stream into a lazy stream of events.
///
/// The first error (transport or frame) is yielded and then the stream ends.
/// Each call starts a fresh decoder; a stream cannot be resumed midway.
pub fn decode_stream<S>(bytes: S) -> impl Stream<Item = Result<StreamEvent, StreamError>>
where
    S: Stream<Item = Result<Vec<u8>, TransportError>> + Unpin,
{
    futures::stream::unfold(Some((bytes, FrameDecoder::new())), |state| async move {
        let (mut bytes, mut decoder) = state?;
        loop {
            match decoder.next_event() {
                Some(Ok(event)) => return Some((Ok(event), Some((bytes, decoder)))),
                Some(Err(e)) => return Some((Err(e.into()), None)),
                None => {}
            }

            match bytes.next().await {
                Some(Ok(chunk)) => decoder.push(&chunk),
                Some(Err(e)) => return Some((Err(e.into()), None)),
                None => {
                    decoder.finish();
                    return None;
                }
            }
        }
    })
}
