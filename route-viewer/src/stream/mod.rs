//! Incremental decoding of the solve endpoint's event stream.
//!
//! The solve endpoint answers a POST with a chunked body where each frame is
//! a line `data: <JSON>`. Chunks arrive at arbitrary byte boundaries, so the
//! decoder buffers until a full line is available. The browser's
//! `EventSource` cannot POST, which is why this is parsed by hand rather than
//! with an SSE client.

mod decoder;
mod error;
mod event;

pub use decoder::{FRAME_PREFIX, FrameDecoder, decode_stream};
pub use error::{FrameError, StreamError, TransportError};
pub use event::StreamEvent;
