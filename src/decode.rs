//! Shared streaming-decode driver.
//!
//! Both providers stream one JSON-shaped record per logical unit of output,
//! but framing differs: the cloud protocol wraps records in SSE `data:`
//! lines with an explicit `[DONE]` sentinel, while the local protocol emits
//! bare NDJSON with an inline `done` flag. The framing rule lives in a
//! per-provider [`FrameDecoder`]; [`DeltaStream`] drives any decoder over a
//! line stream and enforces the shared termination contract.

use crate::{ChatStreamDelta, Error};
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// What one line of the response body decoded to.
pub(crate) enum Frame {
    /// The line is not a frame under this provider's framing rule
    /// (blank line, SSE comment, unrelated field). Keep reading.
    Skip,
    /// A decoded domain delta to hand to the caller.
    Delta(ChatStreamDelta),
    /// The provider's end-of-stream sentinel; no delta is emitted for it.
    End,
}

/// A provider's framing rule: extract a frame from one line, or fail with a
/// protocol error that aborts the stream.
pub(crate) trait FrameDecoder: Send {
    fn decode_line(&mut self, line: &str) -> Result<Frame, Error>;
}

/// Drives a line stream through a [`FrameDecoder`], yielding domain deltas.
///
/// The stream fuses after the first error, after the decoder signals
/// [`Frame::End`], and after the first delta with `done = true` — no frames
/// are read past any of those points.
pub(crate) struct DeltaStream<S, D> {
    lines: S,
    decoder: D,
    finished: bool,
}

impl<S, D> DeltaStream<S, D> {
    pub(crate) fn new(lines: S, decoder: D) -> Self {
        Self {
            lines,
            decoder,
            finished: false,
        }
    }
}

impl<S, D> Stream for DeltaStream<S, D>
where
    S: Stream<Item = Result<String, Error>> + Unpin,
    D: FrameDecoder + Unpin,
{
    type Item = Result<ChatStreamDelta, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        loop {
            let line = match ready!(self.lines.poll_next_unpin(cx)) {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    // Body ended without a sentinel; treat as a clean end.
                    self.finished = true;
                    return Poll::Ready(None);
                }
            };

            match self.decoder.decode_line(&line) {
                Ok(Frame::Skip) => continue,
                Ok(Frame::Delta(delta)) => {
                    if delta.done {
                        self.finished = true;
                    }
                    return Poll::Ready(Some(Ok(delta)));
                }
                Ok(Frame::End) => {
                    self.finished = true;
                    return Poll::Ready(None);
                }
                Err(e) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }
}
