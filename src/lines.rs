//! Stream adapter that splits a byte stream into complete text lines.
//!
//! Both wire protocols this crate speaks are line-oriented (SSE `data:`
//! lines and bare NDJSON), so the per-provider decoders run on top of one
//! shared line scanner. The adapter buffers bytes across chunk boundaries —
//! a line, or a multi-byte UTF-8 sequence inside it, may be split across
//! arbitrary network chunks.

use crate::Error;
use futures_util::{Stream, StreamExt};
use memchr::memchr;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Upper bound on buffered bytes without a newline; a well-behaved stream
/// never comes close.
const MAX_BUFFER_SIZE: usize = 1_000_000;

/// A stream adapter that yields complete lines from a byte stream.
///
/// Lines are terminated by `\n`; a trailing `\r` is stripped. If the
/// underlying stream ends with unterminated data, that data is yielded as a
/// final line.
pub struct LineStream<S> {
    /// The underlying byte stream
    inner: S,
    /// Buffer for incomplete raw bytes from previous chunks
    buffer: Vec<u8>,
    /// Parsed lines ready to be yielded
    lines: VecDeque<String>,
}

impl<S> LineStream<S> {
    /// Create a new line stream from a byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            lines: VecDeque::new(),
        }
    }

    /// Split complete lines out of the buffer, leaving any trailing partial
    /// line in place.
    fn split_buffer(&mut self) -> Result<(), Error> {
        let mut start = 0;

        while let Some(pos) = memchr(b'\n', &self.buffer[start..]) {
            let line_end = start + pos;
            let line_bytes = trim_cr(&self.buffer[start..line_end]);

            let line = std::str::from_utf8(line_bytes)
                .map_err(|e| Error::protocol(format!("invalid UTF-8 in stream line: {e}")))?;
            self.lines.push_back(line.to_string());

            start = line_end + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        Ok(())
    }
}

/// Strip a single trailing carriage return, for CRLF-framed streams.
fn trim_cr(bytes: &[u8]) -> &[u8] {
    match bytes {
        [head @ .., b'\r'] => head,
        _ => bytes,
    }
}

impl<S, E> Stream for LineStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Error>,
{
    type Item = Result<String, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            // First, yield any already-split lines (FIFO order)
            if let Some(line) = self.lines.pop_front() {
                return Poll::Ready(Some(Ok(line)));
            }

            let chunk = match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => chunk,
                // Mid-stream read failures are transport errors, not
                // protocol errors; the distinction matters to callers.
                Some(Err(e)) => return Poll::Ready(Some(Err(e.into()))),
                None => {
                    // Stream ended - flush any unterminated final line
                    if self.buffer.is_empty() {
                        return Poll::Ready(None);
                    }
                    let result = match std::str::from_utf8(trim_cr(&self.buffer)) {
                        Ok(line) => Ok(line.to_string()),
                        Err(e) => Err(Error::protocol(format!(
                            "invalid UTF-8 in stream line: {e}"
                        ))),
                    };
                    self.buffer.clear();
                    return Poll::Ready(Some(result));
                }
            };

            self.buffer.extend_from_slice(&chunk);

            if self.buffer.len() > MAX_BUFFER_SIZE {
                self.buffer.clear();
                return Poll::Ready(Some(Err(Error::protocol(
                    "line buffer exceeded maximum size",
                ))));
            }

            if let Err(e) = self.split_buffer() {
                return Poll::Ready(Some(Err(e)));
            }
        }
    }
}

/// Extension trait to add line splitting to byte streams.
pub trait LineStreamExt: Stream {
    /// Split this byte stream into complete text lines.
    fn lines(self) -> LineStream<Self>
    where
        Self: Sized,
    {
        LineStream::new(self)
    }
}

impl<S: Stream> LineStreamExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    async fn collect(parts: Vec<bytes::Bytes>) -> Vec<Result<String, Error>> {
        let chunks: Vec<Result<bytes::Bytes, reqwest::Error>> =
            parts.into_iter().map(Ok).collect();
        stream::iter(chunks).lines().collect().await
    }

    fn chunk(bytes: &'static [u8]) -> bytes::Bytes {
        bytes::Bytes::from_static(bytes)
    }

    #[tokio::test]
    async fn test_complete_lines() {
        let lines = collect(vec![chunk(b"first\nsecond\n")]).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].as_ref().unwrap(), "first");
        assert_eq!(lines[1].as_ref().unwrap(), "second");
    }

    #[tokio::test]
    async fn test_line_split_across_chunks() {
        let lines = collect(vec![chunk(b"hel"), chunk(b"lo wor"), chunk(b"ld\nnext\n")]).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].as_ref().unwrap(), "hello world");
        assert_eq!(lines[1].as_ref().unwrap(), "next");
    }

    #[tokio::test]
    async fn test_crlf_lines() {
        let lines = collect(vec![chunk(b"data: one\r\ndata: two\r\n")]).await;
        assert_eq!(lines[0].as_ref().unwrap(), "data: one");
        assert_eq!(lines[1].as_ref().unwrap(), "data: two");
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        let lines = collect(vec![chunk(b"complete\n"), chunk(b"unterminated")]).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].as_ref().unwrap(), "unterminated");
    }

    #[tokio::test]
    async fn test_utf8_split_across_chunks() {
        // Euro sign is three bytes in UTF-8: E2 82 AC
        let euro = "€".as_bytes();
        let lines = collect(vec![
            bytes::Bytes::from([b"price: ".as_slice(), &euro[..2]].concat()),
            bytes::Bytes::from([&euro[2..], b"100\n".as_slice()].concat()),
        ])
        .await;
        assert_eq!(lines[0].as_ref().unwrap(), "price: €100");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_an_error() {
        let lines = collect(vec![chunk(b"ok\n\xff\xfe broken\n")]).await;
        assert!(lines[0].is_ok());
        assert!(matches!(lines[1], Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn test_empty_lines_are_preserved() {
        // SSE keep-alives show up as blank lines; decoders skip them.
        let lines = collect(vec![chunk(b"data: x\n\ndata: y\n")]).await;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].as_ref().unwrap(), "");
    }
}
