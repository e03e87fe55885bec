//! SSE (Server-Sent Events) relaying of an upstream line stream.
//!
//! Upstream bytes are split into lines and each non-empty line is re-emitted
//! as a `data: <line>\n\n` frame. The stream is lazy and one-shot: nothing is
//! read from upstream until the client side polls for the next frame.

use std::io;

use bytes::{Buf, Bytes, BytesMut};
use futures::stream::{Stream, TryStreamExt};
use tokio_util::codec::{Decoder, FramedRead};
use tokio_util::io::StreamReader;

/// Splits upstream bytes into lines ending at `\r`, `\n` or `\r\n`.
///
/// A line is yielded as soon as its terminator arrives. `\r\n` therefore
/// produces the line followed by an empty one, which the relay skips anyway.
#[derive(Debug, Default, Clone, Copy)]
pub struct UpstreamLineCodec {
    // Bytes of `buf` already scanned without finding a terminator.
    next_index: usize,
}

impl UpstreamLineCodec {
    fn take_line(&mut self, buf: &mut BytesMut, len: usize) -> io::Result<String> {
        self.next_index = 0;
        let line = buf.split_to(len);
        String::from_utf8(line.to_vec())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Decoder for UpstreamLineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<String>> {
        let terminator = buf[self.next_index..]
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r');

        match terminator {
            Some(offset) => {
                let end = self.next_index + offset;
                let line = self.take_line(buf, end)?;
                buf.advance(1);
                Ok(Some(line))
            }
            None => {
                self.next_index = buf.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> io::Result<Option<String>> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        let len = buf.len();
        self.take_line(buf, len).map(Some)
    }
}

/// Wrap one upstream line as an SSE data frame.
pub fn data_frame(line: &str) -> Bytes {
    Bytes::from(format!("data: {line}\n\n"))
}

/// Convert a stream of upstream body chunks into SSE data frames.
///
/// Lines end at `\r`, `\n` or `\r\n`; a final unterminated line is still
/// emitted. Empty lines are skipped. An upstream read error ends the
/// stream with that error, which aborts the response body.
pub fn line_stream_to_sse<S, E>(chunks: S) -> impl Stream<Item = io::Result<Bytes>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let reader = StreamReader::new(chunks.map_err(io::Error::other));

    FramedRead::new(reader, UpstreamLineCodec::default())
        .try_filter(|line| futures::future::ready(!line.is_empty()))
        .map_ok(|line| data_frame(&line))
}
