use std::fmt::{self, Display};

use super::{ChunkError, ChunkReader};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Chunk(ChunkError),
    InvalidPayload,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Chunk(err) => err.fmt(f),
            Error::InvalidPayload => write!(f, "invalid server-sent event"),
        }
    }
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced. Comments and every other field are
/// skipped, and an event without data yields nothing.
pub struct Sse {
    buf: Vec<u8>,
    chunks: ChunkReader,
    eof: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: ChunkReader) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
            eof: false,
        }
    }

    /// Returns the data of the next event, or `None` once the stream has
    /// ended. A trailing event without its blank line is dropped.
    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            if let Some(data) = self.try_parse_event()? {
                return Ok(Some(data));
            }
            if self.eof {
                return Ok(None);
            }
            // Bytes are buffered raw, since a chunk boundary may split a
            // multi-byte character.
            match self.chunks.next_chunk().await.map_err(Error::Chunk)? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.eof = true,
            }
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        while let Some((end, terminator_len)) = find_event_end(&self.buf) {
            let block: Vec<u8> =
                self.buf.drain(..end + terminator_len).collect();
            let block = str::from_utf8(&block[..end])
                .map_err(|_| Error::InvalidPayload)?;

            let mut data_lines = Vec::new();
            for line in block.lines() {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (field, value) = match line.split_once(':') {
                    Some((field, value)) => {
                        (field, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                if field == "data" {
                    data_lines.push(value);
                }
            }
            if !data_lines.is_empty() {
                return Ok(Some(data_lines.join("\n")));
            }
        }
        Ok(None)
    }
}

/// Finds the first blank line, returning its offset and length.
fn find_event_end(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buf, b"\n\n").map(|idx| (idx, 2));
    let crlf = find(buf, b"\r\n\r\n").map(|idx| (idx, 4));
    match (lf, crlf) {
        (Some(lf), Some(crlf)) => Some(if lf.0 <= crlf.0 { lf } else { crlf }),
        (lf, crlf) => lf.or(crlf),
    }
}

#[inline]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
