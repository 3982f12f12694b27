#[cfg(test)]
use std::collections::VecDeque;
use std::fmt::{self, Display};

use bytes::Bytes;
use reqwest::Response;

/// Failure while reading the response body.
#[derive(Debug, PartialEq, Eq)]
pub struct Error(String);

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to read the response body: {}", self.0)
    }
}

/// Reads a response body chunk by chunk.
pub enum ChunkReader {
    Response(Response),
    #[cfg(test)]
    Buffered(VecDeque<Bytes>),
}

impl ChunkReader {
    #[inline]
    pub fn from_response(response: Response) -> Self {
        Self::Response(response)
    }

    #[cfg(test)]
    pub fn from_chunks<I: IntoIterator<Item = Bytes>>(chunks: I) -> Self {
        Self::Buffered(chunks.into_iter().collect())
    }

    /// Returns the next chunk, or `None` at the end of the body.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            Self::Response(response) => response
                .chunk()
                .await
                .map_err(|err| Error(err.to_string())),
            #[cfg(test)]
            Self::Buffered(chunks) => Ok(chunks.pop_front()),
        }
    }
}
