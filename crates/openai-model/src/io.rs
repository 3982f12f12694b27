//! Byte-level plumbing for streamed responses.

mod chunks;
mod sse;

pub use chunks::{ChunkReader, Error as ChunkError};
pub use sse::Sse;
