use std::fmt::{self, Debug};
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};

use crate::Error;

type BoxedChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// An open response body delivered as a sequence of byte chunks.
///
/// Chunks are raw bytes: a multi-byte character may be split across two
/// chunks, so consumers must decode incrementally. Exhaustion of the
/// stream is the only completion signal.
pub struct ChatStream {
    inner: BoxedChunkStream,
}

impl ChatStream {
    /// Wraps any stream of byte chunks.
    #[inline]
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, Error>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Creates a stream that yields the given chunks and then ends.
    #[inline]
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::new(stream::iter(chunks.into_iter().map(Ok)))
    }

    /// Pulls the next chunk.
    ///
    /// Returns `Ok(None)` once the body is exhausted.
    #[inline]
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        self.inner.next().await.transpose()
    }
}

impl Debug for ChatStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatStream").finish_non_exhaustive()
    }
}
