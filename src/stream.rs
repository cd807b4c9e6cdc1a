//! The body-stream collaborator contract (`spec.md` §4.6, §6).
//!
//! `Stream` is deliberately small: one read, one seek, and a status probe.
//! Two concrete variants exist in this crate — [`CursorStream`] for bodies a
//! caller already holds in memory, and [`crate::tee::TeeBranch`] for bodies
//! read once and then re-read by a transport layer. External crates may
//! implement `Stream` for their own body types (e.g. a wrapper around an
//! HTTP client's chunked body) without this crate knowing about them.

use bytes::Bytes;

use crate::error::StreamError;

/// Where a [`Stream::seek`] measures its offset from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    Start(u64),
    End(i64),
    Current(i64),
}

/// A snapshot of a stream's seek/length capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamStatus {
    pub seekable: bool,
    pub known_length: Option<u64>,
    pub at_eof: bool,
}

/// A forward-readable, possibly-seekable byte source.
pub trait Stream {
    /// Read up to `buf.len()` bytes, returning the number written. Zero
    /// means EOF.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// Seek to an absolute or relative position.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError>;

    /// Current seekability/length/EOF status.
    fn status(&self) -> StreamStatus;

    /// Total length, if known without draining the stream.
    fn length(&self) -> Option<u64> {
        self.status().known_length
    }

    /// Returns `Some(branch)` if this stream is backed by a tee and a fresh,
    /// independent reader over the same buffered source can be created
    /// without re-wrapping. The default (for non-tee streams) is `None`.
    ///
    /// This is the concrete form of `is_tee(stream)` from `spec.md` §4.6:
    /// rather than a free function that inspects an opaque handle, the
    /// capability lives on the trait itself, which is the idiomatic Rust
    /// shape for a may-or-may-not-support-this-operation query.
    fn try_new_branch(&self) -> Option<Box<dyn Stream>> {
        None
    }
}

/// Returns `true` if `stream` is backed by a tee (i.e. a further branch can
/// be created from it without installing a new tee).
pub fn is_tee(stream: &dyn Stream) -> bool {
    stream.try_new_branch().is_some()
}

/// An in-memory, fully-buffered body. Always seekable; length always known.
pub struct CursorStream {
    data: Bytes,
    pos: usize,
}

impl CursorStream {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    pub fn empty() -> Self {
        Self::new(Bytes::new())
    }
}

impl Stream for CursorStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        let len = self.data.len() as i64;
        let target = match pos {
            SeekFrom::Start(p) => p as i64,
            SeekFrom::End(delta) => len + delta,
            SeekFrom::Current(delta) => self.pos as i64 + delta,
        };
        if target < 0 {
            return Err(StreamError::InvalidSeek);
        }
        self.pos = (target as usize).min(self.data.len());
        Ok(self.pos as u64)
    }

    fn status(&self) -> StreamStatus {
        StreamStatus {
            seekable: true,
            known_length: Some(self.data.len() as u64),
            at_eof: self.pos >= self.data.len(),
        }
    }
}
