//! The tee input stream (`spec.md` §4.6).
//!
//! Lets a single-pass source be read once (by the payload hasher) while
//! leaving a re-readable branch for the transport layer. Single-threaded
//! only — `spec.md` §5 guarantees the signer never shares a request across
//! threads during `sign_request`, so an `Rc<RefCell<_>>` is the right tool
//! here, not `Arc<Mutex<_>>`.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::BytesMut;

use crate::error::StreamError;
use crate::stream::{SeekFrom, Stream, StreamStatus};

struct TeeInner {
    source: Option<Box<dyn Stream>>,
    buffer: BytesMut,
    source_complete: bool,
    known_length: Option<u64>,
}

impl TeeInner {
    /// Pull from the source until `target` bytes are buffered or the source
    /// is exhausted. A no-op once `source_complete` is set.
    fn fill_to(&mut self, target: usize) -> Result<(), StreamError> {
        const CHUNK: usize = 8 * 1024;
        while !self.source_complete && self.buffer.len() < target {
            let source = self
                .source
                .as_mut()
                .expect("source dropped before source_complete was set");
            let start = self.buffer.len();
            self.buffer.resize(start + CHUNK, 0);
            let n = source.read(&mut self.buffer[start..start + CHUNK])?;
            self.buffer.truncate(start + n);
            if n == 0 {
                self.source_complete = true;
                self.known_length = Some(self.buffer.len() as u64);
                self.source = None;
            }
        }
        Ok(())
    }

    /// Drain the source to completion (used by seek-from-end when the
    /// length isn't already known; `spec.md` §4.6: "implementations may
    /// choose to eagerly drain in that case").
    fn drain_fully(&mut self) -> Result<(), StreamError> {
        self.fill_to(usize::MAX / 2)
    }
}

/// Owns a single-pass source and lets callers create any number of
/// independent, always-offset-zero reading branches over it.
pub struct Tee {
    inner: Rc<RefCell<TeeInner>>,
}

impl Tee {
    /// Wrap `source`, taking ownership of it. Use [`crate::stream::is_tee`]
    /// first if you want to avoid double-wrapping an already-teed stream.
    pub fn wrap(source: Box<dyn Stream>) -> Self {
        let known_length = source.length();
        tracing::debug!(known_length = ?known_length, "wrapping body stream in tee");
        Self {
            inner: Rc::new(RefCell::new(TeeInner {
                source: Some(source),
                buffer: BytesMut::new(),
                source_complete: false,
                known_length,
            })),
        }
    }

    /// Create a fresh branch, starting at offset 0. May be called any
    /// number of times, at any point in the tee's lifetime.
    pub fn new_branch(&self) -> TeeBranch {
        TeeBranch {
            inner: Rc::clone(&self.inner),
            cursor: 0,
        }
    }
}

/// An independent reader over a [`Tee`]'s buffered data.
///
/// Branches share the parent's buffer by a non-owning `Rc` clone — dropping
/// a branch never affects the parent or other branches.
pub struct TeeBranch {
    inner: Rc<RefCell<TeeInner>>,
    cursor: u64,
}

impl Stream for TeeBranch {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let mut inner = self.inner.borrow_mut();
        let cursor = self.cursor as usize;

        if cursor >= inner.buffer.len() && !inner.source_complete {
            inner.fill_to(cursor + buf.len().max(1))?;
        }

        let available = inner.buffer.len().saturating_sub(cursor);
        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&inner.buffer[cursor..cursor + n]);
        self.cursor += n as u64;
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        let mut inner = self.inner.borrow_mut();

        let target = match pos {
            SeekFrom::Start(p) => p as i64,
            SeekFrom::End(delta) => {
                if inner.known_length.is_none() {
                    inner.drain_fully()?;
                }
                let len = inner
                    .known_length
                    .expect("drain_fully sets known_length on completion")
                    as i64;
                len + delta
            }
            SeekFrom::Current(delta) => self.cursor as i64 + delta,
        };
        if target < 0 {
            return Err(StreamError::InvalidSeek);
        }
        let target = target as u64;

        // Pulling the source is only needed if we're seeking past what's
        // buffered so far; seeking backward never touches the source.
        if target > inner.buffer.len() as u64 && !inner.source_complete {
            inner.fill_to(target as usize)?;
        }

        self.cursor = target.min(inner.buffer.len() as u64);
        Ok(self.cursor)
    }

    fn status(&self) -> StreamStatus {
        let inner = self.inner.borrow();
        StreamStatus {
            seekable: true,
            known_length: inner.known_length,
            at_eof: inner.source_complete && self.cursor >= inner.buffer.len() as u64,
        }
    }

    fn try_new_branch(&self) -> Option<Box<dyn Stream>> {
        Some(Box::new(TeeBranch {
            inner: Rc::clone(&self.inner),
            cursor: 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::CursorStream;

    fn read_all(s: &mut dyn Stream) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 4];
        loop {
            let n = s.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn branch_reads_full_source_from_zero() {
        let tee = Tee::wrap(Box::new(CursorStream::new(&b"hello tee stream"[..])));
        let mut branch = tee.new_branch();
        assert_eq!(read_all(&mut branch), b"hello tee stream");
    }

    #[test]
    fn multiple_branches_are_independent() {
        let tee = Tee::wrap(Box::new(CursorStream::new(&b"abcdefgh"[..])));
        let mut b1 = tee.new_branch();
        let mut buf = [0u8; 3];
        assert_eq!(b1.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"abc");

        // A branch created afterward still starts at offset 0.
        let mut b2 = tee.new_branch();
        assert_eq!(read_all(&mut b2), b"abcdefgh");

        // b1's cursor was unaffected by b2's reads.
        assert_eq!(b1.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"def");
    }

    #[test]
    fn try_new_branch_detects_existing_tee() {
        let tee = Tee::wrap(Box::new(CursorStream::new(&b"x"[..])));
        let branch: Box<dyn Stream> = Box::new(tee.new_branch());
        assert!(crate::stream::is_tee(branch.as_ref()));
        let mut another = branch.try_new_branch().unwrap();
        assert_eq!(read_all(another.as_mut()), b"x");
    }

    #[test]
    fn seek_to_end_drains_unknown_length_source() {
        struct OneByteAtATime(Vec<u8>, usize);
        impl Stream for OneByteAtATime {
            fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
                if self.1 >= self.0.len() {
                    return Ok(0);
                }
                buf[0] = self.0[self.1];
                self.1 += 1;
                Ok(1)
            }
            fn seek(&mut self, _pos: SeekFrom) -> Result<u64, StreamError> {
                Err(StreamError::StreamNotSeekable)
            }
            fn status(&self) -> StreamStatus {
                StreamStatus {
                    seekable: false,
                    known_length: None,
                    at_eof: self.1 >= self.0.len(),
                }
            }
        }

        let tee = Tee::wrap(Box::new(OneByteAtATime(b"abcdef".to_vec(), 0)));
        let mut branch = tee.new_branch();
        let pos = branch.seek(SeekFrom::End(0)).unwrap();
        assert_eq!(pos, 6);
        assert_eq!(branch.status().known_length, Some(6));
    }

    #[test]
    fn negative_seek_is_rejected() {
        let tee = Tee::wrap(Box::new(CursorStream::new(&b"abc"[..])));
        let mut branch = tee.new_branch();
        assert!(matches!(
            branch.seek(SeekFrom::Current(-1)),
            Err(StreamError::InvalidSeek)
        ));
    }
}
