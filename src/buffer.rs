//! Bounded byte streams used as the source and sink of the codec.
//!
//! [`ReadStream`] is a cursor over a borrowed buffer whose logical end can be
//! temporarily clamped. Nested length-delimited messages are decoded by
//! clamping the end to the nested payload, decoding, then restoring it, so no
//! sub-buffer is ever allocated. [`WriteStream`] is a cursor over a
//! fixed-size, caller provided buffer.
//!
//! Both implement the `bytes` traits, [`bytes::Buf`] and [`bytes::BufMut`]
//! respectively, so every primitive in [`crate::wire`] and [`crate::leb128`]
//! works on them directly.

use bytes::buf::UninitSlice;

use crate::error::DecodeError;
use crate::util::unlikely;

/// Default maximum number of nested length-delimited messages.
pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// Read cursor over an in-memory buffer with a clampable logical end.
///
/// Invariant: `pos <= limit <= buf.len()`.
#[derive(Debug, Clone)]
pub struct ReadStream<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Logical end of the stream, reads never go past it.
    limit: usize,
    /// Current number of nested messages being decoded.
    depth: u32,
    recursion_limit: u32,
}

static_assertions::assert_impl_all!(ReadStream<'static>: Send, Sync);

impl<'a> ReadStream<'a> {
    /// Creates a stream over the whole of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        ReadStream {
            buf,
            pos: 0,
            limit: buf.len(),
            depth: 0,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Creates a stream over the first `len` bytes of `buf`.
    ///
    /// Fails if `buf` holds fewer than `len` bytes.
    pub fn with_len(buf: &'a [u8], len: usize) -> Result<Self, DecodeError> {
        if unlikely(len > buf.len()) {
            return Err(DecodeError::truncated(len, buf.len()));
        }
        let mut stream = ReadStream::new(buf);
        stream.limit = len;
        Ok(stream)
    }

    /// Sets the maximum number of nested messages this stream will decode.
    pub fn with_recursion_limit(mut self, recursion_limit: u32) -> Self {
        self.recursion_limit = recursion_limit;
        self
    }

    /// Current read position, as an offset from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Current logical length of the stream.
    #[inline]
    pub fn len(&self) -> usize {
        self.limit
    }

    /// Returns `true` if the stream has nothing left to read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.limit
    }

    /// Moves the logical end of the stream.
    ///
    /// Only used to restore a length saved by [`ReadStream::push_limit`], or to
    /// shrink the stream. The end can never move before the read position or
    /// past the real buffer.
    ///
    /// # Panics
    ///
    /// If `len` is before the current position or past the end of the buffer.
    #[inline]
    pub fn set_len(&mut self, len: usize) {
        assert!(
            self.pos <= len && len <= self.buf.len(),
            "logical length {len} outside of [{}, {}]",
            self.pos,
            self.buf.len()
        );
        self.limit = len;
    }

    /// Reads a single byte, returning `None` once the logical end is reached.
    ///
    /// Running out of bytes is not an error here: between fields it simply
    /// means the message is complete.
    #[inline]
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.pos < self.limit {
            let byte = self.buf[self.pos];
            self.pos += 1;
            Some(byte)
        } else {
            None
        }
    }

    /// Reads exactly `len` bytes.
    #[inline]
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.limit - self.pos;
        if unlikely(len > remaining) {
            return Err(DecodeError::truncated(len, remaining));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Clamps the logical end to the next `len` bytes, returning the previous
    /// length so it can be restored with [`ReadStream::pop_limit`].
    #[inline]
    pub fn push_limit(&mut self, len: usize) -> Result<usize, DecodeError> {
        let remaining = self.limit - self.pos;
        if unlikely(len > remaining) {
            return Err(DecodeError::truncated(len, remaining));
        }
        let saved = self.limit;
        self.limit = self.pos + len;
        Ok(saved)
    }

    /// Restores a logical length returned by [`ReadStream::push_limit`].
    #[inline]
    pub fn pop_limit(&mut self, saved: usize) {
        self.set_len(saved);
    }

    /// Records that a nested message is being entered.
    #[inline]
    pub(crate) fn enter_nested(&mut self) -> Result<(), DecodeError> {
        if unlikely(self.depth >= self.recursion_limit) {
            return Err(DecodeError::RecursionLimitExceeded {
                limit: self.recursion_limit,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Records that a nested message was left.
    #[inline]
    pub(crate) fn exit_nested(&mut self) {
        self.depth -= 1;
    }
}

impl bytes::Buf for ReadStream<'_> {
    #[inline]
    fn remaining(&self) -> usize {
        self.limit - self.pos
    }

    #[inline]
    fn chunk(&self) -> &[u8] {
        &self.buf[self.pos..self.limit]
    }

    #[inline]
    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.remaining(),
            "cannot advance past the logical end of the stream"
        );
        self.pos += cnt;
    }
}

/// Write cursor over a fixed-size, caller provided buffer.
///
/// The buffer never grows. Encoding checks the full encoded size against
/// [`bytes::BufMut::remaining_mut`] before writing anything.
#[derive(Debug)]
pub struct WriteStream<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WriteStream<'a> {
    /// Creates a stream that writes from the start of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        WriteStream { buf, pos: 0 }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total capacity of the underlying buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Writes a single byte, returning `false` if the buffer is full.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) -> bool {
        if self.pos < self.buf.len() {
            self.buf[self.pos] = byte;
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Writes as much of `slice` as fits, returning how many bytes were written.
    #[inline]
    pub fn write(&mut self, slice: &[u8]) -> usize {
        let write_len = slice.len().min(self.buf.len() - self.pos);
        self.buf[self.pos..self.pos + write_len].copy_from_slice(&slice[..write_len]);
        self.pos += write_len;
        write_len
    }

    /// The bytes written so far.
    #[inline]
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

// SAFETY: `chunk_mut` only ever hands out the unwritten tail of an initialized
// buffer, and `advance_mut` never moves past its end.
unsafe impl bytes::BufMut for WriteStream<'_> {
    #[inline]
    fn remaining_mut(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    unsafe fn advance_mut(&mut self, cnt: usize) {
        assert!(
            cnt <= self.remaining_mut(),
            "cannot advance past the end of the buffer"
        );
        self.pos += cnt;
    }

    #[inline]
    fn chunk_mut(&mut self) -> &mut UninitSlice {
        UninitSlice::new(&mut self.buf[self.pos..])
    }
}
