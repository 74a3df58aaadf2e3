//! Message-level types and helpers.

use bytes::{BufMut, Bytes, BytesMut};

use super::{DecodeValue, EncodeValue, WireValue};
use crate::buffer::ReadStream;
use crate::descriptor::MessageDescriptor;
use crate::error::{DecodeError, EncodeError};
use crate::util::unlikely;
use crate::wire::{self, WireType};

/// Trait for packet types.
///
/// Implementors only supply a [`MessageDescriptor`], usually through
/// `#[derive(Packet)]`. Decoding, encoding and sizing are all driven by the
/// descriptor through the provided methods.
///
/// Decoding is all-or-nothing: on error no partially decoded packet is
/// returned. Encoding never writes a partial packet either, capacity is
/// checked up front.
pub trait Message: Default + Sized + 'static {
    /// Field table for this packet type.
    const DESCRIPTOR: MessageDescriptor<Self>;

    /// Decode a packet from the whole of `buf`.
    fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_from(&mut ReadStream::new(buf))
    }

    /// Decode a packet from the remaining bytes of `stream`.
    ///
    /// Reads until the logical end of `stream`. Fields with unknown numbers
    /// are skipped.
    fn decode_from(stream: &mut ReadStream<'_>) -> Result<Self, DecodeError> {
        let mut msg = Self::default();
        match Self::DESCRIPTOR.merge(&mut msg, stream) {
            Ok(()) => Ok(msg),
            Err(err) => {
                tracing::debug!(packet = Self::DESCRIPTOR.name, %err, "failed to decode packet");
                Err(err)
            }
        }
    }

    /// Decode a length-prefixed packet from the front of `stream`.
    fn decode_length_delimited(stream: &mut ReadStream<'_>) -> Result<Self, DecodeError> {
        let mut msg = Self::default();
        Self::decode_length_delimited_into(stream, &mut msg)?;
        Ok(msg)
    }

    /// Decode a length-prefixed packet from the front of `stream` into `dst`.
    ///
    /// `dst` is reset to its default before decoding, and again if decoding
    /// fails. The stream's logical end is restored afterwards, so sibling
    /// fields following the nested packet are read normally.
    fn decode_length_delimited_into(
        stream: &mut ReadStream<'_>,
        dst: &mut Self,
    ) -> Result<(), DecodeError> {
        *dst = Self::default();
        let result = merge_length_delimited(stream, dst);
        if result.is_err() {
            *dst = Self::default();
        }
        result
    }

    /// Encode this packet into `buf`, without a length prefix.
    ///
    /// Fails without writing anything if `buf` cannot hold the whole packet.
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<(), EncodeError> {
        let required = self.compute_size();
        check_capacity::<Self>(required, buf.remaining_mut())?;
        Self::DESCRIPTOR.encode(self, buf);
        Ok(())
    }

    /// Returns the number of bytes [`Message::encode`] will write.
    ///
    /// Default-valued fields contribute nothing, so a packet with every field
    /// at its default has a size of zero.
    fn compute_size(&self) -> usize {
        Self::DESCRIPTOR.encoded_len(self)
    }

    /// Encode this packet with a length prefix of `size`, which must be the
    /// value returned by [`Message::compute_size`].
    ///
    /// # Panics
    ///
    /// Panics if the number of bytes written for the body differs from `size`.
    fn encode_with_size<B: BufMut>(&self, size: usize, buf: &mut B) -> Result<(), EncodeError> {
        check_capacity::<Self>(wire::encoded_len_len(size) + size, buf.remaining_mut())?;
        write_with_size(self, size, buf);
        Ok(())
    }

    /// Encode this packet into a freshly allocated buffer.
    fn encode_to_bytes(&self) -> Bytes {
        let size = self.compute_size();
        let mut buf = BytesMut::with_capacity(size);
        Self::DESCRIPTOR.encode(self, &mut buf);
        buf.freeze()
    }

    /// Encode this packet into `buf` with a length prefix.
    fn encode_length_delimited<B: BufMut>(&self, buf: &mut B) -> Result<(), EncodeError> {
        let body = self.encode_to_bytes();
        check_capacity::<Self>(
            wire::encoded_len_len(body.len()) + body.len(),
            buf.remaining_mut(),
        )?;
        wire::encode_len(body.len(), buf);
        buf.put_slice(&body);
        Ok(())
    }
}

/// Reads a length prefix and merges that many bytes of `stream` into `dst`.
fn merge_length_delimited<M: Message>(
    stream: &mut ReadStream<'_>,
    dst: &mut M,
) -> Result<(), DecodeError> {
    let len = wire::decode_len(stream)?;
    let saved = stream.push_limit(len)?;
    if let Err(err) = stream.enter_nested() {
        stream.pop_limit(saved);
        return Err(err);
    }

    let result = M::DESCRIPTOR.merge(dst, stream);

    stream.exit_nested();
    stream.pop_limit(saved);
    result
}

#[inline]
fn check_capacity<M: Message>(required: usize, remaining: usize) -> Result<(), EncodeError> {
    if unlikely(required > remaining) {
        tracing::debug!(
            packet = M::DESCRIPTOR.name,
            required,
            remaining,
            "insufficient capacity to encode packet"
        );
        return Err(EncodeError::InsufficientCapacity {
            required,
            remaining,
        });
    }
    Ok(())
}

/// Writes `size` as a length prefix followed by the body of `msg`.
fn write_with_size<M: Message, B: BufMut + ?Sized>(msg: &M, size: usize, mut buf: &mut B) {
    wire::encode_len(size, buf);
    let before = buf.remaining_mut();
    M::DESCRIPTOR.encode(msg, &mut buf);
    let written = before - buf.remaining_mut();
    assert_eq!(
        written,
        size,
        "`{}` wrote a different number of bytes than its computed size",
        M::DESCRIPTOR.name
    );
}

impl<M: Message> WireValue for M {
    const WIRE_TYPE: WireType = WireType::Len;
}

impl<M: Message> DecodeValue for M {
    #[inline]
    fn decode_into(stream: &mut ReadStream<'_>, dst: &mut Self) -> Result<(), DecodeError> {
        M::decode_length_delimited_into(stream, dst)
    }
}

// Sizes are not cached, so every nesting level recomputes the size of the
// packets below it. Encoding a chain of depth `d` costs O(n * d), bounded in
// practice by the decoder's recursion limit.
impl<M: Message> EncodeValue for M {
    #[inline]
    fn encode_value<B: BufMut + ?Sized>(&self, buf: &mut B) {
        write_with_size(self, self.compute_size(), buf);
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        let size = self.compute_size();
        wire::encoded_len_len(size) + size
    }
}
