//! Unsigned varint field values.

use super::{DecodeValue, EncodeValue, WireValue};
use crate::buffer::ReadStream;
use crate::error::DecodeError;
use crate::leb128::LebCodec;
use crate::wire::WireType;

impl WireValue for u64 {
    const WIRE_TYPE: WireType = WireType::Varint;
}

impl DecodeValue for u64 {
    #[inline]
    fn decode_into(stream: &mut ReadStream<'_>, dst: &mut Self) -> Result<(), DecodeError> {
        *dst = u64::decode_leb128_buf(stream)?.0;
        Ok(())
    }
}

impl EncodeValue for u64 {
    #[inline]
    fn encode_value<B: bytes::BufMut + ?Sized>(&self, buf: &mut B) {
        self.encode_leb128(buf);
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        self.encoded_leb128_len()
    }
}

impl WireValue for u32 {
    const WIRE_TYPE: WireType = WireType::Varint;
}

impl DecodeValue for u32 {
    #[inline]
    fn decode_into(stream: &mut ReadStream<'_>, dst: &mut Self) -> Result<(), DecodeError> {
        // Read the full 64-bit varint and narrow it, high bits are discarded.
        let (value, _) = u64::decode_leb128_buf(stream)?;
        #[allow(clippy::as_conversions)]
        {
            *dst = value as u32;
        }
        Ok(())
    }
}

impl EncodeValue for u32 {
    #[inline]
    fn encode_value<B: bytes::BufMut + ?Sized>(&self, buf: &mut B) {
        self.encode_leb128(buf);
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        self.encoded_leb128_len()
    }
}
