//! Length-delimited field values (strings and byte blobs).

use super::{DecodeValue, EncodeValue, WireValue};
use crate::buffer::ReadStream;
use crate::error::DecodeError;
use crate::wire::{self, WireType};

impl WireValue for bytes::Bytes {
    const WIRE_TYPE: WireType = WireType::Len;
}

impl DecodeValue for bytes::Bytes {
    #[inline]
    fn decode_into(stream: &mut ReadStream<'_>, dst: &mut Self) -> Result<(), DecodeError> {
        let len = wire::decode_len(stream)?;
        *dst = bytes::Bytes::copy_from_slice(stream.read_slice(len)?);
        Ok(())
    }
}

impl EncodeValue for bytes::Bytes {
    #[inline]
    fn encode_value<B: bytes::BufMut + ?Sized>(&self, buf: &mut B) {
        wire::encode_len(self.len(), buf);
        buf.put_slice(self);
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        wire::encoded_len_len(self.len()) + self.len()
    }
}

impl WireValue for String {
    const WIRE_TYPE: WireType = WireType::Len;
}

impl DecodeValue for String {
    #[inline]
    fn decode_into(stream: &mut ReadStream<'_>, dst: &mut Self) -> Result<(), DecodeError> {
        let len = wire::decode_len(stream)?;
        let data = stream.read_slice(len)?;
        let value = core::str::from_utf8(data).map_err(|_| DecodeError::InvalidUtf8)?;

        // A field can show up multiple times in a payload, reuse the allocation.
        dst.clear();
        dst.push_str(value);
        Ok(())
    }
}

impl EncodeValue for String {
    #[inline]
    fn encode_value<B: bytes::BufMut + ?Sized>(&self, buf: &mut B) {
        wire::encode_len(self.len(), buf);
        buf.put_slice(self.as_bytes());
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        wire::encoded_len_len(self.len()) + self.len()
    }
}
