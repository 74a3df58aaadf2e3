//! Optional field values. `None` is absent on the wire.

use super::{DecodeValue, EncodeValue, WireValue};
use crate::buffer::ReadStream;
use crate::error::DecodeError;
use crate::wire::WireType;

impl<T: WireValue> WireValue for Option<T> {
    const WIRE_TYPE: WireType = T::WIRE_TYPE;
}

impl<T: DecodeValue> DecodeValue for Option<T> {
    #[inline]
    fn decode_into(stream: &mut ReadStream<'_>, dst: &mut Self) -> Result<(), DecodeError> {
        let mut value = T::default();
        T::decode_into(stream, &mut value)?;
        *dst = Some(value);
        Ok(())
    }
}

impl<T: EncodeValue> EncodeValue for Option<T> {
    #[inline]
    fn encode_value<B: bytes::BufMut + ?Sized>(&self, buf: &mut B) {
        if let Some(value) = self {
            value.encode_value(buf);
        }
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        match self {
            Some(value) => value.encoded_len(),
            None => 0,
        }
    }
}
