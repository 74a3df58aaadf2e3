//! Encoding and decoding of individual field values.

mod default_check;
mod delimited;
mod message;
mod optional;
mod repeated;
mod scalar;

use crate::buffer::ReadStream;
use crate::error::DecodeError;
use crate::wire::WireType;

pub use default_check::IsWireDefault;
pub use message::Message;
pub use repeated::Repeated;

/// A type that can appear as a field value on the wire.
pub trait WireValue {
    /// The wire type this value is encoded with.
    const WIRE_TYPE: WireType;
}

/// A field value that can be decoded from the wire.
///
/// `decode_into` overwrites `dst`, so for a field that appears more than
/// once the last occurrence wins. Repeated fields append instead, see
/// [`crate::descriptor::RepeatedField`].
pub trait DecodeValue: WireValue + Default {
    /// Decode one value from the front of `stream` into `dst`.
    fn decode_into(stream: &mut ReadStream<'_>, dst: &mut Self) -> Result<(), DecodeError>;
}

/// A field value that can be encoded to the wire.
pub trait EncodeValue: WireValue {
    /// Encode this value, without its field key.
    fn encode_value<B: bytes::BufMut + ?Sized>(&self, buf: &mut B);

    /// Returns the encoded length of this value, not including its field key.
    fn encoded_len(&self) -> usize;
}
