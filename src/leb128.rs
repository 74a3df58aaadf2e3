//! LEB128 variable-length integer encoding/decoding.
//!
//! Values are split into 7-bit groups, least-significant group first. Every
//! byte except the last has its most significant bit set to signal that more
//! bytes follow.

// This module uses `as` casts which have been thoroughly reviewed for correctness.
#![allow(clippy::as_conversions)]

use crate::error::DecodeError;
use crate::util::{likely, unlikely};

/// Types that can be encoded to and decoded from a LEB128 varint.
pub trait LebCodec: Sized + Copy {
    /// Maximum number of bytes an encoded value of this type can span.
    const MAX_LEB_BYTES: usize;

    /// Decode a varint from the front of `data`.
    ///
    /// Returns the decoded value and the number of bytes it spanned. Fails with
    /// [`DecodeError::MalformedVarint`] if `data` ends before the final byte,
    /// if no final byte is found within [`LebCodec::MAX_LEB_BYTES`], or if the
    /// value overflows `Self`.
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError>;

    /// Decode a varint from `buf`, advancing it past the consumed bytes.
    #[inline]
    fn decode_leb128_buf<B: bytes::Buf + ?Sized>(
        buf: &mut B,
    ) -> Result<(Self, usize), DecodeError> {
        let chunk = buf.chunk();
        let chunk_len = chunk.len();

        // Fast path: the varint is entirely contained in the current chunk.
        match Self::decode_leb128(chunk) {
            Ok((value, bytes_read)) => {
                buf.advance(bytes_read);
                return Ok((value, bytes_read));
            }
            Err(err) if chunk_len >= Self::MAX_LEB_BYTES || chunk_len == buf.remaining() => {
                return Err(err);
            }
            Err(_) => (),
        }

        // Slow path: the varint straddles chunks, read byte by byte.
        let mut scratch = [0u8; 16];
        for i in 0..Self::MAX_LEB_BYTES {
            if unlikely(!buf.has_remaining()) {
                return Err(DecodeError::MalformedVarint);
            }
            scratch[i] = buf.get_u8();
            if scratch[i] < 0x80 {
                return Self::decode_leb128(&scratch[..=i]);
            }
        }
        Err(DecodeError::MalformedVarint)
    }

    /// Encode `self` into `buf`, returning the number of bytes written.
    fn encode_leb128<B: bytes::BufMut + ?Sized>(self, buf: &mut B) -> usize;

    /// The number of bytes [`LebCodec::encode_leb128`] would write.
    fn encoded_leb128_len(self) -> usize;
}

macro_rules! impl_leb_codec {
    ($ty:ty, $max_bytes:literal) => {
        impl LebCodec for $ty {
            const MAX_LEB_BYTES: usize = $max_bytes;

            #[inline]
            fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError> {
                // Number of payload bits the final byte may carry.
                const LAST_BYTE_BITS: u32 = <$ty>::BITS - 7 * ($max_bytes - 1);

                // Most values on the wire are small, single byte is the hot path.
                if let Some(&first) = data.first() {
                    if likely(first < 0x80) {
                        return Ok((<$ty>::from(first), 1));
                    }
                }

                let mut value: $ty = 0;
                for (i, &byte) in data.iter().take($max_bytes).enumerate() {
                    if unlikely(i == $max_bytes - 1 && byte >= (1u8 << LAST_BYTE_BITS)) {
                        // Either no terminator within the maximum length, or
                        // the value overflows the target type.
                        return Err(DecodeError::MalformedVarint);
                    }
                    value |= <$ty>::from(byte & 0x7f) << (7 * i);
                    if byte < 0x80 {
                        return Ok((value, i + 1));
                    }
                }

                // Ran out of input before finding the final byte.
                Err(DecodeError::MalformedVarint)
            }

            #[inline]
            fn encode_leb128<B: bytes::BufMut + ?Sized>(self, buf: &mut B) -> usize {
                let mut value = self;
                let mut written = 1;
                while value >= 0x80 {
                    buf.put_u8((value as u8) | 0x80);
                    value >>= 7;
                    written += 1;
                }
                buf.put_u8(value as u8);
                written
            }

            /// LEB128 encodes 7 bits per byte, so the length is
            /// `ceil(significant_bits / 7)` with a minimum of one byte for zero.
            #[inline]
            fn encoded_leb128_len(self) -> usize {
                let significant_bits = <$ty>::BITS - (self | 1).leading_zeros();
                ((significant_bits + 6) / 7) as usize
            }
        }
    };
}

impl_leb_codec!(u64, 10);
impl_leb_codec!(u32, 5);
