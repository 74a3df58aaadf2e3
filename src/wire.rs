//! Wire format primitives: field keys, length prefixes and skipping.
//!
//! An encoded packet is a series of records, each a key followed by a value.
//! The key is the varint `(field_number << 3) | wire_type`.

use crate::error::{DecodeError, InvalidTagReason};
use crate::leb128::LebCodec;
use crate::util::{likely, unlikely, CastFrom};

/// Minimum value of a field number. Zero is reserved and never valid on the wire.
pub const MINIMUM_FIELD_NUMBER: u32 = 1;
/// Maximum value of a field number.
pub const MAXIMUM_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// A decoded field key: a field number and the [`WireType`] of its value.
///
/// Stored as the raw key value. The maximum key, `(2^29 - 1) << 3 | 7`, is
/// exactly `u32::MAX`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FieldKey(u32);

#[allow(clippy::as_conversions)]
impl FieldKey {
    /// Packs a field number and wire type into a key.
    ///
    /// # Panics
    ///
    /// If `field_number` is outside `MINIMUM_FIELD_NUMBER..=MAXIMUM_FIELD_NUMBER`.
    #[inline(always)]
    pub const fn new(field_number: u32, wire_type: WireType) -> Self {
        assert!(field_number >= MINIMUM_FIELD_NUMBER && field_number <= MAXIMUM_FIELD_NUMBER);
        FieldKey((field_number << 3) | wire_type.into_val() as u32)
    }

    /// Unpacks a raw key value, validating the wire type and field number.
    #[inline(always)]
    pub fn try_from_raw(raw_key: u64) -> Result<Self, DecodeError> {
        let wire_type = WireType::try_from_val((raw_key & 0b111) as u8)?;

        let field_number = raw_key >> 3;
        if unlikely(field_number == 0) {
            return Err(DecodeError::invalid_tag(InvalidTagReason::ZeroFieldNumber));
        }
        if unlikely(field_number > u64::from(MAXIMUM_FIELD_NUMBER)) {
            return Err(DecodeError::invalid_tag(
                InvalidTagReason::FieldNumberTooLarge,
            ));
        }

        Ok(FieldKey::new(field_number as u32, wire_type))
    }

    /// Returns the field number component of this key.
    #[inline(always)]
    pub const fn field_number(self) -> u32 {
        self.0 >> 3
    }

    /// Returns the [`WireType`] component of this key.
    #[inline(always)]
    pub const fn wire_type(self) -> WireType {
        match self.0 & 0b111 {
            0 => WireType::Varint,
            1 => WireType::I64,
            2 => WireType::Len,
            3 => WireType::SGroup,
            4 => WireType::EGroup,
            _ => WireType::I32,
        }
    }

    /// Decomposes this key into its field number and [`WireType`].
    #[inline(always)]
    pub const fn into_parts(self) -> (u32, WireType) {
        (self.field_number(), self.wire_type())
    }

    /// Returns the raw key value as it is varint encoded on the wire.
    #[inline(always)]
    pub const fn into_raw(self) -> u32 {
        self.0
    }
}

impl core::fmt::Debug for FieldKey {
    #[cold]
    #[inline(never)]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldKey")
            .field("field_number", &self.field_number())
            .field("wire_type", &self.wire_type())
            .finish()
    }
}

/// Encodes a field key for `field_number` and `wire_type`.
///
/// Called for every field of every packet we encode.
#[inline(always)]
pub fn encode_key<B: bytes::BufMut + ?Sized>(wire_type: WireType, field_number: u32, buf: &mut B) {
    FieldKey::new(field_number, wire_type)
        .into_raw()
        .encode_leb128(buf);
}

/// Returns the encoded length of a field key.
#[inline(always)]
pub fn encoded_key_len(field_number: u32) -> usize {
    // The wire type occupies the low three bits and never changes the length.
    (field_number << 3).encoded_leb128_len()
}

/// Finishes reading a key whose first byte the caller already consumed.
///
/// The decode loop reads one byte up front to tell "no more data" apart from
/// "a key follows". If that byte has its continuation bit set the remaining
/// key bytes are read from `buf` and combined with it.
#[inline]
pub fn read_key<B: bytes::Buf + ?Sized>(first_byte: u8, buf: &mut B) -> Result<FieldKey, DecodeError> {
    if likely(first_byte < 0x80) {
        return FieldKey::try_from_raw(u64::from(first_byte));
    }

    // The first byte already counts towards the varint length limit.
    let (rest, len) = u64::decode_leb128_buf(buf)?;
    if unlikely(len >= u64::MAX_LEB_BYTES || rest > u64::MAX >> 7) {
        return Err(DecodeError::MalformedVarint);
    }
    let raw = (rest << 7) | u64::from(first_byte & 0x7f);
    FieldKey::try_from_raw(raw)
}

/// Decodes a field key from the front of `buf`.
#[inline]
pub fn decode_key<B: bytes::Buf + ?Sized>(buf: &mut B) -> Result<FieldKey, DecodeError> {
    if unlikely(!buf.has_remaining()) {
        return Err(DecodeError::truncated(1, 0));
    }
    let first_byte = buf.get_u8();
    read_key(first_byte, buf)
}

/// Decodes the length prefix of a length-delimited value.
#[inline(always)]
pub fn decode_len<B: bytes::Buf + ?Sized>(buf: &mut B) -> Result<usize, DecodeError> {
    let (len, _) = u64::decode_leb128_buf(buf)?;
    usize::try_from(len).map_err(|_| DecodeError::LengthOverflow { value: len })
}

/// Writes a bare length prefix, with no key in front of it.
///
/// Used for the outermost prefix of a length-delimited envelope.
#[inline(always)]
pub fn encode_len<B: bytes::BufMut + ?Sized>(len: usize, buf: &mut B) {
    u64::cast_from(len).encode_leb128(buf);
}

/// Returns the encoded length of a length prefix for `len`.
#[inline(always)]
pub fn encoded_len_len(len: usize) -> usize {
    u64::cast_from(len).encoded_leb128_len()
}

/// Skips over a field value based on its wire type.
///
/// This is how fields added by newer protocol versions are ignored: the
/// value is consumed without being interpreted.
#[inline]
pub fn skip_field<B: bytes::Buf + ?Sized>(wire_type: WireType, buf: &mut B) -> Result<(), DecodeError> {
    let skip_len = match wire_type {
        WireType::Varint => {
            u64::decode_leb128_buf(buf)?;
            return Ok(());
        }
        WireType::I64 => 8,
        WireType::Len => decode_len(buf)?,
        WireType::I32 => 4,
        WireType::SGroup | WireType::EGroup => {
            return Err(DecodeError::DeprecatedGroupEncoding);
        }
    };

    if unlikely(buf.remaining() < skip_len) {
        return Err(DecodeError::truncated(skip_len, buf.remaining()));
    }
    buf.advance(skip_len);
    Ok(())
}

/// Denotes the encoding shape of a field's value.
///
/// Packets only ever produce [`WireType::Varint`] and [`WireType::Len`]. The
/// remaining types are recognized so unknown fields using them can still be
/// skipped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for: `uint32`, `uint64`.
    Varint = 0,
    /// 64-bit little-endian value.
    I64 = 1,
    /// Length-delimited value.
    ///
    /// Used for: strings, byte blobs, nested messages, packed repeated fields.
    Len = 2,
    /// Group start (deprecated).
    SGroup = 3,
    /// Group end (deprecated).
    EGroup = 4,
    /// 32-bit little-endian value.
    I32 = 5,
}

// N.B. It's not super important that these are the same size, but keeping them as such
// allows the compiler to make as many optimizations as possible.
static_assertions::assert_eq_size!(WireType, Result<WireType, ()>);
static_assertions::assert_eq_size!(FieldKey, u32);

#[allow(clippy::as_conversions)]
impl WireType {
    /// Maximum value a [`WireType`] can be.
    const MAX_VAL: u8 = WireType::I32 as u8;

    /// Try to decode a [`WireType`] from the provided raw value.
    #[inline(always)]
    fn try_from_val(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::SGroup),
            4 => Ok(WireType::EGroup),
            5 => Ok(WireType::I32),
            _ => Err(DecodeError::InvalidWireType { value }),
        }
    }

    /// Return the raw value for this [`WireType`].
    #[inline(always)]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeError;

    #[inline(always)]
    fn try_from(value: u8) -> Result<Self, DecodeError> {
        WireType::try_from_val(value)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn proptest_key_roundtrips() {
        fn arb_field_number() -> impl Strategy<Value = u32> {
            MINIMUM_FIELD_NUMBER..=MAXIMUM_FIELD_NUMBER
        }

        fn arb_wiretype() -> impl Strategy<Value = WireType> {
            (0..=WireType::MAX_VAL).prop_map(|val| WireType::try_from_val(val).expect("known valid"))
        }

        fn test(field_number: u32, wire_type: WireType) {
            let mut buf = Vec::with_capacity(16);
            encode_key(wire_type, field_number, &mut buf);
            assert_eq!(buf.len(), encoded_key_len(field_number));

            let key = decode_key(&mut &buf[..]).unwrap();
            assert_eq!(key.into_parts(), (field_number, wire_type));
        }

        let strat = (arb_field_number(), arb_wiretype());
        proptest!(|((field_number, wire_type) in strat)| test(field_number, wire_type))
    }

    #[test]
    fn test_key_packing() {
        assert_eq!(FieldKey::new(1, WireType::Len).into_raw(), 10);
        assert_eq!(FieldKey::new(2, WireType::Varint).into_raw(), 16);

        let key = FieldKey::try_from_raw(10).unwrap();
        assert_eq!(key.into_parts(), (1, WireType::Len));
    }

    #[test]
    fn test_all_wire_type_values() {
        for i in u8::MIN..u8::MAX {
            let wire_type = WireType::try_from_val(i);
            match (i, wire_type) {
                (0, Ok(WireType::Varint))
                | (1, Ok(WireType::I64))
                | (2, Ok(WireType::Len))
                | (3, Ok(WireType::SGroup))
                | (4, Ok(WireType::EGroup))
                | (5, Ok(WireType::I32)) => (),
                (6..=u8::MAX, Err(DecodeError::InvalidWireType { value })) => assert_eq!(value, i),
                other => panic!("unexpected value {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_field_number() {
        // A lone zero byte, and field 0 paired with any valid wire type.
        for raw in [0u8, 2] {
            let err = read_key(raw, &mut &b""[..]).unwrap_err();
            assert_eq!(
                err,
                DecodeError::InvalidTag {
                    reason: InvalidTagReason::ZeroFieldNumber
                }
            );
        }
    }

    #[test]
    fn test_field_number_too_large() {
        let raw = (u64::from(MAXIMUM_FIELD_NUMBER) + 1) << 3;
        assert_eq!(
            FieldKey::try_from_raw(raw),
            Err(DecodeError::InvalidTag {
                reason: InvalidTagReason::FieldNumberTooLarge
            })
        );
    }

    #[test]
    fn test_read_key_multi_byte() {
        // Field 16, wire type Len: raw key 130 = [0x82, 0x01].
        let mut rest = &[0x01, 0x99][..];
        let key = read_key(0x82, &mut rest).unwrap();
        assert_eq!(key.into_parts(), (16, WireType::Len));
        assert_eq!(rest, &[0x99]);
    }

    #[test]
    fn test_read_key_truncated() {
        // Continuation bit set on the first byte but nothing follows.
        let err = read_key(0x82, &mut &b""[..]).unwrap_err();
        assert_eq!(err, DecodeError::MalformedVarint);
    }

    #[test]
    fn test_read_key_length_limit() {
        // Ten bytes in total, padded with redundant continuation bytes.
        let mut rest = &[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00, 0x07][..];
        let key = read_key(0x88, &mut rest).unwrap();
        assert_eq!(key.into_parts(), (1, WireType::Varint));
        assert_eq!(rest, &[0x07]);

        // Eleven bytes in total.
        let mut rest = &[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00, 0x07][..];
        assert_eq!(read_key(0x88, &mut rest), Err(DecodeError::MalformedVarint));
    }

    #[test]
    fn test_decode_len() {
        let mut buf = &[0u8][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 0);

        let mut buf = &[127u8][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 127);

        let mut buf = &[0x80, 0x01][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 128);

        let mut buf = &[0xAC, 0x02][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 300);
    }

    #[test]
    fn test_encode_len() {
        let mut buf = Vec::new();
        encode_len(300, &mut buf);
        assert_eq!(buf, [0xAC, 0x02]);
        assert_eq!(encoded_len_len(300), 2);
        assert_eq!(encoded_len_len(0), 1);
    }

    #[test]
    fn test_skip_field_varint() {
        let mut buf = &[42u8, 99][..];
        skip_field(WireType::Varint, &mut buf).unwrap();
        assert_eq!(buf, &[99]);

        let mut buf = &[0x80, 0x01, 99][..];
        skip_field(WireType::Varint, &mut buf).unwrap();
        assert_eq!(buf, &[99]);
    }

    #[test]
    fn test_skip_field_fixed() {
        let mut buf = &[1, 2, 3, 4, 99][..];
        skip_field(WireType::I32, &mut buf).unwrap();
        assert_eq!(buf, &[99]);

        let mut buf = &[1, 2, 3, 4, 5, 6, 7, 8, 99][..];
        skip_field(WireType::I64, &mut buf).unwrap();
        assert_eq!(buf, &[99]);
    }

    #[test]
    fn test_skip_field_len() {
        let mut buf = &[3, 1, 2, 3, 99][..];
        skip_field(WireType::Len, &mut buf).unwrap();
        assert_eq!(buf, &[99]);

        let mut buf = &[0, 99][..];
        skip_field(WireType::Len, &mut buf).unwrap();
        assert_eq!(buf, &[99]);
    }

    #[test]
    fn test_skip_field_truncated() {
        let mut buf = &[5, 1, 2][..];
        assert_eq!(
            skip_field(WireType::Len, &mut buf),
            Err(DecodeError::TruncatedMessage {
                needed: 5,
                remaining: 2
            })
        );
    }

    #[test]
    fn test_skip_field_groups_error() {
        let mut buf = &[0u8][..];
        assert!(skip_field(WireType::SGroup, &mut buf).is_err());
        assert!(skip_field(WireType::EGroup, &mut buf).is_err());
    }
}
