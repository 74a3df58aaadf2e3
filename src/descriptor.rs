//! Declarative field tables and the generic engine that walks them.
//!
//! Every packet type exposes one [`MessageDescriptor`] listing its fields.
//! Each [`FieldEntry`] pairs a field number with a [`FieldAccess`], which
//! knows how to read, write and size that one field of the packet. The
//! engine in [`MessageDescriptor::merge`], [`MessageDescriptor::encode`] and
//! [`MessageDescriptor::encoded_len`] is shared by all packet types, so no
//! per-packet decode or encode loop exists.
//!
//! Descriptors are `const` data, normally produced by `#[derive(Packet)]`:
//!
//! ```ignore
//! impl Message for Position {
//!     const DESCRIPTOR: MessageDescriptor<Self> = MessageDescriptor {
//!         name: "Position",
//!         fields: &[FieldEntry {
//!             number: 1,
//!             name: "x",
//!             access: &Singular::<Position, u32> {
//!                 get: |m| &m.x,
//!                 get_mut: |m| &mut m.x,
//!             },
//!         }],
//!     };
//! }
//! ```

use bytes::BufMut;

use crate::buffer::ReadStream;
use crate::codec::{DecodeValue, EncodeValue, IsWireDefault, Repeated};
use crate::error::DecodeError;
use crate::wire::{self, WireType};

/// Field table for a packet type `M`.
pub struct MessageDescriptor<M: 'static> {
    /// Packet name, used in logs and panics.
    pub name: &'static str,
    /// Fields in the order they are encoded.
    pub fields: &'static [FieldEntry<M>],
}

impl<M: 'static> Clone for MessageDescriptor<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: 'static> Copy for MessageDescriptor<M> {}

impl<M: 'static> core::fmt::Debug for MessageDescriptor<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<M: 'static> MessageDescriptor<M> {
    /// Looks up the entry for `number`.
    #[inline]
    pub fn field(&self, number: u32) -> Option<&'static FieldEntry<M>> {
        self.fields.iter().find(|entry| entry.number == number)
    }

    /// Decodes fields from `stream` into `msg` until the stream's logical end.
    ///
    /// A field is dispatched to its entry only if both the number and the wire
    /// type match. Anything else is skipped, which keeps older readers working
    /// against payloads from newer writers.
    pub fn merge(&self, msg: &mut M, stream: &mut ReadStream<'_>) -> Result<(), DecodeError> {
        while let Some(first_byte) = stream.read_byte() {
            let (number, wire_type) = wire::read_key(first_byte, stream)?.into_parts();
            match self.field(number) {
                Some(entry) if entry.access.accepts(wire_type) => {
                    entry.access.merge(msg, wire_type, stream)?;
                }
                _ => {
                    tracing::trace!(
                        packet = self.name,
                        field_number = number,
                        ?wire_type,
                        "skipping unknown field"
                    );
                    wire::skip_field(wire_type, stream)?;
                }
            }
        }
        Ok(())
    }

    /// Encodes every non-default field of `msg`, in declaration order.
    pub fn encode(&self, msg: &M, buf: &mut dyn BufMut) {
        for entry in self.fields {
            entry.access.encode(msg, entry.number, buf);
        }
    }

    /// Returns the number of bytes [`MessageDescriptor::encode`] writes.
    pub fn encoded_len(&self, msg: &M) -> usize {
        self.fields
            .iter()
            .map(|entry| entry.access.encoded_len(msg, entry.number))
            .sum()
    }
}

/// One field of a packet.
pub struct FieldEntry<M: 'static> {
    pub number: u32,
    pub name: &'static str,
    pub access: &'static dyn FieldAccess<M>,
}

impl<M: 'static> core::fmt::Debug for FieldEntry<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldEntry")
            .field("number", &self.number)
            .field("name", &self.name)
            .field("wire_type", &self.access.wire_type())
            .finish()
    }
}

/// Reads, writes and sizes a single field of a packet `M`.
pub trait FieldAccess<M>: Send + Sync {
    /// Wire type this field is encoded with.
    fn wire_type(&self) -> WireType;

    /// Whether a value arriving with `wire_type` can be decoded into this field.
    fn accepts(&self, wire_type: WireType) -> bool {
        wire_type == self.wire_type()
    }

    /// Decodes one occurrence of the field from `stream` into `msg`.
    fn merge(
        &self,
        msg: &mut M,
        wire_type: WireType,
        stream: &mut ReadStream<'_>,
    ) -> Result<(), DecodeError>;

    /// Encodes the field of `msg`, key included, unless it holds its default.
    fn encode(&self, msg: &M, number: u32, buf: &mut dyn BufMut);

    /// Returns the number of bytes [`FieldAccess::encode`] writes.
    fn encoded_len(&self, msg: &M, number: u32) -> usize;
}

/// A field holding at most one value. Later occurrences replace earlier ones.
pub struct Singular<M, T> {
    pub get: fn(&M) -> &T,
    pub get_mut: fn(&mut M) -> &mut T,
}

impl<M, T> FieldAccess<M> for Singular<M, T>
where
    T: DecodeValue + EncodeValue + IsWireDefault,
{
    #[inline]
    fn wire_type(&self) -> WireType {
        T::WIRE_TYPE
    }

    #[inline]
    fn merge(
        &self,
        msg: &mut M,
        _wire_type: WireType,
        stream: &mut ReadStream<'_>,
    ) -> Result<(), DecodeError> {
        T::decode_into(stream, (self.get_mut)(msg))
    }

    #[inline]
    fn encode(&self, msg: &M, number: u32, buf: &mut dyn BufMut) {
        let value = (self.get)(msg);
        if value.is_wire_default() {
            return;
        }
        wire::encode_key(T::WIRE_TYPE, number, buf);
        value.encode_value(buf);
    }

    #[inline]
    fn encoded_len(&self, msg: &M, number: u32) -> usize {
        let value = (self.get)(msg);
        if value.is_wire_default() {
            return 0;
        }
        wire::encoded_key_len(number) + value.encoded_len()
    }
}

/// A field holding any number of values, appended in arrival order.
///
/// Each element is encoded as its own key/value record. When decoding,
/// varint elements are also accepted as a packed run: a single
/// length-delimited record holding back to back varints.
pub struct RepeatedField<M, T> {
    pub get: fn(&M) -> &Repeated<T>,
    pub get_mut: fn(&mut M) -> &mut Repeated<T>,
}

impl<M, T> FieldAccess<M> for RepeatedField<M, T>
where
    T: DecodeValue + EncodeValue,
{
    #[inline]
    fn wire_type(&self) -> WireType {
        T::WIRE_TYPE
    }

    #[inline]
    fn accepts(&self, wire_type: WireType) -> bool {
        wire_type == T::WIRE_TYPE || (T::WIRE_TYPE == WireType::Varint && wire_type == WireType::Len)
    }

    fn merge(
        &self,
        msg: &mut M,
        wire_type: WireType,
        stream: &mut ReadStream<'_>,
    ) -> Result<(), DecodeError> {
        let values = (self.get_mut)(msg);
        if wire_type == T::WIRE_TYPE {
            let mut value = T::default();
            T::decode_into(stream, &mut value)?;
            values.push(value);
            return Ok(());
        }

        let len = wire::decode_len(stream)?;
        let saved = stream.push_limit(len)?;
        tracing::trace!(len, "decoding packed repeated field");

        let mut result = Ok(());
        while result.is_ok() && !stream.is_empty() {
            let mut value = T::default();
            result = T::decode_into(stream, &mut value).map(|()| values.push(value));
        }

        stream.pop_limit(saved);
        result
    }

    fn encode(&self, msg: &M, number: u32, buf: &mut dyn BufMut) {
        for value in (self.get)(msg) {
            wire::encode_key(T::WIRE_TYPE, number, buf);
            value.encode_value(buf);
        }
    }

    fn encoded_len(&self, msg: &M, number: u32) -> usize {
        let values = (self.get)(msg);
        let values_len: usize = values.iter().map(EncodeValue::encoded_len).sum();
        values.len() * wire::encoded_key_len(number) + values_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Message;

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        id: u32,
        label: Option<String>,
    }

    impl Message for Item {
        const DESCRIPTOR: MessageDescriptor<Self> = MessageDescriptor {
            name: "Item",
            fields: &[
                FieldEntry {
                    number: 1,
                    name: "id",
                    access: &Singular::<Item, u32> {
                        get: |m| &m.id,
                        get_mut: |m| &mut m.id,
                    },
                },
                FieldEntry {
                    number: 2,
                    name: "label",
                    access: &Singular::<Item, Option<String>> {
                        get: |m| &m.label,
                        get_mut: |m| &mut m.label,
                    },
                },
            ],
        };
    }

    #[derive(Debug, Default, PartialEq)]
    struct Inventory {
        owner: Option<Item>,
        items: Repeated<Item>,
        counts: Repeated<u64>,
        version: u64,
    }

    impl Message for Inventory {
        const DESCRIPTOR: MessageDescriptor<Self> = MessageDescriptor {
            name: "Inventory",
            fields: &[
                FieldEntry {
                    number: 1,
                    name: "owner",
                    access: &Singular::<Inventory, Option<Item>> {
                        get: |m| &m.owner,
                        get_mut: |m| &mut m.owner,
                    },
                },
                FieldEntry {
                    number: 2,
                    name: "items",
                    access: &RepeatedField::<Inventory, Item> {
                        get: |m| &m.items,
                        get_mut: |m| &mut m.items,
                    },
                },
                FieldEntry {
                    number: 3,
                    name: "counts",
                    access: &RepeatedField::<Inventory, u64> {
                        get: |m| &m.counts,
                        get_mut: |m| &mut m.counts,
                    },
                },
                FieldEntry {
                    number: 4,
                    name: "version",
                    access: &Singular::<Inventory, u64> {
                        get: |m| &m.version,
                        get_mut: |m| &mut m.version,
                    },
                },
            ],
        };
    }

    fn item(id: u32, label: &str) -> Item {
        Item {
            id,
            label: Some(label.to_string()),
        }
    }

    #[test]
    fn test_field_lookup() {
        let desc = Inventory::DESCRIPTOR;
        assert_eq!(desc.field(3).map(|entry| entry.name), Some("counts"));
        assert_eq!(desc.field(2).map(|entry| entry.access.wire_type()), Some(WireType::Len));
        assert!(desc.field(9).is_none());
    }

    #[test]
    fn test_nested_roundtrip() {
        let inventory = Inventory {
            owner: Some(item(1, "me")),
            items: vec![item(2, "sword"), item(3, "")].into(),
            counts: vec![1, 300, 0].into(),
            version: 7,
        };
        let bytes = inventory.encode_to_bytes();
        assert_eq!(bytes.len(), inventory.compute_size());
        assert_eq!(Inventory::decode(&bytes).unwrap(), inventory);
    }

    #[test]
    fn test_nested_then_sibling() {
        // owner = { id: 5 }, then version = 9 after the nested payload.
        let buf = [0x0A, 0x02, 0x08, 0x05, 0x20, 0x09];
        let decoded = Inventory::decode(&buf).unwrap();
        assert_eq!(decoded.owner, Some(Item { id: 5, label: None }));
        assert_eq!(decoded.version, 9);
    }

    #[test]
    fn test_interleaved_repeated() {
        // counts: 99, version: 2, counts: 91, counts: 107
        let buf = [0x18, 99, 0x20, 0x02, 0x18, 91, 0x18, 107];
        let decoded = Inventory::decode(&buf).unwrap();
        assert_eq!(decoded.counts.as_slice(), &[99, 91, 107]);
        assert_eq!(decoded.version, 2);
    }

    #[test]
    fn test_packed_repeated_varints() {
        // counts as a packed run [1, 300, 2].
        let buf = [0x1A, 0x04, 0x01, 0xAC, 0x02, 0x02, 0x20, 0x01];
        let decoded = Inventory::decode(&buf).unwrap();
        assert_eq!(decoded.counts.as_slice(), &[1, 300, 2]);
        assert_eq!(decoded.version, 1);
    }

    #[test]
    fn test_skips_unknown_fields() {
        // field 15 varint, field 16 length-delimited, field 17 fixed 32 bit,
        // field 18 fixed 64 bit, then id = 4.
        let mut buf = vec![0x78, 0x96, 0x01];
        buf.extend_from_slice(&[0x82, 0x01, 0x02, 0xAA, 0xBB]);
        buf.extend_from_slice(&[0x8D, 0x01, 1, 2, 3, 4]);
        buf.extend_from_slice(&[0x91, 0x01, 1, 2, 3, 4, 5, 6, 7, 8]);
        buf.extend_from_slice(&[0x08, 0x04]);
        let decoded = Item::decode(&buf).unwrap();
        assert_eq!(decoded, Item { id: 4, label: None });

        // Each skip stops exactly on the key of the next field.
        let mut stream = ReadStream::new(&buf);
        for next_key in [3, 8, 14, 24] {
            let first_byte = stream.read_byte().unwrap();
            let (_, wire_type) = wire::read_key(first_byte, &mut stream).unwrap().into_parts();
            wire::skip_field(wire_type, &mut stream).unwrap();
            assert_eq!(stream.position(), next_key);
        }

        let mut stream = ReadStream::new(&buf);
        let decoded = Item::decode_from(&mut stream).unwrap();
        assert_eq!(decoded.id, 4);
        assert!(stream.is_empty());
        assert_eq!(stream.position(), buf.len());
    }

    #[test]
    fn test_overlong_key_rejected() {
        // Key for field 1 padded out to eleven bytes, then the value 7.
        let mut buf = vec![0x88];
        buf.extend_from_slice(&[0x80; 9]);
        buf.extend_from_slice(&[0x00, 0x07]);
        assert_eq!(Item::decode(&buf), Err(DecodeError::MalformedVarint));

        // Ten bytes is still a valid key.
        buf.remove(1);
        assert_eq!(Item::decode(&buf).unwrap().id, 7);
    }

    #[test]
    fn test_wrong_wire_type_is_skipped() {
        // Field 1 is a varint, here it arrives length-delimited.
        let buf = [0x0A, 0x01, 0xFF, 0x08, 0x02];
        let decoded = Item::decode(&buf).unwrap();
        assert_eq!(decoded.id, 2);
    }

    #[test]
    fn test_group_encoding_rejected() {
        let buf = [0x7B];
        assert_eq!(Item::decode(&buf), Err(DecodeError::DeprecatedGroupEncoding));
    }

    #[test]
    fn test_truncated_nested_payload() {
        // owner declares 5 bytes but only 2 follow.
        let buf = [0x0A, 0x05, 0x08, 0x05];
        assert_eq!(
            Inventory::decode(&buf),
            Err(DecodeError::TruncatedMessage {
                needed: 5,
                remaining: 2
            })
        );
    }

    #[test]
    fn test_recursion_limit() {
        let inventory = Inventory {
            owner: Some(item(1, "me")),
            ..Default::default()
        };
        let bytes = inventory.encode_to_bytes();

        let mut stream = ReadStream::new(&bytes).with_recursion_limit(0);
        assert_eq!(
            Inventory::decode_from(&mut stream),
            Err(DecodeError::RecursionLimitExceeded { limit: 0 })
        );

        let mut stream = ReadStream::new(&bytes).with_recursion_limit(1);
        assert_eq!(Inventory::decode_from(&mut stream).unwrap(), inventory);
    }

    #[test]
    fn test_encode_order_and_sparseness() {
        let inventory = Inventory {
            version: 1,
            counts: vec![5].into(),
            ..Default::default()
        };
        let bytes = inventory.encode_to_bytes();
        assert_eq!(&bytes[..], &[0x18, 0x05, 0x20, 0x01]);
    }
}
